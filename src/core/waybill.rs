use crate::core::soap::{self, XmlWriter};
use crate::domain::model::{services, Credentials, Waybill};
use crate::domain::ports::SoapTransport;
use crate::utils::error::{AfipError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use roxmltree::Node;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const WSCPE_NAMESPACE: &str = "https://serviciosjava.afip.gob.ar/wscpe/";
pub const CONSULT_AUTOMOTOR_ACTION: &str =
    "https://serviciosjava.afip.gob.ar/wscpe/consultarCPEAutomotor";

/// 電子運送單 (Carta de Porte) 查詢
pub struct WaybillClient {
    transport: Arc<dyn SoapTransport>,
    url: String,
}

impl WaybillClient {
    pub fn new(transport: Arc<dyn SoapTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// Looks up a road-freight waybill by its CTG number.
    pub async fn consult_automotor(&self, auth: &Credentials, ctg: &str) -> Result<Waybill> {
        let ctg = ctg.trim();
        if ctg.is_empty() || !ctg.chars().all(|c| c.is_ascii_digit()) {
            return Err(AfipError::ValidationError {
                message: format!("CTG number must be numeric, got '{}'", ctg),
            });
        }

        let mut w = XmlWriter::new();
        w.open("wsc:ConsultarCPEAutomotorReq")
            .open("auth")
            .leaf("token", &auth.token)
            .leaf("sign", &auth.sign)
            .leaf("cuitRepresentada", auth.cuit)
            .close("auth")
            .open("solicitud")
            .leaf("nroCTG", ctg)
            .close("solicitud")
            .close("wsc:ConsultarCPEAutomotorReq");
        let envelope = soap::envelope("wsc", WSCPE_NAMESPACE, &w.finish());

        tracing::debug!("Consulting waybill CTG {}", ctg);
        let body = self
            .transport
            .call(&self.url, CONSULT_AUTOMOTOR_ACTION, envelope)
            .await?;
        parse_waybill(&body, ctg)
    }
}

fn parse_waybill(body: &str, ctg: &str) -> Result<Waybill> {
    let doc = soap::parse_response(body)?;

    let errors = soap::collect_messages(doc.root(), "errores", "error", "codigo", "descripcion");
    if !errors.is_empty() {
        return Err(AfipError::ServiceError {
            service: services::WSCPE.to_string(),
            errors,
        });
    }

    let respuesta = soap::find_required(doc.root(), "respuesta")?;

    let pdf = match soap::text_of(respuesta, "pdf") {
        Some(encoded) => {
            let compact: String = encoded.split_whitespace().collect();
            Some(
                STANDARD
                    .decode(compact)
                    .map_err(|e| AfipError::malformed(format!("waybill pdf is not base64: {}", e)))?,
            )
        }
        None => None,
    };

    let mut fields = BTreeMap::new();
    flatten(respuesta, "", &mut fields);

    let ctg_number = fields
        .iter()
        .find(|(k, _)| k.rsplit('.').next() == Some("nroCTG"))
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| ctg.to_string());

    Ok(Waybill {
        ctg_number,
        fields,
        pdf,
    })
}

/// Collects leaf text under `node` keyed by dotted path; repeated paths get `[n]`.
fn flatten(node: Node<'_, '_>, prefix: &str, out: &mut BTreeMap<String, String>) {
    for child in node.children().filter(|n| n.is_element()) {
        let name = child.tag_name().name();
        if prefix.is_empty() && name == "pdf" {
            continue;
        }

        let mut path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };

        if child.children().any(|n| n.is_element()) {
            flatten(child, &path, out);
            continue;
        }

        let Some(text) = child.text().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };

        if out.contains_key(&path) {
            let base = path.clone();
            let mut n = 2;
            while out.contains_key(&path) {
                path = format!("{}[{}]", base, n);
                n += 1;
            }
        }
        out.insert(path, text.to_string());
    }
}
