use crate::core::soap::{self, XmlWriter};
use crate::domain::model::{services, Credentials, ServiceMessage, Taxpayer};
use crate::domain::ports::SoapTransport;
use crate::utils::error::{AfipError, Result};
use roxmltree::Node;
use std::sync::Arc;

pub const PADRON_A13_NAMESPACE: &str = "http://a13.soap.ws.server.puc.sr/";

/// 稅籍登錄查詢 (padrón A13)
pub struct PadronClient {
    transport: Arc<dyn SoapTransport>,
    url: String,
}

impl PadronClient {
    pub fn new(transport: Arc<dyn SoapTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub async fn taxpayer(&self, auth: &Credentials, cuit: u64) -> Result<Taxpayer> {
        let mut w = XmlWriter::new();
        w.open("a13:getPersona")
            .leaf("token", &auth.token)
            .leaf("sign", &auth.sign)
            .leaf("cuitRepresentada", auth.cuit)
            .leaf("idPersona", cuit)
            .close("a13:getPersona");
        let envelope = soap::envelope("a13", PADRON_A13_NAMESPACE, &w.finish());

        let body = self.transport.call(&self.url, "", envelope).await?;
        let doc = soap::parse_response(&body)?;
        let persona = soap::find(doc.root(), "persona").ok_or_else(|| AfipError::ServiceError {
            service: services::PADRON_A13.to_string(),
            errors: vec![ServiceMessage::new(
                "persona",
                format!("no registry entry for {}", cuit),
            )],
        })?;

        parse_persona(persona, cuit)
    }

    /// VAT condition id of `cuit`, when the registry publishes one.
    pub async fn vat_condition(&self, auth: &Credentials, cuit: u64) -> Result<Option<u8>> {
        Ok(self.taxpayer(auth, cuit).await?.vat_condition)
    }
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    soap::children(node, name)
        .next()
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn parse_persona(persona: Node<'_, '_>, requested: u64) -> Result<Taxpayer> {
    let id = match child_text(persona, "idPersona") {
        Some(text) => text
            .parse::<u64>()
            .map_err(|_| AfipError::malformed(format!("idPersona is not numeric: {}", text)))?,
        None => requested,
    };

    // Companies carry razonSocial, people apellido/nombre.
    let name = child_text(persona, "razonSocial").unwrap_or_else(|| {
        match (child_text(persona, "apellido"), child_text(persona, "nombre")) {
            (Some(last), Some(first)) => format!("{}, {}", last, first),
            (Some(last), None) => last,
            (None, Some(first)) => first,
            (None, None) => String::new(),
        }
    });

    let vat_condition = match child_text(persona, "idCondicionIva") {
        Some(text) => Some(
            text.parse::<u8>()
                .map_err(|_| AfipError::malformed(format!("idCondicionIva is not numeric: {}", text)))?,
        ),
        None => None,
    };

    Ok(Taxpayer {
        id,
        name,
        person_type: child_text(persona, "tipoPersona"),
        key_status: child_text(persona, "estadoClave"),
        vat_condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::ScriptedTransport;

    fn auth() -> Credentials {
        Credentials {
            token: "tok".to_string(),
            sign: "sig".to_string(),
            cuit: 30716004720,
        }
    }

    fn response(persona: &str) -> String {
        format!(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><ns2:getPersonaResponse xmlns:ns2="http://a13.soap.ws.server.puc.sr/"><personaReturn><metadata><fechaHora>2025-06-30T12:00:00</fechaHora><servidor>linux11b</servidor></metadata>{}</personaReturn></ns2:getPersonaResponse></soap:Body></soap:Envelope>"#,
            persona
        )
    }

    #[tokio::test]
    async fn test_company_lookup() {
        let transport = Arc::new(ScriptedTransport::new().reply(response(
            "<persona><idPersona>30716004720</idPersona><tipoPersona>JURIDICA</tipoPersona><estadoClave>ACTIVO</estadoClave><razonSocial>TRANSPORTES DEL SUR SA</razonSocial><idCondicionIva>1</idCondicionIva></persona>",
        )));
        let client = PadronClient::new(transport.clone(), "https://padron.test");

        let taxpayer = client.taxpayer(&auth(), 30716004720).await.unwrap();

        assert_eq!(taxpayer.id, 30716004720);
        assert_eq!(taxpayer.name, "TRANSPORTES DEL SUR SA");
        assert_eq!(taxpayer.person_type.as_deref(), Some("JURIDICA"));
        assert_eq!(taxpayer.vat_condition, Some(1));

        let call = &transport.calls()[0];
        assert_eq!(call.url, "https://padron.test");
        assert!(call.envelope.contains(r#"xmlns:a13="http://a13.soap.ws.server.puc.sr/""#));
        assert!(call.envelope.contains("<token>tok</token><sign>sig</sign><cuitRepresentada>30716004720</cuitRepresentada><idPersona>30716004720</idPersona>"));
    }

    #[tokio::test]
    async fn test_person_name_and_missing_condition() {
        let transport = Arc::new(ScriptedTransport::new().reply(response(
            "<persona><idPersona>20111111112</idPersona><tipoPersona>FISICA</tipoPersona><apellido>GOMEZ</apellido><nombre>ANA</nombre><domicilio><nombre>ignored</nombre></domicilio></persona>",
        )));
        let client = PadronClient::new(transport, "https://padron.test");

        let taxpayer = client.taxpayer(&auth(), 20111111112).await.unwrap();
        assert_eq!(taxpayer.name, "GOMEZ, ANA");
        assert_eq!(taxpayer.vat_condition, None);
    }

    #[tokio::test]
    async fn test_unknown_person_fault() {
        let transport = Arc::new(ScriptedTransport::new().reply(
            r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Server</faultcode><faultstring>No existe persona con ese Id</faultstring></soap:Fault></soap:Body></soap:Envelope>"#,
        ));
        let client = PadronClient::new(transport, "https://padron.test");

        let err = client.vat_condition(&auth(), 20111111112).await.unwrap_err();
        assert!(matches!(err, AfipError::SoapFault { ref message, .. } if message.contains("No existe")));
    }

    #[tokio::test]
    async fn test_missing_persona_block() {
        let transport = Arc::new(ScriptedTransport::new().reply(response("")));
        let client = PadronClient::new(transport, "https://padron.test");

        let err = client.taxpayer(&auth(), 20111111112).await.unwrap_err();
        assert!(matches!(err, AfipError::ServiceError { .. }));
    }
}
