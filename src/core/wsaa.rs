use crate::core::soap::{self, XmlWriter};
use crate::domain::ports::SoapTransport;
use crate::utils::error::{AfipError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

pub const WSAA_NAMESPACE: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov.ar";
pub const LOGIN_CMS_ACTION: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov.ar/loginCms";

/// WSAA 驗證服務用戶端
pub struct WsaaClient {
    transport: Arc<dyn SoapTransport>,
    url: String,
}

impl WsaaClient {
    pub fn new(transport: Arc<dyn SoapTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Submits a signed TRA and returns the `loginTicketResponse` document.
    pub async fn login_cms(&self, cms_der: &[u8]) -> Result<String> {
        let mut body = XmlWriter::new();
        body.open("wsaa:loginCms")
            .leaf("wsaa:in0", STANDARD.encode(cms_der))
            .close("wsaa:loginCms");
        let envelope = soap::envelope("wsaa", WSAA_NAMESPACE, &body.finish());

        tracing::debug!("Calling WSAA loginCms at {}", self.url);
        let response = self
            .transport
            .call(&self.url, LOGIN_CMS_ACTION, envelope)
            .await?;

        let doc = soap::parse_response(&response)?;
        let ticket = soap::text_of(doc.root(), "loginCmsReturn").ok_or_else(|| {
            AfipError::malformed("WSAA response has no <loginCmsReturn>")
        })?;

        Ok(ticket)
    }
}
