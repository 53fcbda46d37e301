use crate::domain::ports::SoapTransport;
use crate::utils::error::{AfipError, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

/// SOAP 1.1 over HTTPS with reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("afip-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SoapTransport for ReqwestTransport {
    async fn call(&self, url: &str, action: &str, envelope: String) -> Result<String> {
        tracing::debug!("POST {} (SOAPAction: {})", url, action);

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", action))
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Response status: {} ({} bytes)", status, body.len());

        // Faults come back as HTTP 500 with a regular envelope.
        if status.is_success() || (status.is_server_error() && body.contains("Fault")) {
            return Ok(body);
        }

        Err(AfipError::HttpStatusError {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
