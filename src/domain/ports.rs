use crate::utils::error::Result;
use async_trait::async_trait;

/// Posts a SOAP envelope and hands back the response document.
///
/// Implementations return the body for HTTP 200 and for HTTP 500 responses
/// carrying a SOAP Fault, so callers can turn the fault into a typed error.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    async fn call(&self, url: &str, action: &str, envelope: String) -> Result<String>;
}

/// Produces a CMS SignedData (DER, content attached) over the given bytes.
#[async_trait]
pub trait CmsSigner: Send + Sync {
    async fn sign(&self, content: &[u8]) -> Result<Vec<u8>>;
}

/// Persistence for WSAA tickets, keyed by service name.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn load(&self, service: &str) -> Result<Option<String>>;
    async fn save(&self, service: &str, ticket_xml: &str) -> Result<()>;
}
