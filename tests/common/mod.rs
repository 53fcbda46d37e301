#![allow(dead_code)]

use afip_client::adapters::{FileTicketStore, ReqwestTransport};
use afip_client::domain::ports::CmsSigner;
use afip_client::{Afip, AfipConfig};
use async_trait::async_trait;
use chrono::{Duration, FixedOffset, Utc};
use httpmock::MockServer;
use std::path::Path;
use std::sync::Arc;

pub const WSAA_PATH: &str = "/ws/services/LoginCms";
pub const WSFE_PATH: &str = "/wsfev1/service.asmx";
pub const PADRON_PATH: &str = "/sr-padron/webservices/personaServiceA13";
pub const WSCPE_PATH: &str = "/wscpe/services/soap";

/// Returns a fixed blob instead of invoking openssl.
pub struct StaticSigner;

#[async_trait]
impl CmsSigner for StaticSigner {
    async fn sign(&self, _content: &[u8]) -> afip_client::Result<Vec<u8>> {
        Ok(b"signed-tra".to_vec())
    }
}

pub fn config(server: &MockServer, cache_dir: &Path, extra: &str) -> afip_client::Result<AfipConfig> {
    let cache_dir = cache_dir.display().to_string().replace('\\', "/");
    AfipConfig::from_toml_str(&format!(
        r#"
[afip]
cuit = 30716004720

[credentials]
certificate = "unused.crt"
private_key = "unused.key"

[tickets]
cache_dir = "{}"
{}

[endpoints]
wsaa = "{}"
wsfe = "{}"
padron = "{}"
wscpe = "{}"

[http]
timeout_seconds = 5
"#,
        cache_dir,
        extra,
        server.url(WSAA_PATH),
        server.url(WSFE_PATH),
        server.url(PADRON_PATH),
        server.url(WSCPE_PATH),
    ))
}

pub fn afip(config: &AfipConfig) -> afip_client::Result<Afip> {
    let transport = Arc::new(ReqwestTransport::new(config.http_timeout())?);
    let store = Arc::new(FileTicketStore::new(config.cache_dir()));
    Ok(Afip::with_parts(config, transport, Arc::new(StaticSigner), store))
}

/// `loginTicketResponse` expiring `minutes` from now.
pub fn ticket_xml(token: &str, minutes: i64) -> String {
    let offset = FixedOffset::west_opt(3 * 3600).unwrap();
    let now = Utc::now().with_timezone(&offset);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<loginTicketResponse version="1.0">
    <header>
        <source>CN=wsaahomo, O=AFIP, C=AR, SERIALNUMBER=CUIT 33693450239</source>
        <destination>SERIALNUMBER=CUIT 30716004720, CN=logistica</destination>
        <uniqueId>4121212</uniqueId>
        <generationTime>{}</generationTime>
        <expirationTime>{}</expirationTime>
    </header>
    <credentials>
        <token>{}</token>
        <sign>sign-{}</sign>
    </credentials>
</loginTicketResponse>"#,
        (now - Duration::minutes(10)).to_rfc3339(),
        (now + Duration::minutes(minutes)).to_rfc3339(),
        token,
        token
    )
}

pub fn login_cms_response(ticket: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><loginCmsResponse xmlns="http://wsaa.view.sua.dvadac.desein.afip.gov.ar"><loginCmsReturn>{}</loginCmsReturn></loginCmsResponse></soapenv:Body></soapenv:Envelope>"#,
        quick_xml::escape::escape(ticket)
    )
}

pub fn soap(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{}</soap:Body></soap:Envelope>"#,
        body
    )
}
