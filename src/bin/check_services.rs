use afip_client::adapters::{FileTicketStore, ReqwestTransport};
use afip_client::core::wsfe::WsfeClient;
use afip_client::domain::model::{services, AccessTicket};
use afip_client::domain::ports::TicketStore;
use afip_client::AfipConfig;
use chrono::Utc;
use std::sync::Arc;

/// 檢查 WSFE 伺服器狀態與本機快取的票證
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "afip.toml".to_string());
    let config = AfipConfig::from_file(&config_path)?;

    println!("🚀 Checking AFIP services ({:?})", config.environment());

    let transport = Arc::new(ReqwestTransport::new(config.http_timeout())?);
    let wsfe = WsfeClient::new(transport, config.wsfe_url());
    match wsfe.dummy().await {
        Ok(status) => println!(
            "{} WSFE app={} db={} auth={}",
            if status.is_healthy() { "✅" } else { "⚠️" },
            status.app_server,
            status.db_server,
            status.auth_server
        ),
        Err(e) => println!("❌ WSFE unreachable: {}", e),
    }

    let store = FileTicketStore::new(config.cache_dir());
    let now = Utc::now();
    let margin = config.renew_margin();
    for service in [services::WSFE, services::PADRON_A13, services::WSCPE] {
        match store.load(service).await? {
            None => println!("   {:<18} no cached ticket", service),
            Some(xml) => match AccessTicket::from_xml(&xml) {
                Ok(ticket) if ticket.is_valid_at(now, margin) => println!(
                    "✅ {:<18} valid for {} more minutes",
                    service,
                    ticket.remaining(now).num_minutes()
                ),
                Ok(ticket) if ticket.is_valid_at(now, chrono::Duration::zero()) => println!(
                    "⏰ {:<18} due for renewal, expires at {}",
                    service, ticket.expiration_time
                ),
                Ok(ticket) => println!("⚠️ {:<18} expired at {}", service, ticket.expiration_time),
                Err(e) => println!("❌ {:<18} unreadable: {}", service, e),
            },
        }
    }

    Ok(())
}
