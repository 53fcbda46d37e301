use crate::core::wsaa::WsaaClient;
use crate::domain::model::{AccessTicket, Credentials, LoginTicketRequest};
use crate::domain::ports::{CmsSigner, TicketStore};
use crate::utils::error::{AfipError, Result};
use crate::utils::logger::redact;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// WSAA 票證快取：先讀取已存的 TA，過期或不存在才重新申請
pub struct TicketManager {
    store: Arc<dyn TicketStore>,
    signer: Arc<dyn CmsSigner>,
    wsaa: WsaaClient,
    cuit: u64,
    renew_margin: Duration,
    tra_window: Duration,
}

impl TicketManager {
    pub fn new(
        store: Arc<dyn TicketStore>,
        signer: Arc<dyn CmsSigner>,
        wsaa: WsaaClient,
        cuit: u64,
    ) -> Self {
        Self {
            store,
            signer,
            wsaa,
            cuit,
            renew_margin: Duration::zero(),
            tra_window: Duration::minutes(crate::core::tra::DEFAULT_WINDOW_MINUTES),
        }
    }

    pub fn with_renew_margin(mut self, margin: Duration) -> Self {
        self.renew_margin = margin;
        self
    }

    pub fn with_tra_window(mut self, window: Duration) -> Self {
        self.tra_window = window;
        self
    }

    pub fn cuit(&self) -> u64 {
        self.cuit
    }

    /// `Auth` block for a business call to `service`.
    pub async fn credentials(&self, service: &str) -> Result<Credentials> {
        Ok(self.ticket(service).await?.credentials(self.cuit))
    }

    pub async fn ticket(&self, service: &str) -> Result<AccessTicket> {
        self.ticket_at(service, Utc::now()).await
    }

    pub async fn ticket_at(&self, service: &str, now: DateTime<Utc>) -> Result<AccessTicket> {
        let cached = self.load_cached(service).await?;

        match &cached {
            Some(ticket) if ticket.is_valid_at(now, self.renew_margin) => {
                tracing::info!(
                    "♻️ Reusing cached ticket for {} ({} min left)",
                    service,
                    ticket.remaining(now).num_minutes()
                );
                return Ok(ticket.clone());
            }
            Some(ticket) => {
                tracing::info!("⏰ Ticket for {} expired at {}", service, ticket.expiration_time)
            }
            None => tracing::info!("No cached ticket for {}", service),
        }

        match self.request_new(service, now).await {
            Ok(ticket) => Ok(ticket),
            // Never fall back to an expired ticket.
            Err(AfipError::AlreadyAuthenticated { message }) => match cached {
                Some(ticket) if ticket.is_valid_at(now, Duration::zero()) => {
                    tracing::warn!(
                        "WSAA still holds a ticket for {}; falling back to the cached one",
                        service
                    );
                    Ok(ticket)
                }
                _ => Err(AfipError::AlreadyAuthenticated { message }),
            },
            Err(e) => Err(e),
        }
    }

    /// Requests a fresh ticket regardless of what is cached.
    pub async fn force_renew(&self, service: &str) -> Result<AccessTicket> {
        self.request_new(service, Utc::now()).await
    }

    async fn load_cached(&self, service: &str) -> Result<Option<AccessTicket>> {
        let Some(xml) = self.store.load(service).await? else {
            return Ok(None);
        };

        match AccessTicket::from_xml(&xml) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached ticket for {}: {}", service, e);
                Ok(None)
            }
        }
    }

    async fn request_new(&self, service: &str, now: DateTime<Utc>) -> Result<AccessTicket> {
        let tra = LoginTicketRequest::new(service, now, self.tra_window);
        tracing::debug!("Generated TRA {} for {}", tra.unique_id, service);

        let cms = self.signer.sign(tra.to_xml().as_bytes()).await?;
        let xml = self.wsaa.login_cms(&cms).await?;
        let ticket = AccessTicket::from_xml(&xml)?;
        self.store.save(service, &xml).await?;

        tracing::info!(
            "🔑 New ticket for {} (token {}), expires {}",
            service,
            redact(&ticket.token),
            ticket.expiration_time
        );
        Ok(ticket)
    }
}
