use crate::adapters::{FileTicketStore, OpensslSigner, ReqwestTransport};
use crate::config::AfipConfig;
use crate::core::batch::{BatchRunner, BatchSummary};
use crate::core::invoicing::{self, InvoiceService, IssuedInvoice};
use crate::core::padron::PadronClient;
use crate::core::ticket_cache::TicketManager;
use crate::core::waybill::WaybillClient;
use crate::core::wsaa::WsaaClient;
use crate::core::wsfe::WsfeClient;
use crate::domain::model::{
    services, AccessTicket, InvoiceOrder, LastVoucher, ParamItem, ServerStatus, Taxpayer,
    VoucherRecord, VoucherType, Waybill,
};
use crate::domain::ports::{CmsSigner, SoapTransport, TicketStore};
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

/// 整合所有 AFIP 服務的入口
pub struct Afip {
    config: AfipConfig,
    tickets: Arc<TicketManager>,
    wsfe: Arc<WsfeClient>,
    padron: PadronClient,
    waybill: WaybillClient,
    invoicing: InvoiceService,
}

impl Afip {
    /// Real adapters: reqwest, the openssl binary and the on-disk ticket cache.
    pub fn from_config(config: &AfipConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.http_timeout())?);
        let signer = Arc::new(OpensslSigner::new(
            &config.credentials.openssl_bin,
            &config.credentials.certificate,
            &config.credentials.private_key,
        ));
        let store = Arc::new(FileTicketStore::new(config.cache_dir()));

        tracing::debug!(
            "AFIP {:?} for CUIT {}, tickets in {}",
            config.environment(),
            config.cuit(),
            config.tickets.cache_dir
        );
        Ok(Self::with_parts(config, transport, signer, store))
    }

    pub fn with_parts(
        config: &AfipConfig,
        transport: Arc<dyn SoapTransport>,
        signer: Arc<dyn CmsSigner>,
        store: Arc<dyn TicketStore>,
    ) -> Self {
        let wsaa = WsaaClient::new(transport.clone(), config.wsaa_url());
        let tickets = Arc::new(
            TicketManager::new(store, signer, wsaa, config.cuit())
                .with_renew_margin(config.renew_margin())
                .with_tra_window(config.tra_window()),
        );
        let wsfe = Arc::new(WsfeClient::new(transport.clone(), config.wsfe_url()));
        let invoicing = InvoiceService::new(tickets.clone(), wsfe.clone(), config.invoice_settings());

        Self {
            config: config.clone(),
            tickets,
            wsfe,
            padron: PadronClient::new(transport.clone(), config.padron_url()),
            waybill: WaybillClient::new(transport, config.wscpe_url()),
            invoicing,
        }
    }

    pub fn config(&self) -> &AfipConfig {
        &self.config
    }

    pub fn tickets(&self) -> &TicketManager {
        &self.tickets
    }

    pub fn invoicing(&self) -> &InvoiceService {
        &self.invoicing
    }

    pub async fn login(&self, service: &str, force: bool) -> Result<AccessTicket> {
        if force {
            self.tickets.force_renew(service).await
        } else {
            self.tickets.ticket(service).await
        }
    }

    pub async fn server_status(&self) -> Result<ServerStatus> {
        self.wsfe.dummy().await
    }

    pub async fn last_voucher(&self, point_of_sale: u32, voucher_type: VoucherType) -> Result<LastVoucher> {
        let auth = self.tickets.credentials(services::WSFE).await?;
        self.wsfe.last_authorized(&auth, point_of_sale, voucher_type).await
    }

    pub async fn issue(&self, order: &InvoiceOrder) -> Result<IssuedInvoice> {
        self.invoicing.issue(order).await
    }

    pub fn qr_url(&self, issued: &IssuedInvoice) -> Result<String> {
        invoicing::qr_url(self.config.cuit(), issued)
    }

    pub async fn run_batch(&self, input: &Path, output: &Path) -> Result<BatchSummary> {
        BatchRunner::new(&self.invoicing, self.config.batch_defaults())
            .run_files(input, output)
            .await
    }

    pub async fn vat_types(&self) -> Result<Vec<ParamItem>> {
        let auth = self.tickets.credentials(services::WSFE).await?;
        self.wsfe.vat_types(&auth).await
    }

    pub async fn voucher_types(&self) -> Result<Vec<ParamItem>> {
        let auth = self.tickets.credentials(services::WSFE).await?;
        self.wsfe.voucher_types(&auth).await
    }

    pub async fn voucher(
        &self,
        point_of_sale: u32,
        voucher_type: VoucherType,
        number: u64,
    ) -> Result<VoucherRecord> {
        let auth = self.tickets.credentials(services::WSFE).await?;
        self.wsfe
            .query_voucher(&auth, point_of_sale, voucher_type, number)
            .await
    }

    pub async fn taxpayer(&self, cuit: u64) -> Result<Taxpayer> {
        let auth = self.tickets.credentials(services::PADRON_A13).await?;
        self.padron.taxpayer(&auth, cuit).await
    }

    pub async fn waybill(&self, ctg: &str) -> Result<Waybill> {
        let auth = self.tickets.credentials(services::WSCPE).await?;
        self.waybill.consult_automotor(&auth, ctg).await
    }
}
