use crate::config::AfipConfig;
use crate::domain::model::{services, Concept, DocType, InvoiceOrder, VoucherType};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "afip")]
#[command(about = "AFIP/ARCA web services client: access tickets, invoicing, registry and waybills")]
pub struct Cli {
    #[arg(long, short, global = true, default_value = "afip.toml")]
    pub config: PathBuf,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Obtain (or reuse) an access ticket for a service
    Login {
        #[arg(long, default_value = services::WSFE)]
        service: String,
        #[arg(long, help = "Request a new ticket even if the cached one is valid")]
        force: bool,
    },
    /// WSFE server health (FEDummy)
    Status,
    /// Last authorized voucher number
    LastVoucher(VoucherSelector),
    /// Request a CAE for one voucher
    Issue(IssueArgs),
    /// Issue every row of a CSV file and write a results CSV
    Batch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// VAT aliquot table
    VatTypes,
    /// Voucher type table
    VoucherTypes,
    /// Look up an authorized voucher
    Voucher {
        #[arg(long)]
        number: u64,
        #[command(flatten)]
        selector: VoucherSelector,
    },
    /// Taxpayer registry lookup (padrón A13)
    Taxpayer {
        #[arg(long)]
        cuit: u64,
    },
    /// Road-freight waybill lookup by CTG
    Waybill {
        #[arg(long)]
        ctg: String,
        #[arg(long, help = "Write the waybill PDF here")]
        pdf_out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct VoucherSelector {
    #[arg(long)]
    pub point_of_sale: Option<u32>,
    #[arg(long)]
    pub voucher_type: Option<u16>,
}

impl VoucherSelector {
    pub fn resolve(&self, config: &AfipConfig) -> (u32, VoucherType) {
        (
            self.point_of_sale.unwrap_or(config.invoicing.point_of_sale),
            self.voucher_type
                .map(VoucherType::from)
                .unwrap_or_else(|| config.voucher_type()),
        )
    }
}

#[derive(Debug, Clone, Args)]
pub struct IssueArgs {
    #[arg(long)]
    pub doc_number: u64,
    #[arg(long, help = "VAT-inclusive total")]
    pub total: Decimal,
    #[arg(long, default_value_t = 80, help = "80 CUIT, 86 CUIL, 96 DNI, 99 consumidor final")]
    pub doc_type: u16,
    #[arg(long, help = "Receiver VAT condition id (1 RI, 4 exento, 5 CF, 6 monotributo)")]
    pub vat_condition: Option<u8>,
    #[command(flatten)]
    pub selector: VoucherSelector,
    #[arg(long, value_enum)]
    pub concept: Option<ConceptArg>,
    #[arg(long)]
    pub service_from: Option<NaiveDate>,
    #[arg(long)]
    pub service_to: Option<NaiveDate>,
    #[arg(long)]
    pub payment_due: Option<NaiveDate>,
    #[arg(long)]
    pub reference: Option<String>,
    #[arg(long, help = "Print the voucher QR URL")]
    pub qr: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ConceptArg {
    Products,
    Services,
    ProductsAndServices,
}

impl From<ConceptArg> for Concept {
    fn from(arg: ConceptArg) -> Self {
        match arg {
            ConceptArg::Products => Concept::Products,
            ConceptArg::Services => Concept::Services,
            ConceptArg::ProductsAndServices => Concept::ProductsAndServices,
        }
    }
}

impl IssueArgs {
    /// Fills what the flags leave out from `[invoicing]`.
    pub fn to_order(&self, config: &AfipConfig) -> InvoiceOrder {
        let (point_of_sale, voucher_type) = self.selector.resolve(config);
        InvoiceOrder {
            reference: self.reference.clone(),
            doc_type: DocType::from(self.doc_type),
            doc_number: self.doc_number,
            receiver_vat_condition: self
                .vat_condition
                .unwrap_or(config.invoicing.receiver_vat_condition),
            voucher_type,
            point_of_sale,
            total: self.total,
            concept: self
                .concept
                .map(Concept::from)
                .unwrap_or(config.invoicing.concept),
            service_from: self.service_from,
            service_to: self.service_to,
            payment_due: self.payment_due,
        }
    }
}
