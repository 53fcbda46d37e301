use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// AFIP 環境（測試 / 正式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Homologation,
    Production,
}

impl Environment {
    pub fn wsaa_url(&self) -> &'static str {
        match self {
            Environment::Homologation => "https://wsaahomo.afip.gov.ar/ws/services/LoginCms",
            Environment::Production => "https://wsaa.afip.gov.ar/ws/services/LoginCms",
        }
    }

    pub fn wsfe_url(&self) -> &'static str {
        match self {
            Environment::Homologation => "https://wswhomo.afip.gov.ar/wsfev1/service.asmx",
            Environment::Production => "https://servicios1.afip.gov.ar/wsfev1/service.asmx",
        }
    }

    pub fn padron_url(&self) -> &'static str {
        match self {
            Environment::Homologation => {
                "https://awshomo.afip.gov.ar/sr-padron/webservices/personaServiceA13"
            }
            Environment::Production => {
                "https://aws.afip.gov.ar/sr-padron/webservices/personaServiceA13"
            }
        }
    }

    pub fn wscpe_url(&self) -> &'static str {
        match self {
            Environment::Homologation => "https://fwshomo.afip.gov.ar/wscpe/services/soap",
            Environment::Production => "https://cpea-ws.afip.gob.ar/wscpe/services/soap",
        }
    }
}

/// WSAA service names a ticket can be requested for.
pub mod services {
    pub const WSFE: &str = "wsfe";
    pub const PADRON_A13: &str = "ws_sr_padron_a13";
    pub const WSCPE: &str = "wscpe";
}

/// Ticket request (TRA) sent to WSAA once signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTicketRequest {
    pub unique_id: u64,
    pub generation_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    pub service: String,
}

/// Ticket of access (TA) returned by WSAA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTicket {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub unique_id: Option<u64>,
    pub generation_time: Option<DateTime<FixedOffset>>,
    pub expiration_time: DateTime<FixedOffset>,
    pub token: String,
    pub sign: String,
    /// The document exactly as WSAA returned it; this is what gets cached.
    pub raw_xml: String,
}

/// `Auth` block sent with every business call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub sign: String,
    pub cuit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum VoucherType {
    FacturaA,
    NotaDebitoA,
    NotaCreditoA,
    FacturaB,
    NotaDebitoB,
    NotaCreditoB,
    FacturaC,
    NotaDebitoC,
    NotaCreditoC,
    Other(u16),
}

impl VoucherType {
    pub fn code(&self) -> u16 {
        match self {
            VoucherType::FacturaA => 1,
            VoucherType::NotaDebitoA => 2,
            VoucherType::NotaCreditoA => 3,
            VoucherType::FacturaB => 6,
            VoucherType::NotaDebitoB => 7,
            VoucherType::NotaCreditoB => 8,
            VoucherType::FacturaC => 11,
            VoucherType::NotaDebitoC => 12,
            VoucherType::NotaCreditoC => 13,
            VoucherType::Other(code) => *code,
        }
    }

    /// Letter printed on the voucher, `X` when the code is not an A/B/C type.
    pub fn letter(&self) -> char {
        match self {
            VoucherType::FacturaA | VoucherType::NotaDebitoA | VoucherType::NotaCreditoA => 'A',
            VoucherType::FacturaB | VoucherType::NotaDebitoB | VoucherType::NotaCreditoB => 'B',
            VoucherType::FacturaC | VoucherType::NotaDebitoC | VoucherType::NotaCreditoC => 'C',
            VoucherType::Other(_) => 'X',
        }
    }

    /// Class C vouchers (monotributo issuers) never itemize VAT.
    pub fn itemizes_vat(&self) -> bool {
        matches!(self.letter(), 'A' | 'B')
    }
}

impl From<u16> for VoucherType {
    fn from(code: u16) -> Self {
        match code {
            1 => VoucherType::FacturaA,
            2 => VoucherType::NotaDebitoA,
            3 => VoucherType::NotaCreditoA,
            6 => VoucherType::FacturaB,
            7 => VoucherType::NotaDebitoB,
            8 => VoucherType::NotaCreditoB,
            11 => VoucherType::FacturaC,
            12 => VoucherType::NotaDebitoC,
            13 => VoucherType::NotaCreditoC,
            other => VoucherType::Other(other),
        }
    }
}

impl From<VoucherType> for u16 {
    fn from(voucher_type: VoucherType) -> Self {
        voucher_type.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    #[default]
    Products,
    Services,
    ProductsAndServices,
}

impl Concept {
    pub fn code(&self) -> u8 {
        match self {
            Concept::Products => 1,
            Concept::Services => 2,
            Concept::ProductsAndServices => 3,
        }
    }

    /// Services require the service period and payment due date.
    pub fn requires_service_dates(&self) -> bool {
        !matches!(self, Concept::Products)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum DocType {
    Cuit,
    Cuil,
    Dni,
    ConsumidorFinal,
    Other(u16),
}

impl DocType {
    pub fn code(&self) -> u16 {
        match self {
            DocType::Cuit => 80,
            DocType::Cuil => 86,
            DocType::Dni => 96,
            DocType::ConsumidorFinal => 99,
            DocType::Other(code) => *code,
        }
    }
}

impl From<u16> for DocType {
    fn from(code: u16) -> Self {
        match code {
            80 => DocType::Cuit,
            86 => DocType::Cuil,
            96 => DocType::Dni,
            99 => DocType::ConsumidorFinal,
            other => DocType::Other(other),
        }
    }
}

impl From<DocType> for u16 {
    fn from(doc_type: DocType) -> Self {
        doc_type.code()
    }
}

/// VAT aliquot ids used in `AlicIva/Id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VatRate {
    Zero,
    TwoAndHalf,
    Five,
    TenAndHalf,
    #[default]
    TwentyOne,
    TwentySeven,
}

impl VatRate {
    pub fn id(&self) -> u8 {
        match self {
            VatRate::Zero => 3,
            VatRate::TenAndHalf => 4,
            VatRate::TwentyOne => 5,
            VatRate::TwentySeven => 6,
            VatRate::Five => 8,
            VatRate::TwoAndHalf => 9,
        }
    }

    /// Rate as a fraction, e.g. 0.21.
    pub fn fraction(&self) -> Decimal {
        match self {
            VatRate::Zero => Decimal::ZERO,
            VatRate::TwoAndHalf => Decimal::new(25, 3),
            VatRate::Five => Decimal::new(5, 2),
            VatRate::TenAndHalf => Decimal::new(105, 3),
            VatRate::TwentyOne => Decimal::new(21, 2),
            VatRate::TwentySeven => Decimal::new(27, 2),
        }
    }
}

/// A voucher the back office wants authorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceOrder {
    /// Caller reference (payment id, trip id...), echoed in batch results.
    #[serde(default)]
    pub reference: Option<String>,
    pub doc_type: DocType,
    pub doc_number: u64,
    /// `CondicionIVAReceptorId` (1 RI, 4 exento, 5 consumidor final, 6 monotributo...).
    pub receiver_vat_condition: u8,
    pub voucher_type: VoucherType,
    pub point_of_sale: u32,
    pub total: Decimal,
    #[serde(default)]
    pub concept: Concept,
    #[serde(default)]
    pub service_from: Option<NaiveDate>,
    #[serde(default)]
    pub service_to: Option<NaiveDate>,
    #[serde(default)]
    pub payment_due: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VatLine {
    pub rate: VatRate,
    pub base: Decimal,
    pub amount: Decimal,
}

/// One `FECAEDetRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDetail {
    pub concept: Concept,
    pub doc_type: DocType,
    pub doc_number: u64,
    pub number_from: u64,
    pub number_to: u64,
    pub date: NaiveDate,
    pub total: Decimal,
    pub untaxed: Decimal,
    pub net: Decimal,
    pub exempt: Decimal,
    pub taxes: Decimal,
    pub vat: Decimal,
    pub service_from: Option<NaiveDate>,
    pub service_to: Option<NaiveDate>,
    pub payment_due: Option<NaiveDate>,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub receiver_vat_condition: u8,
    pub vat_lines: Vec<VatLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMessage {
    pub code: String,
    pub message: String,
}

impl ServiceMessage {
    pub fn new(code: impl ToString, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationResult {
    Approved,
    Rejected,
    Partial,
}

impl AuthorizationResult {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "A" => Some(AuthorizationResult::Approved),
            "R" => Some(AuthorizationResult::Rejected),
            "P" => Some(AuthorizationResult::Partial),
            _ => None,
        }
    }
}

/// Outcome of `FECAESolicitar` for a single voucher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaeResult {
    pub result: AuthorizationResult,
    pub point_of_sale: u32,
    pub voucher_type: VoucherType,
    pub number: u64,
    pub cae: Option<String>,
    pub cae_due_date: Option<NaiveDate>,
    pub observations: Vec<ServiceMessage>,
    pub events: Vec<ServiceMessage>,
    pub errors: Vec<ServiceMessage>,
}

impl CaeResult {
    pub fn is_approved(&self) -> bool {
        self.result == AuthorizationResult::Approved && self.cae.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LastVoucher {
    pub point_of_sale: u32,
    pub voucher_type: VoucherType,
    pub number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub app_server: String,
    pub db_server: String,
    pub auth_server: String,
}

impl ServerStatus {
    pub fn is_healthy(&self) -> bool {
        [&self.app_server, &self.db_server, &self.auth_server]
            .iter()
            .all(|s| s.eq_ignore_ascii_case("OK"))
    }
}

/// Row of an `FEParamGet*` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamItem {
    pub id: String,
    pub description: String,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
}

/// An already issued voucher as reported by `FECompConsultar`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoucherRecord {
    pub point_of_sale: u32,
    pub voucher_type: VoucherType,
    pub number: u64,
    pub date: Option<NaiveDate>,
    pub doc_type: Option<DocType>,
    pub doc_number: Option<u64>,
    pub total: Option<Decimal>,
    pub authorization_code: Option<String>,
    pub authorization_due: Option<NaiveDate>,
    pub result: Option<AuthorizationResult>,
}

/// Taxpayer registry entry (padrón A13).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxpayer {
    pub id: u64,
    pub name: String,
    pub person_type: Option<String>,
    pub key_status: Option<String>,
    pub vat_condition: Option<u8>,
}

/// Electronic waybill (CPE) lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Waybill {
    pub ctg_number: String,
    /// Leaf values under `respuesta`, keyed by dotted path (`origen.planta`).
    pub fields: BTreeMap<String, String>,
    pub pdf: Option<Vec<u8>>,
}

impl Waybill {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    /// Looks a field up by its last path segment when the nesting is unknown.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(k, _)| k.rsplit('.').next() == Some(name))
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn status(&self) -> Option<&str> {
        self.find("estado")
    }
}
