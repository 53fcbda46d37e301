use crate::core::ticket_cache::TicketManager;
use crate::core::wsfe::WsfeClient;
use crate::domain::model::{
    services, CaeResult, DocType, InvoiceDetail, InvoiceOrder, VatLine, VatRate,
};
use crate::utils::error::{AfipError, Result};
use crate::utils::validation::validate_cuit;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::{FixedOffset, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::sync::Arc;

pub const QR_BASE_URL: &str = "https://www.afip.gob.ar/fe/qr/";

/// 發票共用設定
#[derive(Debug, Clone)]
pub struct InvoiceSettings {
    pub currency: String,
    pub exchange_rate: Decimal,
    pub vat_rate: VatRate,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            currency: "PES".to_string(),
            exchange_rate: Decimal::ONE,
            vat_rate: VatRate::TwentyOne,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssuedInvoice {
    pub detail: InvoiceDetail,
    pub authorization: CaeResult,
}

impl IssuedInvoice {
    pub fn cae(&self) -> Option<&str> {
        self.authorization.cae.as_deref()
    }

    pub fn number(&self) -> u64 {
        self.authorization.number
    }
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Splits a VAT-inclusive total into (net, vat); `net + vat == total`.
pub fn split_vat(total: Decimal, rate: VatRate) -> (Decimal, Decimal) {
    let total = round_money(total);
    let net = round_money(total / (Decimal::ONE + rate.fraction()));
    (net, total - net)
}

/// Today's date in Argentina (UTC-3, no DST).
pub fn argentina_today() -> NaiveDate {
    let now = Utc::now();
    match FixedOffset::west_opt(3 * 3600) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => now.date_naive(),
    }
}

pub fn validate_order(order: &InvoiceOrder) -> Result<()> {
    // AFIP receives the total rounded to cents.
    if round_money(order.total) <= Decimal::ZERO {
        return Err(AfipError::ValidationError {
            message: format!("invoice total must be at least 0.01, got {}", order.total),
        });
    }
    if order.point_of_sale == 0 {
        return Err(AfipError::ValidationError {
            message: "point of sale must be at least 1".to_string(),
        });
    }
    if matches!(order.doc_type, DocType::Cuit | DocType::Cuil) {
        validate_cuit("doc_number", order.doc_number).map_err(|e| AfipError::ValidationError {
            message: match e {
                AfipError::InvalidConfigValueError { value, reason, .. } => {
                    format!("receiver CUIT {} is invalid: {}", value, reason)
                }
                other => other.to_string(),
            },
        })?;
    }
    if order.concept.requires_service_dates()
        && (order.service_from.is_none() || order.service_to.is_none() || order.payment_due.is_none())
    {
        return Err(AfipError::ValidationError {
            message: "service invoices need service_from, service_to and payment_due".to_string(),
        });
    }
    Ok(())
}

/// Builds the `FECAEDetRequest` for the voucher numbered `number`.
pub fn build_detail(
    order: &InvoiceOrder,
    number: u64,
    date: NaiveDate,
    settings: &InvoiceSettings,
) -> InvoiceDetail {
    let total = round_money(order.total);
    let (net, vat, vat_lines) = if order.voucher_type.itemizes_vat() {
        let (net, vat) = split_vat(total, settings.vat_rate);
        let line = VatLine {
            rate: settings.vat_rate,
            base: net,
            amount: vat,
        };
        (net, vat, vec![line])
    } else {
        (total, Decimal::ZERO, Vec::new())
    };

    InvoiceDetail {
        concept: order.concept,
        doc_type: order.doc_type,
        doc_number: order.doc_number,
        number_from: number,
        number_to: number,
        date,
        total,
        untaxed: Decimal::ZERO,
        net,
        exempt: Decimal::ZERO,
        taxes: Decimal::ZERO,
        vat,
        service_from: order.service_from,
        service_to: order.service_to,
        payment_due: order.payment_due,
        currency: settings.currency.clone(),
        exchange_rate: settings.exchange_rate,
        receiver_vat_condition: order.receiver_vat_condition,
        vat_lines,
    }
}

/// 開立發票：取得 TA、查詢最後號碼、送出 CAE 申請
pub struct InvoiceService {
    tickets: Arc<TicketManager>,
    wsfe: Arc<WsfeClient>,
    settings: InvoiceSettings,
}

impl InvoiceService {
    pub fn new(tickets: Arc<TicketManager>, wsfe: Arc<WsfeClient>, settings: InvoiceSettings) -> Self {
        Self {
            tickets,
            wsfe,
            settings,
        }
    }

    pub fn settings(&self) -> &InvoiceSettings {
        &self.settings
    }

    pub async fn issue(&self, order: &InvoiceOrder) -> Result<IssuedInvoice> {
        self.issue_on(order, argentina_today()).await
    }

    pub async fn issue_on(&self, order: &InvoiceOrder, date: NaiveDate) -> Result<IssuedInvoice> {
        validate_order(order)?;

        let auth = self.tickets.credentials(services::WSFE).await?;
        let last = self
            .wsfe
            .last_authorized(&auth, order.point_of_sale, order.voucher_type)
            .await?;
        let number = last.number + 1;

        let detail = build_detail(order, number, date, &self.settings);
        tracing::info!(
            "🧾 Requesting CAE for {} {:04}-{:08} (total {})",
            order.voucher_type.letter(),
            order.point_of_sale,
            number,
            detail.total
        );

        let authorization = self
            .wsfe
            .request_cae(&auth, order.point_of_sale, order.voucher_type, &detail)
            .await?;

        if !authorization.is_approved() {
            let mut observations = authorization.observations.clone();
            observations.extend(authorization.errors.iter().cloned());
            tracing::warn!(
                "Voucher {:04}-{:08} rejected with {} observation(s)",
                order.point_of_sale,
                number,
                observations.len()
            );
            return Err(AfipError::RejectedError {
                number,
                observations,
            });
        }

        tracing::info!(
            "✅ CAE {} for voucher {:04}-{:08}, due {}",
            authorization.cae.as_deref().unwrap_or_default(),
            order.point_of_sale,
            number,
            authorization
                .cae_due_date
                .map(|d| d.to_string())
                .unwrap_or_default()
        );

        Ok(IssuedInvoice {
            detail,
            authorization,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QrPayload<'a> {
    ver: u8,
    fecha: String,
    cuit: u64,
    pto_vta: u32,
    tipo_cmp: u16,
    nro_cmp: u64,
    importe: f64,
    moneda: &'a str,
    ctz: f64,
    tipo_doc_rec: u16,
    nro_doc_rec: u64,
    tipo_cod_aut: &'a str,
    cod_aut: u64,
}

/// URL encoded in the QR code printed on the voucher.
pub fn qr_url(issuer_cuit: u64, invoice: &IssuedInvoice) -> Result<String> {
    let cae = invoice
        .cae()
        .ok_or_else(|| AfipError::ValidationError {
            message: "voucher has no CAE".to_string(),
        })?
        .parse::<u64>()
        .map_err(|_| AfipError::ValidationError {
            message: "CAE is not numeric".to_string(),
        })?;

    let detail = &invoice.detail;
    let payload = QrPayload {
        ver: 1,
        fecha: detail.date.format("%Y-%m-%d").to_string(),
        cuit: issuer_cuit,
        pto_vta: invoice.authorization.point_of_sale,
        tipo_cmp: invoice.authorization.voucher_type.code(),
        nro_cmp: invoice.authorization.number,
        importe: detail.total.to_f64().unwrap_or_default(),
        moneda: &detail.currency,
        ctz: detail.exchange_rate.to_f64().unwrap_or(1.0),
        tipo_doc_rec: detail.doc_type.code(),
        nro_doc_rec: detail.doc_number,
        tipo_cod_aut: "E",
        cod_aut: cae,
    };

    let json = serde_json::to_string(&payload)?;
    Ok(format!("{}?p={}", QR_BASE_URL, URL_SAFE.encode(json)))
}
