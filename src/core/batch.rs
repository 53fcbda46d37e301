use crate::core::invoicing::{InvoiceService, IssuedInvoice};
use crate::domain::model::{Concept, DocType, InvoiceOrder, VoucherType};
use crate::utils::error::{AfipError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Values applied to batch rows that leave a column empty.
#[derive(Debug, Clone)]
pub struct BatchDefaults {
    pub point_of_sale: u32,
    pub voucher_type: VoucherType,
    pub concept: Concept,
    pub receiver_vat_condition: u8,
}

impl Default for BatchDefaults {
    fn default() -> Self {
        Self {
            point_of_sale: 1,
            voucher_type: VoucherType::FacturaB,
            concept: Concept::Products,
            receiver_vat_condition: 5,
        }
    }
}

/// 批次輸入的一列
#[derive(Debug, Deserialize)]
struct BatchRow {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    doc_type: Option<DocType>,
    #[serde(default)]
    doc_number: Option<u64>,
    #[serde(default)]
    receiver_vat_condition: Option<u8>,
    #[serde(default)]
    voucher_type: Option<u16>,
    #[serde(default)]
    point_of_sale: Option<u32>,
    total: String,
    #[serde(default)]
    concept: Option<Concept>,
    #[serde(default)]
    service_from: Option<NaiveDate>,
    #[serde(default)]
    service_to: Option<NaiveDate>,
    #[serde(default)]
    payment_due: Option<NaiveDate>,
}

impl BatchRow {
    fn into_order(self, defaults: &BatchDefaults) -> Result<InvoiceOrder> {
        let total = Decimal::from_str(self.total.trim()).map_err(|_| AfipError::ValidationError {
            message: format!("total '{}' is not a number", self.total),
        })?;

        Ok(InvoiceOrder {
            reference: self.reference,
            doc_type: self.doc_type.unwrap_or(DocType::ConsumidorFinal),
            doc_number: self.doc_number.unwrap_or(0),
            receiver_vat_condition: self
                .receiver_vat_condition
                .unwrap_or(defaults.receiver_vat_condition),
            voucher_type: self
                .voucher_type
                .map(VoucherType::from)
                .unwrap_or(defaults.voucher_type),
            point_of_sale: self.point_of_sale.unwrap_or(defaults.point_of_sale),
            total,
            concept: self.concept.unwrap_or(defaults.concept),
            service_from: self.service_from,
            service_to: self.service_to,
            payment_due: self.payment_due,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Approved,
    Rejected,
    Failed,
}

/// One line of the results file.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub row: usize,
    pub reference: Option<String>,
    pub status: BatchStatus,
    pub voucher_type: Option<u16>,
    pub point_of_sale: Option<u32>,
    pub voucher_number: Option<u64>,
    pub total: Option<Decimal>,
    pub cae: Option<String>,
    pub cae_due_date: Option<NaiveDate>,
    pub error: Option<String>,
}

impl BatchOutcome {
    fn issued(row: usize, reference: Option<String>, issued: &IssuedInvoice) -> Self {
        Self {
            row,
            reference,
            status: BatchStatus::Approved,
            voucher_type: Some(issued.authorization.voucher_type.code()),
            point_of_sale: Some(issued.authorization.point_of_sale),
            voucher_number: Some(issued.number()),
            total: Some(issued.detail.total),
            cae: issued.authorization.cae.clone(),
            cae_due_date: issued.authorization.cae_due_date,
            error: None,
        }
    }

    fn failed(row: usize, reference: Option<String>, order: Option<&InvoiceOrder>, error: &AfipError) -> Self {
        let (status, voucher_number) = match error {
            AfipError::RejectedError { number, .. } => (BatchStatus::Rejected, Some(*number)),
            _ => (BatchStatus::Failed, None),
        };

        Self {
            row,
            reference,
            status,
            voucher_type: order.map(|o| o.voucher_type.code()),
            point_of_sale: order.map(|o| o.point_of_sale),
            voucher_number,
            total: order.map(|o| o.total),
            cae: None,
            cae_due_date: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, status: BatchStatus) {
        self.total += 1;
        match status {
            BatchStatus::Approved => self.approved += 1,
            BatchStatus::Rejected => self.rejected += 1,
            BatchStatus::Failed => self.failed += 1,
        }
    }
}

/// 批次開立發票：逐列處理，單列失敗不影響其他列
pub struct BatchRunner<'a> {
    service: &'a InvoiceService,
    defaults: BatchDefaults,
}

impl<'a> BatchRunner<'a> {
    pub fn new(service: &'a InvoiceService, defaults: BatchDefaults) -> Self {
        Self { service, defaults }
    }

    pub async fn run_files(&self, input: &Path, output: &Path) -> Result<BatchSummary> {
        tracing::info!("📂 Reading billing run from {}", input.display());
        let reader = std::fs::File::open(input)?;
        let writer = std::fs::File::create(output)?;
        let summary = self.run(reader, writer).await?;
        tracing::info!("💾 Results written to {}", output.display());
        Ok(summary)
    }

    pub async fn run<R: Read, W: Write>(&self, input: R, output: W) -> Result<BatchSummary> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input);
        let rows: Vec<std::result::Result<BatchRow, csv::Error>> = reader.deserialize().collect();

        let mut writer = csv::Writer::from_writer(output);
        let mut summary = BatchSummary::default();

        for (index, row) in rows.into_iter().enumerate() {
            let line = index + 1;
            let outcome = match row {
                Err(e) => {
                    let error = AfipError::from(e);
                    tracing::warn!("Row {} unreadable: {}", line, error);
                    BatchOutcome::failed(line, None, None, &error)
                }
                Ok(row) => self.process(line, row).await,
            };

            summary.record(outcome.status);
            writer.serialize(&outcome)?;
        }

        writer.flush()?;
        tracing::info!(
            "📊 Batch finished: {} rows, {} approved, {} rejected, {} failed",
            summary.total,
            summary.approved,
            summary.rejected,
            summary.failed
        );
        Ok(summary)
    }

    async fn process(&self, line: usize, row: BatchRow) -> BatchOutcome {
        let reference = row.reference.clone();
        let order = match row.into_order(&self.defaults) {
            Ok(order) => order,
            Err(e) => return BatchOutcome::failed(line, reference, None, &e),
        };

        match self.service.issue(&order).await {
            Ok(issued) => BatchOutcome::issued(line, reference, &issued),
            Err(e) => {
                tracing::warn!("Row {} not issued: {}", line, e);
                BatchOutcome::failed(line, reference, Some(&order), &e)
            }
        }
    }
}
