use crate::core::batch::BatchDefaults;
use crate::core::invoicing::InvoiceSettings;
use crate::domain::model::{Concept, Environment, VatRate, VoucherType};
use crate::utils::error::{AfipError, Result};
use crate::utils::validation::{self, Validate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfipConfig {
    pub afip: AccountConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub invoicing: InvoicingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// CUIT the certificate was issued to.
    pub cuit: u64,
    #[serde(default)]
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub certificate: String,
    pub private_key: String,
    #[serde(default = "default_openssl_bin")]
    pub openssl_bin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketsConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default)]
    pub renew_margin_seconds: u64,
    #[serde(default = "default_tra_window")]
    pub tra_window_minutes: u64,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            renew_margin_seconds: 0,
            tra_window_minutes: default_tra_window(),
        }
    }
}

/// Explicit endpoint URLs; unset ones follow `afip.environment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub wsaa: Option<String>,
    pub wsfe: Option<String>,
    pub padron: Option<String>,
    pub wscpe: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicingConfig {
    #[serde(default = "default_point_of_sale")]
    pub point_of_sale: u32,
    #[serde(default = "default_voucher_type")]
    pub voucher_type: u16,
    #[serde(default)]
    pub concept: Concept,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub vat_rate: VatRate,
    #[serde(default = "default_receiver_vat_condition")]
    pub receiver_vat_condition: u8,
}

impl Default for InvoicingConfig {
    fn default() -> Self {
        Self {
            point_of_sale: default_point_of_sale(),
            voucher_type: default_voucher_type(),
            concept: Concept::default(),
            currency: default_currency(),
            vat_rate: VatRate::default(),
            receiver_vat_condition: default_receiver_vat_condition(),
        }
    }
}

fn default_openssl_bin() -> String {
    "openssl".to_string()
}

fn default_cache_dir() -> String {
    "./.afip".to_string()
}

const MAX_RENEW_MARGIN_SECONDS: u64 = 86_400;
const MAX_TRA_WINDOW_MINUTES: u64 = 720;

fn default_tra_window() -> u64 {
    10
}

fn default_timeout() -> u64 {
    60
}

fn default_point_of_sale() -> u32 {
    1
}

fn default_voucher_type() -> u16 {
    6
}

fn default_currency() -> String {
    "PES".to_string()
}

fn default_receiver_vat_condition() -> u8 {
    5
}

impl AfipConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AfipError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AfipError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AFIP_CUIT})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            AfipError::ConfigValidationError {
                field: "environment".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_cuit("afip.cuit", self.afip.cuit)?;

        validation::validate_path("credentials.certificate", &self.credentials.certificate)?;
        validation::validate_path("credentials.private_key", &self.credentials.private_key)?;
        validation::validate_non_empty_string("credentials.openssl_bin", &self.credentials.openssl_bin)?;

        validation::validate_path("tickets.cache_dir", &self.tickets.cache_dir)?;
        // WSAA rejects TRAs valid for more than a day.
        validation::validate_range(
            "tickets.tra_window_minutes",
            self.tickets.tra_window_minutes,
            1,
            MAX_TRA_WINDOW_MINUTES,
        )?;
        // WSAA tickets last 12 hours.
        validation::validate_range(
            "tickets.renew_margin_seconds",
            self.tickets.renew_margin_seconds,
            0,
            MAX_RENEW_MARGIN_SECONDS,
        )?;

        for (field, value) in [
            ("endpoints.wsaa", &self.endpoints.wsaa),
            ("endpoints.wsfe", &self.endpoints.wsfe),
            ("endpoints.padron", &self.endpoints.padron),
            ("endpoints.wscpe", &self.endpoints.wscpe),
        ] {
            if let Some(url) = value {
                validation::validate_url(field, url)?;
            }
        }

        validation::validate_positive_number("http.timeout_seconds", self.http.timeout_seconds, 1)?;

        validation::validate_range("invoicing.point_of_sale", self.invoicing.point_of_sale, 1, 99998)?;
        if VoucherType::from(self.invoicing.voucher_type).letter() == 'X' {
            return Err(AfipError::InvalidConfigValueError {
                field: "invoicing.voucher_type".to_string(),
                value: self.invoicing.voucher_type.to_string(),
                reason: "Supported voucher types: 1-3, 6-8, 11-13".to_string(),
            });
        }
        if self.invoicing.currency.len() != 3 {
            return Err(AfipError::InvalidConfigValueError {
                field: "invoicing.currency".to_string(),
                value: self.invoicing.currency.clone(),
                reason: "Currency must be a 3-letter AFIP code such as PES".to_string(),
            });
        }

        Ok(())
    }

    pub fn cuit(&self) -> u64 {
        self.afip.cuit
    }

    pub fn environment(&self) -> Environment {
        self.afip.environment
    }

    pub fn wsaa_url(&self) -> &str {
        self.endpoints
            .wsaa
            .as_deref()
            .unwrap_or_else(|| self.afip.environment.wsaa_url())
    }

    pub fn wsfe_url(&self) -> &str {
        self.endpoints
            .wsfe
            .as_deref()
            .unwrap_or_else(|| self.afip.environment.wsfe_url())
    }

    pub fn padron_url(&self) -> &str {
        self.endpoints
            .padron
            .as_deref()
            .unwrap_or_else(|| self.afip.environment.padron_url())
    }

    pub fn wscpe_url(&self) -> &str {
        self.endpoints
            .wscpe
            .as_deref()
            .unwrap_or_else(|| self.afip.environment.wscpe_url())
    }

    pub fn cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.tickets.cache_dir)
    }

    /// Clamped to the validated range, so an unvalidated config cannot overflow.
    pub fn renew_margin(&self) -> chrono::Duration {
        let seconds = self.tickets.renew_margin_seconds.min(MAX_RENEW_MARGIN_SECONDS);
        chrono::Duration::try_seconds(seconds as i64).unwrap_or_else(chrono::Duration::zero)
    }

    pub fn tra_window(&self) -> chrono::Duration {
        let minutes = self.tickets.tra_window_minutes.min(MAX_TRA_WINDOW_MINUTES);
        chrono::Duration::try_minutes(minutes as i64).unwrap_or_else(chrono::Duration::zero)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn voucher_type(&self) -> VoucherType {
        VoucherType::from(self.invoicing.voucher_type)
    }

    pub fn invoice_settings(&self) -> InvoiceSettings {
        InvoiceSettings {
            currency: self.invoicing.currency.clone(),
            exchange_rate: Decimal::ONE,
            vat_rate: self.invoicing.vat_rate,
        }
    }

    pub fn batch_defaults(&self) -> BatchDefaults {
        BatchDefaults {
            point_of_sale: self.invoicing.point_of_sale,
            voucher_type: self.voucher_type(),
            concept: self.invoicing.concept,
            receiver_vat_condition: self.invoicing.receiver_vat_condition,
        }
    }
}

impl Validate for AfipConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
