use crate::domain::model::ServiceMessage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AfipError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatusError { url: String, status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("CMS signing failed: {message}")]
    SigningError { message: String },

    #[error("SOAP fault {code}: {message}")]
    SoapFault { code: String, message: String },

    #[error("WSAA already issued a valid ticket for this service: {message}")]
    AlreadyAuthenticated { message: String },

    #[error("Invalid access ticket: {message}")]
    InvalidTicket { message: String },

    #[error("{service} returned errors: {}", join_messages(.errors))]
    ServiceError {
        service: String,
        errors: Vec<ServiceMessage>,
    },

    #[error("Voucher {number} rejected: {}", join_messages(.observations))]
    RejectedError {
        number: u64,
        observations: Vec<ServiceMessage>,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

fn join_messages(messages: &[ServiceMessage]) -> String {
    if messages.is_empty() {
        return "no details".to_string();
    }
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.code, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Service,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AfipError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AfipError::HttpError(_) | AfipError::HttpStatusError { .. } => ErrorCategory::Network,
            AfipError::ConfigValidationError { .. }
            | AfipError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AfipError::SigningError { .. }
            | AfipError::AlreadyAuthenticated { .. }
            | AfipError::InvalidTicket { .. } => ErrorCategory::Authentication,
            AfipError::SoapFault { .. }
            | AfipError::ServiceError { .. }
            | AfipError::RejectedError { .. } => ErrorCategory::Service,
            AfipError::XmlError(_)
            | AfipError::CsvError(_)
            | AfipError::SerializationError(_)
            | AfipError::MalformedResponse { .. }
            | AfipError::ValidationError { .. } => ErrorCategory::Data,
            AfipError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題通常可以重試
            AfipError::HttpError(_)
            | AfipError::HttpStatusError { .. }
            | AfipError::AlreadyAuthenticated { .. } => ErrorSeverity::Medium,
            AfipError::IoError(_) | AfipError::SigningError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AfipError::HttpError(_) | AfipError::HttpStatusError { .. } => {
                "Check network connectivity and the configured AFIP endpoints, then retry"
            }
            AfipError::ConfigValidationError { .. }
            | AfipError::InvalidConfigValueError { .. } => {
                "Review the TOML configuration file and any ${VAR} environment variables it uses"
            }
            AfipError::SigningError { .. } => {
                "Verify the certificate and private key paths and that the openssl binary is installed"
            }
            AfipError::AlreadyAuthenticated { .. } => {
                "Wait for the current ticket to expire or restore the cached ticket file"
            }
            AfipError::InvalidTicket { .. } => {
                "Delete the cached ticket file and run `afip login --force`"
            }
            AfipError::SoapFault { .. } | AfipError::ServiceError { .. } => {
                "Check the AFIP error code against the web service manual"
            }
            AfipError::RejectedError { .. } => {
                "Fix the voucher data reported in the observations and issue it again"
            }
            AfipError::XmlError(_) | AfipError::MalformedResponse { .. } => {
                "AFIP answered with an unexpected document; retry or check the service status"
            }
            AfipError::CsvError(_) | AfipError::ValidationError { .. } => {
                "Check the input data format"
            }
            AfipError::SerializationError(_) => "Check the data being serialized",
            AfipError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Could not reach AFIP: {}", self),
            ErrorCategory::Authentication => format!("Authentication with WSAA failed: {}", self),
            ErrorCategory::Service => format!("AFIP refused the request: {}", self),
            ErrorCategory::Data => format!("Invalid data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        AfipError::MalformedResponse {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AfipError>;
