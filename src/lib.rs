pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::AfipConfig;
pub use core::{Afip, InvoiceService, IssuedInvoice, TicketManager};
pub use domain::model::{AccessTicket, Credentials, InvoiceOrder, VoucherType};
pub use utils::error::{AfipError, Result};
