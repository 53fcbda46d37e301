pub mod afip;
pub mod batch;
pub mod invoicing;
pub mod padron;
pub mod soap;
pub mod ticket;
pub mod ticket_cache;
pub mod tra;
pub mod waybill;
pub mod wsaa;
pub mod wsfe;

#[cfg(test)]
pub(crate) mod testing;

pub use afip::Afip;
pub use invoicing::{InvoiceService, IssuedInvoice};
pub use ticket_cache::TicketManager;
