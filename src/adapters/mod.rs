// Adapters layer: concrete implementations of the domain ports (HTTP, openssl, filesystem).

pub mod http;
pub mod signer;
pub mod storage;

pub use http::ReqwestTransport;
pub use signer::OpensslSigner;
pub use storage::FileTicketStore;
