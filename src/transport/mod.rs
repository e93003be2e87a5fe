pub mod base;
pub mod reqwest_transport;

// Re-export so callers can do "use crate::transport::{HttpTransport, ReqwestTransport};"
pub use base::{HttpRequest, HttpResponse, HttpTransport};
pub use reqwest_transport::ReqwestTransport;
