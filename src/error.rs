//! Error types surfaced by the transport and the drink store.

use http::StatusCode;
use thiserror::Error;

/// The request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("error sending request to {url}: {message}")]
    Send { url: String, message: String },
    #[error("error receiving response from {url}: {message}")]
    Receive { url: String, message: String },
}

/// Everything that can go wrong in a `DrinkStore` operation.
///
/// None of these leave a partial update behind: the cache is only touched
/// once a response has been fully decoded and reported success.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server responded with {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("server rejected the request: {message}")]
    Rejected { message: String },

    #[error("could not decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("auth token is not a valid header value")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error("drink has not been saved yet")]
    NotPersisted,
}

impl StoreError {
    /// Whether the server was reached and answered, as opposed to the
    /// request failing in flight or never being sent.
    pub fn is_server_response(&self) -> bool {
        matches!(self, StoreError::Status { .. } | StoreError::Rejected { .. })
    }
}
