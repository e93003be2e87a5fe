use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};

use crate::error::TransportError;

/// A request as built by the drink store, independent of any HTTP library.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>, headers: HeaderMap) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Whatever came back from the server, whatever the status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }
}

/// Performs HTTP requests off the caller's task.
///
/// A non-2xx status is still an `Ok` response; only failures to get any
/// response at all are `TransportError`s.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
