use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderValue, USER_AGENT};
use http::HeaderMap;
use tracing::{debug, warn};

use super::base::{HttpRequest, HttpResponse, HttpTransport};
use crate::config::HttpConfig;
use crate::error::TransportError;

/// An [`HttpTransport`] backed by a pooled [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    // reqwest::Client is reference-counted internally, cloning shares the pool.
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .default_headers(default_headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url;
        debug!(method = %request.method, url = url.as_str(), "sending HTTP request");

        let mut builder = self
            .client
            .request(request.method, url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|err| {
            warn!(%err, url = url.as_str(), "error sending HTTP request");
            if err.is_timeout() {
                TransportError::Timeout { url: url.clone() }
            } else {
                TransportError::Send {
                    url: url.clone(),
                    message: err.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            warn!(%err, url = url.as_str(), "error receiving HTTP response");
            if err.is_timeout() {
                TransportError::Timeout { url: url.clone() }
            } else {
                TransportError::Receive {
                    url: url.clone(),
                    message: err.to_string(),
                }
            }
        })?;

        debug!(status = status.as_u16(), url = url.as_str(), "received HTTP response");
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
