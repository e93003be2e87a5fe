#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use drinks_client::auth::StaticAuthProvider;
use drinks_client::transport::{HttpRequest, HttpResponse, HttpTransport};
use drinks_client::{DrinkStore, TransportError};
use http::StatusCode;
use tokio::sync::oneshot;

pub const BASE_URL: &str = "http://drinks.test";

struct Step {
    outcome: Result<HttpResponse, TransportError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// An in-memory transport that records every request and answers them, in
/// arrival order, from a script.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.push(Step {
            outcome: Ok(response(status, body)),
            gate: None,
        });
    }

    /// Like `respond`, but the response is held back until the returned
    /// sender fires.
    pub fn respond_gated(&self, status: u16, body: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(Step {
            outcome: Ok(response(status, body)),
            gate: Some(rx),
        });
        tx
    }

    pub fn fail(&self, error: TransportError) {
        self.push(Step {
            outcome: Err(error),
            gate: None,
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }

    pub fn request(&self, index: usize) -> HttpRequest {
        self.requests()
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("no request #{}", index))
    }

    /// Wait until at least `count` requests have been sent.
    pub async fn wait_for_requests(&self, count: usize) {
        for _ in 0..200 {
            if self.requests().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {} requests", count);
    }

    fn push(&self, step: Step) {
        self.script.lock().expect("script mutex poisoned").push_back(step);
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        let step = self.script.lock().expect("script mutex poisoned").pop_front();
        self.requests.lock().expect("requests mutex poisoned").push(request);

        let Some(step) = step else {
            return Err(TransportError::Send {
                url,
                message: "no scripted response left".to_string(),
            });
        };
        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        step.outcome
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse::new(
        StatusCode::from_u16(status).expect("valid status code"),
        body.as_bytes(),
    )
}

pub fn store_with(transport: Arc<ScriptedTransport>, auth: Arc<StaticAuthProvider>) -> DrinkStore {
    DrinkStore::new(BASE_URL, auth, transport)
}

/// A session with token `test-token` and the given permissions.
pub fn auth(permissions: &[&str]) -> Arc<StaticAuthProvider> {
    Arc::new(StaticAuthProvider::with_token(
        "test-token",
        permissions.iter().copied(),
    ))
}

pub fn body_string(request: &HttpRequest) -> String {
    String::from_utf8(request.body.clone().expect("request should have a body"))
        .expect("body should be UTF-8")
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}
