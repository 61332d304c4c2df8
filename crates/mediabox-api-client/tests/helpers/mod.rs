//! Test helpers: a scripted in-memory transport and client builders.
//!
//! Run from workspace root: `cargo test -p mediabox-api-client`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mediabox_api_client::http::{ApiRequest, ApiResponse, HttpTransport, RequestBody};
use mediabox_api_client::ApiClient;
use mediabox_core::{ClientConfig, ClientError};
use serde_json::Value;

pub const BASE_URL: &str = "http://api.test";
pub const CSRF_PATH: &str = "/csrf";

/// Scripted response for a request. The second argument is how many earlier
/// requests went to the same endpoint (0 for the first).
type Handler = dyn Fn(&ApiRequest, usize) -> Result<ApiResponse, ClientError> + Send + Sync;

/// [`HttpTransport`] that answers from a closure and records every request.
pub struct FakeTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<ApiRequest>>,
    latency: Duration,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest, usize) -> Result<ApiResponse, ClientError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        })
    }

    /// Like [`FakeTransport::new`], with every response delayed by `latency`.
    pub fn with_latency<F>(latency: Duration, handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest, usize) -> Result<ApiResponse, ClientError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            latency,
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.endpoint() == path)
            .collect()
    }

    pub fn calls(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let seen = {
            let mut requests = self.requests.lock().unwrap();
            let seen = requests
                .iter()
                .filter(|r| r.endpoint() == request.endpoint())
                .count();
            requests.push(request.clone());
            seen
        };

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        (self.handler)(request, seen)
    }
}

pub fn json(status: u16, body: Value) -> Result<ApiResponse, ClientError> {
    Ok(ApiResponse::new(status, serde_json::to_vec(&body).unwrap()))
}

pub fn empty(status: u16) -> Result<ApiResponse, ClientError> {
    Ok(ApiResponse::new(status, Vec::new()))
}

pub fn csrf(token: &str) -> Result<ApiResponse, ClientError> {
    json(200, serde_json::json!({ "csrfToken": token }))
}

pub fn not_found(request: &ApiRequest) -> Result<ApiResponse, ClientError> {
    json(
        404,
        serde_json::json!({ "message": format!("no route for {}", request.path) }),
    )
}

pub fn config() -> ClientConfig {
    ClientConfig::new(BASE_URL).with_csrf_path(CSRF_PATH)
}

pub fn client(transport: &Arc<FakeTransport>) -> ApiClient {
    ApiClient::with_transport(config(), transport.clone())
}

/// JSON body of a recorded request, or `Value::Null`.
pub fn json_body(request: &ApiRequest) -> Value {
    match &request.body {
        RequestBody::Json(value) => value.clone(),
        _ => Value::Null,
    }
}
