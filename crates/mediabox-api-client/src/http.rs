//! HTTP transport abstraction.
//!
//! [`HttpTransport`] is the only thing that talks to the network. The session
//! layer in [`crate::ApiClient`] builds [`ApiRequest`]s, decorates them with
//! credentials, and hands them to a transport. Production code uses
//! [`ReqwestTransport`]; tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mediabox_core::{ClientConfig, ClientError};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Request body. Cheap to clone so a request can be replayed.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartFile),
}

/// A single-file multipart form.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A backend request, addressed by path relative to the base API URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_query(mut self, query: &[(&str, String)]) -> Self {
        self.query
            .extend(query.iter().map(|(k, v)| (k.to_string(), v.clone())));
        self
    }

    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_multipart(mut self, file: MultipartFile) -> Self {
        self.body = RequestBody::Multipart(file);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace a header (case-insensitive name match).
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// State-mutating methods that need a CSRF token.
    pub fn is_unsafe(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Path without any inline query string, used for endpoint identity checks.
    pub fn endpoint(&self) -> &str {
        self.path.split('?').next().unwrap_or_default()
    }
}

/// A fully-read backend response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ClientError::Decode(format!("Failed to parse response as JSON: {}", e)))
    }

    /// Like [`ApiResponse::json`], but an empty body yields `T::default()`.
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, ClientError> {
        if self.body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(T::default());
        }
        self.json()
    }

    pub fn into_error(self) -> ClientError {
        ClientError::from_response(self.status, &self.body)
    }
}

/// Sends one request and reads the full response.
///
/// Non-2xx statuses are returned as responses, not errors; only failures to
/// reach the server or read the body are `Err`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError>;
}

/// A [`reqwest`]-backed [`HttpTransport`] with a cookie store, so the
/// cookie-based refresh credential survives between calls.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.require_base_url()?, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        let url = self.build_url(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(file) => {
                let part = reqwest::multipart::Part::bytes(file.data.to_vec())
                    .file_name(file.filename.clone())
                    .mime_str(&file.content_type)
                    .map_err(|e| {
                        ClientError::InvalidInput(format!(
                            "Invalid content type '{}': {}",
                            file.content_type, e
                        ))
                    })?;
                builder.multipart(reqwest::multipart::Form::new().part(file.field.clone(), part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(format!("Failed to read response body: {}", e)))?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut request = ApiRequest::get("/auth/me").with_header("authorization", "Bearer a");
        assert_eq!(request.header("Authorization"), Some("Bearer a"));

        request.set_header("AUTHORIZATION", "Bearer b");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("authorization"), Some("Bearer b"));
    }

    #[test]
    fn test_unsafe_methods() {
        assert!(ApiRequest::post("/x").is_unsafe());
        assert!(ApiRequest::new(Method::PUT, "/x").is_unsafe());
        assert!(ApiRequest::new(Method::PATCH, "/x").is_unsafe());
        assert!(ApiRequest::new(Method::DELETE, "/x").is_unsafe());
        assert!(!ApiRequest::get("/x").is_unsafe());
        assert!(!ApiRequest::new(Method::HEAD, "/x").is_unsafe());
    }

    #[test]
    fn test_endpoint_strips_query() {
        assert_eq!(ApiRequest::get("/auth/login?next=/").endpoint(), "/auth/login");
        assert_eq!(ApiRequest::get("/media/all/page").endpoint(), "/media/all/page");
    }

    #[test]
    fn test_json_or_default_on_empty_body() {
        #[derive(Debug, Default, serde::Deserialize, PartialEq)]
        struct Body {
            token: Option<String>,
        }
        let empty = ApiResponse::new(204, Bytes::new());
        assert_eq!(empty.json_or_default::<Body>().unwrap(), Body::default());

        let filled = ApiResponse::new(200, r#"{"token":"t"}"#);
        assert_eq!(filled.json_or_default::<Body>().unwrap().token.as_deref(), Some("t"));
    }
}
