//! Session-aware HTTP client for the mediabox backend.
//!
//! [`ApiClient`] wraps every backend call. Before a request goes out it
//! injects the bearer token and, for state-mutating methods, a CSRF token
//! obtained through a single shared fetch. When the backend answers 401 or
//! 403 the client refreshes the matching credential and replays the request
//! once. [`AuthClient`] layers login/signup/logout on top, and
//! [`VideoStatusPoller`] tracks asynchronous video processing.

pub mod api;
pub mod auth;
pub mod http;
pub mod poller;
pub mod recovery;
pub mod session;

use std::sync::Arc;

use futures::FutureExt;
use mediabox_core::constants::{endpoints, AUTHORIZATION_HEADER, CSRF_HEADER_NAME};
use mediabox_core::models::TokenResponse;
use mediabox_core::{ClientConfig, ClientError};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::recovery::{Attempt, Recovery};
use crate::session::{CsrfLookup, Session};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsrfResponse {
    #[serde(default)]
    csrf_token: Option<String>,
}

/// HTTP client for the mediabox API with token and CSRF lifecycle management.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<Session>,
    config: ClientConfig,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_api_url", &self.config.base_api_url)
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    /// Client backed by reqwest. Fails if the base API URL is not configured.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::from_config(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            session: Arc::new(Session::new()),
            config,
        }
    }

    /// Create client from environment: MEDIABOX_API_URL, MEDIABOX_CSRF_PATH, ...
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env()?;
        config.validate()?;
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send a request through the session layer.
    ///
    /// Resolves with any 2xx response. A 401 (outside login/signup/refresh)
    /// triggers one token refresh and one replay; a 403 triggers one forced
    /// CSRF fetch and one replay. If a recovery step itself fails, the
    /// original rejection is returned.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let mut attempt = Attempt::new();

        loop {
            let prepared = self.prepare(&request, &attempt).await?;
            let response = self.transport.send(&prepared).await?;
            if response.is_success() {
                return Ok(response);
            }

            let Some(recovery) = attempt.recovery_for(&request, response.status) else {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    "API request rejected"
                );
                return Err(response.into_error());
            };
            attempt.record(recovery);

            let recovered = match recovery {
                Recovery::Auth => self.recover_access_token(&request, &prepared).await,
                Recovery::Csrf => self.ensure_csrf_token(true).await.map(|_| ()),
            };
            if let Err(e) = recovered {
                tracing::warn!(
                    path = %request.path,
                    status = response.status,
                    recovery = ?recovery,
                    error = %e,
                    "Recovery failed, surfacing original response"
                );
                return Err(response.into_error());
            }

            tracing::debug!(
                method = %request.method,
                path = %request.path,
                recovery = ?recovery,
                "Replaying request"
            );
        }
    }

    /// Header injection. Runs before every send, including replays.
    async fn prepare(&self, request: &ApiRequest, attempt: &Attempt) -> Result<ApiRequest, ClientError> {
        let mut prepared = request.clone();

        if let Some(token) = self.session.access_token() {
            // A caller-supplied Authorization header wins, except after a refresh.
            if attempt.auth_retried() || prepared.header(AUTHORIZATION_HEADER).is_none() {
                prepared.set_header(AUTHORIZATION_HEADER, format!("Bearer {}", token));
            }
        }

        if prepared.is_unsafe() {
            if let Some(csrf) = self.ensure_csrf_token(false).await? {
                prepared.set_header(CSRF_HEADER_NAME, csrf);
            }
        }

        Ok(prepared)
    }

    /// Cached CSRF token, or the result of the single shared fetch.
    ///
    /// `force` bypasses the cache. Without a configured CSRF path there is
    /// nothing to fetch and the result is `Ok(None)`.
    pub async fn ensure_csrf_token(&self, force: bool) -> Result<Option<String>, ClientError> {
        let Some(csrf_path) = self.config.csrf_path.clone() else {
            return Ok(None);
        };

        let lookup = self.session.csrf_token_or_fetch(force, |generation| {
            let transport = Arc::clone(&self.transport);
            let session = Arc::clone(&self.session);
            fetch_csrf_token(transport, session, csrf_path, generation)
                .boxed()
                .shared()
        });

        match lookup {
            CsrfLookup::Cached(token) => Ok(Some(token)),
            CsrfLookup::Pending(fetch) => fetch.await,
        }
    }

    /// Recover from a 401 on `sent`.
    ///
    /// If the session token changed after `sent` was prepared, another request
    /// already refreshed it and the replay uses the new token. Otherwise the
    /// caller joins the running refresh or starts one.
    async fn recover_access_token(
        &self,
        request: &ApiRequest,
        sent: &ApiRequest,
    ) -> Result<(), ClientError> {
        if request.header(AUTHORIZATION_HEADER).is_none() {
            if let Some(current) = self.session.access_token() {
                if sent.header(AUTHORIZATION_HEADER) != Some(format!("Bearer {}", current).as_str()) {
                    tracing::debug!(path = %request.path, "Access token already refreshed");
                    return Ok(());
                }
            }
        }

        let refresh = self.session.refresh_or_join(|generation| {
            let api = self.clone();
            async move {
                let result = api.refresh_access_token().await;
                api.session.finish_refresh(generation);
                result
            }
            .boxed()
            .shared()
        });
        refresh.await
    }

    /// Exchange the refresh cookie for a new access token.
    ///
    /// Sent straight to the transport: no bearer header and no recovery of its own.
    async fn refresh_access_token(&self) -> Result<(), ClientError> {
        tracing::debug!("Refreshing access token");

        let mut request = ApiRequest::post(endpoints::REFRESH).with_json(&serde_json::json!({}))?;
        if let Some(csrf) = self.ensure_csrf_token(false).await? {
            request.set_header(CSRF_HEADER_NAME, csrf);
        }

        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }

        if let Some(token) = response.json_or_default::<TokenResponse>()?.into_token() {
            self.session.set_access_token(Some(token));
            tracing::info!("Access token refreshed");
        }
        Ok(())
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let request = ApiRequest::get(path).with_query(query);
        self.request(request).await?.json()
    }

    /// POST JSON body and deserialize response. An empty body yields `T::default()`.
    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned + Default,
        B: serde::Serialize,
    {
        let request = ApiRequest::post(path).with_json(body)?;
        self.request(request).await?.json_or_default()
    }
}

async fn fetch_csrf_token(
    transport: Arc<dyn HttpTransport>,
    session: Arc<Session>,
    path: String,
    generation: u64,
) -> Result<Option<String>, ClientError> {
    tracing::debug!(generation, "Fetching CSRF token");

    let result = match transport.send(&ApiRequest::get(path)).await {
        Ok(response) if response.is_success() => response
            .json::<CsrfResponse>()
            .map(|body| body.csrf_token.filter(|t| !t.is_empty())),
        Ok(response) => Err(response.into_error()),
        Err(e) => Err(e),
    };

    match &result {
        Ok(token) => session.set_csrf_token(token.clone()),
        Err(e) => tracing::warn!(error = %e, "CSRF token fetch failed"),
    }
    session.finish_csrf_fetch(generation);

    result
}

// Re-export the types callers need most.
pub use auth::AuthClient;
pub use http::{MultipartFile, RequestBody};
pub use mediabox_core::models::{MediaItem, MediaKind, UploadOutcome, User, VideoStatus};
pub use poller::{PollHandle, PollState, VideoStatusPoller};
