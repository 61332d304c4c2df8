//! Login, signup and logout on top of the session transport.

use std::sync::Mutex;

use mediabox_core::constants::endpoints;
use mediabox_core::models::{LoginRequest, MeResponse, RegisterPayload, SignupRequest, TokenResponse, User};
use mediabox_core::ClientError;

use crate::http::ApiRequest;
use crate::session::lock;
use crate::ApiClient;

/// Authentication state of one client: the bearer token (in the session)
/// plus the cached identity of the logged-in user.
#[derive(Debug)]
pub struct AuthClient {
    api: ApiClient,
    user: Mutex<Option<User>>,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            user: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Startup hook: pick up an existing cookie session if there is one.
    pub async fn init(&self) {
        if let Err(e) = self.fetch_current_user().await {
            tracing::debug!(error = %e, "No existing session");
        }
    }

    pub fn current_user(&self) -> Option<User> {
        lock(&self.user).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.session().has_access_token() || lock(&self.user).is_some()
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<(), ClientError> {
        let credentials = LoginRequest::new(identifier, password)?;
        let response: TokenResponse = self.api.post_json(endpoints::LOGIN, &credentials).await?;
        self.complete_authentication(response).await;
        tracing::info!("Logged in");
        Ok(())
    }

    pub async fn signup(&self, payload: RegisterPayload) -> Result<(), ClientError> {
        payload.check()?;
        let body = SignupRequest::from(payload);
        let response: TokenResponse = self.api.post_json(endpoints::SIGNUP, &body).await?;
        self.complete_authentication(response).await;
        tracing::info!("Signed up");
        Ok(())
    }

    /// Store the returned token, then load the user. The user fetch is best-effort.
    async fn complete_authentication(&self, response: TokenResponse) {
        if let Some(token) = response.into_token() {
            self.api.session().set_access_token(Some(token));
        }
        if let Err(e) = self.fetch_current_user().await {
            tracing::warn!(error = %e, "Authenticated, but fetching the current user failed");
        }
    }

    /// End the session locally and on the server.
    ///
    /// Both server calls are attempted; their failures are logged and
    /// swallowed. The token and cached user are always cleared.
    pub async fn logout(&self) {
        let logout = ApiRequest::post(endpoints::LOGOUT).with_json(&serde_json::json!({}));
        let result = match logout {
            Ok(request) => self.api.request(request).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Logout request failed");
        }

        if let Err(e) = self.api.request(ApiRequest::get(endpoints::LOGOUT_OAUTH)).await {
            tracing::warn!(error = %e, "OAuth logout request failed");
        }

        self.api.session().teardown();
        *lock(&self.user) = None;
        tracing::info!("Logged out");
    }

    /// Load the authenticated identity. On error the cached user is left as it was.
    pub async fn fetch_current_user(&self) -> Result<Option<User>, ClientError> {
        let response: MeResponse = self.api.get(endpoints::ME, &[]).await?;
        *lock(&self.user) = response.user.clone();
        Ok(response.user)
    }
}
