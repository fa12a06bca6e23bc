//! HTTP implementation of the auth provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use swot_core::{
    classify_status, AuthOutcome, AuthProvider, Config, Credential, Result, StudyError,
    UserProfile,
};

use crate::service::{classify_transport, normalize_base_url};

/// Wire body for `POST /auth/login`.
#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Wire body for `POST /auth/signup`.
#[derive(Debug, Serialize)]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Wire payload returned by both auth endpoints.
#[derive(Debug, Deserialize)]
struct AuthPayload {
    token: String,
    #[serde(default)]
    user: Option<UserProfile>,
}

// ============================================================================
// Field prevalidation
// ============================================================================

/// Rejects obviously invalid login fields before any network call.
fn precheck_login(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(StudyError::validation("Please fill in all fields"));
    }
    if !email.contains('@') {
        return Err(StudyError::validation("Please enter a valid email"));
    }
    if password.len() < 6 {
        return Err(StudyError::validation(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

/// Signup needs everything login needs, plus a display name.
fn precheck_signup(email: &str, password: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StudyError::validation("Please enter your name"));
    }
    precheck_login(email, password)
}

// ============================================================================
// HttpAuthProvider
// ============================================================================

/// Token issuer spoken over HTTP.
///
/// Holds the bearer credential in memory for the lifetime of the process;
/// there is no on-disk persistence, so every run starts logged out.
pub struct HttpAuthProvider {
    http: reqwest::Client,
    base_url: String,
    token: Mutex<Option<Credential>>,
}

impl HttpAuthProvider {
    /// Builds an auth provider from the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StudyError::validation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.api_base_url),
            token: Mutex::new(None),
        })
    }

    /// Posts to an auth endpoint and, on success, stores the issued token.
    async fn authenticate<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        email: &str,
    ) -> AuthOutcome {
        let url = format!("{}{path}", self.base_url);
        let response = match self.http.post(&url).json(body).send().await {
            Ok(response) => response,
            Err(e) => return AuthOutcome::failed(classify_transport(&e).message()),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return AuthOutcome::failed(classify_transport(&e).message()),
        };

        if !status.is_success() {
            return AuthOutcome::failed(classify_status(status.as_u16(), &text).message());
        }

        let payload: AuthPayload = match serde_json::from_str(&text) {
            Ok(payload) => payload,
            Err(_) => {
                return AuthOutcome::failed("The service sent an unreadable response");
            }
        };

        *self.token.lock().await = Some(Credential::new(payload.token));
        info!(email, "Authenticated");

        let user = payload
            .user
            .unwrap_or_else(|| UserProfile::from_email(email));
        AuthOutcome::ok(user)
    }
}

#[async_trait::async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        if let Err(err) = precheck_login(email, password) {
            return AuthOutcome::failed(err.message());
        }
        self.authenticate("/auth/login", &LoginBody { email, password }, email)
            .await
    }

    async fn signup(&self, email: &str, password: &str, name: &str) -> AuthOutcome {
        if let Err(err) = precheck_signup(email, password, name) {
            return AuthOutcome::failed(err.message());
        }
        self.authenticate(
            "/auth/signup",
            &SignupBody {
                name,
                email,
                password,
            },
            email,
        )
        .await
    }

    async fn logout(&self) {
        *self.token.lock().await = None;
        debug!("Stored credential discarded");
    }

    async fn token(&self) -> Option<Credential> {
        self.token.lock().await.clone()
    }
}
