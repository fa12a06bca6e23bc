//! Session ownership and the authentication gate.
//!
//! [`AuthGate`] wraps an injected [`AuthProvider`] capability and is the
//! single mutation entry point for the [`Session`]. Both the provider-driven
//! events (login, signup, logout) and the orchestrator's forced logout on a
//! 401 serialize through the gate's lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::types::UserProfile;

// ============================================================================
// Credential
// ============================================================================

/// An opaque bearer credential.
///
/// The wrapped token is deliberately excluded from `Debug` output so it can
/// never leak into logs; callers that need the raw value for an
/// `Authorization` header use [`Credential::reveal`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// ============================================================================
// Session and Access
// ============================================================================

/// The current authentication session.
///
/// Owned by [`AuthGate`]; mutated only by login, signup, logout, and
/// credential-expiry events.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<UserProfile>,
    credential: Option<Credential>,
}

impl Session {
    /// Returns `true` if a credential is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Returns the signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    fn establish(&mut self, user: UserProfile, credential: Credential) {
        self.user = Some(user);
        self.credential = Some(credential);
    }

    fn clear(&mut self) {
        self.user = None;
        self.credential = None;
    }
}

/// The answer to "is the caller allowed to request content".
///
/// `Denied` is a returned value, never an error: the orchestrator uses it to
/// short-circuit before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The session holds a credential; gated calls may proceed.
    Allowed,
    /// No usable credential; carries a user-facing reason.
    Denied(String),
}

impl Access {
    /// Returns `true` for [`Access::Allowed`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// ============================================================================
// AuthProvider
// ============================================================================

/// Outcome of a provider-level auth operation.
#[derive(Debug, Clone, Default)]
pub struct AuthOutcome {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Provider-supplied failure reason, if any.
    pub error: Option<String>,
    /// Profile of the authenticated user, when the provider knows it.
    pub user: Option<UserProfile>,
}

impl AuthOutcome {
    /// A successful outcome carrying the given profile.
    #[must_use]
    pub const fn ok(user: UserProfile) -> Self {
        Self {
            success: true,
            error: None,
            user: Some(user),
        }
    }

    /// A failed outcome with a user-facing reason.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            user: None,
        }
    }
}

/// The identity capability consumed by the gate.
///
/// Credential storage mechanics and the issuer behind login/signup are out
/// of scope for the core; implementations live at the edges (HTTP in
/// `swot-client`, in-memory fakes in tests).
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Authenticates an existing account.
    async fn login(&self, email: &str, password: &str) -> AuthOutcome;

    /// Registers and authenticates a new account.
    async fn signup(&self, email: &str, password: &str, name: &str) -> AuthOutcome;

    /// Discards any provider-side credential state.
    async fn logout(&self);

    /// Returns the current bearer credential, if one is held.
    async fn token(&self) -> Option<Credential>;
}

// ============================================================================
// AuthGate
// ============================================================================

/// Gatekeeper for authenticated operations.
///
/// Answers [`AuthGate::check_access`] without I/O and supplies the bearer
/// credential on demand. All `Session` mutations go through this type.
pub struct AuthGate {
    provider: Arc<dyn AuthProvider>,
    session: Mutex<Session>,
}

impl AuthGate {
    /// Creates a gate over the given provider with an unauthenticated session.
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            session: Mutex::new(Session::default()),
        }
    }

    /// Logs in through the provider and, on success, establishes the session.
    ///
    /// A provider that reports success but holds no token is treated as a
    /// failure: a session without a credential would deadlock every gated
    /// call behind a re-authentication prompt.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let outcome = self.provider.login(email, password).await;
        self.establish_from(outcome, email).await
    }

    /// Signs up through the provider and, on success, establishes the session.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> AuthOutcome {
        let outcome = self.provider.signup(email, password, name).await;
        self.establish_from(outcome, email).await
    }

    async fn establish_from(&self, outcome: AuthOutcome, email: &str) -> AuthOutcome {
        if !outcome.success {
            return outcome;
        }

        let Some(credential) = self.provider.token().await else {
            return AuthOutcome::failed("Authentication succeeded but no credential was issued");
        };

        let user = outcome
            .user
            .clone()
            .unwrap_or_else(|| UserProfile::from_email(email));

        let mut session = self.session.lock().await;
        session.establish(user, credential);
        info!(email, "Session established");
        outcome
    }

    /// Logs out through the provider and clears the local session.
    pub async fn logout(&self) {
        self.provider.logout().await;
        self.session.lock().await.clear();
        info!("Session cleared");
    }

    /// Answers whether gated calls may proceed. No I/O.
    pub async fn check_access(&self) -> Access {
        let session = self.session.lock().await;
        if session.is_authenticated() {
            Access::Allowed
        } else {
            Access::Denied("You need to log in to request study material".to_string())
        }
    }

    /// Returns the current bearer credential, if any.
    pub async fn credential(&self) -> Option<Credential> {
        self.session.lock().await.credential.clone()
    }

    /// Returns the signed-in user's profile, if any.
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.session.lock().await.user.clone()
    }

    /// Forced local logout after a 401 on any gated call.
    ///
    /// The credential is discarded immediately so a stale credential is never
    /// retried; a subsequent [`AuthGate::check_access`] answers `Denied`
    /// without a network round trip.
    pub async fn invalidate(&self) {
        self.provider.logout().await;
        self.session.lock().await.clear();
        debug!("Credential invalidated after rejected call");
    }
}
