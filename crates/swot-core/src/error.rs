//! Error taxonomy for Swot study sessions.
//!
//! Every failure surfaced by the core carries a fixed, machine-readable
//! [`ErrorKind`] tag plus a human-readable message. The tag is what callers
//! and tests branch on; the message is advisory only.

use serde::{Deserialize, Serialize};

/// A specialized `Result` type for Swot core operations.
pub type Result<T> = std::result::Result<T, StudyError>;

/// Classified error categories for study-session failures.
///
/// The set is closed: the presentation layer handles each kind
/// programmatically (re-authentication prompt, retry hint, and so on)
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before any I/O (e.g. empty topic).
    Validation,
    /// Missing or expired credential; triggers a re-authentication prompt.
    Unauthenticated,
    /// Transport failure before a response was received (connectivity, DNS, abort).
    NetworkUnreachable,
    /// The request did not resolve within the configured timeout.
    Timeout,
    /// The remote service answered with a 5xx status.
    ServerError,
    /// The remote service rejected the request with a non-401 4xx status.
    ClientError,
    /// A response was received but its body did not match the expected structure.
    MalformedResponse,
}

impl ErrorKind {
    /// Returns the stable machine-readable tag for this kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use swot_core::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::Unauthenticated.tag(), "unauthenticated");
    /// assert_eq!(ErrorKind::MalformedResponse.tag(), "malformed_response");
    /// ```
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthenticated => "unauthenticated",
            Self::NetworkUnreachable => "network_unreachable",
            Self::Timeout => "timeout",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::MalformedResponse => "malformed_response",
        }
    }

    /// Returns `true` if this kind is resolved locally, without contacting
    /// the remote service.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Validation | Self::Unauthenticated)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A classified study-session failure.
///
/// Carries an [`ErrorKind`] tag and an advisory message. Errors are values
/// surfaced through the session state, never uncaught faults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StudyError {
    /// The classified kind.
    kind: ErrorKind,
    /// Human-readable description, advisory only.
    message: String,
}

impl StudyError {
    /// Creates a new error with the given kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates an `Unauthenticated` error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    /// Creates a `NetworkUnreachable` error.
    #[must_use]
    pub fn network_unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkUnreachable, message)
    }

    /// Creates a `Timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates a `ServerError` error.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    /// Creates a `ClientError` error.
    #[must_use]
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientError, message)
    }

    /// Creates a `MalformedResponse` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    /// Returns the classified kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the advisory message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Generic fallback message for 5xx responses without a usable body.
const SERVER_ERROR_FALLBACK: &str =
    "The study service hit an internal error. Try again in a moment.";

/// Classifies a non-2xx HTTP response into a [`StudyError`].
///
/// Evaluation order (transport failures are classified by the network layer
/// before a response exists, so they never reach this function):
///
/// 1. 401 → `Unauthenticated`
/// 2. 500–599 → `ServerError`, message from the body `message` field if present
/// 3. other 4xx with a body `message`/`error` field → `ClientError`, verbatim
/// 4. any other body shape → `MalformedResponse`
/// 5. anything else → `Timeout`
///
/// # Examples
///
/// ```
/// use swot_core::{classify_status, ErrorKind};
///
/// let err = classify_status(401, "");
/// assert_eq!(err.kind(), ErrorKind::Unauthenticated);
///
/// let err = classify_status(503, r#"{"message":"maintenance"}"#);
/// assert_eq!(err.kind(), ErrorKind::ServerError);
/// assert_eq!(err.message(), "maintenance");
/// ```
#[must_use]
pub fn classify_status(status: u16, body: &str) -> StudyError {
    if status == 401 {
        return StudyError::unauthenticated("Your session has expired. Please log in again.");
    }

    if (500..=599).contains(&status) {
        let message = body_message(body).unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string());
        return StudyError::server(message);
    }

    if (400..=499).contains(&status) {
        if let Some(message) = body_message(body) {
            return StudyError::client(message);
        }
        return StudyError::malformed(format!(
            "the service returned status {status} without an error field"
        ));
    }

    // Not a failure status we recognize; treat like a timed-out exchange.
    StudyError::timeout(format!("unexpected response status {status}"))
}

/// Extracts the `message` or `error` field from a JSON error body, if any.
fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
