//! The study-session orchestrator.
//!
//! This module drives a study request's lifecycle (auth gate, in-flight
//! tracking, success/failure) and keeps the history cache consistent with
//! the session. The state machine transitions through:
//!
//! - `Idle -> Checking -> InFlight -> {Succeeded, Failed}`
//!
//! Terminal states return to a fresh `Checking`/`InFlight` cycle when a new
//! submission begins. Each submission carries a monotonically increasing
//! generation number; a late-resolving stale request is discarded by
//! comparing generations, so the result shown is always the most recently
//! *initiated* submission's (last-submission-wins).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{Access, AuthGate, AuthOutcome, Credential};
use crate::error::{ErrorKind, Result, StudyError};
use crate::history::HistoryCache;
use crate::service::StudyService;
use crate::types::{HistoryEntry, StudyMode, StudyRequest, StudyResult};

// ============================================================================
// SessionStatus
// ============================================================================

/// Current status of the study session.
///
/// The status transitions through these states:
/// - `Idle` -> `Checking` -> `InFlight`
/// - From `InFlight`:
///   - `Succeeded` (material received and parsed)
///   - `Failed` (classified error)
/// - Any state -> `Checking` when a new submission begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No submission has started, or the session was reset.
    #[default]
    Idle,
    /// The auth gate is being consulted; no network call yet.
    Checking,
    /// The content request is on the wire.
    InFlight,
    /// The most recent submission produced a study result.
    Succeeded,
    /// The most recent submission failed with a classified error.
    Failed,
}

impl SessionStatus {
    /// Returns `true` if this status represents a settled submission.
    ///
    /// # Examples
    ///
    /// ```
    /// use swot_core::SessionStatus;
    ///
    /// assert!(SessionStatus::Succeeded.is_terminal());
    /// assert!(SessionStatus::Failed.is_terminal());
    /// assert!(!SessionStatus::InFlight.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns `true` while a submission is being processed.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Checking | Self::InFlight)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Snapshot and Submission
// ============================================================================

/// Read-only view of the session for the presentation layer.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// The displayed study result, if the last submission succeeded.
    pub result: Option<StudyResult>,
    /// The classified error, if the last submission failed.
    pub error: Option<StudyError>,
    /// Cached history entries, server-ordered.
    pub history: Vec<HistoryEntry>,
    /// Set when the presentation layer should prompt for credentials.
    pub needs_credentials: bool,
}

/// How a `submit` call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The submission settled and its result is the one on display.
    Completed(StudyResult),
    /// A newer submission was initiated before this one resolved; its
    /// outcome was discarded without touching the session state.
    Superseded,
}

/// Mutable session state, guarded by a single lock.
#[derive(Debug, Default)]
struct SessionState {
    status: SessionStatus,
    result: Option<StudyResult>,
    error: Option<StudyError>,
    needs_credentials: bool,
    /// Generation of the most recently initiated submission.
    generation: u64,
}

// ============================================================================
// StudySessionOrchestrator
// ============================================================================

/// Composes the auth gate, remote service, and history cache to drive the
/// request lifecycle.
///
/// This is the single entry point the presentation layer calls; it owns the
/// session state and exposes it through [`StudySessionOrchestrator::snapshot`].
pub struct StudySessionOrchestrator {
    gate: Arc<AuthGate>,
    service: Arc<dyn StudyService>,
    history: Arc<HistoryCache>,
    state: Arc<Mutex<SessionState>>,
}

impl StudySessionOrchestrator {
    /// Creates an orchestrator in the `Idle` state with an empty history.
    #[must_use]
    pub fn new(gate: Arc<AuthGate>, service: Arc<dyn StudyService>) -> Self {
        let history = Arc::new(HistoryCache::new(Arc::clone(&service)));
        Self {
            gate,
            service,
            history,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    // ------------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------------

    /// Logs in and, on success, synchronizes history with the remote
    /// source of truth.
    ///
    /// A failed initial sync is non-fatal; it is logged and the session
    /// stays authenticated with an empty local history.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let outcome = self.gate.login(email, password).await;
        if outcome.success {
            self.after_authentication().await;
        }
        outcome
    }

    /// Signs up and, on success, synchronizes history.
    pub async fn signup(&self, email: &str, password: &str, name: &str) -> AuthOutcome {
        let outcome = self.gate.signup(email, password, name).await;
        if outcome.success {
            self.after_authentication().await;
        }
        outcome
    }

    /// Logs out, wipes the local history, and resets the session to `Idle`.
    pub async fn logout(&self) {
        self.gate.logout().await;
        self.history.clear_local().await;

        let mut state = self.state.lock().await;
        state.status = SessionStatus::Idle;
        state.result = None;
        state.error = None;
        state.needs_credentials = false;
        // The generation is left untouched so an in-flight submission from
        // before the logout still resolves as superseded.
    }

    async fn after_authentication(&self) {
        self.state.lock().await.needs_credentials = false;

        if let Some(credential) = self.gate.credential().await {
            if let Err(err) = self.history.refresh(&credential).await {
                warn!(error = %err, "Initial history sync failed");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Submissions
    // ------------------------------------------------------------------------

    /// Submits a study request for the given topic and mode.
    ///
    /// An empty (after trimming) topic fails with a `Validation` error
    /// before any state transition or network call. An unauthenticated
    /// session fails with `Unauthenticated` before any network call and
    /// raises the credential prompt. Otherwise the request is issued with
    /// the bearer credential; on success exactly one history refresh is
    /// triggered in the background.
    ///
    /// Calling `submit` while a previous submission is in flight is safe:
    /// the newer call supersedes the older one, whose eventual resolution
    /// is discarded.
    pub async fn submit(&self, topic: &str, mode: StudyMode) -> Result<Submission> {
        // Fails fast, before any state transition.
        let request = StudyRequest::new(topic, mode)?;

        let generation = self.begin_submission().await;

        let credential = match self.gate.check_access().await {
            Access::Denied(reason) => {
                let err = StudyError::unauthenticated(reason);
                self.fail_if_current(generation, err.clone(), true).await;
                return Err(err);
            }
            Access::Allowed => self.gate.credential().await,
        };
        // The credential can disappear between the check and the read if a
        // concurrent call just saw a 401; treat that the same as Denied.
        let Some(credential) = credential else {
            let err = StudyError::unauthenticated("Your session has ended. Please log in again.");
            self.fail_if_current(generation, err.clone(), true).await;
            return Err(err);
        };

        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return Ok(Submission::Superseded);
            }
            state.status = SessionStatus::InFlight;
        }

        info!(topic = request.topic(), mode = %request.mode(), "Requesting study material");
        let outcome = self.service.generate(&request, &credential).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(generation, "Discarding superseded submission");
            return Ok(Submission::Superseded);
        }

        match outcome {
            Ok(result) => {
                state.status = SessionStatus::Succeeded;
                state.result = Some(result.clone());
                state.error = None;
                drop(state);

                self.spawn_history_refresh(credential);
                Ok(Submission::Completed(result))
            }
            Err(err) => {
                state.status = SessionStatus::Failed;
                state.error = Some(err.clone());
                let expired = err.kind() == ErrorKind::Unauthenticated;
                state.needs_credentials = expired;
                drop(state);

                if expired {
                    self.force_logout().await;
                }
                warn!(kind = %err.kind(), "Study request failed");
                Err(err)
            }
        }
    }

    /// Re-runs a past request as a fresh submission.
    ///
    /// History selection is never a cache replay: the material may have
    /// changed server-side since the entry was recorded.
    pub async fn select_from_history(&self, entry: &HistoryEntry) -> Result<Submission> {
        self.submit(&entry.topic, entry.mode).await
    }

    /// Allocates a new submission generation and clears any displayed
    /// result or error, so stale content is never shown during a new load.
    async fn begin_submission(&self) -> u64 {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.status = SessionStatus::Checking;
        state.result = None;
        state.error = None;
        state.needs_credentials = false;
        state.generation
    }

    /// Marks the submission failed unless it has already been superseded.
    async fn fail_if_current(&self, generation: u64, err: StudyError, needs_credentials: bool) {
        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.status = SessionStatus::Failed;
            state.error = Some(err);
            state.needs_credentials = needs_credentials;
        }
    }

    /// Triggers the post-success history refresh, fire-and-forget.
    ///
    /// The refresh runs independently of the submission that spawned it: a
    /// failure here is logged and never demotes `Succeeded`.
    fn spawn_history_refresh(&self, credential: Credential) {
        let history = Arc::clone(&self.history);
        let gate = Arc::clone(&self.gate);

        tokio::spawn(async move {
            if let Err(err) = history.refresh(&credential).await {
                warn!(error = %err, "Background history refresh failed");
                if err.kind() == ErrorKind::Unauthenticated {
                    gate.invalidate().await;
                    history.clear_local().await;
                }
            }
        });
    }

    // ------------------------------------------------------------------------
    // History operations
    // ------------------------------------------------------------------------

    /// Refreshes the history cache from the remote source of truth.
    ///
    /// Gated like any authenticated call; failures are independent of the
    /// main submission state.
    pub async fn refresh_history(&self) -> Result<()> {
        let credential = self.require_credential().await?;
        match self.history.refresh(&credential).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.handle_history_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Clears the history remotely, then locally.
    ///
    /// On remote failure the local list is left unchanged and a non-fatal
    /// error is returned; the main submission state is untouched either way.
    pub async fn clear_history(&self) -> Result<()> {
        let credential = self.require_credential().await?;
        match self.history.clear(&credential).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "Clear history failed");
                self.handle_history_failure(&err).await;
                Err(err)
            }
        }
    }

    async fn require_credential(&self) -> Result<Credential> {
        match self.gate.check_access().await {
            Access::Allowed => self.gate.credential().await.ok_or_else(|| {
                StudyError::unauthenticated("Your session has ended. Please log in again.")
            }),
            Access::Denied(reason) => {
                self.state.lock().await.needs_credentials = true;
                Err(StudyError::unauthenticated(reason))
            }
        }
    }

    async fn handle_history_failure(&self, err: &StudyError) {
        if err.kind() == ErrorKind::Unauthenticated {
            self.state.lock().await.needs_credentials = true;
            self.force_logout().await;
        }
    }

    /// Credential expiry: discard the credential and wipe local history.
    async fn force_logout(&self) {
        self.gate.invalidate().await;
        self.history.clear_local().await;
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Returns the current presentation-layer view of the session.
    pub async fn snapshot(&self) -> Snapshot {
        let history = self.history.entries().await;
        let state = self.state.lock().await;
        Snapshot {
            status: state.status,
            result: state.result.clone(),
            error: state.error.clone(),
            history,
            needs_credentials: state.needs_credentials,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
