//! Per-session cache of past study requests.
//!
//! The cache mirrors the remote source of truth: [`HistoryCache::refresh`]
//! is always a full replacement, never a merge, so server-side dedup and
//! ordering rules can never diverge from what the client shows. There is no
//! local append after a successful submission; the orchestrator refreshes
//! instead, trading one round trip for guaranteed consistency.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::Credential;
use crate::error::Result;
use crate::service::StudyService;
use crate::types::HistoryEntry;

/// Ordered list of past requests for the current session.
///
/// Coupled to the session lifecycle: on logout or credential expiry the
/// orchestrator wipes it locally via [`HistoryCache::clear_local`], and no
/// remote mutation is attempted while unauthenticated.
pub struct HistoryCache {
    service: Arc<dyn StudyService>,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryCache {
    /// Creates an empty cache backed by the given service.
    #[must_use]
    pub fn new(service: Arc<dyn StudyService>) -> Self {
        Self {
            service,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the local list with the remote source of truth.
    ///
    /// On failure the local list is left untouched.
    pub async fn refresh(&self, credential: &Credential) -> Result<()> {
        let fresh = self.service.history(credential).await?;
        debug!(entries = fresh.len(), "History refreshed");
        *self.entries.lock().await = fresh;
        Ok(())
    }

    /// Clears the history remotely, then locally.
    ///
    /// Optimistic-after-confirmation: the local list is emptied only once the
    /// remote delete has succeeded. A remote failure leaves the local list
    /// unchanged and surfaces a non-fatal error.
    pub async fn clear(&self, credential: &Credential) -> Result<()> {
        self.service.delete_history(credential).await?;
        self.entries.lock().await.clear();
        debug!("History cleared");
        Ok(())
    }

    /// Wipes the local list without touching the remote service.
    ///
    /// Used on logout and credential expiry.
    pub async fn clear_local(&self) {
        self.entries.lock().await.clear();
    }

    /// Returns a snapshot of the current entries.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.clone()
    }

    /// Returns the number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no entries are cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
