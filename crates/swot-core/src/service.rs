//! The remote study-service boundary.

use crate::auth::Credential;
use crate::error::Result;
use crate::types::{HistoryEntry, StudyRequest, StudyResult};

/// The content-generation service, consumed over the wire.
///
/// The core treats the service as opaque: every method either returns the
/// parsed payload or a classified [`crate::StudyError`]. Implementations
/// attach the bearer credential to each call and apply the configured
/// timeout; the HTTP implementation lives in `swot-client`.
#[async_trait::async_trait]
pub trait StudyService: Send + Sync {
    /// Requests generated study material for a topic and mode.
    async fn generate(&self, request: &StudyRequest, credential: &Credential)
        -> Result<StudyResult>;

    /// Fetches the caller's full request history, server-ordered.
    async fn history(&self, credential: &Credential) -> Result<Vec<HistoryEntry>>;

    /// Deletes the caller's entire request history.
    async fn delete_history(&self, credential: &Credential) -> Result<()>;
}
