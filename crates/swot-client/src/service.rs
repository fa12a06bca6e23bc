//! HTTP implementation of the remote study service.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use swot_core::{
    classify_status, Config, Credential, HistoryEntry, Result, StudyError, StudyRequest,
    StudyResult, StudyService,
};

/// Wire envelope for the history endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryPayload {
    pub(crate) history: Vec<HistoryEntry>,
}

/// Maps a transport-level failure onto the error taxonomy.
///
/// A timed-out request is `Timeout`; anything else that never produced a
/// status line (refused connection, DNS failure, dropped socket) is
/// `NetworkUnreachable`.
pub(crate) fn classify_transport(err: &reqwest::Error) -> StudyError {
    if err.is_timeout() {
        StudyError::timeout("The request took too long to complete. Please try again.")
    } else {
        StudyError::network_unreachable(
            "Unable to reach the study service. Please check your connection.",
        )
    }
}

/// Strips any trailing slashes so endpoint joins are unambiguous.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

// ============================================================================
// HttpStudyService
// ============================================================================

/// The study service spoken over HTTP.
///
/// Endpoints, relative to the configured base URL:
/// - `GET /study?topic=...&mode=...` — generate material
/// - `GET /study/history` — fetch the full history
/// - `DELETE /study/history` — delete the full history
///
/// Every call carries the bearer credential and the configured timeout.
pub struct HttpStudyService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStudyService {
    /// Builds a service client from the configuration.
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
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Resolves a response into the expected payload or a classified error.
    ///
    /// Non-2xx responses go through [`classify_status`] with the raw body; a
    /// 2xx body that fails to parse is `MalformedResponse`.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport(&e))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            StudyError::malformed(format!("The service sent an unreadable response: {e}"))
        })
    }
}

#[async_trait::async_trait]
impl StudyService for HttpStudyService {
    async fn generate(
        &self,
        request: &StudyRequest,
        credential: &Credential,
    ) -> Result<StudyResult> {
        debug!(topic = request.topic(), mode = %request.mode(), "GET /study");
        let response = self
            .http
            .get(self.endpoint("/study"))
            .query(&[("topic", request.topic()), ("mode", request.mode().as_str())])
            .bearer_auth(credential.reveal())
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        Self::read_json(response).await
    }

    async fn history(&self, credential: &Credential) -> Result<Vec<HistoryEntry>> {
        debug!("GET /study/history");
        let response = self
            .http
            .get(self.endpoint("/study/history"))
            .bearer_auth(credential.reveal())
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let payload: HistoryPayload = Self::read_json(response).await?;
        Ok(payload.history)
    }

    async fn delete_history(&self, credential: &Credential) -> Result<()> {
        debug!("DELETE /study/history");
        let response = self
            .http
            .delete(self.endpoint("/study/history"))
            .bearer_auth(credential.reveal())
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .map_err(|e| classify_transport(&e))?;
        Err(classify_status(status.as_u16(), &body))
    }
}
