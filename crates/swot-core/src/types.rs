//! Core data types for study requests, results, and history.
//!
//! Wire types mirror the remote service's JSON contract (camelCase field
//! names); history entries additionally accept the legacy `_id` and
//! `timestamp` aliases still emitted by older service versions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudyError};

// ============================================================================
// StudyMode and StudyRequest
// ============================================================================

/// The study mode requested by the learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    /// Regular study material: summary, quiz, and a study tip.
    #[default]
    Normal,
    /// Adds a worked math challenge to the regular material.
    Math,
}

impl StudyMode {
    /// Returns the lowercase wire name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Math => "math",
        }
    }
}

impl std::fmt::Display for StudyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyMode {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "math" => Ok(Self::Math),
            other => Err(StudyError::validation(format!(
                "unknown study mode '{other}' (expected 'normal' or 'math')"
            ))),
        }
    }
}

/// A validated study request.
///
/// Construction trims the topic and rejects emptiness before any I/O;
/// the request is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyRequest {
    topic: String,
    mode: StudyMode,
}

impl StudyRequest {
    /// Creates a request from a raw topic and mode.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the topic is empty after trimming.
    ///
    /// # Examples
    ///
    /// ```
    /// use swot_core::{StudyMode, StudyRequest};
    ///
    /// let request = StudyRequest::new("  Photosynthesis  ", StudyMode::Normal)?;
    /// assert_eq!(request.topic(), "Photosynthesis");
    ///
    /// assert!(StudyRequest::new("   ", StudyMode::Normal).is_err());
    /// # Ok::<(), swot_core::StudyError>(())
    /// ```
    pub fn new(topic: &str, mode: StudyMode) -> Result<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(StudyError::validation("Please enter a topic to study"));
        }
        Ok(Self {
            topic: topic.to_string(),
            mode,
        })
    }

    /// Returns the trimmed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the requested mode.
    #[must_use]
    pub const fn mode(&self) -> StudyMode {
        self.mode
    }
}

// ============================================================================
// StudyResult
// ============================================================================

/// One multiple-choice quiz question.
///
/// Options are implicitly lettered `A`, `B`, `C`, … by position;
/// `correct_answer` holds one of those letters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// The question text.
    pub question: String,
    /// Answer options in display order.
    pub options: Vec<String>,
    /// The letter of the correct option.
    pub correct_answer: String,
}

/// The optional worked math challenge included in math mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathQuestion {
    /// The challenge prompt.
    pub question: String,
    /// The answer.
    pub answer: String,
    /// A worked explanation of the answer.
    pub explanation: String,
}

/// Generated study material returned by the remote service.
///
/// Treated as read-only by the orchestrator; owned by the presentation
/// layer once surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyResult {
    /// The topic this material was generated for.
    pub topic: String,
    /// Ordered summary statements.
    pub summary: Vec<String>,
    /// Ordered quiz questions.
    pub quiz: Vec<QuizQuestion>,
    /// A study tip for the topic.
    pub study_tip: String,
    /// Math challenge, present in math mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_question: Option<MathQuestion>,
    /// Link to further reading, if the service found one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_url: Option<String>,
}

// ============================================================================
// HistoryEntry
// ============================================================================

/// One past study request, as recorded by the remote service.
///
/// Ordering is server-assigned (most recent first); the client never
/// reorders or partially removes entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Server-assigned identifier.
    #[serde(alias = "_id")]
    pub id: String,
    /// The topic that was studied.
    pub topic: String,
    /// The mode it was studied in.
    pub mode: StudyMode,
    /// When the request was made.
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// UserProfile
// ============================================================================

/// The identity attached to an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name.
    pub name: String,
    /// Email address used to sign in.
    pub email: String,
}

impl UserProfile {
    /// Builds a minimal profile from an email address alone.
    ///
    /// Used when the auth provider reports success without a profile;
    /// the local part of the address stands in for the display name.
    #[must_use]
    pub fn from_email(email: &str) -> Self {
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            name,
            email: email.to_string(),
        }
    }
}
