//! Swot study-session core
//!
//! Session orchestration, error classification, history caching, and quiz
//! evaluation, independent of any transport or user interface.

pub mod auth;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod quiz;
pub mod service;
pub mod types;

pub use auth::{Access, AuthGate, AuthOutcome, AuthProvider, Credential, Session};
pub use config::Config;
pub use error::{classify_status, ErrorKind, Result, StudyError};
pub use history::HistoryCache;
pub use orchestrator::{SessionStatus, Snapshot, StudySessionOrchestrator, Submission};
pub use quiz::{option_letter, QuizAttempt, QuizScore, Selections};
pub use service::StudyService;
pub use types::{
    HistoryEntry, MathQuestion, QuizQuestion, StudyMode, StudyRequest, StudyResult, UserProfile,
};
