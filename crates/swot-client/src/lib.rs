//! Swot HTTP client
//!
//! `reqwest`-backed implementations of the `swot-core` service and auth
//! provider contracts. Everything transport-specific (URLs, bearer headers,
//! status-code classification, timeouts) lives here.

pub mod auth;
pub mod service;

pub use auth::HttpAuthProvider;
pub use service::HttpStudyService;
