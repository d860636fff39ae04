//! Job-level error type
//!
//! One import job either completes, skips (existing data), or fails with a
//! [`JobError`]. Failures never cross job boundaries; the runner logs them
//! and moves on to the next job.

use serpline_core::HttpError;

/// Error that fails a single import job.
#[derive(Debug)]
pub enum JobError {
    /// Invalid or incomplete per-property settings. Raised before any
    /// network call is made.
    Config(String),
    /// Reporting API request or response decode failure.
    Api(HttpError),
    /// Destination guard query or write failure.
    Sink(anyhow::Error),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration: {msg}"),
            Self::Api(e) => write!(f, "reporting API: {e}"),
            Self::Sink(e) => write!(f, "destination: {e}"),
        }
    }
}

impl std::error::Error for JobError {}

impl JobError {
    /// Whether this is a configuration error (job rejected before fetch).
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<HttpError> for JobError {
    fn from(e: HttpError) -> Self {
        Self::Api(e)
    }
}
