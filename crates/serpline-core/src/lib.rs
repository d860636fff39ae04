//! Serpline Core - Common infrastructure for search analytics ingestion
//!
//! This crate provides the shared pieces used by the ingestion pipeline:
//! a pooled HTTP client with a blocking facade, logging setup, and
//! TTY-aware progress reporting.

pub mod http;
pub mod logging;
pub mod progress;

// Re-exports for convenience
pub use http::{HttpError, SHARED_RUNTIME, http_client};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
