//! Pooled HTTP client with a blocking facade.
//!
//! Uses async reqwest internally on a shared tokio runtime, but presents
//! a sync interface so callers (rayon workers, the sequential fetch loop)
//! never deal with futures directly.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout for all outbound requests
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from an HTTP round trip or response decoding.
#[derive(Debug)]
pub enum HttpError {
    /// Transport or status error with optional HTTP status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Response body could not be decoded
    Decode(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create from a reqwest error, stripping the URL to avoid leaking
    /// site identifiers into logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Self::Decode(e.without_url().to_string());
        }
        let status = e.status().map(|s| s.as_u16());
        Self::Http {
            status,
            message: e.without_url().to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            Self::Decode(_) => None,
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});
