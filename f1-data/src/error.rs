//! Fetch error types.
//!
//! Every fetch-normalize operation returns `Result<T, FetchError>`. Callers that
//! want the degraded behaviour (log and show an empty result) go through
//! [`or_empty`]; everyone else can match on [`FetchError::kind`].

use std::time::Duration;

use tracing::error;

use crate::session::SessionType;

/// Coarse classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failure, timeout or non-success status.
    Transport,
    /// The response arrived but could not be decoded into the expected shape.
    Parse,
    /// The data was well-formed but not what the caller asked for.
    Unexpected,
}

/// Errors from the OpenF1 and circuit layout clients.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, client timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the API
    #[error("rate limited by {host}")]
    RateLimited { host: String },

    /// The call did not finish within the service-level timeout
    #[error("timed out after {}s", after.as_secs())]
    Timeout { after: Duration },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// No session matches the requested year, circuit and type
    #[error("no {session_type} session at {circuit} in {year}")]
    SessionNotFound {
        year: i32,
        circuit: String,
        session_type: SessionType,
    },

    /// A lap has no start time or duration, so its telemetry window is unknown
    #[error("lap {lap} of {driver} has no timing window")]
    LapWindowUnknown { driver: String, lap: u32 },

    /// The layout dataset no longer lines up with the country reference list
    #[error("country list has {expected} entries but the layout dataset has {actual} rows")]
    CountryBackfillMismatch { expected: usize, actual: usize },
}

impl FetchError {
    /// Build a `Json` error, keeping the start of the offending body for the log.
    pub(crate) fn json(err: &serde_json::Error, body: &str) -> Self {
        FetchError::Json {
            message: err.to_string(),
            body: Some(body.chars().take(500).collect()),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Http(e) if e.is_decode() => ErrorKind::Parse,
            FetchError::Http(_)
            | FetchError::Api { .. }
            | FetchError::RateLimited { .. }
            | FetchError::Timeout { .. } => ErrorKind::Transport,
            FetchError::Json { .. } => ErrorKind::Parse,
            FetchError::SessionNotFound { .. }
            | FetchError::LapWindowUnknown { .. }
            | FetchError::CountryBackfillMismatch { .. } => ErrorKind::Unexpected,
        }
    }
}

/// Unwrap a fetch result, degrading to an empty value on failure.
///
/// The failure is reported on the `error` log level, which is the channel the
/// UI surfaces to the user.
pub fn or_empty<T: Default>(result: Result<T, FetchError>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!(kind = ?e.kind(), "{context}: {e}");
            T::default()
        }
    }
}
