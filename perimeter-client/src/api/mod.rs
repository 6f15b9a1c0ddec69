//! API client abstraction for the Perimeter service.
//!
//! The whole remote surface is one JSON-RPC style call:
//! `invoke(method, params, retry)`. Typed wrappers over it live where they
//! are used (the session for location calls, the [`Sdk`](crate::Sdk) for
//! registration and CRUD).
//!
//! # Retry policy
//!
//! Retry is opt-in per call site, never implicit. `retry = true` callers
//! accept the client retrying transient failures with exponential backoff
//! and jitter; `retry = false` is a single attempt, used for
//! fire-and-forget transition posts where staleness is acceptable.

mod mock;
mod rest;

pub use mock::{MockApiClient, RecordedCall};
pub use rest::RestApiClient;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Maximum attempts for a `retry = true` call (initial try included).
pub const MAX_ATTEMPTS: u32 = 4;

/// API call errors.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request failed and retrying will not help.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// A network-level failure that may succeed on retry.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The service returned an error object.
    #[error("api error {code}: {message}")]
    Api {
        /// Service error code.
        code: i64,
        /// Service error message.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// True for failures a `retry = true` caller should retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_) | ApiError::Timeout)
    }

    /// True when the service reported the requested entity missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { code: 404, .. })
    }
}

/// Executes remote calls against the Perimeter service.
///
/// Implementations handle transport, signing, and retry; callers get a
/// parsed JSON result value or an error value, never a panic.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Invoke a service method with the given parameters.
    ///
    /// With `retry = true` the client may retry transient failures with
    /// backoff; with `retry = false` it makes exactly one attempt.
    async fn invoke(&self, method: &str, params: Value, retry: bool)
        -> Result<Value, ApiError>;
}

/// Backoff before retry `attempt` (1-based) with jitter, so a fleet of
/// devices recovering from the same outage does not stampede the service.
///
/// Formula: min(10s, 2^attempt seconds) + random(0..1000ms)
pub(crate) fn retry_backoff(attempt: u32) -> Duration {
    let base_secs = 2u64.pow(attempt.min(4)).min(10);
    Duration::from_secs(base_secs) + Duration::from_millis(random_jitter_ms())
}

/// Random jitter between 0 and 1000 milliseconds.
fn random_jitter_ms() -> u64 {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes).expect("getrandom failed");
    u64::from_le_bytes(bytes) % 1001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_timeout_are_retryable() {
        assert!(ApiError::Transient("reset".into()).is_transient());
        assert!(ApiError::Timeout.is_transient());
        assert!(!ApiError::RequestFailed("bad request".into()).is_transient());
        assert!(!ApiError::Api {
            code: 500,
            message: "oops".into()
        }
        .is_transient());
    }

    #[test]
    fn not_found_detection() {
        assert!(ApiError::Api {
            code: 404,
            message: "missing".into()
        }
        .is_not_found());
        assert!(!ApiError::Timeout.is_not_found());
    }

    #[test]
    fn backoff_grows_with_attempt_and_is_capped() {
        assert!(retry_backoff(1) >= Duration::from_secs(2));
        assert!(retry_backoff(3) >= Duration::from_secs(8));
        assert!(retry_backoff(10) <= Duration::from_secs(11));
    }
}
