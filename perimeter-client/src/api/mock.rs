//! Mock API client for testing.
//!
//! Allows queueing per-method responses and capturing invocations for
//! verification.

use super::{ApiClient, ApiError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One captured `invoke` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The method that was invoked.
    pub method: String,
    /// The parameters it was invoked with.
    pub params: Value,
    /// The retry flag the caller passed.
    pub retry: bool,
}

/// Mock API client for testing.
///
/// Responses are queued per method and consumed in order. Methods with no
/// queued response return `Value::Null`, which callers treat as an empty
/// result.
#[derive(Debug, Default)]
pub struct MockApiClient {
    inner: Arc<Mutex<MockApiInner>>,
}

#[derive(Debug, Default)]
struct MockApiInner {
    responses: HashMap<String, VecDeque<Result<Value, ApiError>>>,
    calls: Vec<RecordedCall>,
    fail_next: Option<ApiError>,
}

impl MockApiClient {
    /// Create a new mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response for the next call to `method`.
    pub fn queue_response(&self, method: &str, value: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(value));
    }

    /// Queue an error for the next call to `method`.
    pub fn queue_error(&self, method: &str, error: ApiError) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .responses
            .entry(method.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Cause the very next invocation of any method to fail.
    pub fn fail_next(&self, error: ApiError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next = Some(error);
    }

    /// All invocations recorded so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Invocations of one method.
    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    /// The most recent invocation, if any.
    pub fn last_call(&self) -> Option<RecordedCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.last().cloned()
    }

    /// Clear all queued responses and recorded calls.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockApiInner::default();
    }
}

impl Clone for MockApiClient {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn invoke(
        &self,
        method: &str,
        params: Value,
        retry: bool,
    ) -> Result<Value, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(RecordedCall {
            method: method.to_string(),
            params,
            retry,
        });

        if let Some(error) = inner.fail_next.take() {
            return Err(error);
        }

        match inner.responses.get_mut(method).and_then(VecDeque::pop_front) {
            Some(result) => result,
            None => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn responses_are_consumed_in_order() {
        let mock = MockApiClient::new();
        mock.queue_response("device.register", json!({"id": "d-1"}));
        mock.queue_response("device.register", json!({"id": "d-2"}));

        let first = mock.invoke("device.register", json!({}), true).await.unwrap();
        let second = mock.invoke("device.register", json!({}), true).await.unwrap();
        assert_eq!(first["id"], "d-1");
        assert_eq!(second["id"], "d-2");

        // Exhausted queue falls back to null.
        let third = mock.invoke("device.register", json!({}), true).await.unwrap();
        assert!(third.is_null());
    }

    #[tokio::test]
    async fn invocations_are_recorded_with_retry_flag() {
        let mock = MockApiClient::new();
        mock.invoke("event.post", json!({"type": "x"}), false)
            .await
            .unwrap();

        let calls = mock.calls_to("event.post");
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].retry);
        assert_eq!(calls[0].params["type"], "x");
    }

    #[tokio::test]
    async fn queued_and_forced_errors_are_returned() {
        let mock = MockApiClient::new();
        mock.queue_error("location.fetch", ApiError::Timeout);
        let err = mock.invoke("location.fetch", json!({}), true).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout));

        mock.fail_next(ApiError::Transient("reset".into()));
        let err = mock.invoke("anything", json!({}), false).await.unwrap_err();
        assert!(err.is_transient());
    }
}
