//! Real API client over HTTPS.
//!
//! Speaks JSON-RPC 2.0 to the configured service URL. Every request
//! carries the application id and API key headers from [`SdkConfig`].

use super::{retry_backoff, ApiClient, ApiError, MAX_ATTEMPTS};
use crate::config::SdkConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC API client backed by reqwest.
pub struct RestApiClient {
    http: reqwest::Client,
    config: SdkConfig,
    next_id: AtomicU64,
}

impl RestApiClient {
    /// Build a client for the service described by `config`.
    pub fn new(config: SdkConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call_once(&self, method: &str, params: &Value) -> Result<Value, ApiError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.config.url)
            .header("X-Perimeter-Application", &self.config.application)
            .header("X-Perimeter-Key", &self.config.key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ApiError::Transient(format!("http {status}")));
        }
        if !status.is_success() {
            return Err(ApiError::RequestFailed(format!("http {status}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        parse_rpc_response(value)
    }
}

#[async_trait]
impl ApiClient for RestApiClient {
    async fn invoke(
        &self,
        method: &str,
        params: Value,
        retry: bool,
    ) -> Result<Value, ApiError> {
        let attempts = if retry { MAX_ATTEMPTS } else { 1 };
        let mut attempt = 0;
        loop {
            match self.call_once(method, &params).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    attempt += 1;
                    let delay = retry_backoff(attempt);
                    tracing::debug!(
                        "transient failure invoking {method} (attempt {attempt}): {err}; \
                         retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Split a JSON-RPC response body into its result or error.
fn parse_rpc_response(value: Value) -> Result<Value, ApiError> {
    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ApiError::Api { code, message });
    }
    Ok(value.get("result").cloned().unwrap_or(Value::Null))
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_connect() {
        ApiError::Transient(err.to_string())
    } else {
        ApiError::RequestFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_field_is_extracted() {
        let value = json!({"jsonrpc": "2.0", "id": 1, "result": {"id": "d-1"}});
        let result = parse_rpc_response(value).unwrap();
        assert_eq!(result["id"], "d-1");
    }

    #[test]
    fn missing_result_becomes_null() {
        let value = json!({"jsonrpc": "2.0", "id": 1});
        assert!(parse_rpc_response(value).unwrap().is_null());
    }

    #[test]
    fn error_object_becomes_api_error() {
        let value = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 404, "message": "message not found"}
        });
        let err = parse_rpc_response(value).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "api error 404: message not found");
    }
}
