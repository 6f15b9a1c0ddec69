//! The SDK facade: device registration, push registration, device data,
//! channels, and message fetches.
//!
//! Every method here is a thin call over the API client: build params,
//! invoke, map the error to the operation-specific [`SdkError`] variant.
//! The interesting machinery lives in [`LocationSession`](crate::session).

use crate::api::{ApiClient, ApiError};
use crate::config::SdkConfig;
use crate::session::LocationSession;
use perimeter_core::GeoConfig;
use perimeter_types::{DeviceToken, Message, SdkError};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Top-level SDK handle.
///
/// Holds the service configuration and the device's registration state.
/// Methods other than registration require a registered device.
pub struct Sdk<C: ApiClient + 'static> {
    api: Arc<C>,
    config: SdkConfig,
    device_token: Mutex<Option<DeviceToken>>,
}

impl<C: ApiClient + 'static> Sdk<C> {
    /// Create an SDK handle over the given API client.
    pub fn new(config: SdkConfig, api: C) -> Self {
        Self {
            api: Arc::new(api),
            config,
            device_token: Mutex::new(None),
        }
    }

    /// The underlying API client.
    pub fn api(&self) -> Arc<C> {
        Arc::clone(&self.api)
    }

    /// Create a location monitoring session sharing this SDK's API client.
    pub fn location_session(&self, config: &GeoConfig) -> LocationSession<C> {
        LocationSession::new(Arc::clone(&self.api), config)
    }

    /// Whether a device registration has succeeded.
    pub async fn is_registered(&self) -> bool {
        self.device_token.lock().await.is_some()
    }

    /// The registered device token, if any.
    pub async fn device_token(&self) -> Option<DeviceToken> {
        self.device_token.lock().await.clone()
    }

    /// Register (or re-register) this device.
    ///
    /// Pass a previously issued token to resume an identity, or `None` to
    /// let the service mint one. An optional user token links the device
    /// to an authenticated member.
    pub async fn register_device(
        &self,
        existing: Option<DeviceToken>,
        user_token: Option<&str>,
    ) -> Result<DeviceToken, SdkError> {
        let params = json!({
            "id": existing.as_ref().map(DeviceToken::as_str),
            "name": self.config.device_name,
            "user_token": user_token,
        });
        let value = self
            .api
            .invoke("device.register", params, true)
            .await
            .map_err(|e| SdkError::DeviceRegistrationFailed(e.to_string()))?;

        let token = value
            .get("id")
            .and_then(Value::as_str)
            .map(DeviceToken::new)
            .ok_or_else(|| {
                SdkError::InvalidResponse("device.register response missing id".into())
            })?;

        tracing::debug!("device registered as {token}");
        *self.device_token.lock().await = Some(token.clone());
        Ok(token)
    }

    /// Unregister this device and forget its token.
    pub async fn unregister_device(&self) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke("device.unregister", json!({ "device": device.as_str() }), true)
            .await
            .map_err(|e| SdkError::DeviceUnregisterFailed(e.to_string()))?;
        *self.device_token.lock().await = None;
        Ok(())
    }

    /// Register the platform push token so the service can reach this
    /// device.
    pub async fn register_for_notifications(&self, push_token: &str) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "device.set_push_token",
                json!({ "device": device.as_str(), "token": push_token }),
                true,
            )
            .await
            .map_err(|e| SdkError::PushRegistrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Link the device to an authenticated member.
    pub async fn set_user_token(&self, user_token: &str) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "device.set_user_token",
                json!({ "device": device.as_str(), "user_token": user_token }),
                true,
            )
            .await
            .map_err(|e| SdkError::SetUserTokenFailed(e.to_string()))?;
        Ok(())
    }

    /// Store a key/value pair in the device's server-side data.
    pub async fn set_device_data(&self, key: &str, value: Value) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "device.set_data",
                json!({ "device": device.as_str(), "key": key, "value": value }),
                true,
            )
            .await
            .map_err(|e| SdkError::DeviceDataFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Read a value from the device's server-side data.
    pub async fn get_device_data(&self, key: &str) -> Result<Value, SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "device.get_data",
                json!({ "device": device.as_str(), "key": key }),
                true,
            )
            .await
            .map_err(|e| SdkError::DeviceDataFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Subscribe the device to a pub/sub channel.
    pub async fn subscribe_to_channel(&self, channel: &str) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "channel.subscribe",
                json!({ "device": device.as_str(), "channel": channel }),
                true,
            )
            .await
            .map_err(|e| SdkError::ChannelSubscribeFailed {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Unsubscribe the device from a pub/sub channel.
    pub async fn unsubscribe_from_channel(&self, channel: &str) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "channel.unsubscribe",
                json!({ "device": device.as_str(), "channel": channel }),
                true,
            )
            .await
            .map_err(|e| SdkError::ChannelUnsubscribeFailed {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Post an application event.
    pub async fn post_event(&self, name: &str, data: Value) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "event.post",
                json!({ "device": device.as_str(), "type": name, "data": data }),
                true,
            )
            .await
            .map_err(|e| SdkError::PostEventFailed {
                event: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Fetch the full message behind a push notification payload.
    ///
    /// The notification must carry the message id under `msg_id`.
    pub async fn fetch_message(&self, notification: &Value) -> Result<Message, SdkError> {
        let device = self.require_device().await?;
        let msg_id = notification
            .get("msg_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SdkError::InvalidMessage("notification carries no message id".into())
            })?;

        let value = self
            .api
            .invoke(
                "message.fetch",
                json!({ "device": device.as_str(), "id": msg_id }),
                true,
            )
            .await
            .map_err(map_message_error)?;
        Message::from_value(value)
    }

    /// Fetch the next unread message queued for this device.
    pub async fn fetch_unread_message(&self) -> Result<Message, SdkError> {
        let device = self.require_device().await?;
        let value = self
            .api
            .invoke("message.poll", json!({ "device": device.as_str() }), true)
            .await
            .map_err(map_message_error)?;
        Message::from_value(value)
    }

    /// Send a message to another member by user token.
    pub async fn send_message(
        &self,
        user_token: &str,
        alert: &str,
        payload: Value,
    ) -> Result<(), SdkError> {
        let device = self.require_device().await?;
        self.api
            .invoke(
                "message.send",
                json!({
                    "device": device.as_str(),
                    "audience": { "user_tokens": [user_token] },
                    "notification": { "text": alert },
                    "payload": payload,
                }),
                true,
            )
            .await
            .map_err(|e| SdkError::SendMessageFailed {
                user_token: user_token.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn require_device(&self) -> Result<DeviceToken, SdkError> {
        self.device_token
            .lock()
            .await
            .clone()
            .ok_or(SdkError::DeviceNotRegistered)
    }
}

fn map_message_error(err: ApiError) -> SdkError {
    if err.is_not_found() {
        SdkError::MessageNotFound
    } else {
        SdkError::MessageFetchFailed(err.to_string())
    }
}
