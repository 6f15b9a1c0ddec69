//! Engagement messages delivered by the service.

use crate::SdkError;
use serde::{Deserialize, Serialize};

/// A push- or fetch-delivered engagement message.
///
/// The payload is carried as raw JSON; interpreting it is the host
/// application's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message id.
    #[serde(rename = "id")]
    pub message_id: String,
    /// Application the message belongs to.
    #[serde(default)]
    pub application: Option<String>,
    /// Notification text, absent for silent messages.
    #[serde(default)]
    pub alert: Option<String>,
    /// MIME-style payload type hint.
    #[serde(default)]
    pub payload_type: Option<String>,
    /// Opaque message payload.
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Targeting tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the message was sent, epoch milliseconds.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl Message {
    /// Parse a message from a server response value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, SdkError> {
        serde_json::from_value(value).map_err(|e| SdkError::InvalidMessage(e.to_string()))
    }

    /// True when the message carries no user-visible alert.
    pub fn is_silent(&self) -> bool {
        self.alert.as_deref().map_or(true, str::is_empty)
    }
}
