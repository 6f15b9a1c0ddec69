//! Error types for the Perimeter SDK.

use thiserror::Error;

/// Errors surfaced by Perimeter SDK operations.
///
/// Remote failures are reported to whichever caller asked for the call;
/// they never roll back or corrupt local geo engine state.
#[derive(Debug, Clone, Error)]
pub enum SdkError {
    /// Platform location permission refused; monitoring cannot start.
    #[error("location access denied")]
    LocationAccessDenied,

    /// Permission level too coarse for the requested monitoring mode.
    #[error("location access insufficient for requested monitoring mode")]
    LocationAccessInsufficient,

    /// Platform failed to start region monitoring.
    #[error("location monitoring failed: {0}")]
    LocationMonitoringFailed(String),

    /// Platform failed to start beacon ranging.
    #[error("beacon ranging failed: {0}")]
    LocationBeaconRangingFailed(String),

    /// Remote fetch of nearby locations failed.
    #[error("location fetch failed: {0}")]
    LocationFetchFailed(String),

    /// Remote location sync or transition post failed.
    #[error("location sync failed: {0}")]
    LocationSyncFailed(String),

    /// Posting an application event failed.
    #[error("post of event {event} failed: {reason}")]
    PostEventFailed {
        /// The event name that was being posted.
        event: String,
        /// Why the post failed.
        reason: String,
    },

    /// Operation requires a registered device.
    #[error("device not registered")]
    DeviceNotRegistered,

    /// Device registration call failed.
    #[error("device registration failed: {0}")]
    DeviceRegistrationFailed(String),

    /// Device unregistration call failed.
    #[error("device unregister failed: {0}")]
    DeviceUnregisterFailed(String),

    /// Push token registration failed.
    #[error("push registration failed: {0}")]
    PushRegistrationFailed(String),

    /// Message fetch failed.
    #[error("message fetch failed: {0}")]
    MessageFetchFailed(String),

    /// No message matched the request.
    #[error("message not found")]
    MessageNotFound,

    /// A message payload could not be decoded.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Channel subscription failed.
    #[error("subscribe to channel {channel} failed: {reason}")]
    ChannelSubscribeFailed {
        /// Channel name.
        channel: String,
        /// Why the call failed.
        reason: String,
    },

    /// Channel unsubscription failed.
    #[error("unsubscribe from channel {channel} failed: {reason}")]
    ChannelUnsubscribeFailed {
        /// Channel name.
        channel: String,
        /// Why the call failed.
        reason: String,
    },

    /// Setting the user token failed.
    #[error("set user token failed: {0}")]
    SetUserTokenFailed(String),

    /// Reading or writing device key/value data failed.
    #[error("device data access for key {key} failed: {reason}")]
    DeviceDataFailed {
        /// The key being read or written.
        key: String,
        /// Why the call failed.
        reason: String,
    },

    /// Sending a message to another user failed.
    #[error("send message to {user_token} failed: {reason}")]
    SendMessageFailed {
        /// Recipient user token.
        user_token: String,
        /// Why the call failed.
        reason: String,
    },

    /// The server response did not match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
