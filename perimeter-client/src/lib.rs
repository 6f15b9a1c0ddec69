//! # perimeter-client
//!
//! Client library for the Perimeter location-aware engagement SDK.
//!
//! This is the crate host applications depend on. It wires the pure geo
//! engine from `perimeter-core` to real I/O:
//!
//! ```text
//! Platform callbacks → LocationSession → GeoEngine (pure)
//!                            ↓ actions
//!                    EventBus + ApiClient → Network
//! ```
//!
//! ## Features
//!
//! - **Pluggable API client**: JSON-RPC style [`ApiClient`] trait with a
//!   reqwest-backed [`RestApiClient`] and a [`MockApiClient`] for tests
//! - **Pure state machine**: all occupancy logic lives in `perimeter-core`
//! - **Typed event bus**: broadcast channel of [`LocationEvent`]s
//! - **Thin CRUD facade**: [`Sdk`] for registration, device data,
//!   channels, and message fetches
//!
//! ## Example
//!
//! ```ignore
//! use perimeter_client::{GeoConfig, LocationAuthorization, LocationSession,
//!     MonitoringMode, RestApiClient, SdkConfig};
//! use std::sync::Arc;
//!
//! let config = SdkConfig::new("https://api.example.com/v1", "app-id", "api-key");
//! let api = Arc::new(RestApiClient::new(config.clone())?);
//! let session = LocationSession::new(api, &GeoConfig::default());
//!
//! let mut events = session.subscribe();
//! session.start_monitoring(
//!     LocationAuthorization::Always,
//!     MonitoringMode::Background,
//!     None,
//! ).await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod events;
pub mod sdk;
pub mod session;

pub use api::{ApiClient, ApiError, MockApiClient, RestApiClient};
pub use config::{ConfigError, SdkConfig};
pub use events::EventBus;
pub use perimeter_core::{GeoConfig, LocationEvent};
pub use sdk::Sdk;
pub use session::{LocationAuthorization, LocationSession, MonitoringMode};
