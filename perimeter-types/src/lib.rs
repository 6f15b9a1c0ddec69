//! # perimeter-types
//!
//! Domain and wire types for the Perimeter location SDK.
//!
//! This crate provides the foundational types used across all Perimeter
//! crates:
//! - [`LocationId`], [`DeviceToken`] - Identity types
//! - [`Coordinates`], [`Position`], [`RangingReading`] - Raw samples from
//!   the platform positioning subsystem
//! - [`Location`] - A monitored point of interest with its occupancy state
//! - [`LocationRecord`], [`LocationEventPayload`] - Server wire payloads
//! - [`Message`] - A push/pull engagement message
//! - [`SdkError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod location;
mod message;
mod position;
mod wire;

pub use error::SdkError;
pub use ids::{DeviceToken, LocationId};
pub use location::{Location, LocationKind, LocationState};
pub use message::Message;
pub use position::{Coordinates, Position, Proximity, RangingReading};
pub use wire::{LocationEventPayload, LocationRecord, LocationKindTag};
