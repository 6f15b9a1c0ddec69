//! # perimeter-core
//!
//! Pure logic for the Perimeter SDK (no I/O, instant tests).
//!
//! This crate implements the sample filter and the geo engine state
//! machine without any network or platform I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce
//! output without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (network calls, platform callbacks, event broadcast) is
//! performed by `perimeter-client`, which interprets the actions produced
//! by the engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod events;
pub mod filter;

pub use engine::{GeoAction, GeoEngine, GeoInput};
pub use events::LocationEvent;
pub use filter::{GeoConfig, SampleFilter};
