//! Events emitted to the application layer.

use perimeter_types::{Location, Position};

/// Typed events surfaced on the event bus.
///
/// Transition events carry a snapshot of the location with its new state
/// already applied.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// Device entered a location (no dwell time configured).
    Enter(Location),
    /// Device left a location it was inside (or pending inside).
    Exit(Location),
    /// Device stayed inside a location for its full dwell time.
    Dwell(Location),
    /// A raw position sample was accepted past the filter.
    Update(Position),
}

impl LocationEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            LocationEvent::Enter(_) => "enter",
            LocationEvent::Exit(_) => "exit",
            LocationEvent::Dwell(_) => "dwell",
            LocationEvent::Update(_) => "update",
        }
    }
}
