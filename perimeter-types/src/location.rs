//! The monitored location entity.
//!
//! A [`Location`] is a point of interest the server asked the device to
//! watch: a bare coordinate, a circular geofence, or a beacon. Its
//! geometry and kind are immutable once built from a wire record; its
//! occupancy [`state`](Location::state) is owned and driven by the geo
//! engine.

use crate::position::{Coordinates, Proximity, RangingReading};
use crate::wire::{LocationKindTag, LocationRecord};
use crate::{LocationId, SdkError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// What kind of point of interest this is, with kind-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationKind {
    /// A plain coordinate; "near" is decided by the engine-level event
    /// filter radius, not a hard boundary.
    Coordinate,
    /// A circular geofence around the coordinates.
    Geofence {
        /// Boundary radius in meters.
        radius_m: f64,
    },
    /// A beacon; occupancy comes from ranging, never from raw position.
    Beacon {
        /// Beacon region UUID.
        uuid: Uuid,
        /// Beacon major value.
        major: u16,
        /// Beacon minor value.
        minor: u16,
        /// Readings at or nearer than this count as inside.
        proximity_threshold: Proximity,
    },
}

impl LocationKind {
    /// Short tag for events and logs.
    pub fn tag(&self) -> LocationKindTag {
        match self {
            LocationKind::Coordinate => LocationKindTag::Coordinate,
            LocationKind::Geofence { .. } => LocationKindTag::Geofence,
            LocationKind::Beacon { .. } => LocationKindTag::Beacon,
        }
    }
}

/// Occupancy state of a monitored location.
///
/// Transitions only along `Outside → Pending → Inside|Dwell` and
/// `any → Outside`; `Unknown` is the pre-observation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationState {
    /// No sample has classified this location yet.
    Unknown,
    /// Last classification was outside the boundary.
    Outside,
    /// Inside the boundary, waiting out the dwell time.
    Pending,
    /// Inside the boundary (no dwell time configured).
    Inside,
    /// Inside the boundary continuously for at least the dwell time.
    Dwell,
}

impl LocationState {
    /// True for any of the inside-class states.
    pub fn is_inside(self) -> bool {
        matches!(
            self,
            LocationState::Pending | LocationState::Inside | LocationState::Dwell
        )
    }
}

/// A monitored point of interest plus its occupancy state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Server-assigned identifier.
    pub id: LocationId,
    /// Human-readable name from the server.
    pub name: String,
    /// Kind tag with kind-specific geometry; immutable after creation.
    pub kind: LocationKind,
    /// Center (or beacon registration) coordinates.
    pub coordinates: Coordinates,
    /// Minimum continuous-inside duration before a Dwell transition.
    pub dwell_time: Duration,
    /// Current occupancy state.
    pub state: LocationState,
    /// Last computed distance from the device position, meters.
    pub distance_m: Option<f64>,
    /// Most recent ranging reading (beacons only).
    pub last_ranging: Option<RangingReading>,
    /// Epoch-ms when the current inside streak began; dwell clock.
    pub entered_at_ms: Option<u64>,
}

impl Location {
    /// Build an unobserved location.
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        kind: LocationKind,
        coordinates: Coordinates,
        dwell_time: Duration,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            coordinates,
            dwell_time,
            state: LocationState::Unknown,
            distance_m: None,
            last_ranging: None,
            entered_at_ms: None,
        }
    }

    /// True when this is a beacon matching the given ranging identity.
    pub fn matches_beacon(&self, uuid: &Uuid, major: u16, minor: u16) -> bool {
        match &self.kind {
            LocationKind::Beacon {
                uuid: u,
                major: maj,
                minor: min,
                ..
            } => u == uuid && *maj == major && *min == minor,
            _ => false,
        }
    }

    /// Carry occupancy forward from a previous incarnation of the same
    /// location after a monitored-set refresh, so a sync does not replay
    /// enter events for regions the device never left.
    pub fn carry_occupancy_from(&mut self, previous: &Location) {
        self.state = previous.state;
        self.distance_m = previous.distance_m;
        self.last_ranging = previous.last_ranging;
        self.entered_at_ms = previous.entered_at_ms;
    }
}

impl TryFrom<LocationRecord> for Location {
    type Error = SdkError;

    fn try_from(record: LocationRecord) -> Result<Self, Self::Error> {
        let kind = match record.kind {
            LocationKindTag::Coordinate => LocationKind::Coordinate,
            LocationKindTag::Geofence => LocationKind::Geofence {
                radius_m: record.radius_m.ok_or_else(|| {
                    SdkError::InvalidResponse(format!(
                        "geofence {} missing radius",
                        record.id
                    ))
                })?,
            },
            LocationKindTag::Beacon => LocationKind::Beacon {
                uuid: record.beacon_uuid.ok_or_else(|| {
                    SdkError::InvalidResponse(format!("beacon {} missing uuid", record.id))
                })?,
                major: record.beacon_major.unwrap_or(0),
                minor: record.beacon_minor.unwrap_or(0),
                proximity_threshold: record.proximity_threshold.unwrap_or(Proximity::Near),
            },
        };

        Ok(Location::new(
            record.id,
            record.name,
            kind,
            Coordinates::new(record.latitude, record.longitude),
            Duration::from_secs(record.dwell_time_s.unwrap_or(0)),
        ))
    }
}
