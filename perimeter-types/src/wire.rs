//! Server wire payloads.
//!
//! These mirror the JSON the service sends and accepts. Records are flat:
//! kind-specific fields are optional and validated when a record is turned
//! into a [`Location`](crate::Location).

use crate::position::{Position, Proximity};
use crate::{LocationId, LocationState};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind discriminator carried on the wire and in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKindTag {
    /// Plain coordinate.
    Coordinate,
    /// Circular geofence.
    Geofence,
    /// Beacon.
    Beacon,
}

impl std::fmt::Display for LocationKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LocationKindTag::Coordinate => "coordinate",
            LocationKindTag::Geofence => "geofence",
            LocationKindTag::Beacon => "beacon",
        };
        write!(f, "{s}")
    }
}

/// One entry of a `location.fetch` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Server-assigned identifier.
    pub id: LocationId,
    /// Human-readable name.
    pub name: String,
    /// Kind discriminator.
    pub kind: LocationKindTag,
    /// Latitude in decimal degrees.
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees.
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Geofence radius in meters; geofences only.
    #[serde(rename = "radius", default, skip_serializing_if = "Option::is_none")]
    pub radius_m: Option<f64>,
    /// Beacon region UUID; beacons only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon_uuid: Option<Uuid>,
    /// Beacon major value; beacons only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon_major: Option<u16>,
    /// Beacon minor value; beacons only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beacon_minor: Option<u16>,
    /// Proximity threshold for beacon occupancy; beacons only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity_threshold: Option<Proximity>,
    /// Minimum continuous-inside seconds before a dwell event.
    #[serde(rename = "dwell_time", default, skip_serializing_if = "Option::is_none")]
    pub dwell_time_s: Option<u64>,
}

/// Body of a location transition `event.post`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEventPayload {
    /// Which location transitioned.
    pub location_id: LocationId,
    /// The new occupancy state.
    pub state: LocationState,
    /// When the transition was observed, epoch milliseconds.
    pub timestamp_ms: u64,
    /// Device position at the transition, when one was involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}
