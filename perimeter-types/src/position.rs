//! Raw samples from the platform positioning subsystem.
//!
//! [`Position`] is a GPS-style fix; [`RangingReading`] is a beacon ranging
//! callback. Both arrive asynchronously and are serialized onto the geo
//! engine by the client layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mean earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees, south negative.
    pub latitude: f64,
    /// Longitude in decimal degrees, west negative.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another coordinate in meters (haversine).
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

/// A raw position update from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Where the device was.
    pub coordinates: Coordinates,
    /// When the fix was taken, epoch milliseconds.
    pub timestamp_ms: u64,
    /// Reported horizontal accuracy in meters.
    pub accuracy_m: f64,
}

impl Position {
    /// Create a position sample.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64, accuracy_m: f64) -> Self {
        Self {
            coordinates: Coordinates::new(latitude, longitude),
            timestamp_ms,
            accuracy_m,
        }
    }

    /// Great-circle distance to another position in meters.
    pub fn distance_m(&self, other: &Position) -> f64 {
        self.coordinates.distance_m(&other.coordinates)
    }
}

/// Proximity classification from beacon ranging.
///
/// Ordered nearest-first: `Immediate < Near < Far < Unknown`. A beacon is
/// occupied when its latest reading is at or nearer than its configured
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proximity {
    /// Within a meter or so of the beacon.
    Immediate,
    /// Within a few meters.
    Near,
    /// Detectable but distant.
    Far,
    /// Ranging produced no usable classification.
    Unknown,
}

impl Proximity {
    /// Rank for nearness comparison; lower is nearer.
    fn rank(self) -> u8 {
        match self {
            Proximity::Immediate => 0,
            Proximity::Near => 1,
            Proximity::Far => 2,
            Proximity::Unknown => 3,
        }
    }

    /// True when this reading is at or nearer than `threshold`.
    ///
    /// An `Unknown` reading is never within any threshold.
    pub fn is_within(self, threshold: Proximity) -> bool {
        self != Proximity::Unknown && self.rank() <= threshold.rank()
    }
}

/// A beacon ranging update from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangingReading {
    /// Beacon region UUID.
    pub uuid: Uuid,
    /// Beacon major value.
    pub major: u16,
    /// Beacon minor value.
    pub minor: u16,
    /// Proximity classification for this reading.
    pub proximity: Proximity,
    /// When the reading was taken, epoch milliseconds.
    pub timestamp_ms: u64,
}
