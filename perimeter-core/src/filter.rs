//! Battery and bandwidth gates in front of the geo engine.
//!
//! Raw position samples arrive far more often than monitoring needs. The
//! [`SampleFilter`] drops samples that moved too little too recently, and
//! separately decides when the device has drifted far enough from the last
//! monitored-set refresh that the server should be asked again.

use perimeter_types::Position;
use std::time::Duration;

/// Filter thresholds and engine tuning, all independently settable.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoConfig {
    /// Samples closer than this to the last accepted sample are throttled
    /// (meters).
    pub update_filter_m: f64,
    /// "Near" radius for bare coordinate locations (meters).
    pub event_filter_m: f64,
    /// Drifting farther than this from the last sync position triggers a
    /// monitored-set refresh (meters).
    pub sync_filter_m: f64,
    /// Minimum interval between accepted samples, bounding wake frequency.
    pub update_interval: Duration,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            update_filter_m: 50.0,
            event_filter_m: 100.0,
            sync_filter_m: 400.0,
            update_interval: Duration::from_secs(60),
        }
    }
}

/// The distance/interval gates applied to every raw sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFilter {
    update_filter_m: f64,
    sync_filter_m: f64,
    update_interval: Duration,
}

impl SampleFilter {
    /// Build a filter from config thresholds.
    pub fn new(config: &GeoConfig) -> Self {
        Self {
            update_filter_m: config.update_filter_m,
            sync_filter_m: config.sync_filter_m,
            update_interval: config.update_interval,
        }
    }

    /// Decide whether a raw sample is worth processing at all.
    ///
    /// A sample strictly closer than the update filter to the last accepted
    /// sample, arriving before the update interval has elapsed, is dropped.
    /// Enough movement or enough elapsed time each independently readmit
    /// samples; the first sample is always processed.
    pub fn should_process(&self, new: &Position, last: Option<&Position>) -> bool {
        let Some(last) = last else {
            return true;
        };

        let moved_enough = new.distance_m(last) >= self.update_filter_m;
        let elapsed_ms = new.timestamp_ms.saturating_sub(last.timestamp_ms);
        let waited_enough = elapsed_ms >= self.update_interval.as_millis() as u64;

        moved_enough || waited_enough
    }

    /// Decide whether the monitored set should be refreshed from the server
    /// before classifying this sample.
    ///
    /// Controls remote refresh only, never local processing.
    pub fn needs_sync(&self, new: &Position, last_sync: Option<&Position>) -> bool {
        match last_sync {
            None => true,
            Some(last) => new.distance_m(last) > self.sync_filter_m,
        }
    }
}
