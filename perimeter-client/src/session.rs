//! The monitoring session: wires the pure geo engine to real I/O.
//!
//! Platform callbacks (position fixes, beacon ranging, region hints) enter
//! through one method each, are serialized onto the engine behind a single
//! mutex, and the actions the engine returns are executed here: events go
//! out on the broadcast bus, transition posts and nearby fetches go out on
//! the API client as spawned tasks so network latency never blocks sample
//! processing.

use crate::api::ApiClient;
use crate::events::EventBus;
use perimeter_core::{GeoAction, GeoConfig, GeoEngine, GeoInput, LocationEvent};
use perimeter_types::{
    Location, LocationId, LocationRecord, Position, RangingReading, SdkError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Platform location permission state, as reported by the host layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationAuthorization {
    /// The user refused location access.
    Denied,
    /// Access granted while the app is in use.
    WhenInUse,
    /// Access granted at all times.
    Always,
}

/// How much of the device's life the session should watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringMode {
    /// Monitor only while the app is foregrounded.
    Foreground,
    /// Monitor continuously; requires `Always` authorization.
    Background,
}

/// A location monitoring session over an API client.
///
/// Cheap to clone; clones share the same engine and bus.
pub struct LocationSession<C: ApiClient + 'static> {
    inner: Arc<SessionInner<C>>,
}

impl<C: ApiClient + 'static> Clone for LocationSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<C> {
    api: Arc<C>,
    engine: Mutex<GeoEngine>,
    bus: EventBus,
}

impl<C: ApiClient + 'static> LocationSession<C> {
    /// Create a session over the given API client.
    pub fn new(api: Arc<C>, config: &GeoConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                engine: Mutex::new(GeoEngine::new(config)),
                bus: EventBus::new(),
            }),
        }
    }

    /// Subscribe to location events.
    pub fn subscribe(&self) -> broadcast::Receiver<LocationEvent> {
        self.inner.bus.subscribe()
    }

    /// Start monitoring.
    ///
    /// Performs the initial nearby fetch (seeded by `seed`, when the
    /// platform has a last known fix) before returning, so the monitored
    /// set is in place before any sample processing. A fetch failure is
    /// returned to the caller but leaves the session active; the next
    /// accepted sample retries the refresh.
    pub async fn start_monitoring(
        &self,
        authorization: LocationAuthorization,
        mode: MonitoringMode,
        seed: Option<Position>,
    ) -> Result<(), SdkError> {
        match (authorization, mode) {
            (LocationAuthorization::Denied, _) => return Err(SdkError::LocationAccessDenied),
            (LocationAuthorization::WhenInUse, MonitoringMode::Background) => {
                return Err(SdkError::LocationAccessInsufficient)
            }
            _ => {}
        }

        let actions = self.inner.engine.lock().await.handle(GeoInput::Start { seed });
        for action in actions {
            match action {
                GeoAction::FetchNearby {
                    position,
                    generation,
                } => {
                    // Bootstrap fetch runs to completion so the monitored
                    // set is seeded before samples arrive.
                    self.inner.run_fetch(position, generation).await?;
                }
                other => self.inner.execute(vec![other]),
            }
        }
        Ok(())
    }

    /// Stop monitoring. Clears the monitored set and classification state;
    /// no transition events fire, and results of calls still in flight for
    /// the stopped session are dropped by the generation guard.
    pub async fn stop_monitoring(&self) {
        let actions = self.inner.engine.lock().await.handle(GeoInput::Stop);
        self.inner.execute(actions);
    }

    /// Feed a raw position update from the platform.
    pub async fn handle_position(&self, position: Position) {
        self.dispatch(GeoInput::Sample(position)).await;
    }

    /// Feed a beacon ranging update from the platform.
    pub async fn handle_ranging(&self, reading: RangingReading) {
        self.dispatch(GeoInput::Ranging(reading)).await;
    }

    /// Feed a platform region enter/exit notification. Used as a wake
    /// hint; the engine re-verifies against its latest observations.
    pub async fn handle_region_hint(&self, location_id: LocationId, entered: bool) {
        self.dispatch(GeoInput::RegionHint {
            location_id,
            entered,
        })
        .await;
    }

    /// Locally enroll a location for monitoring.
    pub async fn monitor_location(&self, location: Location) {
        self.dispatch(GeoInput::Monitor(location)).await;
    }

    /// Stop monitoring a single location.
    pub async fn stop_monitoring_location(&self, id: LocationId) {
        self.dispatch(GeoInput::Unmonitor(id)).await;
    }

    /// Whether a monitoring session is active.
    pub async fn is_monitoring(&self) -> bool {
        self.inner.engine.lock().await.is_monitoring()
    }

    /// Snapshot of the monitored locations, ordered by id.
    pub async fn monitored_locations(&self) -> Vec<Location> {
        self.inner.engine.lock().await.locations()
    }

    async fn dispatch(&self, input: GeoInput) {
        let actions = self.inner.engine.lock().await.handle(input);
        self.inner.execute(actions);
    }
}

impl<C: ApiClient + 'static> SessionInner<C> {
    /// Execute engine actions. Emissions are synchronous; network calls
    /// are spawned so they never block the caller.
    fn execute(self: &Arc<Self>, actions: Vec<GeoAction>) {
        for action in actions {
            match action {
                GeoAction::Emit(event) => {
                    tracing::debug!("emitting {} event", event.name());
                    self.bus.emit(event);
                }
                GeoAction::PostEvent {
                    name,
                    payload,
                    retry,
                } => {
                    let api = Arc::clone(&self.api);
                    tokio::spawn(async move {
                        let params = json!({ "type": name, "data": payload });
                        if let Err(err) = api.invoke("event.post", params, retry).await {
                            // Best-effort: the local transition is already
                            // authoritative.
                            tracing::warn!("post of {name} failed: {err}");
                        }
                    });
                }
                GeoAction::FetchNearby {
                    position,
                    generation,
                } => {
                    let inner = Arc::clone(self);
                    tokio::spawn(async move {
                        if let Err(err) = inner.run_fetch(position, generation).await {
                            tracing::warn!("nearby refresh failed: {err}");
                        }
                    });
                }
            }
        }
    }

    /// Fetch nearby locations and feed the result back into the engine
    /// tagged with the generation the fetch was issued under.
    async fn run_fetch(
        self: &Arc<Self>,
        position: Position,
        generation: u64,
    ) -> Result<(), SdkError> {
        match self.fetch_nearby(position).await {
            Ok(locations) => {
                let actions = self.engine.lock().await.handle(GeoInput::SyncCompleted {
                    generation,
                    position,
                    locations,
                });
                self.execute(actions);
                Ok(())
            }
            Err(err) => {
                let actions = self
                    .engine
                    .lock()
                    .await
                    .handle(GeoInput::SyncFailed { generation });
                self.execute(actions);
                Err(err)
            }
        }
    }

    async fn fetch_nearby(&self, position: Position) -> Result<Vec<Location>, SdkError> {
        let params = json!({
            "lat": position.coordinates.latitude,
            "lng": position.coordinates.longitude,
        });
        let value = self
            .api
            .invoke("location.fetch", params, true)
            .await
            .map_err(|e| SdkError::LocationFetchFailed(e.to_string()))?;
        parse_locations(value)
    }
}

/// Parse a `location.fetch` response: an array of records, or null when
/// nothing is nearby. Malformed records are skipped, not fatal.
fn parse_locations(value: Value) -> Result<Vec<Location>, SdkError> {
    if value.is_null() {
        return Ok(vec![]);
    }
    let records: Vec<LocationRecord> =
        serde_json::from_value(value).map_err(|e| SdkError::InvalidResponse(e.to_string()))?;
    Ok(records
        .into_iter()
        .filter_map(|record| match Location::try_from(record) {
            Ok(location) => Some(location),
            Err(err) => {
                tracing::warn!("skipping malformed location record: {err}");
                None
            }
        })
        .collect())
}
