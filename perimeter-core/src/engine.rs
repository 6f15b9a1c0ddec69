//! Geo engine state machine - NO I/O, just state transitions.
//!
//! The engine owns the set of monitored locations and consumes one input
//! at a time: raw samples, ranging readings, platform region hints, and
//! sync results. Each input produces a list of [`GeoAction`]s for the
//! client to execute. The engine never performs I/O itself; a remote
//! failure can therefore never corrupt local occupancy state.
//!
//! A generation counter guards against stale sessions: start and stop each
//! bump it, and sync results carry the generation of the fetch that
//! produced them. Results from a prior generation are dropped without
//! touching state.

use crate::events::LocationEvent;
use crate::filter::{GeoConfig, SampleFilter};
use perimeter_types::{
    Location, LocationEventPayload, LocationId, LocationKind, LocationState, Position,
    RangingReading,
};
use std::collections::HashMap;

/// Server event name posted on enter-class transitions.
pub const EVENT_LOCATION_ENTER: &str = "location.enter";
/// Server event name posted on exit transitions.
pub const EVENT_LOCATION_EXIT: &str = "location.exit";

/// Inputs consumed by the engine, one at a time, fully serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoInput {
    /// Begin a monitoring session, optionally seeded with a last known fix.
    Start {
        /// Position used to seed the initial nearby fetch.
        seed: Option<Position>,
    },
    /// End the monitoring session, discarding all classification state.
    Stop,
    /// A raw position update from the platform.
    Sample(Position),
    /// A beacon ranging update from the platform.
    Ranging(RangingReading),
    /// A platform region enter/exit notification. Used as a wake hint and
    /// re-verified against the latest fix, never trusted blindly.
    RegionHint {
        /// Which monitored location the platform flagged.
        location_id: LocationId,
        /// What the platform claims happened.
        entered: bool,
    },
    /// Locally enroll a location for monitoring.
    Monitor(Location),
    /// Stop monitoring a single location. No transition events fire.
    Unmonitor(LocationId),
    /// A nearby fetch resolved with a fresh monitored set.
    SyncCompleted {
        /// Generation the fetch was issued under.
        generation: u64,
        /// Position the fetch was seeded with.
        position: Position,
        /// The replacement monitored set.
        locations: Vec<Location>,
    },
    /// A nearby fetch failed; classification proceeds on the old set.
    SyncFailed {
        /// Generation the fetch was issued under.
        generation: u64,
    },
}

/// Actions to be executed by the client layer.
///
/// These are instructions, not side effects. The client interprets them
/// and performs the actual I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoAction {
    /// Surface an event to the application via the event bus.
    Emit(LocationEvent),
    /// Best-effort post of a transition to the server. Posting failure
    /// never rolls back the local transition.
    PostEvent {
        /// Server event name.
        name: String,
        /// JSON body for the post.
        payload: serde_json::Value,
        /// Whether the API client may retry transient failures.
        retry: bool,
    },
    /// Ask the server for the locations near `position`.
    FetchNearby {
        /// Position to search around.
        position: Position,
        /// Generation to tag the eventual sync result with.
        generation: u64,
    },
}

/// The geo engine: monitored set, filter gates, and the transition table.
#[derive(Debug, Clone)]
pub struct GeoEngine {
    filter: SampleFilter,
    event_filter_m: f64,
    monitored: HashMap<LocationId, Location>,
    last_raw: Option<Position>,
    last_sync: Option<Position>,
    pending_sample: Option<Position>,
    generation: u64,
    monitoring: bool,
}

impl GeoEngine {
    /// Create an engine with the given filter thresholds. Monitoring is
    /// inactive until a [`GeoInput::Start`] is processed.
    pub fn new(config: &GeoConfig) -> Self {
        Self {
            filter: SampleFilter::new(config),
            event_filter_m: config.event_filter_m,
            monitored: HashMap::new(),
            last_raw: None,
            last_sync: None,
            pending_sample: None,
            generation: 0,
            monitoring: false,
        }
    }

    /// Process one input and return the actions it produced.
    pub fn handle(&mut self, input: GeoInput) -> Vec<GeoAction> {
        match input {
            GeoInput::Start { seed } => self.start(seed),
            GeoInput::Stop => self.stop(),
            GeoInput::Sample(position) => self.sample(position),
            GeoInput::Ranging(reading) => self.ranging(reading),
            GeoInput::RegionHint {
                location_id,
                entered,
            } => self.region_hint(&location_id, entered),
            GeoInput::Monitor(location) => {
                if self.monitoring {
                    self.monitored.insert(location.id.clone(), location);
                }
                vec![]
            }
            GeoInput::Unmonitor(id) => {
                self.monitored.remove(&id);
                vec![]
            }
            GeoInput::SyncCompleted {
                generation,
                position,
                locations,
            } => self.sync_completed(generation, position, locations),
            GeoInput::SyncFailed { generation } => self.sync_failed(generation),
        }
    }

    /// Whether a monitoring session is active.
    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// The current session generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The most recent sample accepted past the filter.
    pub fn last_raw_position(&self) -> Option<&Position> {
        self.last_raw.as_ref()
    }

    /// The position at which the monitored set was last refreshed.
    pub fn last_sync_position(&self) -> Option<&Position> {
        self.last_sync.as_ref()
    }

    /// Snapshot of the monitored locations, ordered by id.
    pub fn locations(&self) -> Vec<Location> {
        let mut locations: Vec<Location> = self.monitored.values().cloned().collect();
        locations.sort_by(|a, b| a.id.cmp(&b.id));
        locations
    }

    /// Look up a monitored location by id.
    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.monitored.get(id)
    }

    fn start(&mut self, seed: Option<Position>) -> Vec<GeoAction> {
        self.generation += 1;
        self.monitoring = true;
        self.monitored.clear();
        self.last_raw = None;
        self.last_sync = None;
        self.pending_sample = None;

        match seed {
            Some(position) => vec![GeoAction::FetchNearby {
                position,
                generation: self.generation,
            }],
            // No known fix; the first accepted sample triggers the fetch.
            None => vec![],
        }
    }

    fn stop(&mut self) -> Vec<GeoAction> {
        self.generation += 1;
        self.monitoring = false;
        self.monitored.clear();
        self.last_raw = None;
        self.last_sync = None;
        self.pending_sample = None;
        vec![]
    }

    fn sample(&mut self, position: Position) -> Vec<GeoAction> {
        if !self.monitoring {
            return vec![];
        }
        if !self.filter.should_process(&position, self.last_raw.as_ref()) {
            return vec![];
        }

        if self.pending_sample.is_some() {
            // A refresh is already in flight; the freshest sample will be
            // classified when it resolves.
            self.pending_sample = Some(position);
            return vec![];
        }

        if self.filter.needs_sync(&position, self.last_sync.as_ref()) {
            self.pending_sample = Some(position);
            return vec![GeoAction::FetchNearby {
                position,
                generation: self.generation,
            }];
        }

        self.accept_sample(position)
    }

    fn accept_sample(&mut self, position: Position) -> Vec<GeoAction> {
        self.last_raw = Some(position);
        let mut actions = vec![GeoAction::Emit(LocationEvent::Update(position))];

        for id in self.sorted_ids() {
            let Some(location) = self.monitored.get_mut(&id) else {
                continue;
            };
            let distance = position.coordinates.distance_m(&location.coordinates);
            location.distance_m = Some(distance);

            let inside = match &location.kind {
                LocationKind::Geofence { radius_m } => distance <= *radius_m,
                LocationKind::Coordinate => distance <= self.event_filter_m,
                // Beacons are classified by ranging, never by raw position.
                LocationKind::Beacon { .. } => continue,
            };
            apply_transition(
                location,
                inside,
                position.timestamp_ms,
                Some(position),
                &mut actions,
            );
        }

        actions
    }

    fn ranging(&mut self, reading: RangingReading) -> Vec<GeoAction> {
        if !self.monitoring {
            return vec![];
        }

        let mut actions = vec![];
        for id in self.sorted_ids() {
            let Some(location) = self.monitored.get_mut(&id) else {
                continue;
            };
            if !location.matches_beacon(&reading.uuid, reading.major, reading.minor) {
                continue;
            }
            location.last_ranging = Some(reading);

            let inside = match &location.kind {
                LocationKind::Beacon {
                    proximity_threshold,
                    ..
                } => reading.proximity.is_within(*proximity_threshold),
                _ => continue,
            };
            apply_transition(location, inside, reading.timestamp_ms, None, &mut actions);
        }

        actions
    }

    fn region_hint(&mut self, location_id: &LocationId, _entered: bool) -> Vec<GeoAction> {
        if !self.monitoring {
            return vec![];
        }

        // Platform region events can be coarse; re-verify against what we
        // have actually observed instead of trusting the hint.
        let last_raw = self.last_raw;
        let event_filter_m = self.event_filter_m;
        let Some(location) = self.monitored.get_mut(location_id) else {
            return vec![];
        };

        let mut actions = vec![];
        match &location.kind {
            LocationKind::Beacon {
                proximity_threshold,
                ..
            } => {
                if let Some(reading) = location.last_ranging {
                    let inside = reading.proximity.is_within(*proximity_threshold);
                    apply_transition(location, inside, reading.timestamp_ms, None, &mut actions);
                }
            }
            LocationKind::Geofence { radius_m } => {
                if let Some(position) = last_raw {
                    let distance = position.coordinates.distance_m(&location.coordinates);
                    location.distance_m = Some(distance);
                    let inside = distance <= *radius_m;
                    apply_transition(
                        location,
                        inside,
                        position.timestamp_ms,
                        Some(position),
                        &mut actions,
                    );
                }
            }
            LocationKind::Coordinate => {
                if let Some(position) = last_raw {
                    let distance = position.coordinates.distance_m(&location.coordinates);
                    location.distance_m = Some(distance);
                    let inside = distance <= event_filter_m;
                    apply_transition(
                        location,
                        inside,
                        position.timestamp_ms,
                        Some(position),
                        &mut actions,
                    );
                }
            }
        }

        actions
    }

    fn sync_completed(
        &mut self,
        generation: u64,
        position: Position,
        locations: Vec<Location>,
    ) -> Vec<GeoAction> {
        if !self.monitoring || generation != self.generation {
            // Result of a fetch issued by a prior session.
            return vec![];
        }

        let previous = std::mem::take(&mut self.monitored);
        for mut location in locations {
            if let Some(old) = previous.get(&location.id) {
                location.carry_occupancy_from(old);
            }
            self.monitored.insert(location.id.clone(), location);
        }
        self.last_sync = Some(position);

        match self.pending_sample.take() {
            Some(sample) => self.accept_sample(sample),
            None => vec![],
        }
    }

    fn sync_failed(&mut self, generation: u64) -> Vec<GeoAction> {
        if !self.monitoring || generation != self.generation {
            return vec![];
        }
        // The refresh failed; classify the deferred sample against the set
        // we already have so sample processing never stalls.
        match self.pending_sample.take() {
            Some(sample) => self.accept_sample(sample),
            None => vec![],
        }
    }

    fn sorted_ids(&self) -> Vec<LocationId> {
        let mut ids: Vec<LocationId> = self.monitored.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Apply the transition table to one location.
///
/// | Current | Condition | Next |
/// |---|---|---|
/// | Unknown/Outside | inside, dwell configured | Pending |
/// | Unknown/Outside | inside, no dwell | Inside (enter event) |
/// | Pending | inside, streak ≥ dwell_time | Dwell (dwell event) |
/// | Pending/Inside/Dwell | outside | Outside (exit event) |
///
/// Exit is immediate: false exits are cheaper than missed exits for
/// notification purposes. The Pending buffer absorbs boundary flapping on
/// the way in.
fn apply_transition(
    location: &mut Location,
    inside: bool,
    now_ms: u64,
    position: Option<Position>,
    actions: &mut Vec<GeoAction>,
) {
    use LocationState::*;

    match (location.state, inside) {
        (Unknown | Outside, true) => {
            location.entered_at_ms = Some(now_ms);
            if location.dwell_time.is_zero() {
                location.state = Inside;
                actions.push(GeoAction::Emit(LocationEvent::Enter(location.clone())));
                actions.push(post_action(location, EVENT_LOCATION_ENTER, now_ms, position));
            } else {
                location.state = Pending;
            }
        }
        (Pending, true) => {
            let entered_at = location.entered_at_ms.unwrap_or(now_ms);
            let streak_ms = now_ms.saturating_sub(entered_at);
            if streak_ms >= location.dwell_time.as_millis() as u64 {
                location.state = Dwell;
                actions.push(GeoAction::Emit(LocationEvent::Dwell(location.clone())));
                // The server's notion of "entered" is dwell-confirmed.
                actions.push(post_action(location, EVENT_LOCATION_ENTER, now_ms, position));
            }
        }
        (Inside | Dwell, true) => {}
        (Pending | Inside | Dwell, false) => {
            location.state = Outside;
            location.entered_at_ms = None;
            actions.push(GeoAction::Emit(LocationEvent::Exit(location.clone())));
            actions.push(post_action(location, EVENT_LOCATION_EXIT, now_ms, position));
        }
        (Unknown, false) => {
            location.state = Outside;
        }
        (Outside, false) => {}
    }
}

fn post_action(
    location: &Location,
    name: &str,
    now_ms: u64,
    position: Option<Position>,
) -> GeoAction {
    let payload = LocationEventPayload {
        location_id: location.id.clone(),
        state: location.state,
        timestamp_ms: now_ms,
        position,
    };
    GeoAction::PostEvent {
        name: name.to_string(),
        payload: serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null),
        retry: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perimeter_types::{Coordinates, Proximity};
    use std::time::Duration;
    use uuid::Uuid;

    const MIN: u64 = 60_000;

    fn config() -> GeoConfig {
        GeoConfig {
            update_filter_m: 50.0,
            event_filter_m: 100.0,
            // Wide sync filter so transition tests never trip a refresh.
            sync_filter_m: 1_000_000.0,
            update_interval: Duration::from_secs(60),
        }
    }

    fn geofence(id: &str, dwell_s: u64) -> Location {
        Location::new(
            LocationId::new(id),
            "Store",
            LocationKind::Geofence { radius_m: 100.0 },
            Coordinates::new(40.0, -74.0),
            Duration::from_secs(dwell_s),
        )
    }

    fn beacon(id: &str) -> Location {
        Location::new(
            LocationId::new(id),
            "Register",
            LocationKind::Beacon {
                uuid: beacon_uuid(),
                major: 1,
                minor: 2,
                proximity_threshold: Proximity::Near,
            },
            Coordinates::new(40.0, -74.0),
            Duration::ZERO,
        )
    }

    fn beacon_uuid() -> Uuid {
        Uuid::parse_str("f7826da6-4fa2-4e98-8024-bc5b71e0893e").unwrap()
    }

    fn reading(proximity: Proximity, t_ms: u64) -> RangingReading {
        RangingReading {
            uuid: beacon_uuid(),
            major: 1,
            minor: 2,
            proximity,
            timestamp_ms: t_ms,
        }
    }

    /// ~50m from the geofence center.
    fn near_center(t_ms: u64) -> Position {
        Position::new(40.00045, -74.0, t_ms, 5.0)
    }

    /// ~55m from the center on the other axis; ~75m from `near_center`,
    /// so consecutive samples clear the update filter.
    fn near_center_b(t_ms: u64) -> Position {
        Position::new(40.0, -74.00065, t_ms, 5.0)
    }

    /// ~500m from the geofence center.
    fn far_from_center(t_ms: u64) -> Position {
        Position::new(40.0045, -74.0, t_ms, 5.0)
    }

    /// Engine with an active session and the given locations seeded.
    fn started(locations: Vec<Location>) -> GeoEngine {
        let mut engine = GeoEngine::new(&config());
        let seed = Position::new(40.0, -74.0, 0, 5.0);
        let actions = engine.handle(GeoInput::Start { seed: Some(seed) });
        assert!(matches!(actions[0], GeoAction::FetchNearby { .. }));
        engine.handle(GeoInput::SyncCompleted {
            generation: engine.generation(),
            position: seed,
            locations,
        });
        engine
    }

    fn emitted(actions: &[GeoAction]) -> Vec<&LocationEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                GeoAction::Emit(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    fn posts(actions: &[GeoAction]) -> Vec<(&str, bool)> {
        actions
            .iter()
            .filter_map(|a| match a {
                GeoAction::PostEvent { name, retry, .. } => Some((name.as_str(), *retry)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn start_with_seed_fetches_nearby_once() {
        let mut engine = GeoEngine::new(&config());
        let seed = Position::new(40.0, -74.0, 0, 5.0);
        let actions = engine.handle(GeoInput::Start { seed: Some(seed) });
        assert_eq!(actions.len(), 1);
        assert!(
            matches!(actions[0], GeoAction::FetchNearby { position, generation }
                if position == seed && generation == engine.generation())
        );
    }

    #[test]
    fn samples_ignored_when_not_monitoring() {
        let mut engine = GeoEngine::new(&config());
        assert!(engine.handle(GeoInput::Sample(near_center(0))).is_empty());
    }

    #[test]
    fn filtered_sample_produces_no_actions() {
        let mut engine = started(vec![geofence("loc-1", 0)]);
        engine.handle(GeoInput::Sample(near_center(MIN)));
        // ~11m and 1s later: under both gates.
        let actions = engine.handle(GeoInput::Sample(Position::new(
            40.00055,
            -74.0,
            MIN + 1_000,
            5.0,
        )));
        assert!(actions.is_empty());
    }

    #[test]
    fn geofence_dwell_scenario() {
        // Geofence radius 100m, dwell 60s, state Outside.
        let mut engine = started(vec![geofence("loc-a", 60)]);

        // Sample at 50m: Pending, no events.
        let actions = engine.handle(GeoInput::Sample(near_center(MIN)));
        assert_eq!(emitted(&actions).len(), 1); // the Update only
        assert!(posts(&actions).is_empty());
        let loc = engine.location(&LocationId::new("loc-a")).unwrap();
        assert_eq!(loc.state, LocationState::Pending);

        // 70s later, still 50m: Dwell, one dwell event, one best-effort
        // enter post.
        let actions = engine.handle(GeoInput::Sample(near_center(MIN + 70_000)));
        let events = emitted(&actions);
        assert!(events
            .iter()
            .any(|e| matches!(e, LocationEvent::Dwell(l) if l.state == LocationState::Dwell)));
        assert_eq!(posts(&actions), vec![(EVENT_LOCATION_ENTER, false)]);

        // 500m away: Outside, one exit event.
        let actions = engine.handle(GeoInput::Sample(far_from_center(MIN + 140_000)));
        let events = emitted(&actions);
        assert!(events.iter().any(|e| matches!(e, LocationEvent::Exit(_))));
        assert_eq!(posts(&actions), vec![(EVENT_LOCATION_EXIT, false)]);
        let loc = engine.location(&LocationId::new("loc-a")).unwrap();
        assert_eq!(loc.state, LocationState::Outside);
    }

    #[test]
    fn no_dwell_configured_enters_immediately() {
        let mut engine = started(vec![geofence("loc-a", 0)]);
        let actions = engine.handle(GeoInput::Sample(near_center(MIN)));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Enter(l) if l.state == LocationState::Inside)));
        assert_eq!(posts(&actions), vec![(EVENT_LOCATION_ENTER, false)]);
    }

    #[test]
    fn dwell_clock_resets_on_bounce() {
        let mut engine = started(vec![geofence("loc-a", 60)]);

        engine.handle(GeoInput::Sample(near_center(MIN)));
        // Bounce out after 30s, back in 30s later.
        engine.handle(GeoInput::Sample(far_from_center(MIN + 30_000)));
        engine.handle(GeoInput::Sample(near_center(MIN + 60_000)));

        // 59s of the new streak: still Pending.
        let actions = engine.handle(GeoInput::Sample(near_center_b(MIN + 119_000)));
        assert!(posts(&actions).is_empty());
        let loc = engine.location(&LocationId::new("loc-a")).unwrap();
        assert_eq!(loc.state, LocationState::Pending);

        // 62s of the new streak: Dwell.
        let actions = engine.handle(GeoInput::Sample(near_center(MIN + 122_000)));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Dwell(_))));
    }

    #[test]
    fn pending_exit_emits_exit_event() {
        let mut engine = started(vec![geofence("loc-a", 60)]);
        engine.handle(GeoInput::Sample(near_center(MIN)));
        let actions = engine.handle(GeoInput::Sample(far_from_center(MIN * 2)));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Exit(_))));
    }

    #[test]
    fn coordinate_inside_uses_event_filter_radius() {
        let coordinate = Location::new(
            LocationId::new("pt-1"),
            "Kiosk",
            LocationKind::Coordinate,
            Coordinates::new(40.0, -74.0),
            Duration::ZERO,
        );
        let mut engine = started(vec![coordinate]);

        // 50m < event_filter 100m: enter.
        let actions = engine.handle(GeoInput::Sample(near_center(MIN)));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Enter(_))));
    }

    #[test]
    fn beacon_flap_produces_enter_then_exit() {
        let mut engine = started(vec![beacon("bcn-1")]);

        let actions = engine.handle(GeoInput::Ranging(reading(Proximity::Near, 1_000)));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Enter(_))));

        let actions = engine.handle(GeoInput::Ranging(reading(Proximity::Far, 2_000)));
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Exit(_))));
    }

    #[test]
    fn beacons_ignore_raw_position() {
        let mut engine = started(vec![beacon("bcn-1")]);
        let actions = engine.handle(GeoInput::Sample(near_center(MIN)));
        // Update event only; the beacon gets a distance but no transition.
        assert_eq!(emitted(&actions).len(), 1);
        let loc = engine.location(&LocationId::new("bcn-1")).unwrap();
        assert_eq!(loc.state, LocationState::Unknown);
        assert!(loc.distance_m.is_some());
    }

    #[test]
    fn sample_past_sync_filter_defers_classification_behind_one_fetch() {
        let mut engine = GeoEngine::new(&GeoConfig::default());
        let seed = Position::new(40.0, -74.0, 0, 5.0);
        engine.handle(GeoInput::Start { seed: Some(seed) });
        engine.handle(GeoInput::SyncCompleted {
            generation: engine.generation(),
            position: seed,
            locations: vec![geofence("loc-a", 0)],
        });

        // ~500m from the sync position: past the 400m default sync filter.
        let sample = far_from_center(MIN);
        let actions = engine.handle(GeoInput::Sample(sample));
        let fetches: Vec<_> = actions
            .iter()
            .filter(|a| matches!(a, GeoAction::FetchNearby { .. }))
            .collect();
        assert_eq!(fetches.len(), 1);
        // Classification deferred: no update, no transitions yet.
        assert!(emitted(&actions).is_empty());

        // The refresh resolves; the stashed sample is classified against
        // the new set.
        let actions = engine.handle(GeoInput::SyncCompleted {
            generation: engine.generation(),
            position: sample,
            locations: vec![geofence("loc-b", 0)],
        });
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Update(_))));
        assert!(engine.location(&LocationId::new("loc-b")).is_some());
        assert!(engine.location(&LocationId::new("loc-a")).is_none());
    }

    #[test]
    fn second_sample_during_refresh_replaces_pending_without_refetch() {
        let mut engine = GeoEngine::new(&GeoConfig::default());
        engine.handle(GeoInput::Start { seed: None });

        let first = Position::new(40.0, -74.0, MIN, 5.0);
        let actions = engine.handle(GeoInput::Sample(first));
        assert_eq!(actions.len(), 1); // the fetch

        let second = Position::new(40.01, -74.0, MIN * 2, 5.0);
        let actions = engine.handle(GeoInput::Sample(second));
        assert!(actions.is_empty());

        let actions = engine.handle(GeoInput::SyncCompleted {
            generation: engine.generation(),
            position: second,
            locations: vec![],
        });
        // The freshest sample is the one classified.
        assert!(matches!(
            emitted(&actions)[..],
            [LocationEvent::Update(p)] if *p == second
        ));
    }

    #[test]
    fn sync_failure_classifies_pending_against_old_set() {
        let mut engine = GeoEngine::new(&GeoConfig::default());
        let seed = Position::new(40.0, -74.0, 0, 5.0);
        engine.handle(GeoInput::Start { seed: Some(seed) });
        engine.handle(GeoInput::SyncCompleted {
            generation: engine.generation(),
            position: seed,
            locations: vec![geofence("loc-a", 0)],
        });

        // ~500m drift: past the default sync filter, refresh in flight.
        engine.handle(GeoInput::Sample(far_from_center(MIN)));
        let actions = engine.handle(GeoInput::SyncFailed {
            generation: engine.generation(),
        });
        // Old set retained and the deferred sample classified against it.
        assert!(emitted(&actions)
            .iter()
            .any(|e| matches!(e, LocationEvent::Update(_))));
        assert!(engine.location(&LocationId::new("loc-a")).is_some());
    }

    #[test]
    fn stale_generation_sync_mutates_nothing() {
        let mut engine = started(vec![geofence("loc-a", 0)]);
        let stale_generation = engine.generation();
        let position = Position::new(40.0, -74.0, MIN, 5.0);

        engine.handle(GeoInput::Stop);
        let actions = engine.handle(GeoInput::Start { seed: None });
        assert!(actions.is_empty());

        // Response from the stopped session arrives late.
        let actions = engine.handle(GeoInput::SyncCompleted {
            generation: stale_generation,
            position,
            locations: vec![geofence("ghost", 0)],
        });
        assert!(actions.is_empty());
        assert!(engine.locations().is_empty());
    }

    #[test]
    fn sync_carries_occupancy_for_surviving_ids() {
        let mut engine = started(vec![geofence("loc-a", 0)]);
        engine.handle(GeoInput::Sample(near_center(MIN)));
        assert_eq!(
            engine.location(&LocationId::new("loc-a")).unwrap().state,
            LocationState::Inside
        );

        let actions = engine.handle(GeoInput::SyncCompleted {
            generation: engine.generation(),
            position: near_center(MIN),
            locations: vec![geofence("loc-a", 0), geofence("loc-b", 0)],
        });
        assert!(actions.is_empty());
        // Surviving id kept its state; no replayed enter event.
        assert_eq!(
            engine.location(&LocationId::new("loc-a")).unwrap().state,
            LocationState::Inside
        );
        assert_eq!(
            engine.location(&LocationId::new("loc-b")).unwrap().state,
            LocationState::Unknown
        );
    }

    #[test]
    fn stop_clears_state_and_emits_nothing() {
        let mut engine = started(vec![geofence("loc-a", 0)]);
        engine.handle(GeoInput::Sample(near_center(MIN)));

        let actions = engine.handle(GeoInput::Stop);
        assert!(actions.is_empty());
        assert!(!engine.is_monitoring());
        assert!(engine.locations().is_empty());
        assert!(engine.last_raw_position().is_none());
    }

    #[test]
    fn region_hint_is_reverified_not_trusted() {
        let mut engine = started(vec![geofence("loc-a", 0)]);
        // No fix yet: an enter hint alone does nothing.
        let actions = engine.handle(GeoInput::RegionHint {
            location_id: LocationId::new("loc-a"),
            entered: true,
        });
        assert!(actions.is_empty());
        assert_eq!(
            engine.location(&LocationId::new("loc-a")).unwrap().state,
            LocationState::Unknown
        );

        // With a fix far outside the fence, an enter hint verifies to
        // nothing as well.
        engine.handle(GeoInput::Sample(far_from_center(MIN)));
        let actions = engine.handle(GeoInput::RegionHint {
            location_id: LocationId::new("loc-a"),
            entered: true,
        });
        assert!(emitted(&actions).is_empty());
    }

    #[test]
    fn local_enrollment_adds_and_removes_locations() {
        let mut engine = started(vec![]);
        engine.handle(GeoInput::Monitor(geofence("loc-x", 0)));
        assert!(engine.location(&LocationId::new("loc-x")).is_some());

        let actions = engine.handle(GeoInput::Unmonitor(LocationId::new("loc-x")));
        assert!(actions.is_empty());
        assert!(engine.location(&LocationId::new("loc-x")).is_none());
    }

    #[test]
    fn state_edges_follow_the_transition_table() {
        // Exhaustive walk for a dwell-configured geofence: the only edges
        // are Unknown→{Pending,Outside}, Outside→Pending, Pending→{Dwell,
        // Outside}, Dwell→Outside.
        let mut engine = started(vec![geofence("loc-a", 60)]);
        let id = LocationId::new("loc-a");
        let mut seen = vec![engine.location(&id).unwrap().state];

        let script = [
            near_center(MIN),                // Unknown → Pending
            far_from_center(2 * MIN),        // Pending → Outside
            near_center(3 * MIN),            // Outside → Pending
            near_center(5 * MIN),            // Pending → Dwell
            far_from_center(6 * MIN),        // Dwell → Outside
        ];
        for sample in script {
            engine.handle(GeoInput::Sample(sample));
            seen.push(engine.location(&id).unwrap().state);
        }

        use LocationState::*;
        assert_eq!(seen, vec![Unknown, Pending, Outside, Pending, Dwell, Outside]);
    }
}
