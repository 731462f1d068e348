//! Route and single-target navigation.
use crate::{
    azimuth::Azimuth,
    datum::{self, Datum},
    error::{Error, Result},
    geo::GeoPoint,
    store::{MIN_ROUTE_LEN, NavigationStore, WaypointStore},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uom::si::{f64::Length, length::meter};

/// Distance below which a waypoint counts as reached.
pub const DEFAULT_ARRIVAL_RADIUS_M: f64 = 15.0;

/// A named location. An `id` of zero means the waypoint is not saved yet.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    pub id: i64,
    pub name: String,
    /// Position in the global datum.
    pub point: GeoPoint,
}

impl Waypoint {
    /// Creates an unsaved waypoint at a global-datum `point`.
    pub fn new(name: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            id: 0,
            name: name.into(),
            point,
        }
    }

    /// Creates an unsaved waypoint from a point expressed in `datum`.
    ///
    /// Map picks and POI results arrive in the shifted datum and are stored
    /// in the global one.
    pub fn from_datum(name: impl Into<String>, point: GeoPoint, datum: Datum) -> Self {
        Self::new(name, datum.convert(point, Datum::Global))
    }

    pub fn is_saved(&self) -> bool {
        self.id != 0
    }

    /// The position to draw on the provider's map.
    pub fn map_point(&self) -> GeoPoint {
        datum::to_shifted(self.point)
    }
}

/// An ordered list of waypoints.
///
/// The order of `waypoints` is the navigation order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub waypoints: Vec<Waypoint>,
    /// Whether reaching the last waypoint continues at the first.
    pub looping: bool,
}

impl Route {
    pub fn new(name: impl Into<String>, waypoints: Vec<Waypoint>, looping: bool) -> Self {
        Self {
            id: 0,
            name: name.into(),
            waypoints,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Total length along the legs of the route, excluding the closing leg
    /// of a looping route.
    pub fn length(&self) -> Length {
        self.waypoints
            .windows(2)
            .map(|leg| leg[0].point.distance_to(&leg[1].point))
            .fold(Length::new::<meter>(0.0), |acc, d| acc + d)
    }
}

/// What the navigator is currently guiding toward.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum NavigationState {
    #[default]
    Idle,
    Route {
        route: Arc<Route>,
        index: usize,
    },
    Target {
        waypoint: Arc<Waypoint>,
    },
}

/// A lossless, storable description of a [`NavigationState`].
///
/// Routes are referenced by id; ad-hoc targets are stored whole since they
/// may never have been saved.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum NavigationSnapshot {
    Idle,
    Route { route_id: i64, index: usize },
    Target { waypoint: Waypoint },
}

/// Outcome of comparing a location fix against the current target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Arrival {
    /// Nothing to navigate to.
    Idle,
    /// The target is still farther away than the arrival radius.
    EnRoute { distance: Length },
    /// The route moved on to the waypoint at `index`.
    Advanced { index: usize },
    /// The last target was reached and navigation stopped.
    Finished,
}

/// The authoritative owner of the active navigation session.
///
/// Every transition is mirrored into `store` on a best-effort basis: a
/// failed save is logged and the in-memory transition stands.
pub struct Navigator<S> {
    state: NavigationState,
    store: S,
    arrival_radius: Length,
}

impl<S: NavigationStore> Navigator<S> {
    pub fn new(store: S) -> Self {
        Self::with_arrival_radius(store, Length::new::<meter>(DEFAULT_ARRIVAL_RADIUS_M))
    }

    pub fn with_arrival_radius(store: S, arrival_radius: Length) -> Self {
        Self {
            state: NavigationState::Idle,
            store,
            arrival_radius,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn arrival_radius(&self) -> Length {
        self.arrival_radius
    }

    pub fn is_idle(&self) -> bool {
        self.state == NavigationState::Idle
    }

    /// The active route, if any.
    pub fn route(&self) -> Option<&Arc<Route>> {
        match &self.state {
            NavigationState::Route { route, .. } => Some(route),
            _ => None,
        }
    }

    /// Index of the current route waypoint, `None` unless a route is active.
    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            NavigationState::Route { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The waypoint currently navigated to.
    pub fn current_target(&self) -> Option<&Waypoint> {
        match &self.state {
            NavigationState::Idle => None,
            NavigationState::Route { route, index } => route.waypoints.get(*index),
            NavigationState::Target { waypoint } => Some(waypoint),
        }
    }

    /// Starts navigating `route` at `start_index`.
    ///
    /// Returns [`Error::InvalidArgument`] and leaves the state untouched if
    /// `start_index` is not a waypoint of `route`.
    pub fn start_route(&mut self, route: Arc<Route>, start_index: usize) -> Result<()> {
        if start_index >= route.len() {
            return Err(Error::InvalidArgument(format!(
                "start index {start_index} is outside route '{}' with {} waypoints",
                route.name,
                route.len()
            )));
        }

        log::debug!("starting route {} at waypoint {start_index}", route.id);
        self.transition(NavigationState::Route {
            route,
            index: start_index,
        });
        Ok(())
    }

    /// Navigates to a single waypoint, ending any active route.
    pub fn set_target(&mut self, waypoint: Arc<Waypoint>) {
        log::debug!("navigating to '{}' at {}", waypoint.name, waypoint.point);
        self.transition(NavigationState::Target { waypoint });
    }

    /// Ends navigation.
    pub fn stop(&mut self) {
        log::debug!("navigation stopped");
        self.transition(NavigationState::Idle);
    }

    /// Moves to the next route waypoint.
    ///
    /// Wraps to the first waypoint on looping routes of at least
    /// [`MIN_ROUTE_LEN`] waypoints. Returns `false` and keeps the index at the
    /// end of any other route, and when no route is active.
    pub fn next_waypoint(&mut self) -> bool {
        let NavigationState::Route { route, index } = &self.state else {
            return false;
        };

        let next = match index + 1 < route.len() {
            true => index + 1,
            false if route.looping && route.len() >= MIN_ROUTE_LEN => 0,
            false => return false,
        };

        let route = Arc::clone(route);
        self.transition(NavigationState::Route { route, index: next });
        true
    }

    /// Moves to the previous route waypoint.
    ///
    /// Returns `false` at the first waypoint and when no route is active.
    pub fn previous_waypoint(&mut self) -> bool {
        let NavigationState::Route { route, index } = &self.state else {
            return false;
        };

        let Some(previous) = index.checked_sub(1) else {
            return false;
        };

        let route = Arc::clone(route);
        self.transition(NavigationState::Route {
            route,
            index: previous,
        });
        true
    }

    /// Distance and bearing from `position` to the current target.
    pub fn leg_from(&self, position: &GeoPoint) -> Option<(Length, Azimuth)> {
        let target = self.current_target()?;
        Some((
            position.distance_to(&target.point),
            position.bearing_to(&target.point),
        ))
    }

    /// Applies arrival detection for a new location fix.
    ///
    /// Inside the arrival radius the route advances; when it cannot advance,
    /// or when navigating to a single target, navigation stops.
    pub fn check_arrival(&mut self, position: &GeoPoint) -> Arrival {
        let Some((distance, _)) = self.leg_from(position) else {
            return Arrival::Idle;
        };

        if distance >= self.arrival_radius {
            return Arrival::EnRoute { distance };
        }

        if self.next_waypoint() {
            // Index is set because next_waypoint only succeeds on routes.
            let index = self.current_index().unwrap_or_default();
            log::debug!("arrived, advancing to waypoint {index}");
            return Arrival::Advanced { index };
        }

        log::debug!("arrived at final target");
        self.stop();
        Arrival::Finished
    }

    /// Describes the current state for persistence.
    pub fn snapshot(&self) -> NavigationSnapshot {
        match &self.state {
            NavigationState::Idle => NavigationSnapshot::Idle,
            NavigationState::Route { route, index } => NavigationSnapshot::Route {
                route_id: route.id,
                index: *index,
            },
            NavigationState::Target { waypoint } => NavigationSnapshot::Target {
                waypoint: Waypoint::clone(waypoint),
            },
        }
    }

    /// Rebuilds the state from `snapshot`, resolving routes through `routes`.
    ///
    /// The state is only replaced when the snapshot can be applied in full.
    pub fn restore<W: WaypointStore + ?Sized>(
        &mut self,
        snapshot: NavigationSnapshot,
        routes: &W,
    ) -> Result<()> {
        let state = match snapshot {
            NavigationSnapshot::Idle => NavigationState::Idle,
            NavigationSnapshot::Route { route_id, index } => {
                let route = routes.route(route_id)?;
                if index >= route.len() {
                    return Err(Error::InvalidArgument(format!(
                        "stored index {index} is outside route {route_id}"
                    )));
                }
                NavigationState::Route {
                    route: Arc::new(route),
                    index,
                }
            }
            NavigationSnapshot::Target { waypoint } => NavigationState::Target {
                waypoint: Arc::new(waypoint),
            },
        };

        self.state = state;
        Ok(())
    }

    /// Loads the stored snapshot, if any, and restores it.
    pub fn resume<W: WaypointStore + ?Sized>(&mut self, routes: &W) -> Result<()> {
        match self.store.load_navigation()? {
            Some(snapshot) => self.restore(snapshot, routes),
            None => Ok(()),
        }
    }

    fn transition(&mut self, state: NavigationState) {
        self.state = state;
        if let Err(err) = self.store.save_navigation(&self.snapshot()) {
            log::warn!("failed to persist navigation state: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A store that refuses every write.
    #[derive(Default)]
    struct FailingStore {
        attempts: AtomicUsize,
    }

    impl NavigationStore for FailingStore {
        fn save_navigation(&self, _snapshot: &NavigationSnapshot) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::Persistence("disk full".into()))
        }

        fn load_navigation(&self) -> Result<Option<NavigationSnapshot>> {
            Err(Error::Persistence("disk full".into()))
        }
    }

    fn waypoint(id: i64, latitude: f64, longitude: f64) -> Waypoint {
        Waypoint {
            id,
            name: format!("wp{id}"),
            point: GeoPoint::new(latitude, longitude).expect("valid point"),
        }
    }

    fn route(looping: bool) -> Arc<Route> {
        Arc::new(Route {
            id: 7,
            name: "loop".into(),
            waypoints: vec![
                waypoint(1, 39.9087, 116.3975),
                waypoint(2, 39.9087, 116.4075),
                waypoint(3, 39.9187, 116.4075),
            ],
            looping,
        })
    }

    #[fixture]
    fn navigator() -> Navigator<MemoryStore> {
        Navigator::new(MemoryStore::new())
    }

    #[rstest]
    fn starts_idle(navigator: Navigator<MemoryStore>) {
        assert!(navigator.is_idle());
        assert_eq!(navigator.current_index(), None);
        assert_eq!(navigator.current_target(), None);
    }

    #[rstest]
    #[case(3)]
    #[case(100)]
    fn start_out_of_bounds_is_rejected(
        mut navigator: Navigator<MemoryStore>,
        #[case] start_index: usize,
    ) {
        let result = navigator.start_route(route(false), start_index);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(navigator.is_idle());
    }

    #[rstest]
    fn end_of_non_looping_route(mut navigator: Navigator<MemoryStore>) {
        navigator.start_route(route(false), 2).expect("valid index");
        assert!(!navigator.next_waypoint());
        assert_eq!(navigator.current_index(), Some(2));
    }

    #[rstest]
    fn end_of_looping_route_wraps(mut navigator: Navigator<MemoryStore>) {
        navigator.start_route(route(true), 2).expect("valid index");
        assert!(navigator.next_waypoint());
        assert_eq!(navigator.current_index(), Some(0));
    }

    #[rstest]
    fn single_waypoint_loop_finishes(mut navigator: Navigator<MemoryStore>) {
        let lonely = Arc::new(Route {
            id: 8,
            name: "lonely".into(),
            waypoints: vec![waypoint(1, 39.9087, 116.3975)],
            looping: true,
        });
        navigator.start_route(Arc::clone(&lonely), 0).expect("valid index");
        assert!(!navigator.next_waypoint());
        assert_eq!(navigator.current_index(), Some(0));

        let here = lonely.waypoints[0].point;
        assert_eq!(navigator.check_arrival(&here), Arrival::Finished);
        assert!(navigator.is_idle());
    }

    #[rstest]
    fn previous_stops_at_first(mut navigator: Navigator<MemoryStore>) {
        navigator.start_route(route(true), 1).expect("valid index");
        assert!(navigator.previous_waypoint());
        assert_eq!(navigator.current_index(), Some(0));
        assert!(!navigator.previous_waypoint());
        assert_eq!(navigator.current_index(), Some(0));
    }

    #[rstest]
    fn stepping_requires_route(mut navigator: Navigator<MemoryStore>) {
        assert!(!navigator.next_waypoint());
        assert!(!navigator.previous_waypoint());

        navigator.set_target(Arc::new(waypoint(9, 40.0, 116.0)));
        assert!(!navigator.next_waypoint());
        assert!(!navigator.previous_waypoint());
    }

    #[rstest]
    fn target_and_route_are_exclusive(mut navigator: Navigator<MemoryStore>) {
        navigator.start_route(route(false), 0).expect("valid index");
        navigator.set_target(Arc::new(waypoint(9, 40.0, 116.0)));
        assert_eq!(navigator.route(), None);
        assert_eq!(navigator.current_index(), None);
        assert_eq!(navigator.current_target().map(|w| w.id), Some(9));

        navigator.start_route(route(false), 1).expect("valid index");
        assert_eq!(navigator.current_target().map(|w| w.id), Some(2));

        navigator.stop();
        assert!(navigator.is_idle());
    }

    #[rstest]
    fn transitions_are_mirrored(mut navigator: Navigator<MemoryStore>) {
        navigator.start_route(route(false), 1).expect("valid index");
        assert_eq!(
            navigator.store().load_navigation(),
            Ok(Some(NavigationSnapshot::Route {
                route_id: 7,
                index: 1
            }))
        );

        navigator.next_waypoint();
        assert_eq!(
            navigator.store().load_navigation(),
            Ok(Some(NavigationSnapshot::Route {
                route_id: 7,
                index: 2
            }))
        );

        navigator.stop();
        assert_eq!(
            navigator.store().load_navigation(),
            Ok(Some(NavigationSnapshot::Idle))
        );
    }

    #[test]
    fn failed_save_keeps_transition() {
        let mut navigator = Navigator::new(FailingStore::default());
        navigator.start_route(route(false), 0).expect("valid index");
        assert!(navigator.next_waypoint());

        assert_eq!(navigator.current_index(), Some(1));
        assert_eq!(navigator.store().attempts.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    fn arrival_advances_then_finishes(mut navigator: Navigator<MemoryStore>) {
        let route = route(false);
        navigator.start_route(Arc::clone(&route), 1).expect("valid index");

        let near_second = route.waypoints[1].point;
        assert_eq!(
            navigator.check_arrival(&near_second),
            Arrival::Advanced { index: 2 }
        );

        let far = route.waypoints[0].point;
        assert!(matches!(
            navigator.check_arrival(&far),
            Arrival::EnRoute { .. }
        ));

        let near_third = route.waypoints[2].point;
        assert_eq!(navigator.check_arrival(&near_third), Arrival::Finished);
        assert!(navigator.is_idle());
        assert_eq!(navigator.check_arrival(&near_third), Arrival::Idle);
    }

    #[rstest]
    fn arrival_loops_on_looping_route(mut navigator: Navigator<MemoryStore>) {
        let route = route(true);
        navigator.start_route(Arc::clone(&route), 2).expect("valid index");
        assert_eq!(
            navigator.check_arrival(&route.waypoints[2].point),
            Arrival::Advanced { index: 0 }
        );
    }

    #[rstest]
    fn arrival_at_single_target_stops(mut navigator: Navigator<MemoryStore>) {
        let target = waypoint(0, 39.9087, 116.3975);
        navigator.set_target(Arc::new(target.clone()));

        let ten_meters_off = target
            .point
            .project(Azimuth::from_degrees(45.0), Length::new::<meter>(10.0));
        assert_eq!(navigator.check_arrival(&ten_meters_off), Arrival::Finished);
        assert!(navigator.is_idle());
    }

    #[rstest]
    fn snapshot_round_trip_for_target(mut navigator: Navigator<MemoryStore>) {
        navigator.set_target(Arc::new(waypoint(0, 31.2304, 121.4737)));
        let snapshot = navigator.snapshot();

        let mut restored = Navigator::new(MemoryStore::new());
        restored
            .restore(snapshot, &MemoryStore::new())
            .expect("target snapshots need no lookup");
        assert_eq!(restored.state(), navigator.state());
    }

    #[test]
    fn route_length_sums_legs() {
        let route = route(true);
        let expected = route.waypoints[0]
            .point
            .distance_to(&route.waypoints[1].point)
            + route.waypoints[1]
                .point
                .distance_to(&route.waypoints[2].point);
        assert_eq!(route.length(), expected);
    }

    #[test]
    fn waypoint_from_shifted_datum() {
        let shifted = GeoPoint::new(39.91010349934476, 116.40374357265176).expect("valid point");
        let waypoint = Waypoint::from_datum("gate", shifted, Datum::Shifted);

        assert!(!waypoint.is_saved());
        let original = GeoPoint::new(39.9087, 116.3975).expect("valid point");
        assert!(waypoint.point.distance_to(&original).get::<meter>() < 2.0);
    }
}
