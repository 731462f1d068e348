use rstest::{fixture, rstest};
use std::sync::Arc;
use waypoint_radar::prelude::*;

fn p(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).expect("latitude and longitude are in range")
}

/// A store holding one three-stop route around the Forbidden City.
#[fixture]
fn store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .save_route(Route::new(
            "palace",
            vec![
                Waypoint::new("meridian gate", p(39.9131, 116.3972)),
                Waypoint::new("east flowery gate", p(39.9163, 116.4010)),
                Waypoint::new("gate of divine prowess", p(39.9226, 116.3971)),
            ],
            false,
        ))
        .expect("route has enough waypoints");
    store
}

fn palace(store: &MemoryStore) -> Arc<Route> {
    let route = store
        .routes()
        .expect("store is readable")
        .into_iter()
        .next()
        .expect("fixture saved a route");
    Arc::new(route)
}

#[rstest]
#[case(false, 2, false, 2)]
#[case(true, 2, true, 0)]
#[case(false, 0, true, 1)]
#[case(true, 1, true, 2)]
fn next_at_index(
    store: Arc<MemoryStore>,
    #[case] looping: bool,
    #[case] start: usize,
    #[case] advanced: bool,
    #[case] expected: usize,
) {
    let mut route = Route::clone(&palace(&store));
    route.looping = looping;

    let mut navigator = Navigator::new(Arc::clone(&store));
    navigator
        .start_route(Arc::new(route), start)
        .expect("start index is valid");

    assert_eq!(navigator.next_waypoint(), advanced);
    assert_eq!(navigator.current_index(), Some(expected));
}

#[rstest]
fn state_survives_restart(store: Arc<MemoryStore>) {
    let route = palace(&store);
    {
        let mut navigator = Navigator::new(Arc::clone(&store));
        navigator.start_route(route, 0).expect("start index is valid");
        navigator.next_waypoint();
    }

    let mut navigator = Navigator::new(Arc::clone(&store));
    navigator.resume(store.as_ref()).expect("snapshot restores");

    assert_eq!(navigator.current_index(), Some(1));
    assert_eq!(
        navigator.current_target().map(|w| w.name.as_str()),
        Some("east flowery gate")
    );
}

#[rstest]
fn single_target_survives_restart(store: Arc<MemoryStore>) {
    let target = Waypoint::from_datum("noodle shop", p(39.9150, 116.4040), Datum::Shifted);
    {
        let mut navigator = Navigator::new(Arc::clone(&store));
        navigator.set_target(Arc::new(target.clone()));
    }

    let mut navigator = Navigator::new(Arc::clone(&store));
    navigator.resume(store.as_ref()).expect("snapshot restores");
    assert_eq!(navigator.current_target(), Some(&target));
    assert_eq!(navigator.current_index(), None);
}

#[rstest]
fn restoring_deleted_route_fails(store: Arc<MemoryStore>) {
    let route = palace(&store);
    let mut navigator = Navigator::new(Arc::clone(&store));
    navigator
        .start_route(Arc::clone(&route), 1)
        .expect("start index is valid");
    store.delete_route(route.id).expect("route exists");

    let mut restarted = Navigator::new(Arc::clone(&store));
    let result = restarted.resume(store.as_ref());

    assert_eq!(
        result,
        Err(Error::NotFound {
            kind: "route",
            id: route.id
        })
    );
    assert!(restarted.is_idle());
}

#[rstest]
fn walking_the_route_ends_idle(store: Arc<MemoryStore>) {
    let route = palace(&store);
    let mut navigator = Navigator::new(Arc::clone(&store));
    navigator
        .start_route(Arc::clone(&route), 0)
        .expect("start index is valid");

    let arrivals: Vec<_> = route
        .waypoints
        .iter()
        .map(|w| navigator.check_arrival(&w.point))
        .collect();

    assert_eq!(
        arrivals,
        [
            Arrival::Advanced { index: 1 },
            Arrival::Advanced { index: 2 },
            Arrival::Finished
        ]
    );
    assert!(navigator.is_idle());
    assert_eq!(store.load_navigation(), Ok(Some(NavigationSnapshot::Idle)));
}
