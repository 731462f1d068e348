//! Persistence collaborators and an in-memory implementation.
//!
//! Stores take `&self` so one instance can be shared between the navigator
//! and the rest of the application behind an `Arc`.
use crate::{
    error::{Error, Result},
    navigation::{NavigationSnapshot, Route, Waypoint},
};
use chrono::{DateTime, Utc};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

/// Number of search history entries shown by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Minimum number of waypoints in a persisted route.
pub const MIN_ROUTE_LEN: usize = 2;

/// Mirror of the navigation state across restarts.
pub trait NavigationStore {
    fn save_navigation(&self, snapshot: &NavigationSnapshot) -> Result<()>;
    fn load_navigation(&self) -> Result<Option<NavigationSnapshot>>;
}

impl<T: NavigationStore + ?Sized> NavigationStore for Arc<T> {
    fn save_navigation(&self, snapshot: &NavigationSnapshot) -> Result<()> {
        (**self).save_navigation(snapshot)
    }

    fn load_navigation(&self) -> Result<Option<NavigationSnapshot>> {
        (**self).load_navigation()
    }
}

impl<T: NavigationStore + ?Sized> NavigationStore for &T {
    fn save_navigation(&self, snapshot: &NavigationSnapshot) -> Result<()> {
        (**self).save_navigation(snapshot)
    }

    fn load_navigation(&self) -> Result<Option<NavigationSnapshot>> {
        (**self).load_navigation()
    }
}

/// Saved waypoints and routes.
pub trait WaypointStore {
    /// Inserts `waypoint` when its id is zero, updates it otherwise.
    ///
    /// Returns the stored waypoint with its id assigned.
    fn save_waypoint(&self, waypoint: Waypoint) -> Result<Waypoint>;

    fn waypoint(&self, id: i64) -> Result<Waypoint>;

    fn waypoints(&self) -> Result<Vec<Waypoint>>;

    /// Deletes a waypoint and removes it from every route.
    ///
    /// Routes left with fewer than [`MIN_ROUTE_LEN`] waypoints are deleted
    /// too; their ids are returned.
    fn delete_waypoint(&self, id: i64) -> Result<Vec<i64>>;

    /// Inserts or updates `route` together with its ordered membership.
    ///
    /// Unsaved members are saved first. Returns [`Error::InvalidArgument`]
    /// for routes shorter than [`MIN_ROUTE_LEN`].
    fn save_route(&self, route: Route) -> Result<Route>;

    fn route(&self, id: i64) -> Result<Route>;

    fn routes(&self) -> Result<Vec<Route>>;

    fn delete_route(&self, id: i64) -> Result<()>;
}

/// A past POI search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchEntry {
    pub id: i64,
    pub keyword: String,
    pub at: DateTime<Utc>,
}

/// Log of POI search keywords.
pub trait SearchHistory {
    /// Records `keyword`. Searching the same keyword again moves it to the
    /// front instead of adding a duplicate.
    fn record_search(&self, keyword: &str, at: DateTime<Utc>) -> Result<SearchEntry>;

    /// Returns up to `limit` entries, most recent first.
    fn recent_searches(&self, limit: usize) -> Result<Vec<SearchEntry>>;

    fn delete_search(&self, id: i64) -> Result<()>;

    fn clear_searches(&self) -> Result<()>;
}

#[derive(Clone, Debug)]
struct RouteRow {
    name: String,
    looping: bool,
}

/// Join row placing a waypoint at `position` within a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RouteMember {
    route_id: i64,
    waypoint_id: i64,
    position: usize,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    waypoints: BTreeMap<i64, Waypoint>,
    routes: BTreeMap<i64, RouteRow>,
    members: Vec<RouteMember>,
    searches: Vec<SearchEntry>,
    navigation: Option<NavigationSnapshot>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn upsert_waypoint(&mut self, mut waypoint: Waypoint) -> Result<Waypoint> {
        if waypoint.is_saved() {
            if !self.waypoints.contains_key(&waypoint.id) {
                return Err(Error::NotFound {
                    kind: "waypoint",
                    id: waypoint.id,
                });
            }
        } else {
            waypoint.id = self.allocate_id();
        }

        self.waypoints.insert(waypoint.id, waypoint.clone());
        Ok(waypoint)
    }

    fn members_of(&self, route_id: i64) -> Vec<RouteMember> {
        let mut members: Vec<_> = self
            .members
            .iter()
            .filter(|m| m.route_id == route_id)
            .copied()
            .collect();
        members.sort_by_key(|m| m.position);
        members
    }

    fn load_route(&self, id: i64) -> Result<Route> {
        let row = self.routes.get(&id).ok_or(Error::NotFound { kind: "route", id })?;

        let waypoints = self
            .members_of(id)
            .into_iter()
            .map(|m| {
                self.waypoints.get(&m.waypoint_id).cloned().ok_or_else(|| {
                    Error::Persistence(format!(
                        "route {id} references missing waypoint {}",
                        m.waypoint_id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Route {
            id,
            name: row.name.clone(),
            waypoints,
            looping: row.looping,
        })
    }

    fn remove_route(&mut self, id: i64) {
        self.routes.remove(&id);
        self.members.retain(|m| m.route_id != id);
    }
}

/// A [`WaypointStore`], [`SearchHistory`] and [`NavigationStore`] kept in
/// memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // Every mutation below completes before it can panic, so a poisoned
        // lock still guards consistent tables.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WaypointStore for MemoryStore {
    fn save_waypoint(&self, waypoint: Waypoint) -> Result<Waypoint> {
        self.tables().upsert_waypoint(waypoint)
    }

    fn waypoint(&self, id: i64) -> Result<Waypoint> {
        self.tables()
            .waypoints
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound {
                kind: "waypoint",
                id,
            })
    }

    fn waypoints(&self) -> Result<Vec<Waypoint>> {
        Ok(self.tables().waypoints.values().cloned().collect())
    }

    fn delete_waypoint(&self, id: i64) -> Result<Vec<i64>> {
        let mut tables = self.tables();
        if tables.waypoints.remove(&id).is_none() {
            return Err(Error::NotFound {
                kind: "waypoint",
                id,
            });
        }

        let mut affected: Vec<i64> = tables
            .members
            .iter()
            .filter(|m| m.waypoint_id == id)
            .map(|m| m.route_id)
            .collect();
        affected.sort_unstable();
        affected.dedup();
        tables.members.retain(|m| m.waypoint_id != id);

        let mut deleted = Vec::new();
        for route_id in affected {
            let remaining = tables.members_of(route_id);
            if remaining.len() < MIN_ROUTE_LEN {
                log::debug!("deleting route {route_id}: too few waypoints left");
                tables.remove_route(route_id);
                deleted.push(route_id);
                continue;
            }

            // Close the gap left in the ordering.
            for (position, member) in remaining.into_iter().enumerate() {
                if let Some(m) = tables.members.iter_mut().find(|m| **m == member) {
                    m.position = position;
                }
            }
        }

        Ok(deleted)
    }

    fn save_route(&self, mut route: Route) -> Result<Route> {
        if route.len() < MIN_ROUTE_LEN {
            return Err(Error::InvalidArgument(format!(
                "route '{}' needs at least {MIN_ROUTE_LEN} waypoints, got {}",
                route.name,
                route.len()
            )));
        }

        let mut tables = self.tables();
        if route.id != 0 && !tables.routes.contains_key(&route.id) {
            return Err(Error::NotFound {
                kind: "route",
                id: route.id,
            });
        }

        // Check members up front so a failed save leaves the tables untouched.
        if let Some(missing) = route
            .waypoints
            .iter()
            .find(|w| w.is_saved() && !tables.waypoints.contains_key(&w.id))
        {
            return Err(Error::NotFound {
                kind: "waypoint",
                id: missing.id,
            });
        }

        let waypoints = std::mem::take(&mut route.waypoints)
            .into_iter()
            .map(|w| tables.upsert_waypoint(w))
            .collect::<Result<Vec<_>>>()?;

        if route.id == 0 {
            route.id = tables.allocate_id();
        }

        tables.remove_route(route.id);
        tables.routes.insert(
            route.id,
            RouteRow {
                name: route.name.clone(),
                looping: route.looping,
            },
        );
        let route_id = route.id;
        tables
            .members
            .extend(waypoints.iter().enumerate().map(|(position, w)| RouteMember {
                route_id,
                waypoint_id: w.id,
                position,
            }));

        route.waypoints = waypoints;
        Ok(route)
    }

    fn route(&self, id: i64) -> Result<Route> {
        self.tables().load_route(id)
    }

    fn routes(&self) -> Result<Vec<Route>> {
        let tables = self.tables();
        tables.routes.keys().map(|&id| tables.load_route(id)).collect()
    }

    fn delete_route(&self, id: i64) -> Result<()> {
        let mut tables = self.tables();
        if !tables.routes.contains_key(&id) {
            return Err(Error::NotFound { kind: "route", id });
        }

        tables.remove_route(id);
        Ok(())
    }
}

impl SearchHistory for MemoryStore {
    fn record_search(&self, keyword: &str, at: DateTime<Utc>) -> Result<SearchEntry> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidArgument("empty search keyword".into()));
        }

        let mut tables = self.tables();
        tables.searches.retain(|e| e.keyword != keyword);

        let entry = SearchEntry {
            id: tables.allocate_id(),
            keyword: keyword.to_owned(),
            at,
        };
        tables.searches.push(entry.clone());
        Ok(entry)
    }

    fn recent_searches(&self, limit: usize) -> Result<Vec<SearchEntry>> {
        let mut entries = self.tables().searches.clone();
        entries.sort_by(|a, b| b.at.cmp(&a.at).then(b.id.cmp(&a.id)));
        entries.truncate(limit);
        Ok(entries)
    }

    fn delete_search(&self, id: i64) -> Result<()> {
        let mut tables = self.tables();
        let before = tables.searches.len();
        tables.searches.retain(|e| e.id != id);

        match tables.searches.len() == before {
            true => Err(Error::NotFound { kind: "search", id }),
            false => Ok(()),
        }
    }

    fn clear_searches(&self) -> Result<()> {
        self.tables().searches.clear();
        Ok(())
    }
}

impl NavigationStore for MemoryStore {
    fn save_navigation(&self, snapshot: &NavigationSnapshot) -> Result<()> {
        self.tables().navigation = Some(snapshot.clone());
        Ok(())
    }

    fn load_navigation(&self) -> Result<Option<NavigationSnapshot>> {
        Ok(self.tables().navigation.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    fn waypoint(name: &str, latitude: f64, longitude: f64) -> Waypoint {
        Waypoint::new(
            name,
            GeoPoint::new(latitude, longitude).expect("valid point"),
        )
    }

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    #[rstest]
    fn waypoint_ids_are_assigned(store: MemoryStore) {
        let a = store
            .save_waypoint(waypoint("a", 30.0, 120.0))
            .expect("insert");
        let b = store
            .save_waypoint(waypoint("b", 31.0, 121.0))
            .expect("insert");

        assert!(a.is_saved());
        assert_ne!(a.id, b.id);
        assert_eq!(store.waypoint(a.id), Ok(a));
    }

    #[rstest]
    fn update_waypoint(store: MemoryStore) {
        let mut a = store
            .save_waypoint(waypoint("a", 30.0, 120.0))
            .expect("insert");
        a.name = "renamed".into();
        store.save_waypoint(a.clone()).expect("update");

        assert_eq!(store.waypoint(a.id).map(|w| w.name), Ok("renamed".into()));
    }

    #[rstest]
    fn update_of_unknown_waypoint(store: MemoryStore) {
        let mut a = waypoint("a", 30.0, 120.0);
        a.id = 42;
        assert_eq!(
            store.save_waypoint(a),
            Err(Error::NotFound {
                kind: "waypoint",
                id: 42
            })
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn short_routes_are_rejected(store: MemoryStore, #[case] len: usize) {
        let waypoints = (0..len)
            .map(|i| waypoint("w", 30.0 + i as f64, 120.0))
            .collect();
        let result = store.save_route(Route::new("short", waypoints, false));

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(store.routes(), Ok(vec![]));
    }

    #[rstest]
    fn route_keeps_member_order(store: MemoryStore) {
        let route = store
            .save_route(Route::new(
                "tour",
                vec![
                    waypoint("c", 32.0, 120.0),
                    waypoint("a", 30.0, 120.0),
                    waypoint("b", 31.0, 120.0),
                ],
                true,
            ))
            .expect("valid route");

        let loaded = store.route(route.id).expect("route exists");
        let names: Vec<_> = loaded.waypoints.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert!(loaded.looping);
        assert_eq!(store.waypoints().map(|w| w.len()), Ok(3));
    }

    #[rstest]
    fn waypoint_deletion_shortens_route(store: MemoryStore) {
        let route = store
            .save_route(Route::new(
                "tour",
                vec![
                    waypoint("a", 30.0, 120.0),
                    waypoint("b", 31.0, 120.0),
                    waypoint("c", 32.0, 120.0),
                ],
                false,
            ))
            .expect("valid route");

        let deleted = store
            .delete_waypoint(route.waypoints[1].id)
            .expect("waypoint exists");
        assert!(deleted.is_empty());

        let loaded = store.route(route.id).expect("route survives");
        let names: Vec<_> = loaded.waypoints.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[rstest]
    fn delete_route_keeps_waypoints(store: MemoryStore) {
        let route = store
            .save_route(Route::new(
                "pair",
                vec![waypoint("a", 30.0, 120.0), waypoint("b", 31.0, 120.0)],
                false,
            ))
            .expect("valid route");

        store.delete_route(route.id).expect("route exists");
        assert_eq!(
            store.route(route.id),
            Err(Error::NotFound {
                kind: "route",
                id: route.id
            })
        );
        assert_eq!(store.waypoints().map(|w| w.len()), Ok(2));
    }

    #[rstest]
    fn search_history_is_most_recent_first(store: MemoryStore) {
        let start = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");

        for (i, keyword) in ["coffee", "museum", "park"].into_iter().enumerate() {
            store
                .record_search(keyword, start + Duration::minutes(i as i64))
                .expect("recorded");
        }
        store
            .record_search("coffee", start + Duration::minutes(10))
            .expect("recorded");

        let recent: Vec<_> = store
            .recent_searches(DEFAULT_HISTORY_LIMIT)
            .expect("readable")
            .into_iter()
            .map(|e| e.keyword)
            .collect();
        assert_eq!(recent, ["coffee", "park", "museum"]);

        let limited = store.recent_searches(1).expect("readable");
        assert_eq!(limited.len(), 1);

        store.delete_search(limited[0].id).expect("entry exists");
        assert_eq!(store.recent_searches(10).map(|e| e.len()), Ok(2));

        store.clear_searches().expect("cleared");
        assert_eq!(store.recent_searches(10), Ok(vec![]));
    }

    #[rstest]
    fn blank_keyword_is_rejected(store: MemoryStore) {
        assert!(matches!(
            store.record_search("   ", Utc::now()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[rstest]
    fn navigation_snapshot_is_kept(store: MemoryStore) {
        assert_eq!(store.load_navigation(), Ok(None));

        let snapshot = NavigationSnapshot::Route {
            route_id: 3,
            index: 1,
        };
        store.save_navigation(&snapshot).expect("saved");
        assert_eq!(store.load_navigation(), Ok(Some(snapshot)));
    }
}
