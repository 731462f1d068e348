//! Combines heading, location and navigation into what the user is shown.
use crate::{
    azimuth::Azimuth,
    direction::{Sector, relative_bearing},
    geo::{GeoPoint, format_distance},
    navigation::{Arrival, Navigator, Waypoint},
    orientation::OrientationFilter,
    radar::{Animation, RadarFrame, RadarLayout},
    skin::Skin,
    store::NavigationStore,
    stream::{Feed, Subscription},
    tracker::{HeadingTracker, LocationSource, LocationTracker, SensorSource},
};
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use uom::si::f64::Length;

/// Direction and distance toward the current target.
#[derive(Clone, Debug, PartialEq)]
pub struct Guidance {
    pub target: Waypoint,
    pub position: GeoPoint,
    pub distance: Length,
    /// Bearing from the position to the target.
    pub bearing: Azimuth,
    pub heading: Option<Azimuth>,
    /// Bearing relative to the heading; absent until the heading is known.
    pub relative: Option<Azimuth>,
    pub sector: Option<Sector>,
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.target.name,
            format_distance(self.distance),
            self.bearing
        )?;
        if let Some(sector) = self.sector {
            write!(f, ", {sector}")?;
        }
        Ok(())
    }
}

/// A running navigation session.
///
/// Location fixes delivered through [`GuidanceSession::attach_location`]
/// trigger arrival detection; arrivals are published on
/// [`GuidanceSession::arrivals`].
pub struct GuidanceSession<S> {
    heading: HeadingTracker,
    location: LocationTracker,
    navigator: Arc<Mutex<Navigator<S>>>,
    arrivals: Feed<Arrival>,
}

impl<S: NavigationStore + Send + 'static> GuidanceSession<S> {
    pub fn new(navigator: Navigator<S>) -> Self {
        Self {
            heading: HeadingTracker::new(),
            location: LocationTracker::new(),
            navigator: Arc::new(Mutex::new(navigator)),
            arrivals: Feed::new(),
        }
    }

    pub fn heading_tracker(&self) -> &HeadingTracker {
        &self.heading
    }

    pub fn location_tracker(&self) -> &LocationTracker {
        &self.location
    }

    /// Feed of route advances and finished navigations.
    pub fn arrivals(&self) -> &Feed<Arrival> {
        &self.arrivals
    }

    /// Locks the navigator for direct control.
    pub fn navigator(&self) -> MutexGuard<'_, Navigator<S>> {
        lock(&self.navigator)
    }

    pub fn attach_sensors<Src: SensorSource + ?Sized>(
        &self,
        source: &Src,
        filter: OrientationFilter,
    ) -> Subscription {
        self.heading.attach(source, filter)
    }

    pub fn attach_location<Src: LocationSource + ?Sized>(&self, source: &Src) -> Subscription {
        let location = self.location.clone();
        let navigator = Arc::clone(&self.navigator);
        let arrivals = self.arrivals.clone();
        source.subscribe(Box::new(move |point| {
            record_fix(&location, &navigator, &arrivals, point);
        }))
    }

    /// Records a fix from a caller without a push source.
    pub fn update_location(&self, point: GeoPoint) -> Arrival {
        record_fix(&self.location, &self.navigator, &self.arrivals, point)
    }

    /// Current guidance, or `None` without a target or a location fix.
    pub fn guidance(&self) -> Option<Guidance> {
        self.guidance_with(self.heading.heading())
    }

    fn guidance_with(&self, heading: Option<Azimuth>) -> Option<Guidance> {
        let position = self.location.current()?;
        let target = self.navigator().current_target()?.clone();

        let bearing = position.bearing_to(&target.point);
        let relative = heading.map(|heading| relative_bearing(bearing, heading));

        Some(Guidance {
            distance: position.distance_to(&target.point),
            target,
            position,
            bearing,
            heading,
            relative,
            sector: relative.map(Sector::from_relative),
        })
    }

    /// Radar primitives for the current state.
    ///
    /// The heading is read once, so the card and the marker always agree.
    /// Without a heading the card is drawn north up.
    pub fn frame(
        &self,
        layout: &RadarLayout,
        animation: &Animation,
        elapsed: Duration,
        skin: Skin,
    ) -> RadarFrame {
        let heading = self.heading.heading();
        let relative = self.guidance_with(heading).and_then(|g| g.relative);
        let card = heading.unwrap_or_else(Azimuth::north);
        layout.frame(card, relative, elapsed, animation, skin)
    }
}

fn lock<S>(navigator: &Mutex<Navigator<S>>) -> MutexGuard<'_, Navigator<S>> {
    // Navigator transitions complete before anything can panic.
    navigator.lock().unwrap_or_else(|e| e.into_inner())
}

fn record_fix<S: NavigationStore>(
    location: &LocationTracker,
    navigator: &Mutex<Navigator<S>>,
    arrivals: &Feed<Arrival>,
    point: GeoPoint,
) -> Arrival {
    location.update(point);
    let arrival = lock(navigator).check_arrival(&point);

    // Publish after the lock is released so subscribers may use the navigator.
    if matches!(arrival, Arrival::Advanced { .. } | Arrival::Finished) {
        arrivals.push(arrival);
    }
    arrival
}
