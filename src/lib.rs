// #![warn(missing_docs)]

//! Radar Compass Navigation
//!
//! Turns accelerometer and magnetometer samples into a smoothed heading,
//! combines it with location fixes and a target waypoint, and lays out the
//! radar that points the user toward the target. Coordinates from the map
//! provider's shifted datum are reconciled with GPS through [`datum`].

pub mod azimuth;
pub mod config;
pub mod datum;
pub mod direction;
#[allow(missing_docs)]
pub mod error;
pub mod geo;
pub mod navigation;
pub mod orientation;
pub mod poi;
pub mod radar;
pub mod session;
pub mod skin;
pub mod store;
pub mod stream;
pub mod tracker;

pub use error::{Error, Result};

/// The types most callers need.
pub mod prelude {
    pub use crate::{
        azimuth::Azimuth,
        config::Config,
        datum::Datum,
        direction::{Sector, relative_bearing},
        error::{Error, Result},
        geo::{GeoPoint, format_distance},
        navigation::{Arrival, NavigationSnapshot, NavigationState, Navigator, Route, Waypoint},
        orientation::{OrientationFilter, SensorEvent},
        radar::{Animation, RadarFrame, RadarLayout},
        session::{Guidance, GuidanceSession},
        skin::Skin,
        store::{MemoryStore, NavigationStore, SearchHistory, WaypointStore},
        stream::{Feed, Subscription},
        tracker::{HeadingTracker, LocationSource, LocationTracker, SensorSource},
    };
}
