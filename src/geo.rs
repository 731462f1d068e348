use crate::{
    azimuth::Azimuth,
    error::{Error, Result},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use uom::si::{f64::Length, length::meter};

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic position in degrees.
///
/// Latitude is on [-90, 90] and longitude on [-180, 180]. Both are finite,
/// so every geometry function over `GeoPoint` is total.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.latitude, self.longitude)
    }
}

impl GeoPoint {
    /// Creates a new `GeoPoint`.
    ///
    /// Returns [`Error::InvalidCoordinate`] if either value is NaN, infinite
    /// or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds a point from values already known to be in range.
    pub(crate) fn from_valid(latitude: f64, longitude: f64) -> Self {
        debug_assert!(Self::new(latitude, longitude).is_ok());
        Self {
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Initial great-circle bearing (forward azimuth) from `self` to `other`.
    ///
    /// Identical points give north.
    pub fn bearing_to(&self, other: &GeoPoint) -> Azimuth {
        let lat_from = self.latitude.to_radians();
        let lat_to = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let y = delta_lon.sin() * lat_to.cos();
        let x = lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * delta_lon.cos();

        Azimuth::from_degrees(y.atan2(x).to_degrees())
    }

    /// Great-circle distance to `other` using the haversine formula.
    pub fn distance_to(&self, other: &GeoPoint) -> Length {
        let lat_from = self.latitude.to_radians();
        let lat_to = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat_from.cos() * lat_to.cos() * (delta_lon / 2.0).sin().powi(2);

        // Clamp guards asin against a drifting just past 1 for antipodes.
        let c = 2.0 * a.sqrt().min(1.0).asin();

        Length::new::<meter>(EARTH_RADIUS_M * c)
    }

    /// Projects `self` forward along `bearing` by `distance`.
    pub fn project(&self, bearing: Azimuth, distance: Length) -> GeoPoint {
        let lat1 = self.latitude.to_radians();
        let lon1 = self.longitude.to_radians();
        let brng = bearing.degrees().to_radians();
        let angular_distance = distance.get::<meter>() / EARTH_RADIUS_M;

        let lat2 = (lat1.sin() * angular_distance.cos()
            + lat1.cos() * angular_distance.sin() * brng.cos())
        .asin();

        let lon2 = lon1
            + (brng.sin() * angular_distance.sin() * lat1.cos())
                .atan2(angular_distance.cos() - lat1.sin() * lat2.sin());

        let latitude = lat2.to_degrees().clamp(-90.0, 90.0);
        let longitude = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;

        GeoPoint::from_valid(latitude, longitude)
    }
}

impl TryFrom<(f64, f64)> for GeoPoint {
    type Error = Error;

    fn try_from(tuple: (f64, f64)) -> Result<Self> {
        let (latitude, longitude) = tuple;
        GeoPoint::new(latitude, longitude)
    }
}

impl From<GeoPoint> for (f64, f64) {
    fn from(point: GeoPoint) -> Self {
        (point.latitude, point.longitude)
    }
}

/// Formats a distance for display: whole meters below 1 km, kilometers with
/// one decimal above.
pub fn format_distance(distance: Length) -> String {
    let meters = distance.get::<meter>();
    match meters < 1000.0 {
        true => format!("{} m", meters.round() as i64),
        false => format!("{:.1} km", meters / 1000.0),
    }
}
