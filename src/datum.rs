//! Conversion between the global (WGS-84) datum and the regionally shifted
//! (GCJ-02) datum used by the map provider.
//!
//! The shift is only defined inside a rectangular region. Outside of it both
//! directions return the input unchanged.
use crate::geo::GeoPoint;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Semi-major axis of the Krasovsky 1940 ellipsoid in meters.
const SEMI_MAJOR_AXIS: f64 = 6378245.0;

/// Squared first eccentricity of the Krasovsky 1940 ellipsoid.
const ECCENTRICITY_SQ: f64 = 0.00669342162296594323;

const MIN_LONGITUDE: f64 = 72.004;
const MAX_LONGITUDE: f64 = 137.8347;
const MIN_LATITUDE: f64 = 0.8293;
const MAX_LATITUDE: f64 = 55.8271;

/// The coordinate system a point is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Datum {
    /// WGS-84, as reported by GPS.
    #[default]
    Global,
    /// GCJ-02, as used by the map provider.
    Shifted,
}

impl Datum {
    /// Expresses `point`, given in `self`, in the datum `to`.
    pub fn convert(self, point: GeoPoint, to: Datum) -> GeoPoint {
        match (self, to) {
            (Datum::Global, Datum::Shifted) => to_shifted(point),
            (Datum::Shifted, Datum::Global) => to_global(point),
            _ => point,
        }
    }
}

/// Returns `true` if no shift is defined at `point`.
pub fn is_outside_region(point: &GeoPoint) -> bool {
    !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&point.longitude())
        || !(MIN_LATITUDE..=MAX_LATITUDE).contains(&point.latitude())
}

/// Converts a global (WGS-84) point into the shifted datum.
pub fn to_shifted(point: GeoPoint) -> GeoPoint {
    if is_outside_region(&point) {
        return point;
    }

    let (d_lat, d_lon) = offset(point.latitude(), point.longitude());
    GeoPoint::from_valid(point.latitude() + d_lat, point.longitude() + d_lon)
}

/// Converts a shifted point back into the global datum.
///
/// This is a one-step approximation: the forward offset is evaluated at the
/// shifted point and subtracted. The result is within 1 to 2 meters of the
/// exact inverse over most of the region and within about 5 meters at its
/// edges.
pub fn to_global(point: GeoPoint) -> GeoPoint {
    if is_outside_region(&point) {
        return point;
    }

    let shifted = to_shifted(point);
    GeoPoint::from_valid(
        2.0 * point.latitude() - shifted.latitude(),
        2.0 * point.longitude() - shifted.longitude(),
    )
}

/// Latitude and longitude offsets in degrees at a global point.
fn offset(latitude: f64, longitude: f64) -> (f64, f64) {
    let x = longitude - 105.0;
    let y = latitude - 35.0;

    let rad_lat = latitude.to_radians();
    let magic = 1.0 - ECCENTRICITY_SQ * rad_lat.sin().powi(2);
    let sqrt_magic = magic.sqrt();

    // Meridian and parallel radii of curvature.
    let meridian = SEMI_MAJOR_AXIS * (1.0 - ECCENTRICITY_SQ) / (magic * sqrt_magic);
    let parallel = SEMI_MAJOR_AXIS / sqrt_magic * rad_lat.cos();

    let d_lat = latitude_offset(x, y) * 180.0 / (meridian * PI);
    let d_lon = longitude_offset(x, y) * 180.0 / (parallel * PI);

    (d_lat, d_lon)
}

/// Oscillating terms shared by both offsets.
fn short_period(x: f64) -> f64 {
    (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0
}

fn latitude_offset(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += short_period(x);
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn longitude_offset(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += short_period(x);
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quickcheck::quickcheck;
    use rstest::rstest;
    use uom::si::length::meter;

    fn p(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).expect("test point is in range")
    }

    quickcheck! {
        fn round_trip_inside_region(lat_seed: u16, lon_seed: u16) -> bool {
            let latitude = MIN_LATITUDE + (MAX_LATITUDE - MIN_LATITUDE) * lat_seed as f64 / u16::MAX as f64;
            let longitude = MIN_LONGITUDE + (MAX_LONGITUDE - MIN_LONGITUDE) * lon_seed as f64 / u16::MAX as f64;
            let point = p(latitude, longitude);

            let shifted = to_shifted(point);
            if is_outside_region(&shifted) {
                // The shift pushed the point over the edge, so no inverse applies.
                return true;
            }

            to_global(shifted).distance_to(&point).get::<meter>() <= 6.0
        }
    }

    #[rstest]
    #[case(60.0, 100.0)]
    #[case(0.5, 110.0)]
    #[case(30.0, 70.0)]
    #[case(30.0, 140.0)]
    #[case(51.5074, -0.1278)]
    fn identity_outside_region(#[case] latitude: f64, #[case] longitude: f64) {
        let point = p(latitude, longitude);
        assert_eq!(to_shifted(point), point);
        assert_eq!(to_global(point), point);
    }

    #[rstest]
    #[case(p(39.9087, 116.3975), 39.91010349934476, 116.40374357265176)]
    #[case(p(31.2304, 121.4737), 31.22845773757727, 121.47822305927693)]
    fn known_shift(#[case] point: GeoPoint, #[case] latitude: f64, #[case] longitude: f64) {
        let shifted = to_shifted(point);
        assert_relative_eq!(shifted.latitude(), latitude, epsilon = 1e-9);
        assert_relative_eq!(shifted.longitude(), longitude, epsilon = 1e-9);
    }

    #[test]
    fn shift_is_hundreds_of_meters() {
        let point = p(39.9087, 116.3975);
        let d = to_shifted(point).distance_to(&point).get::<meter>();
        assert!((100.0..1000.0).contains(&d));
    }

    #[test]
    fn convert_dispatches() {
        let point = p(22.5431, 114.0579);
        assert_eq!(Datum::Global.convert(point, Datum::Global), point);
        assert_eq!(Datum::Global.convert(point, Datum::Shifted), to_shifted(point));
        assert_eq!(Datum::Shifted.convert(point, Datum::Global), to_global(point));
    }
}
