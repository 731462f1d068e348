//! Device heading from accelerometer and magnetometer samples.
use crate::azimuth::{Azimuth, wrap_half_turn};
use nalgebra::Vector3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard gravity in m/s².
const STANDARD_GRAVITY: f64 = 9.80665;

/// Minimum norm of the east vector before the frame is considered singular.
const MIN_EAST_NORM: f64 = 0.1;

/// Default blend factor of the heading filter.
pub const DEFAULT_ALPHA: f64 = 0.15;

/// A raw sample delivered by the sensor source.
///
/// Vectors are in the device frame: x to the right, y to the top of the
/// screen, z out of the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorEvent {
    /// Acceleration including gravity in m/s².
    Accelerometer([f64; 3]),
    /// Ambient magnetic field in µT.
    Magnetometer([f64; 3]),
}

/// Computes the azimuth of the device's y axis from a gravity and a
/// geomagnetic vector.
///
/// Returns `None` when no rotation frame can be built, either because the
/// device is in free fall or because gravity and the magnetic field are
/// close to parallel.
pub fn raw_heading(gravity: Vector3<f64>, geomagnetic: Vector3<f64>) -> Option<Azimuth> {
    let free_fall_gravity = 0.1 * STANDARD_GRAVITY;
    if gravity.norm_squared() < free_fall_gravity * free_fall_gravity {
        return None;
    }

    let east = geomagnetic.cross(&gravity);
    let east_norm = east.norm();
    if !east_norm.is_finite() || east_norm < MIN_EAST_NORM {
        return None;
    }

    let east = east / east_norm;
    let up = gravity.normalize();
    let north = up.cross(&east);

    Some(Azimuth::from_degrees(east.y.atan2(north.y).to_degrees()))
}

/// Exponential smoothing of the device heading.
///
/// Keeps the latest accelerometer and magnetometer sample and blends every
/// new raw heading into the smoothed value along the shortest arc, so a
/// 359° to 1° transition moves forward through north.
#[derive(Clone, Debug)]
pub struct OrientationFilter {
    alpha: f64,
    gravity: Option<Vector3<f64>>,
    geomagnetic: Option<Vector3<f64>>,
    smoothed: Option<Azimuth>,
}

impl Default for OrientationFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl OrientationFilter {
    /// Creates a new filter with blend factor `alpha`.
    ///
    /// Alpha is clamped to [0, 1]; lower values smooth more.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            gravity: None,
            geomagnetic: None,
            smoothed: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the latest smoothed heading, if any.
    pub fn heading(&self) -> Option<Azimuth> {
        self.smoothed
    }

    /// Records a sensor sample.
    ///
    /// Returns the new smoothed heading when both vectors are known and a
    /// rotation frame could be derived. Otherwise the previous smoothed
    /// value is kept and `None` is returned.
    pub fn push(&mut self, event: SensorEvent) -> Option<Azimuth> {
        match event {
            SensorEvent::Accelerometer(v) => self.gravity = Some(Vector3::from(v)),
            SensorEvent::Magnetometer(v) => self.geomagnetic = Some(Vector3::from(v)),
        }

        let raw = raw_heading(self.gravity?, self.geomagnetic?);
        if raw.is_none() {
            log::debug!("skipping sensor sample: rotation frame is singular");
        }

        Some(self.apply(raw?))
    }

    /// Blends `raw` into the smoothed heading.
    ///
    /// The first heading initializes the filter unchanged.
    pub fn apply(&mut self, raw: Azimuth) -> Azimuth {
        let smoothed = match self.smoothed {
            None => raw,
            Some(prev) => {
                let diff = wrap_half_turn(raw.degrees() - prev.degrees());
                Azimuth::from_degrees(prev.degrees() + self.alpha * diff)
            }
        };

        self.smoothed = Some(smoothed);
        smoothed
    }

    /// Forgets all samples and the smoothed heading.
    pub fn reset(&mut self) {
        self.gravity = None;
        self.geomagnetic = None;
        self.smoothed = None;
    }
}
