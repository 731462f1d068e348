#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{angle::degree, f64::Angle};

/// A compass direction measured clockwise from north.
///
/// The angle is always on the range [0, 360) degrees. Bearings, headings and
/// relative bearings all share this representation.
#[derive(Clone, Copy, Debug, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Azimuth {
    /// Degrees clockwise from north on [0, 360).
    degrees: f64,
}

impl Azimuth {
    /// Creates a new `Azimuth` from `angle`.
    ///
    /// Returns `None` if `angle` is not on the range [0, 360).
    pub fn from_angle(angle: Angle) -> Option<Self> {
        let degrees = angle.get::<degree>();
        if !(0.0..360.0).contains(&degrees) {
            return None;
        }

        Some(Self { degrees })
    }

    /// Creates a new `Azimuth` from `angle` wrapped onto [0, 360).
    pub fn from_angle_wrapped(angle: Angle) -> Self {
        Self::from_degrees(angle.get::<degree>())
    }

    /// Creates a new `Azimuth` from `deg` wrapped onto [0, 360).
    pub fn from_degrees(deg: f64) -> Self {
        Self {
            degrees: wrap_degrees(deg),
        }
    }

    pub fn north() -> Self {
        Self::from_degrees(0.0)
    }

    /// Returns the direction in degrees on the range [0, 360).
    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// Returns the signed shortest rotation from `self` to `other`.
    ///
    /// The result is on the range (-180, 180] degrees, positive clockwise.
    pub fn delta_to(&self, other: &Azimuth) -> Angle {
        Angle::new::<degree>(wrap_half_turn(other.degrees() - self.degrees()))
    }

    /// Returns the `Azimuth` reached by rotating `self` by `delta`.
    pub fn rotated(&self, delta: Angle) -> Self {
        Self::from_degrees(self.degrees + delta.get::<degree>())
    }

    /// Returns true if `other` is within `thres` of `self` inclusive,
    /// handling wrapping.
    pub fn in_thres(&self, other: &Azimuth, thres: Angle) -> bool {
        self.delta_to(other).abs() <= thres
    }

    pub fn into_inner(self) -> Angle {
        Angle::new::<degree>(self.degrees)
    }
}

/// Wraps `deg` onto [0, 360).
pub(crate) fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    match wrapped >= 360.0 {
        true => 0.0,
        false => wrapped,
    }
}

/// Wraps `deg` onto (-180, 180].
pub(crate) fn wrap_half_turn(deg: f64) -> f64 {
    let wrapped = wrap_degrees(deg);
    match wrapped > 180.0 {
        true => wrapped - 360.0,
        false => wrapped,
    }
}

impl std::ops::Add for Azimuth {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::from_degrees(self.degrees() + other.degrees())
    }
}

impl std::ops::Sub for Azimuth {
    type Output = Self;

    /// `target - heading` gives the bearing of the target relative to the
    /// direction the device faces.
    fn sub(self, other: Self) -> Self::Output {
        Self::from_degrees(self.degrees() - other.degrees())
    }
}

impl std::cmp::PartialEq for Azimuth {
    fn eq(&self, other: &Azimuth) -> bool {
        self.degrees == other.degrees
    }
}

impl std::fmt::Display for Azimuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}°", self.degrees())
    }
}

impl From<Azimuth> for Angle {
    fn from(azimuth: Azimuth) -> Self {
        azimuth.into_inner()
    }
}
