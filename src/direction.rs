//! Translates relative bearings into eight on-screen directions.
use crate::azimuth::Azimuth;

/// Where a target lies with respect to the direction the device faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sector {
    Front,
    FrontRight,
    Right,
    BehindRight,
    Behind,
    BehindLeft,
    Left,
    FrontLeft,
}

/// Bearing of a target relative to the direction the device faces, on
/// [0, 360) clockwise.
pub fn relative_bearing(target_bearing: Azimuth, heading: Azimuth) -> Azimuth {
    target_bearing - heading
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Sector {
    /// Classifies a relative bearing.
    ///
    /// Each sector covers 45 degrees centered on a multiple of 45. The lower
    /// bound is closed, so 22.5 belongs to `FrontRight` and 337.5 to `Front`.
    pub fn from_relative(relative: Azimuth) -> Self {
        match relative.degrees() {
            h if h < 22.5 => Sector::Front,
            h if h < 67.5 => Sector::FrontRight,
            h if h < 112.5 => Sector::Right,
            h if h < 157.5 => Sector::BehindRight,
            h if h < 202.5 => Sector::Behind,
            h if h < 247.5 => Sector::BehindLeft,
            h if h < 292.5 => Sector::Left,
            h if h < 337.5 => Sector::FrontLeft,
            _ => Sector::Front,
        }
    }

    /// Classifies the target at `target_bearing` for a device facing `heading`.
    pub fn of_target(target_bearing: Azimuth, heading: Azimuth) -> Self {
        Self::from_relative(relative_bearing(target_bearing, heading))
    }

    pub fn name(&self) -> &str {
        match self {
            Sector::Front => "ahead",
            Sector::FrontRight => "ahead right",
            Sector::Right => "right",
            Sector::BehindRight => "behind right",
            Sector::Behind => "behind",
            Sector::BehindLeft => "behind left",
            Sector::Left => "left",
            Sector::FrontLeft => "ahead left",
        }
    }

    /// The relative bearing at the middle of the sector.
    pub fn center(&self) -> Azimuth {
        let index = match self {
            Sector::Front => 0,
            Sector::FrontRight => 1,
            Sector::Right => 2,
            Sector::BehindRight => 3,
            Sector::Behind => 4,
            Sector::BehindLeft => 5,
            Sector::Left => 6,
            Sector::FrontLeft => 7,
        };
        Azimuth::from_degrees(index as f64 * 45.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, Sector::Front)]
    #[case(22.4, Sector::Front)]
    #[case(22.5, Sector::FrontRight)]
    #[case(45.0, Sector::FrontRight)]
    #[case(67.5, Sector::Right)]
    #[case(90.0, Sector::Right)]
    #[case(135.0, Sector::BehindRight)]
    #[case(180.0, Sector::Behind)]
    #[case(202.5, Sector::BehindLeft)]
    #[case(270.0, Sector::Left)]
    #[case(292.5, Sector::FrontLeft)]
    #[case(337.4, Sector::FrontLeft)]
    #[case(337.5, Sector::Front)]
    #[case(359.9, Sector::Front)]
    fn classify(#[case] relative: f64, #[case] expected: Sector) {
        assert_eq!(Sector::from_relative(Azimuth::from_degrees(relative)), expected);
    }

    #[rstest]
    #[case(90.0, 0.0, 90.0)]
    #[case(10.0, 350.0, 20.0)]
    #[case(350.0, 10.0, 340.0)]
    #[case(45.0, 45.0, 0.0)]
    fn relative(#[case] target: f64, #[case] heading: f64, #[case] expected: f64) {
        let relative = relative_bearing(Azimuth::from_degrees(target), Azimuth::from_degrees(heading));
        approx::assert_relative_eq!(relative.degrees(), expected, epsilon = 1e-9);
    }

    #[test]
    fn target_behind_when_facing_away() {
        let sector = Sector::of_target(Azimuth::from_degrees(10.0), Azimuth::from_degrees(190.0));
        assert_eq!(sector, Sector::Behind);
    }

    #[test]
    fn centers_classify_as_themselves() {
        for sector in [
            Sector::Front,
            Sector::FrontRight,
            Sector::Right,
            Sector::BehindRight,
            Sector::Behind,
            Sector::BehindLeft,
            Sector::Left,
            Sector::FrontLeft,
        ] {
            assert_eq!(Sector::from_relative(sector.center()), sector);
        }
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Sector::FrontLeft), "ahead left");
    }
}
