//! Radar geometry and animation timing.
//!
//! Screen coordinates have their origin at the top left corner with y
//! growing downwards. A screen angle of zero points up and grows clockwise.
use crate::{azimuth::Azimuth, skin::Skin};
use nalgebra::Point2;
use std::time::Duration;

/// Number of concentric range rings.
pub const RING_COUNT: usize = 4;

/// Angular spacing of compass card ticks in degrees.
pub const TICK_STEP_DEG: u32 = 10;

/// Angular spacing of major ticks in degrees.
pub const MAJOR_TICK_STEP_DEG: u32 = 90;

pub const DEFAULT_MARKER_FRACTION: f64 = 0.75;
pub const DEFAULT_SWEEP_DEG_PER_MS: f64 = 0.1;
pub const DEFAULT_PULSE_PERIOD_MS: f64 = 200.0;
pub const DEFAULT_PULSE_AMPLITUDE: f64 = 0.5;

/// Share of the half extent left free around the outer ring.
const PADDING_FRACTION: f64 = 0.1;

const MINOR_TICK_FRACTION: f64 = 0.05;
const MAJOR_TICK_FRACTION: f64 = 0.1;

/// Glow radius of the target marker at rest, relative to the ring radius.
const TARGET_GLOW_FRACTION: f64 = 0.06;

/// A compass card tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Compass direction the tick stands for.
    pub bearing: Azimuth,
    /// Direction the tick is drawn at after rotating the card.
    pub screen_angle: Azimuth,
    pub major: bool,
    pub inner: Point2<f64>,
    pub outer: Point2<f64>,
}

impl Tick {
    /// Cardinal letter for major ticks.
    pub fn label(&self) -> Option<&'static str> {
        if !self.major {
            return None;
        }

        match self.bearing.degrees().round() as u32 {
            0 => Some("N"),
            90 => Some("E"),
            180 => Some("S"),
            270 => Some("W"),
            _ => None,
        }
    }
}

/// Placement of the radar within a view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadarLayout {
    center: Point2<f64>,
    radius: f64,
    marker_fraction: f64,
}

impl RadarLayout {
    /// Centers the radar in a `width` by `height` view.
    pub fn new(width: f64, height: f64) -> Self {
        let half = width.min(height).max(0.0) / 2.0;
        Self {
            center: Point2::new(width / 2.0, height / 2.0),
            radius: half * (1.0 - PADDING_FRACTION),
            marker_fraction: DEFAULT_MARKER_FRACTION,
        }
    }

    /// Places the target marker at `fraction` of the outer ring radius.
    pub fn with_marker_fraction(mut self, fraction: f64) -> Self {
        self.marker_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn center(&self) -> Point2<f64> {
        self.center
    }

    /// Radius of the outer ring.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Radii of the range rings from the innermost outwards.
    pub fn ring_radii(&self) -> [f64; RING_COUNT] {
        std::array::from_fn(|i| self.radius * (i + 1) as f64 / RING_COUNT as f64)
    }

    /// The point `distance` from the center in direction `screen_angle`.
    pub fn point_at(&self, screen_angle: Azimuth, distance: f64) -> Point2<f64> {
        let rad = screen_angle.degrees().to_radians();
        Point2::new(
            self.center.x + distance * rad.sin(),
            self.center.y - distance * rad.cos(),
        )
    }

    /// Compass card ticks for a device facing `heading`.
    ///
    /// The card turns against the device so north stays north.
    pub fn ticks(&self, heading: Azimuth) -> Vec<Tick> {
        (0..360)
            .step_by(TICK_STEP_DEG as usize)
            .map(|deg| {
                let bearing = Azimuth::from_degrees(deg as f64);
                let screen_angle = bearing - heading;
                let major = deg % MAJOR_TICK_STEP_DEG == 0;
                let length = match major {
                    true => MAJOR_TICK_FRACTION,
                    false => MINOR_TICK_FRACTION,
                } * self.radius;

                Tick {
                    bearing,
                    screen_angle,
                    major,
                    inner: self.point_at(screen_angle, self.radius - length),
                    outer: self.point_at(screen_angle, self.radius),
                }
            })
            .collect()
    }

    /// Position of the target marker for a target at `relative` bearing.
    pub fn target_marker(&self, relative: Azimuth) -> Point2<f64> {
        self.point_at(relative, self.radius * self.marker_fraction)
    }

    /// Assembles every primitive of one frame.
    pub fn frame(
        &self,
        heading: Azimuth,
        relative: Option<Azimuth>,
        elapsed: Duration,
        animation: &Animation,
        skin: Skin,
    ) -> RadarFrame {
        let target = relative.map(|relative| TargetMarker {
            relative,
            position: self.target_marker(relative),
            glow_radius: animation.pulse(self.radius * TARGET_GLOW_FRACTION, elapsed),
        });

        RadarFrame {
            center: self.center,
            rings: self.ring_radii(),
            ticks: self.ticks(heading),
            sweep: animation.sweep_angle(elapsed),
            heading_marker: self.point_at(Azimuth::north(), self.radius),
            target,
            skin,
        }
    }
}

/// Timing of the sweep and the target pulse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub sweep_deg_per_ms: f64,
    pub pulse_period_ms: f64,
    pub pulse_amplitude: f64,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            sweep_deg_per_ms: DEFAULT_SWEEP_DEG_PER_MS,
            pulse_period_ms: DEFAULT_PULSE_PERIOD_MS,
            pulse_amplitude: DEFAULT_PULSE_AMPLITUDE,
        }
    }
}

impl Animation {
    /// Screen angle of the scan sweep `elapsed` after the animation started.
    pub fn sweep_angle(&self, elapsed: Duration) -> Azimuth {
        Azimuth::from_degrees(millis(elapsed) * self.sweep_deg_per_ms)
    }

    /// Size of a pulsing element of rest size `base` at time `t`.
    ///
    /// Oscillates between `base` and `base * (1 + amplitude)`. Without a
    /// positive period the element stays at rest.
    pub fn pulse(&self, base: f64, t: Duration) -> f64 {
        if !(self.pulse_period_ms.is_finite() && self.pulse_period_ms > 0.0) {
            return base;
        }
        let phase = (millis(t) / self.pulse_period_ms).sin();
        base * (1.0 + self.pulse_amplitude * (phase + 1.0) / 2.0)
    }
}

fn millis(t: Duration) -> f64 {
    t.as_secs_f64() * 1000.0
}

/// The target as drawn on the radar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetMarker {
    pub relative: Azimuth,
    pub position: Point2<f64>,
    pub glow_radius: f64,
}

/// Everything needed to draw one radar frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarFrame {
    pub center: Point2<f64>,
    pub rings: [f64; RING_COUNT],
    pub ticks: Vec<Tick>,
    pub sweep: Azimuth,
    /// Fixed marker at the top showing where the device points.
    pub heading_marker: Point2<f64>,
    pub target: Option<TargetMarker>,
    pub skin: Skin,
}
