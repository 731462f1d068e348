use crate::{
    navigation::DEFAULT_ARRIVAL_RADIUS_M,
    orientation::{DEFAULT_ALPHA, OrientationFilter},
    radar::{
        Animation, DEFAULT_MARKER_FRACTION, DEFAULT_PULSE_AMPLITUDE, DEFAULT_PULSE_PERIOD_MS,
        DEFAULT_SWEEP_DEG_PER_MS, RadarLayout,
    },
    error::Result,
    skin::Skin,
    store::{DEFAULT_HISTORY_LIMIT, SearchEntry, SearchHistory},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::meter};

/// Tunable constants of the navigator.
///
/// Missing fields take their default when deserialized.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Blend factor of the heading filter on [0, 1].
    pub smoothing_alpha: f64,
    pub arrival_radius_m: f64,
    pub history_limit: usize,
    pub sweep_deg_per_ms: f64,
    pub pulse_period_ms: f64,
    pub pulse_amplitude: f64,
    /// Radial position of the target marker as a share of the ring radius.
    pub marker_fraction: f64,
    pub skin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            smoothing_alpha: DEFAULT_ALPHA,
            arrival_radius_m: DEFAULT_ARRIVAL_RADIUS_M,
            history_limit: DEFAULT_HISTORY_LIMIT,
            sweep_deg_per_ms: DEFAULT_SWEEP_DEG_PER_MS,
            pulse_period_ms: DEFAULT_PULSE_PERIOD_MS,
            pulse_amplitude: DEFAULT_PULSE_AMPLITUDE,
            marker_fraction: DEFAULT_MARKER_FRACTION,
            skin: Skin::default().name.to_owned(),
        }
    }
}

impl Config {
    pub fn orientation_filter(&self) -> OrientationFilter {
        OrientationFilter::new(self.smoothing_alpha)
    }

    pub fn arrival_radius(&self) -> Length {
        Length::new::<meter>(self.arrival_radius_m)
    }

    /// Animation timing. A pulse period that is not a positive finite
    /// number falls back to the default, and a negative amplitude to zero.
    pub fn animation(&self) -> Animation {
        let valid = self.pulse_period_ms.is_finite() && self.pulse_period_ms > 0.0;
        let pulse_period_ms = match valid {
            true => self.pulse_period_ms,
            false => {
                log::warn!(
                    "pulse period {} ms is invalid, using {DEFAULT_PULSE_PERIOD_MS} ms",
                    self.pulse_period_ms
                );
                DEFAULT_PULSE_PERIOD_MS
            }
        };

        Animation {
            sweep_deg_per_ms: self.sweep_deg_per_ms,
            pulse_period_ms,
            pulse_amplitude: self.pulse_amplitude.max(0.0),
        }
    }

    /// The most recent searches, at most [`Config::history_limit`] of them.
    pub fn recent_searches<H: SearchHistory + ?Sized>(
        &self,
        history: &H,
    ) -> Result<Vec<SearchEntry>> {
        history.recent_searches(self.history_limit)
    }

    pub fn radar_layout(&self, width: f64, height: f64) -> RadarLayout {
        RadarLayout::new(width, height).with_marker_fraction(self.marker_fraction)
    }

    /// The configured skin, or the default one if the name is unknown.
    pub fn skin(&self) -> Skin {
        Skin::by_name_or_default(&self.skin)
    }
}
