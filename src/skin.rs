//! Colour palettes for the radar.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A colour packed as `0xAARRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color(pub u32);

impl Color {
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(0xFF, r, g, b)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Same colour with its alpha replaced.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | ((a as u32) << 24))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// A named, immutable radar palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Skin {
    pub name: &'static str,
    pub background: Color,
    pub ring: Color,
    pub tick_minor: Color,
    pub tick_major: Color,
    pub sweep: Color,
    pub target: Color,
    pub target_glow: Color,
    pub label: Color,
    pub distance_text: Color,
    pub heading_marker: Color,
    pub center_dot: Color,
}

const CLASSIC: Skin = Skin {
    name: "classic",
    background: Color::rgb(0x04, 0x14, 0x0A),
    ring: Color::argb(0x99, 0x2E, 0xCC, 0x71),
    tick_minor: Color::argb(0x66, 0x2E, 0xCC, 0x71),
    tick_major: Color::rgb(0x2E, 0xCC, 0x71),
    sweep: Color::argb(0x55, 0x2E, 0xCC, 0x71),
    target: Color::rgb(0xFF, 0x45, 0x3A),
    target_glow: Color::argb(0x80, 0xFF, 0x45, 0x3A),
    label: Color::rgb(0xB8, 0xF5, 0xC9),
    distance_text: Color::rgb(0xFF, 0xFF, 0xFF),
    heading_marker: Color::rgb(0xFF, 0xD6, 0x0A),
    center_dot: Color::rgb(0x2E, 0xCC, 0x71),
};

const AMBER: Skin = Skin {
    name: "amber",
    background: Color::rgb(0x14, 0x0C, 0x02),
    ring: Color::argb(0x99, 0xFF, 0xB0, 0x00),
    tick_minor: Color::argb(0x66, 0xFF, 0xB0, 0x00),
    tick_major: Color::rgb(0xFF, 0xB0, 0x00),
    sweep: Color::argb(0x55, 0xFF, 0xB0, 0x00),
    target: Color::rgb(0x00, 0xE5, 0xFF),
    target_glow: Color::argb(0x80, 0x00, 0xE5, 0xFF),
    label: Color::rgb(0xFF, 0xE0, 0xA0),
    distance_text: Color::rgb(0xFF, 0xF4, 0xE0),
    heading_marker: Color::rgb(0xFF, 0x5A, 0x36),
    center_dot: Color::rgb(0xFF, 0xB0, 0x00),
};

const OCEAN: Skin = Skin {
    name: "ocean",
    background: Color::rgb(0x02, 0x10, 0x24),
    ring: Color::argb(0x99, 0x3D, 0xA5, 0xFF),
    tick_minor: Color::argb(0x66, 0x3D, 0xA5, 0xFF),
    tick_major: Color::rgb(0x3D, 0xA5, 0xFF),
    sweep: Color::argb(0x55, 0x3D, 0xA5, 0xFF),
    target: Color::rgb(0xFF, 0x9F, 0x1C),
    target_glow: Color::argb(0x80, 0xFF, 0x9F, 0x1C),
    label: Color::rgb(0xC6, 0xE6, 0xFF),
    distance_text: Color::rgb(0xFF, 0xFF, 0xFF),
    heading_marker: Color::rgb(0xFF, 0xFF, 0xFF),
    center_dot: Color::rgb(0x3D, 0xA5, 0xFF),
};

const NIGHT: Skin = Skin {
    name: "night",
    background: Color::rgb(0x00, 0x00, 0x00),
    ring: Color::argb(0x80, 0xB0, 0x00, 0x00),
    tick_minor: Color::argb(0x50, 0xB0, 0x00, 0x00),
    tick_major: Color::rgb(0xB0, 0x00, 0x00),
    sweep: Color::argb(0x40, 0xB0, 0x00, 0x00),
    target: Color::rgb(0xFF, 0x30, 0x30),
    target_glow: Color::argb(0x60, 0xFF, 0x30, 0x30),
    label: Color::rgb(0xC0, 0x40, 0x40),
    distance_text: Color::rgb(0xE0, 0x50, 0x50),
    heading_marker: Color::rgb(0xFF, 0x30, 0x30),
    center_dot: Color::rgb(0xB0, 0x00, 0x00),
};

const SKINS: [Skin; 4] = [CLASSIC, AMBER, OCEAN, NIGHT];

impl Default for Skin {
    fn default() -> Self {
        CLASSIC
    }
}

impl Skin {
    /// Every registered skin, default first.
    pub fn all() -> &'static [Skin] {
        &SKINS
    }

    /// Looks up a skin by name, ignoring ASCII case.
    pub fn by_name(name: &str) -> Option<Skin> {
        SKINS
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .copied()
    }

    /// Like [`Skin::by_name`], falling back to the default skin.
    pub fn by_name_or_default(name: &str) -> Skin {
        Self::by_name(name).unwrap_or_else(|| {
            log::debug!("unknown skin '{name}', using default");
            Skin::default()
        })
    }
}

impl fmt::Display for Skin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
