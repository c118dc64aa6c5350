//! Pixel to physical-unit conversion.
//!
//! Thresholds throughout the engine are expressed in physical units so that a
//! gesture feels the same on a dense phone screen and a large monitor. The
//! unit is whatever the host chooses; with [`DeviceInfo::from_dpi`] it is the
//! inch.

use serde::{Deserialize, Serialize};

/// Dots per inch assumed when the platform does not report one.
pub const DEFAULT_DPI: f32 = 200.0;

/// Smallest accepted pixels-per-unit multiplier.
pub const MIN_UNIT_MULTIPLIER: f32 = 0.000_01;

const CENTIMETERS_PER_INCH: f32 = 2.539_998;
const INCHES_PER_CENTIMETER: f32 = 0.393_701;

/// Display density used to convert between pixels and physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    /// Pixels per physical unit.
    unit_multiplier: f32,
}

impl DeviceInfo {
    /// Create device info from a pixels-per-unit multiplier.
    ///
    /// The multiplier is clamped to [`MIN_UNIT_MULTIPLIER`].
    #[must_use]
    pub fn new(unit_multiplier: f32) -> Self {
        Self {
            unit_multiplier: clamp_multiplier(unit_multiplier),
        }
    }

    /// Device info where one unit is one inch at `dpi`.
    ///
    /// Non-positive values fall back to [`DEFAULT_DPI`].
    #[must_use]
    pub fn from_dpi(dpi: f32) -> Self {
        if dpi > 0.0 {
            Self::new(dpi)
        } else {
            Self::new(DEFAULT_DPI)
        }
    }

    /// Pixels per physical unit.
    #[must_use]
    pub const fn unit_multiplier(&self) -> f32 {
        self.unit_multiplier
    }

    /// Replace the pixels-per-unit multiplier.
    pub fn set_unit_multiplier(&mut self, unit_multiplier: f32) {
        self.unit_multiplier = clamp_multiplier(unit_multiplier);
    }

    /// Convert pixels to physical units.
    #[must_use]
    pub fn pixels_to_units(&self, pixels: f32) -> f32 {
        pixels * (1.0 / self.unit_multiplier)
    }

    /// Convert physical units to pixels.
    #[must_use]
    pub fn units_to_pixels(&self, units: f32) -> f32 {
        units * self.unit_multiplier
    }

    /// Convert centimeters to inches.
    #[must_use]
    pub fn centimeters_to_inches(centimeters: f32) -> f32 {
        centimeters * INCHES_PER_CENTIMETER
    }

    /// Convert inches to centimeters.
    #[must_use]
    pub fn inches_to_centimeters(inches: f32) -> f32 {
        inches * CENTIMETERS_PER_INCH
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

fn clamp_multiplier(value: f32) -> f32 {
    if value.is_nan() {
        MIN_UNIT_MULTIPLIER
    } else {
        value.max(MIN_UNIT_MULTIPLIER)
    }
}
