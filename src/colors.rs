//! Color schema for the instrument display.
//!
//! # Rgb565 Color Format
//!
//! The framebuffer stores 16 bits per pixel: 5 bits red, 6 bits green, 5 bits blue.
//! - Red: 0-31 (5 bits)
//! - Green: 0-63 (6 bits)
//! - Blue: 0-31 (5 bits)
//!
//! Colors are kept as [`Rgb565`] everywhere and converted to the raw packed value
//! (`into_storage()`) only at the moment a pixel is written to the back buffer.
//!
//! # Schema
//!
//! Twelve semantic roles map to one color each. The schema starts from the defaults
//! below, may be overridden role by role from the configuration file, and is then
//! copied into every renderer. Nothing mutates it while frames are being drawn.

use embedded_graphics::pixelcolor::Rgb565;

use crate::config::ColorOverrides;

// =============================================================================
// Packing Helpers
// =============================================================================

/// Build a color from a raw packed 5-6-5 value (e.g. `0xF800` is pure red).
pub const fn from_raw(raw: u16) -> Rgb565 {
    Rgb565::new((raw >> 11) as u8, ((raw >> 5) & 0x3F) as u8, (raw & 0x1F) as u8)
}

/// Pack 8-bit-per-channel RGB into 5-6-5, dropping the low bits of each channel.
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

// =============================================================================
// Color Schema
// =============================================================================

/// Semantic color roles used by the HSI and the readout panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSchema {
    /// Screen background, also used to erase dirty regions.
    pub background: Rgb565,
    /// Compass rose ticks and labels.
    pub compass_rose: Rgb565,
    /// Fixed lubber line at the top of the rose and the true heading readout.
    pub dir_marker: Rgb565,
    /// Magnetic heading readout.
    pub magnetic_dir: Rgb565,
    /// Course arrow and course readout.
    pub route_indicator: Rgb565,
    /// Deviation needle and cross-track readout.
    pub cdi: Rgb565,
    /// Dots of the deviation scale.
    pub cdi_scale: Rgb565,
    /// Altitude tape ticks and labels.
    pub alt_scale: Rgb565,
    /// Expected-altitude chevron when it sits on the tape.
    pub vsi: Rgb565,
    /// Fixed current-altitude chevron.
    pub alt_marker: Rgb565,
    /// Readout panel text.
    pub text: Rgb565,
    /// Warnings (no fix, too few satellites, altitude out of scale).
    pub warning: Rgb565,
}

impl ColorSchema {
    /// Default schema: white rose on black, red heading, green route.
    pub const DEFAULT: Self = Self {
        background: from_raw(0x0000),
        compass_rose: from_raw(0xFFFF),
        dir_marker: from_raw(0xF000),
        magnetic_dir: from_raw(0x00F0),
        route_indicator: from_raw(0x0F00),
        cdi: from_raw(0xFF00),
        cdi_scale: from_raw(0xFFFF),
        alt_scale: from_raw(0xFFFF),
        vsi: from_raw(0xFFFF),
        alt_marker: from_raw(0xFFFF),
        text: from_raw(0x0F00),
        warning: from_raw(0xF000),
    };

    /// Apply configured overrides. Roles left unset keep their current color.
    pub fn with_overrides(
        mut self,
        overrides: &ColorOverrides,
    ) -> Self {
        let slots = [
            (&mut self.background, overrides.background),
            (&mut self.compass_rose, overrides.compass_rose),
            (&mut self.dir_marker, overrides.dir_marker),
            (&mut self.magnetic_dir, overrides.magnetic_dir),
            (&mut self.route_indicator, overrides.route_indicator),
            (&mut self.cdi, overrides.cdi),
            (&mut self.cdi_scale, overrides.cdi_scale),
            (&mut self.alt_scale, overrides.alt_scale),
            (&mut self.vsi, overrides.vsi),
            (&mut self.alt_marker, overrides.alt_marker),
            (&mut self.text, overrides.text),
            (&mut self.warning, overrides.warning),
        ];
        for (slot, raw) in slots {
            if let Some(raw) = raw {
                *slot = from_raw(raw);
            }
        }
        self
    }
}

impl Default for ColorSchema {
    fn default() -> Self { Self::DEFAULT }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::*;

    use super::*;

    #[test]
    fn test_from_raw_round_trips_storage() {
        for raw in [0x0000u16, 0xFFFF, 0xF000, 0x00F0, 0x0F00, 0xFF00, 0x1234] {
            assert_eq!(from_raw(raw).into_storage(), raw, "raw {raw:#06x}");
        }
    }

    #[test]
    fn test_rgb_packing() {
        assert_eq!(rgb(255, 255, 255), Rgb565::WHITE);
        assert_eq!(rgb(0, 0, 0), Rgb565::BLACK);
        assert_eq!(rgb(255, 0, 0).into_storage(), 0xF800);
        assert_eq!(rgb(0, 255, 0).into_storage(), 0x07E0);
        assert_eq!(rgb(0, 0, 255).into_storage(), 0x001F);
        // Low bits are truncated, not rounded
        assert_eq!(rgb(7, 3, 7), Rgb565::BLACK);
    }

    #[test]
    fn test_default_roles() {
        let schema = ColorSchema::default();
        assert_eq!(schema.background.into_storage(), 0x0000);
        assert_eq!(schema.dir_marker.into_storage(), 0xF000);
        assert_eq!(schema.cdi.into_storage(), 0xFF00);
        assert_eq!(schema.text.into_storage(), 0x0F00);
    }

    #[test]
    fn test_partial_overrides_keep_defaults() {
        let overrides = ColorOverrides {
            background: Some(0x001F),
            warning: Some(0xF800),
            ..ColorOverrides::default()
        };
        let schema = ColorSchema::default().with_overrides(&overrides);
        assert_eq!(schema.background.into_storage(), 0x001F);
        assert_eq!(schema.warning.into_storage(), 0xF800);
        assert_eq!(schema.compass_rose, ColorSchema::DEFAULT.compass_rose);
        assert_eq!(schema.route_indicator, ColorSchema::DEFAULT.route_indicator);
    }
}
