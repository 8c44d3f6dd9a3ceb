//! Altitude tape and expected-altitude (VSI) chevron.
//!
//! The tape sits right of the dial at `x = height`. Its top shows the current
//! altitude plus the half scale, and the fixed chevron at mid-height marks the
//! current altitude. Ticks every 50 ft, labels (hundreds of feet) every 100 ft.
//!
//! The VSI chevron sits left of the base line. When the expected altitude is off
//! the tape it is pinned to the top ("too low") or bottom ("too high") end in
//! the warning color.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use super::Hsi;
use crate::config::{ALT_LABEL_STEP_FT, ALT_PX_PER_FT, ALT_TICK_STEP_FT, ALT_TICK_STEP_PX};
use crate::surface::{FrameDevice, Surface};

/// Top margin of the tape in pixels.
const TAPE_TOP: i32 = 6;

/// Current-altitude chevron rows as `(x offset from base line, y offset from centre, width)`.
const ALT_MARKER: [(i32, i32, i32); 7] = [
    (12, -3, 2),
    (10, -2, 4),
    (8, -1, 16),
    (6, 0, 18),
    (8, 1, 16),
    (10, 2, 4),
    (12, 3, 2),
];

/// Altitudes are clamped to `±ALTITUDE_LIMIT_FT` before drawing.
const ALTITUDE_LIMIT_FT: f64 = 100_000.0;

/// Whole feet of a finite altitude, clamped to the drawable range.
fn whole_feet(feet: f64) -> Option<i64> {
    feet.is_finite().then(|| feet.clamp(-ALTITUDE_LIMIT_FT, ALTITUDE_LIMIT_FT) as i64)
}

/// Widths of the VSI chevron rows, top to bottom around its centre.
const VSI_CHEVRON: [i32; 7] = [1, 3, 5, 7, 5, 3, 1];

/// Where the VSI chevron goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VsiMarker {
    /// Expected altitude above the tape: climb.
    TooLow,
    /// Expected altitude below the tape: descend.
    TooHigh,
    /// Centre row of the chevron on the tape.
    OnScale(i32),
}

/// Classify an expected altitude against the current one (both in whole feet).
pub fn vsi_marker(
    expected_ft: i64,
    current_ft: i64,
    half_scale_ft: i64,
) -> VsiMarker {
    let top = current_ft.saturating_add(half_scale_ft);
    if expected_ft > top {
        VsiMarker::TooLow
    } else if expected_ft < current_ft.saturating_sub(half_scale_ft) {
        VsiMarker::TooHigh
    } else {
        let offset = top.saturating_sub(expected_ft) as f64 * ALT_PX_PER_FT;
        VsiMarker::OnScale(offset.round() as i32 + TAPE_TOP)
    }
}

impl Hsi {
    /// Redraw the tape for a new altitude. Returns `false` if the whole-foot
    /// altitude did not change or is not a number.
    pub fn draw_altitude_scale<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        altitude_ft: f64,
    ) -> bool {
        let Some(current) = whole_feet(altitude_ft) else {
            log::trace!("Rejected altitude {altitude_ft}");
            return false;
        };
        if self.altitude_ft == Some(current) {
            return false;
        }
        self.altitude_ft = Some(current);

        let g = self.geometry;
        let h = g.size;
        let color = self.colors.alt_scale;
        let bg = self.colors.background;
        surface.fill_rect(Point::new(h + 1, 1), Point::new(h + 25, h), bg);

        let top_ft = current + g.half_alt_scale_ft;
        let mut marker_ft = (top_ft / ALT_TICK_STEP_FT) * ALT_TICK_STEP_FT;
        let mut marker_px = ((top_ft - marker_ft) as f64 * ALT_PX_PER_FT).round() as i32 + TAPE_TOP;
        while marker_px < g.alt_scale_px + TAPE_TOP && marker_ft >= 0 {
            surface.draw_line(Point::new(h, marker_px), Point::new(h + 6, marker_px), color);
            if marker_ft % ALT_LABEL_STEP_FT == 0 {
                surface.blit_text(
                    h + 7,
                    marker_px - 4,
                    color,
                    bg,
                    false,
                    format_args!("{}", marker_ft / ALT_LABEL_STEP_FT),
                );
            }
            marker_px += ALT_TICK_STEP_PX;
            marker_ft -= ALT_TICK_STEP_FT;
        }

        let cy = g.center.y;
        for (dx, dy, width) in ALT_MARKER {
            surface.draw_horizontal_line(h + dx, cy + dy, width, self.colors.alt_marker);
        }

        // The chevron position is relative to the tape, move it along
        if let Some(expected) = self.expected_alt_ft {
            self.draw_vsi(surface, expected, current);
        }
        true
    }

    /// Move the VSI chevron to a new expected altitude. Returns `false` if the
    /// whole-foot value did not change or is not a number, or if there is no
    /// altitude yet to place it against (it is drawn with the next tape update).
    pub fn update_vsi<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        expected_ft: f64,
    ) -> bool {
        let Some(expected) = whole_feet(expected_ft) else {
            log::trace!("Rejected expected altitude {expected_ft}");
            return false;
        };
        if self.expected_alt_ft == Some(expected) {
            return false;
        }
        self.expected_alt_ft = Some(expected);
        match self.altitude_ft {
            Some(current) => {
                self.draw_vsi(surface, expected, current);
                true
            }
            None => false,
        }
    }

    fn draw_vsi<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        expected: i64,
        current: i64,
    ) {
        let g = &self.geometry;
        let h = g.size;
        let left = h - 7;
        surface.fill_rect(Point::new(left, 1), Point::new(h, h), self.colors.background);

        let (center, color): (i32, Rgb565) = match vsi_marker(expected, current, g.half_alt_scale_ft) {
            VsiMarker::TooLow => (5, self.colors.warning),
            VsiMarker::TooHigh => (h - 5, self.colors.warning),
            VsiMarker::OnScale(y) => (y, self.colors.vsi),
        };
        for (dy, width) in (-3..).zip(VSI_CHEVRON) {
            surface.draw_horizontal_line(left, center + dy, width, color);
        }
    }
}
