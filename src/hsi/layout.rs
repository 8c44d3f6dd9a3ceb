//! HSI geometry derived from the screen height.
//!
//! The instrument is a square of side `height` on the left of the screen:
//!
//! ```text
//!   y=0  ┬─ lubber line ──────────────┐
//!   10   ┼─ outer end of rose ticks   │
//!   22   ┼─ inner end of minor ticks  │  altitude tape
//!   30   ┼─ inner end of major ticks  │  at x = height..height+25
//!   40   ┼─ label centres             │
//!   61   ┼─ CDI needle top            │
//!        ⋮                            │
//! h-61   ┴─ CDI needle bottom ────────┘
//! ```
//!
//! Everything here is computed once in [`HsiGeometry::new`] and never changes.

use embedded_graphics::prelude::Point;

use crate::config::{CDI_PIXEL_SCALE, CDI_SCALE_TICKS, SizeClass};

/// Rose labels, clockwise from north, one per 30 degrees.
pub const LABELS: [&str; 12] = ["N", "03", "06", "E", "12", "15", "S", "21", "24", "W", "30", "33"];

/// Half the pixel width of each label, used to centre it on its anchor.
pub const LABEL_HALF_WIDTH: [i32; 12] = [2, 6, 6, 2, 6, 6, 2, 6, 6, 2, 6, 6];

pub const LABEL_HALF_HEIGHT: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HsiGeometry {
    /// Screen height, also the x of the altitude tape base line.
    pub size: i32,
    pub center: Point,
    /// Distance from the top of the rose to the outer end of every tick.
    pub mark_start: i32,
    /// Radius cleared before a full compass redraw.
    pub outer_radius: i32,
    pub major_mark: i32,
    pub minor_mark: i32,
    pub label_pos: i32,
    pub inner_radius: i32,
    /// Radius cleared before a partial redraw. Reaches past the labels up to
    /// the inner end of the major ticks.
    pub clear_radius: i32,
    pub arrow_end: i32,
    pub arrow_side: i32,
    pub cdi_border: i32,
    pub cdi_end: i32,
    /// Pixels between two CDI scale dots.
    pub cdi_tick: i32,
    /// Half-length of a CDI scale dot line.
    pub cdi_scale_mark: i32,
    /// Usable height of the altitude tape.
    pub alt_scale_px: i32,
    /// Feet shown above the current altitude.
    pub half_alt_scale_ft: i64,
}

impl HsiGeometry {
    pub const fn new(height: i32) -> Self {
        let c = height / 2;
        let mark_start = 10;
        let major_mark = mark_start + 20;
        let inner_radius = c - mark_start - major_mark;
        let cdi_border = major_mark + 31;
        Self {
            size: height,
            center: Point::new(c, c),
            mark_start,
            outer_radius: c - mark_start + 1,
            major_mark,
            minor_mark: mark_start + 12,
            label_pos: major_mark + 10,
            inner_radius,
            clear_radius: inner_radius + 11,
            arrow_end: major_mark + 18,
            arrow_side: 8,
            cdi_border,
            cdi_end: height - cdi_border,
            cdi_tick: CDI_PIXEL_SCALE / CDI_SCALE_TICKS,
            cdi_scale_mark: 15,
            alt_scale_px: height - 12,
            half_alt_scale_ft: SizeClass::from_height(height).layout().half_alt_scale_ft,
        }
    }
}
