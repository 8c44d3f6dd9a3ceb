//! Horizontal Situation Indicator.
//!
//! A rotating compass rose with a course arrow, a course deviation indicator
//! (CDI) and, to its right, the altitude tape with the expected-altitude (VSI)
//! chevron.
//!
//! # Redraw Strategy
//!
//! The HSI remembers what it last drew and repaints as little as possible:
//!
//! | Change | Classification | Work |
//! |--------|----------------|------|
//! | Displayed (integer) heading | [`Redraw::Full`] | clear outer disc, rose, labels, CDI |
//! | Course or deviation only | [`Redraw::Partial`] | clear inner disc, labels, CDI |
//! | Nothing the dial shows | [`Redraw::Unchanged`] | numeric readouts only, if their values moved |
//! | Heading or course outside `[0, 360]` | [`Redraw::Rejected`] | nothing, state untouched |
//!
//! The partial clear radius stops at the inner end of the rose ticks, so the rose
//! survives a course change.
//!
//! The altitude tape and the VSI chevron compare the truncated (whole-foot) values
//! and report `true` only when they actually repainted.
//!
//! # Flushing
//!
//! Nothing here flushes. Callers batch several updates and flush the surface once.

mod altitude;
mod compass;
mod layout;

pub use altitude::{VsiMarker, vsi_marker};
pub use compass::cdi_pixel_offset;
use embedded_graphics::prelude::*;
pub use layout::HsiGeometry;

use crate::colors::ColorSchema;
use crate::geometry::round_half_down;
use crate::surface::{FrameDevice, Surface};
use crate::units::{TrackError, TrackErrorUnit};

/// What an update did to the dial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Redraw {
    /// Rose, labels and CDI repainted.
    Full,
    /// Inner disc (labels and CDI) repainted.
    Partial,
    /// Dial left as it was.
    Unchanged,
    /// Input out of range, nothing drawn and nothing remembered.
    Rejected,
}

impl Redraw {
    pub const fn repainted(self) -> bool { matches!(self, Self::Full | Self::Partial) }
}

#[inline]
fn valid_angle(deg: f64) -> bool { (0.0..=360.0).contains(&deg) }

/// Integer rotation applied to the rose for a heading.
#[inline]
fn display_direction(heading: f64) -> i32 { 360 - round_half_down(heading) }

pub struct Hsi {
    geometry: HsiGeometry,
    colors: ColorSchema,
    track_unit: TrackErrorUnit,
    /// Rose rotation last drawn.
    dir: Option<i32>,
    direction: f64,
    magnetic: f64,
    course: Option<f64>,
    deviation: f64,
    altitude_ft: Option<i64>,
    expected_alt_ft: Option<i64>,
}

impl Hsi {
    pub const fn new(
        height: i32,
        colors: ColorSchema,
        track_unit: TrackErrorUnit,
    ) -> Self {
        Self {
            geometry: HsiGeometry::new(height),
            colors,
            track_unit,
            dir: None,
            direction: 0.0,
            magnetic: 0.0,
            course: None,
            deviation: 0.0,
            altitude_ft: None,
            expected_alt_ft: None,
        }
    }

    pub const fn geometry(&self) -> &HsiGeometry { &self.geometry }

    pub const fn direction(&self) -> f64 { self.direction }

    pub const fn course(&self) -> Option<f64> { self.course }

    pub const fn deviation(&self) -> f64 { self.deviation }

    /// Rotation of the rose as last drawn, `None` before the first draw.
    pub const fn display_direction(&self) -> Option<i32> { self.dir }

    pub const fn altitude_ft(&self) -> Option<i64> { self.altitude_ft }

    pub const fn expected_altitude_ft(&self) -> Option<i64> { self.expected_alt_ft }

    /// Static parts: the lubber line above the rose and the altitude tape base line.
    pub fn first_draw<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
    ) {
        let g = &self.geometry;
        let (cx, h) = (g.center.x, g.size);
        let marker = self.colors.dir_marker;
        surface.draw_line(Point::new(cx - 1, 0), Point::new(cx - 1, g.mark_start - 4), marker);
        surface.draw_line(Point::new(cx, 0), Point::new(cx, g.mark_start), marker);
        surface.draw_line(Point::new(cx + 1, 0), Point::new(cx + 1, g.mark_start - 4), marker);
        surface.draw_line(Point::new(h, 6), Point::new(h, h - 6), self.colors.alt_scale);
    }

    /// Draw heading, course and deviation together.
    pub fn draw<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        direction: f64,
        course: f64,
        deviation: f64,
    ) -> Redraw {
        if !valid_angle(direction) || !valid_angle(course) {
            log::trace!("HSI sample rejected: direction {direction}, course {course}");
            return Redraw::Rejected;
        }
        let dir = display_direction(direction);
        let redraw = if self.dir != Some(dir) {
            self.draw_compass(surface, dir);
            self.draw_cdi(surface, direction, course, deviation);
            Redraw::Full
        } else if self.course != Some(course) || self.deviation != deviation {
            self.clear_inner(surface);
            self.draw_labels(surface, dir);
            self.draw_cdi(surface, direction, course, deviation);
            Redraw::Partial
        } else {
            Redraw::Unchanged
        };
        let moved = self.direction != direction;
        self.direction = direction;
        if redraw.repainted() || moved {
            self.print_readouts(surface);
        }
        redraw
    }

    /// New true and magnetic heading. Redraws the rose only if the displayed
    /// heading changes; the CDI follows if a course is set.
    pub fn update_direction<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        direction: f64,
        magnetic: f64,
    ) -> Redraw {
        if !valid_angle(direction) {
            log::trace!("HSI direction rejected: {direction}");
            return Redraw::Rejected;
        }
        let dir = display_direction(direction);
        let redraw = if self.dir != Some(dir) {
            self.draw_compass(surface, dir);
            if let Some(course) = self.course {
                self.draw_cdi(surface, direction, course, self.deviation);
            }
            Redraw::Full
        } else {
            Redraw::Unchanged
        };
        let moved = self.direction != direction || self.magnetic != magnetic;
        self.direction = direction;
        self.magnetic = magnetic;
        if redraw.repainted() || moved {
            self.print_readouts(surface);
        }
        redraw
    }

    /// New course and cross-track deviation (metres, positive right of course).
    ///
    /// Before the rose has been drawn once the values are only remembered.
    pub fn update_course<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        course: f64,
        deviation: f64,
    ) -> Redraw {
        if !valid_angle(course) {
            log::trace!("HSI course rejected: {course}");
            return Redraw::Rejected;
        }
        let Some(dir) = self.dir else {
            self.course = Some(course);
            self.deviation = deviation;
            return Redraw::Unchanged;
        };
        if self.course == Some(course) && self.deviation == deviation {
            return Redraw::Unchanged;
        }
        self.clear_inner(surface);
        self.draw_labels(surface, dir);
        self.draw_cdi(surface, self.direction, course, deviation);
        self.print_readouts(surface);
        Redraw::Partial
    }

    /// New deviation on the current course. Without a course there is no needle
    /// and the value is only remembered.
    pub fn update_deviation<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        deviation: f64,
    ) -> Redraw {
        match self.course {
            Some(course) => self.update_course(surface, course, deviation),
            None => {
                self.deviation = deviation;
                Redraw::Unchanged
            }
        }
    }

    /// Numeric values inside the rose: true and magnetic heading, cross-track
    /// error and course.
    fn print_readouts<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
    ) {
        let c = self.geometry.center;
        let x = c.x - 12;
        let colors = &self.colors;
        let bg = colors.background;
        surface.blit_text(x, c.y - 50, colors.dir_marker, bg, false, format_args!("{:06.2}", self.direction));
        surface.blit_text(x, c.y - 40, colors.magnetic_dir, bg, false, format_args!("{:06.2}", self.magnetic));
        let error = TrackError {
            metres: self.deviation,
            unit: self.track_unit,
        };
        surface.blit_text(x, c.y + 30, colors.cdi, bg, false, format_args!("{error}"));
        match self.course {
            Some(course) => surface.blit_text(x, c.y + 40, colors.route_indicator, bg, false, format_args!("{course:06.2}")),
            None => surface.blit_text(x, c.y + 40, colors.route_indicator, bg, false, format_args!("---.--")),
        };
    }
}

// =============================================================================
// Tests
// =============================================================================
