//! Compass rose and course deviation indicator.
//!
//! Every element is defined in the upright (north-up) frame, as if the rose were
//! not rotated, and then rotated about the dial centre with
//! [`rotate_point`].

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use super::Hsi;
use super::layout::{LABEL_HALF_HEIGHT, LABEL_HALF_WIDTH, LABELS};
use crate::config::{CDI_FULL_SCALE_M, CDI_PIXEL_SCALE, CDI_SCALE_TICKS};
use crate::geometry::{deg_to_rad, rotate_point};
use crate::surface::{FrameDevice, Surface};

/// Degrees between two rose ticks.
const TICK_STEP: i32 = 5;

/// Needle offset in pixels for a cross-track deviation in metres.
///
/// Positive deviation (right of course) moves the needle left. Saturates at
/// full scale in both directions.
pub fn cdi_pixel_offset(deviation: f64) -> i32 {
    if deviation > CDI_FULL_SCALE_M {
        -CDI_PIXEL_SCALE
    } else if deviation < -CDI_FULL_SCALE_M {
        CDI_PIXEL_SCALE
    } else {
        -(f64::from(CDI_PIXEL_SCALE) * deviation / CDI_FULL_SCALE_M).round() as i32
    }
}

impl Hsi {
    /// Segment from `(x0, y0)` to `(x1, y1)` in the upright frame, rotated by `angle`.
    fn rotated_line<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        from: (i32, i32),
        to: (i32, i32),
        angle: f64,
        color: Rgb565,
    ) {
        let c = self.geometry.center;
        let a = rotate_point(c, Point::new(from.0, from.1), angle);
        let b = rotate_point(c, Point::new(to.0, to.1), angle);
        surface.draw_line(a, b, color);
    }

    fn draw_label<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        index: usize,
        angle: f64,
    ) {
        let g = &self.geometry;
        let anchor = rotate_point(g.center, Point::new(g.center.x, g.label_pos), angle);
        surface.blit_text(
            anchor.x - LABEL_HALF_WIDTH[index],
            anchor.y - LABEL_HALF_HEIGHT,
            self.colors.compass_rose,
            self.colors.background,
            false,
            format_args!("{}", LABELS[index]),
        );
    }

    /// Full rose: 12 labelled major ticks, and between each pair five more
    /// alternating short and long (60 in all).
    pub(super) fn draw_compass<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        dir: i32,
    ) {
        self.dir = Some(dir);
        let g = self.geometry;
        let rose = self.colors.compass_rose;
        surface.fill_circle(g.center, g.outer_radius, self.colors.background);

        let mut index = dir;
        for label in 0..LABELS.len() {
            if index > 359 {
                index -= 360;
            }
            let angle = deg_to_rad(f64::from(index));
            self.rotated_line(surface, (g.center.x, g.mark_start), (g.center.x, g.major_mark), angle, rose);
            self.draw_label(surface, label, angle);

            for step in 1..=5 {
                let angle = deg_to_rad(f64::from(index + step * TICK_STEP));
                let end = if step % 2 == 1 { g.minor_mark } else { g.major_mark };
                self.rotated_line(surface, (g.center.x, g.mark_start), (g.center.x, end), angle, rose);
            }
            index += 30;
        }
    }

    pub(super) fn draw_labels<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        dir: i32,
    ) {
        let mut index = dir;
        for label in 0..LABELS.len() {
            if index > 359 {
                index -= 360;
            }
            self.draw_label(surface, label, deg_to_rad(f64::from(index)));
            index += 30;
        }
    }

    pub(super) fn clear_inner<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
    ) {
        surface.fill_circle(self.geometry.center, self.geometry.clear_radius, self.colors.background);
    }

    /// Course arrow with its tail, the deviation scale and the needle.
    pub(super) fn draw_cdi<D: FrameDevice>(
        &mut self,
        surface: &mut Surface<D>,
        direction: f64,
        course: f64,
        deviation: f64,
    ) {
        self.course = Some(course);
        self.deviation = deviation;
        let g = self.geometry;
        let cx = g.center.x;
        let route = self.colors.route_indicator;

        let mut relative = course - direction;
        if relative < 0.0 {
            relative += 360.0;
        }
        let angle = deg_to_rad(relative);

        self.rotated_line(surface, (cx, g.major_mark), (cx, g.cdi_border), angle, route);
        self.rotated_line(surface, (cx, g.major_mark), (cx - g.arrow_side, g.arrow_end), angle, route);
        self.rotated_line(surface, (cx, g.major_mark), (cx + g.arrow_side, g.arrow_end), angle, route);
        self.rotated_line(surface, (cx, g.major_mark), (cx, g.cdi_border), angle + core::f64::consts::PI, route);

        for i in -CDI_SCALE_TICKS..=CDI_SCALE_TICKS {
            let x = cx + i * g.cdi_tick;
            self.rotated_line(
                surface,
                (x, g.center.y - g.cdi_scale_mark),
                (x, g.center.y + g.cdi_scale_mark),
                angle,
                self.colors.cdi_scale,
            );
        }

        let needle = cx + cdi_pixel_offset(deviation);
        self.rotated_line(surface, (needle, g.cdi_border), (needle, g.cdi_end), angle, self.colors.cdi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorSchema;
    use crate::surface::MemoryDevice;
    use crate::units::TrackErrorUnit;

    #[test]
    fn test_cdi_pixel_offset() {
        assert_eq!(cdi_pixel_offset(0.0), 0);
        assert_eq!(cdi_pixel_offset(250.0), -38);
        assert_eq!(cdi_pixel_offset(-250.0), 38);
        assert_eq!(cdi_pixel_offset(100.0), -15);
    }

    #[test]
    fn test_cdi_pixel_offset_saturates() {
        assert_eq!(cdi_pixel_offset(CDI_FULL_SCALE_M), -CDI_PIXEL_SCALE);
        assert_eq!(cdi_pixel_offset(2.0 * CDI_FULL_SCALE_M), cdi_pixel_offset(CDI_FULL_SCALE_M));
        assert_eq!(cdi_pixel_offset(-CDI_FULL_SCALE_M), CDI_PIXEL_SCALE);
        assert_eq!(cdi_pixel_offset(-1e9), CDI_PIXEL_SCALE);
    }

    #[test]
    fn test_needle_position_on_course_up() {
        let mut s = Surface::with_device(MemoryDevice::new(480, 272));
        let mut hsi = Hsi::new(272, ColorSchema::default(), TrackErrorUnit::M);
        let cdi = ColorSchema::default().cdi;

        // Course equal to heading: the arrow points up and the needle is vertical
        hsi.draw(&mut s, 0.0, 0.0, 100.0);
        let x = 136 - 15;
        assert_eq!(s.pixel(x, 61), Some(cdi));
        assert_eq!(s.pixel(x, 180), Some(cdi));
        assert_ne!(s.pixel(x, 211), Some(cdi));
    }

    #[test]
    fn test_course_arrow_points_up() {
        let mut s = Surface::with_device(MemoryDevice::new(480, 272));
        let mut hsi = Hsi::new(272, ColorSchema::default(), TrackErrorUnit::M);
        let route = ColorSchema::default().route_indicator;

        hsi.draw(&mut s, 45.0, 45.0, 0.0);
        assert_eq!(s.pixel(136, 30), Some(route));
        assert_eq!(s.pixel(136, 60), Some(route));
        // Tail below the centre, mirrored; the needle stops where it starts
        assert_eq!(s.pixel(136, 211), Some(route));
        assert_eq!(s.pixel(136, 241), Some(route));
        assert_ne!(s.pixel(136, 242), Some(route));
    }
}
