//! Integer and trigonometric helpers shared by the rasterizer and the HSI.
//!
//! # Rounding
//!
//! Three rounding rules are in use and they are not interchangeable:
//!
//! | Helper | Rule | Used for |
//! |--------|------|----------|
//! | [`fix_sqrt`] | nearest, ties down | circle scanline half-widths |
//! | [`rotate_point`] | half away from zero (`f64::round`) | every rotated vertex |
//! | [`round_half_down`] | fraction strictly above 0.5 rounds up | displayed heading |

use embedded_graphics::prelude::Point;

/// Integer square root, digit by digit, no floating point.
///
/// Returns the square root rounded to the nearest integer: the floor root `r`
/// is bumped to `r + 1` when the remainder `x - r²` exceeds `r`. Filled circles
/// rely on this to reach their left and right extremes.
pub const fn fix_sqrt(mut x: u32) -> u32 {
    let mut root = 0u32;
    let mut bit = 0x4000_0000u32;
    while bit != 0 {
        let trial = root + bit;
        if trial <= x {
            x -= trial;
            root = trial + bit;
        }
        root >>= 1;
        bit >>= 2;
    }
    if x > root {
        root += 1;
    }
    root
}

#[inline]
pub fn deg_to_rad(deg: f64) -> f64 { deg.to_radians() }

/// Wrap an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(deg: f64) -> f64 { deg.rem_euclid(360.0) }

/// Truncate, then round up only if the dropped fraction is strictly above one half.
pub fn round_half_down(d: f64) -> i32 {
    let n = d as i32;
    if d - f64::from(n) > 0.5 { n + 1 } else { n }
}

/// Rotate `p` about `center` by `angle` radians (clockwise on screen, y grows down).
pub fn rotate_point(
    center: Point,
    p: Point,
    angle: f64,
) -> Point {
    let (sin, cos) = angle.sin_cos();
    let dx = f64::from(p.x - center.x);
    let dy = f64::from(p.y - center.y);
    let x = (dx * cos - dy * sin).round() as i32;
    let y = (dx * sin + dy * cos).round() as i32;
    Point::new(x + center.x, y + center.y)
}

/// Split decimal hours into whole hours, whole minutes and seconds.
pub fn decimal_to_hms(hours: f64) -> (i32, i32, f64) {
    let h = hours.trunc();
    let minutes = (hours - h) * 60.0;
    let m = minutes.trunc();
    let seconds = (minutes - m) * 60.0;
    (h as i32, m as i32, seconds)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use core::f64::consts::PI;

    use super::*;

    #[test]
    fn test_fix_sqrt_table() {
        let cases: [(u32, u32); 14] = [
            (0, 0),
            (1, 1),
            (2, 1),
            (3, 2),
            (4, 2),
            (6, 2),
            (7, 3),
            (8, 3),
            (9, 3),
            (12, 3),
            (13, 4),
            (961, 31),
            (992, 31),
            ((1 << 30) - 1, 32768),
        ];
        for (x, expected) in cases {
            assert_eq!(fix_sqrt(x), expected, "fix_sqrt({x})");
        }
    }

    #[test]
    fn test_fix_sqrt_rounds_to_nearest() {
        for x in 0u32..20_000 {
            let floor = (f64::from(x)).sqrt() as u32;
            let floor = if (floor + 1) * (floor + 1) <= x { floor + 1 } else { floor };
            let expected = if x - floor * floor > floor { floor + 1 } else { floor };
            assert_eq!(fix_sqrt(x), expected, "fix_sqrt({x})");
        }
    }

    #[test]
    fn test_fix_sqrt_full_range() {
        assert_eq!(fix_sqrt(u32::MAX), 65536);
        assert_eq!(fix_sqrt(65535 * 65535), 65535);
    }

    #[test]
    fn test_rotate_identity() {
        let center = Point::new(136, 136);
        for p in [Point::new(136, 10), Point::new(200, 50), Point::new(0, 271)] {
            assert_eq!(rotate_point(center, p, 0.0), p);
            assert_eq!(rotate_point(center, p, 2.0 * PI), p);
        }
    }

    #[test]
    fn test_rotate_half_turn() {
        let center = Point::new(136, 136);
        assert_eq!(rotate_point(center, Point::new(236, 136), PI), Point::new(36, 136));
        assert_eq!(rotate_point(center, Point::new(136, 10), PI), Point::new(136, 262));
    }

    #[test]
    fn test_rotate_quarter_turn_is_clockwise() {
        // Top of the dial moves to the right side
        let center = Point::new(100, 100);
        assert_eq!(rotate_point(center, Point::new(100, 0), PI / 2.0), Point::new(200, 100));
    }

    #[test]
    fn test_round_half_down() {
        assert_eq!(round_half_down(90.0), 90);
        assert_eq!(round_half_down(90.4), 90);
        assert_eq!(round_half_down(90.5), 90);
        assert_eq!(round_half_down(90.51), 91);
        assert_eq!(round_half_down(359.9), 360);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-5.0), 355.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
    }

    #[test]
    fn test_decimal_to_hms() {
        let (h, m, s) = decimal_to_hms(1.5);
        assert_eq!((h, m), (1, 30));
        assert!(s.abs() < 1e-6);

        let (h, m, s) = decimal_to_hms(2.0 + 15.0 / 60.0 + 30.0 / 3600.0);
        assert_eq!((h, m), (2, 15));
        assert!((s - 30.0).abs() < 1e-6);
    }
}
