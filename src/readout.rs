//! Textual readout panel right of the altitude tape.
//!
//! Each `print_*` method formats one group of fields in the configured units and
//! blits it at the row the [`ReadoutLayout`] gives for the screen size class.
//! Values are padded with trailing spaces so a shorter value erases the longer
//! one it replaces. Fields hidden in the current layout are skipped and the
//! method returns `false`.
//!
//! | Field | Standard | Compact |
//! |-------|----------|---------|
//! | Speed | `GS:   12.50 Knots` | `13 Knots` |
//! | Distance to go | `DTG:   1.234 NM` | `1.23 NM` |
//! | Time enroute | `ETE:  1:05:30` | ` 1:05` |

use core::fmt;

use embedded_graphics::pixelcolor::Rgb565;

use crate::colors::ColorSchema;
use crate::config::{Field, READOUT_MARGIN, ReadoutLayout, SizeClass};
use crate::geometry::decimal_to_hms;
use crate::surface::{FrameDevice, Surface};
use crate::telemetry::{Dilution, FixMode, Position, UtcTime};
use crate::units::{Units, ft_to_m};

/// Longest ETE shown, in hours.
const MAX_ETE_HOURS: f64 = 100.0;

/// Longest time to destination turned into an arrival time, in hours.
const MAX_ETA_HOURS: f64 = 48.0;

/// Route navigation state, as reported by the navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavStatus {
    NotInitialized,
    NoRoute,
    ReadyToStart,
    WaitingFix,
    ToDeparture,
    ToWaypoint,
    ToDestination,
    Ended,
    Planning,
}

impl NavStatus {
    /// Fixed-width label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotInitialized => "Nav not set   ",
            Self::NoRoute => "No route set  ",
            Self::ReadyToStart => "Ready to start",
            Self::WaitingFix => "Waiting FIX   ",
            Self::ToDeparture => "Nav to Depart.",
            Self::ToWaypoint => "Nav to WPT    ",
            Self::ToDestination => "Nav to Dest.  ",
            Self::Ended => "Nav ended     ",
            Self::Planning => "Busy, planning",
        }
    }
}

pub struct Readouts {
    x: i32,
    layout: &'static ReadoutLayout,
    colors: ColorSchema,
    units: Units,
}

impl Readouts {
    pub const fn new(
        height: i32,
        colors: ColorSchema,
        units: Units,
    ) -> Self {
        Self {
            x: height + READOUT_MARGIN,
            layout: SizeClass::from_height(height).layout(),
            colors,
            units,
        }
    }

    /// Left edge of the panel.
    pub const fn x(&self) -> i32 { self.x }

    pub const fn layout(&self) -> &'static ReadoutLayout { self.layout }

    fn print<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        field: Field,
        color: Rgb565,
        args: fmt::Arguments<'_>,
    ) -> bool {
        let Some(y) = self.layout.row(field) else {
            return false;
        };
        surface.blit_text(self.x, y, color, self.colors.background, false, args).is_some()
    }

    /// Latitude and longitude as degrees, minutes and seconds.
    pub fn print_position<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        position: Position,
    ) -> bool {
        let color = self.colors.text;
        let (d, m, s) = decimal_to_hms(position.latitude.abs());
        let ns = if position.latitude >= 0.0 { 'N' } else { 'S' };
        let lat = self.print(surface, Field::Latitude, color, format_args!("{d:3} {m:2}' {s:6.3}\" {ns} "));
        let (d, m, s) = decimal_to_hms(position.longitude.abs());
        let ew = if position.longitude >= 0.0 { 'E' } else { 'W' };
        let lon = self.print(surface, Field::Longitude, color, format_args!("{d:3} {m:2}' {s:6.3}\" {ew} "));
        lat || lon
    }

    pub fn print_speed<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        kmh: f64,
    ) -> bool {
        let unit = self.units.speed;
        let speed = unit.convert_kmh(kmh);
        if self.layout.terse {
            self.print(surface, Field::Speed, self.colors.text, format_args!("{speed:.0} {}", unit.label()))
        } else {
            self.print(surface, Field::Speed, self.colors.text, format_args!("GS: {speed:7.2} {}", unit.label()))
        }
    }

    pub fn print_nav_status<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        status: NavStatus,
        waypoint: &str,
    ) -> bool {
        let color = self.colors.text;
        let label = status.label();
        let (nav, wpt) = if self.layout.terse {
            (
                self.print(surface, Field::NavStatus, color, format_args!("{label}       ")),
                self.print(surface, Field::Waypoint, color, format_args!("{waypoint}               ")),
            )
        } else {
            (
                self.print(surface, Field::NavStatus, color, format_args!("NAV: {label}       ")),
                self.print(surface, Field::Waypoint, color, format_args!("WPT: {waypoint}                 ")),
            )
        };
        nav || wpt
    }

    fn print_distance<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        field: Field,
        label: &str,
        distance: f64,
    ) -> bool {
        let unit = self.units.distance.label();
        if self.layout.terse {
            self.print(surface, field, self.colors.text, format_args!("{distance:.2} {unit}     "))
        } else {
            self.print(surface, field, self.colors.text, format_args!("{label}: {distance:7.3} {unit}     "))
        }
    }

    /// Average speed is only shown once it is known (positive).
    fn print_average_speed<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        field: Field,
        avg_kmh: f64,
    ) -> bool {
        if avg_kmh <= 0.0 || self.layout.terse {
            return false;
        }
        let unit = self.units.speed;
        let speed = unit.convert_kmh(avg_kmh);
        self.print(surface, field, self.colors.text, format_args!("AS: {speed:5.1} {:<8}", unit.label()))
    }

    /// Remaining leg to the active waypoint: distance, average speed and time
    /// enroute (`hours`).
    pub fn print_waypoint_leg<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        dist_km: f64,
        avg_kmh: f64,
        hours: f64,
    ) -> bool {
        let dist = self.units.distance.convert_km(dist_km);
        let dtg = self.print_distance(surface, Field::DistanceToGo, "DTG", dist);
        let avg = self.print_average_speed(surface, Field::AverageSpeed, avg_kmh);

        let color = self.colors.text;
        let ete = if hours > 0.0 && hours < MAX_ETE_HOURS {
            let (h, m, s) = decimal_to_hms(hours);
            if self.layout.terse {
                self.print(surface, Field::TimeEnroute, color, format_args!("{h:2}:{m:02}    "))
            } else {
                self.print(surface, Field::TimeEnroute, color, format_args!("ETE: {h:2}:{m:02}:{s:02.0}    "))
            }
        } else if self.layout.terse {
            self.print(surface, Field::TimeEnroute, color, format_args!("--:--    "))
        } else {
            self.print(surface, Field::TimeEnroute, color, format_args!("ETE: --:--:--    "))
        };
        dtg || avg || ete
    }

    /// Distance to go given as great-circle arc in radians. Labelled on every
    /// screen size.
    pub fn print_distance_to_go<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        dist_rad: f64,
    ) -> bool {
        let unit = self.units.distance;
        let dist = unit.convert_rad(dist_rad);
        self.print(surface, Field::DistanceToGo, self.colors.text, format_args!("DTG: {dist:7.3} {}    ", unit.label()))
    }

    /// Along-track distance flown on the current leg, in radians of arc.
    pub fn print_along_track<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        atd_rad: f64,
    ) -> bool {
        let unit = self.units.distance;
        let atd = unit.convert_rad(atd_rad);
        self.print(surface, Field::AlongTrack, self.colors.text, format_args!("ATD: {atd:7.3} {}  ", unit.label()))
    }

    pub fn print_altitude<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        feet: f64,
    ) -> bool {
        let metres = ft_to_m(feet);
        self.print(surface, Field::Altitude, self.colors.text, format_args!("{feet:.0} Ft   {metres:.0} m    "))
    }

    /// Whole route: total distance, average speed and arrival time.
    ///
    /// `hours` is the time to destination; `now` is the current UTC time the
    /// arrival is computed from. Without it the arrival time stays blank.
    pub fn print_route_totals<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        dist_km: f64,
        avg_kmh: f64,
        hours: f64,
        now: Option<UtcTime>,
    ) -> bool {
        let dist = self.units.distance.convert_km(dist_km);
        let dtg = self.print_distance(surface, Field::TotalDistanceToGo, "Tot DTG", dist);
        let avg = self.print_average_speed(surface, Field::TotalAverageSpeed, avg_kmh);

        let color = self.colors.text;
        let eta = match now {
            Some(now) if hours > 0.0 && hours < MAX_ETA_HOURS => {
                let now_h = f64::from(now.hour) + f64::from(now.minute) / 60.0 + f64::from(now.second) / 3600.0;
                let mut arrival = now_h + hours;
                while arrival >= 24.0 {
                    arrival -= 24.0;
                }
                let (h, m, s) = decimal_to_hms(arrival);
                self.print(surface, Field::ArrivalTime, color, format_args!("ETA: {h:2}:{m:02}:{s:02.0}    "))
            }
            _ => self.print(surface, Field::ArrivalTime, color, format_args!("ETA: --:--:--    ")),
        };
        dtg || avg || eta
    }

    /// Drawn in the CDI color while there is no fix.
    pub fn print_time<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        time: UtcTime,
        has_fix: bool,
    ) -> bool {
        let color = if has_fix { self.colors.text } else { self.colors.cdi };
        self.print(
            surface,
            Field::Time,
            color,
            format_args!("UTC: {:02}:{:02}:{:02.0}", time.hour, time.minute, time.second),
        )
    }

    pub fn print_satellites<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        active: u8,
        in_view: u8,
    ) -> bool {
        let color = match active {
            4.. => self.colors.text,
            3 => self.colors.cdi,
            _ => self.colors.warning,
        };
        self.print(surface, Field::Satellites, color, format_args!("SAT: {active:2}/{in_view:2}"))
    }

    pub fn print_fix_mode<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        mode: FixMode,
    ) -> bool {
        let (label, color) = match mode {
            FixMode::Fix3D => ("FIX: 3D mode", self.colors.text),
            FixMode::Fix2D => ("FIX: 2D mode", self.colors.warning),
            FixMode::GpsFix => ("FIX: GPS Fix", self.colors.warning),
            FixMode::NoFix => ("FIX: No Fix ", self.colors.warning),
            FixMode::Unknown => ("FIX: Unknown", self.colors.warning),
        };
        self.print(surface, Field::FixMode, color, format_args!("{label}"))
    }

    pub fn print_dilution<D: FrameDevice>(
        &self,
        surface: &mut Surface<D>,
        dop: Dilution,
    ) -> bool {
        self.print(
            surface,
            Field::Dilution,
            self.colors.text,
            format_args!("DOP P:{:4.1} H:{:4.1} V:{:4.1}", dop.position, dop.horizontal, dop.vertical),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{CHAR_WIDTH, glyph};
    use crate::surface::MemoryDevice;
    use crate::units::{DistanceUnit, SpeedUnit};

    fn standard() -> (Surface<MemoryDevice>, Readouts) {
        let units = Units {
            speed: SpeedUnit::Knots,
            distance: DistanceUnit::Nm,
            ..Units::default()
        };
        (Surface::with_device(MemoryDevice::new(480, 272)), Readouts::new(272, ColorSchema::default(), units))
    }

    fn compact() -> (Surface<MemoryDevice>, Readouts) {
        (Surface::with_device(MemoryDevice::new(320, 240)), Readouts::new(240, ColorSchema::default(), Units::default()))
    }

    /// True if the cell at `index` along the row holds `c` drawn in `color`.
    fn has_char(
        s: &Surface<MemoryDevice>,
        x: i32,
        y: i32,
        index: i32,
        c: char,
        color: Rgb565,
    ) -> bool {
        let left = x + index * CHAR_WIDTH;
        let bg = ColorSchema::default().background;
        glyph(c).iter().zip(0..).all(|(bits, col)| {
            (0..8).all(|row| {
                let expected = if (bits >> row) & 1 != 0 { color } else { bg };
                s.pixel(left + col, y + row) == Some(expected)
            })
        })
    }

    #[test]
    fn test_panel_column() {
        let (_, r) = standard();
        assert_eq!(r.x(), 300);
        let (_, r) = compact();
        assert_eq!(r.x(), 268);
    }

    #[test]
    fn test_speed_in_knots() {
        let (mut s, r) = standard();
        let text = ColorSchema::default().text;
        assert!(r.print_speed(&mut s, 18.52));
        // "GS:   10.00 Knots"
        assert!(has_char(&s, 300, 32, 0, 'G', text));
        assert!(has_char(&s, 300, 32, 6, '1', text));
        assert!(has_char(&s, 300, 32, 12, 'K', text));
    }

    #[test]
    fn test_compact_speed_is_terse() {
        let (mut s, r) = compact();
        let text = ColorSchema::default().text;
        assert!(r.print_speed(&mut s, 42.4));
        assert!(has_char(&s, 268, 32, 0, '4', text));
        assert!(has_char(&s, 268, 32, 1, '2', text));
    }

    #[test]
    fn test_distance_to_go_is_labelled_on_compact() {
        let (mut s, r) = compact();
        let text = ColorSchema::default().text;
        assert!(r.print_distance_to_go(&mut s, 0.001));
        assert!(has_char(&s, 268, 72, 0, 'D', text));
        assert!(has_char(&s, 268, 72, 1, 'T', text));

        // The leg distance stays terse
        assert!(r.print_waypoint_leg(&mut s, 6.371, 0.0, 0.0));
        assert!(has_char(&s, 268, 72, 0, '6', text));
    }

    #[test]
    fn test_hidden_fields_are_skipped() {
        let (mut s, r) = compact();
        let position = Position {
            latitude: 45.5,
            longitude: -9.25,
        };
        assert!(!r.print_position(&mut s, position));
        assert!(!r.print_along_track(&mut s, 0.01));
        assert!(!r.print_dilution(&mut s, Dilution { position: 1.0, horizontal: 1.0, vertical: 1.0 }));
        assert!(s.back_buffer().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_position_hemispheres() {
        let (mut s, r) = standard();
        let text = ColorSchema::default().text;
        let position = Position {
            latitude: -45.5,
            longitude: 9.25,
        };
        assert!(r.print_position(&mut s, position));
        // " 45 30'  0.000\" S "
        assert!(has_char(&s, 300, 2, 16, 'S', text));
        assert!(has_char(&s, 300, 12, 16, 'E', text));
        assert!(has_char(&s, 300, 12, 2, '9', text));
    }

    #[test]
    fn test_satellite_colors() {
        let colors = ColorSchema::default();
        for (active, color) in [(7, colors.text), (3, colors.cdi), (2, colors.warning)] {
            let (mut s, r) = standard();
            assert!(r.print_satellites(&mut s, active, 9));
            assert!(has_char(&s, 300, 250, 0, 'S', color), "{active} satellites");
        }
    }

    #[test]
    fn test_fix_mode_colors() {
        let colors = ColorSchema::default();
        let (mut s, r) = standard();
        r.print_fix_mode(&mut s, FixMode::Fix3D);
        assert!(has_char(&s, 300, 260, 5, '3', colors.text));
        r.print_fix_mode(&mut s, FixMode::NoFix);
        assert!(has_char(&s, 300, 260, 5, 'N', colors.warning));
    }

    #[test]
    fn test_time_color_follows_fix() {
        let colors = ColorSchema::default();
        let (mut s, r) = standard();
        let time = UtcTime {
            hour: 9,
            minute: 5,
            second: 7.0,
        };
        r.print_time(&mut s, time, false);
        assert!(has_char(&s, 300, 240, 5, '0', colors.cdi));
        assert!(has_char(&s, 300, 240, 6, '9', colors.cdi));
        r.print_time(&mut s, time, true);
        assert!(has_char(&s, 300, 240, 6, '9', colors.text));
    }

    #[test]
    fn test_time_enroute_placeholder() {
        let (mut s, r) = standard();
        let text = ColorSchema::default().text;
        r.print_waypoint_leg(&mut s, 10.0, 0.0, 0.0);
        assert!(has_char(&s, 300, 102, 5, '-', text));
        // No average speed yet
        assert_eq!(s.pixel(300, 92), Some(Rgb565::new(0, 0, 0)));
        r.print_waypoint_leg(&mut s, 10.0, 100.0, 1.5);
        // "ETE:  1:30:00"
        assert!(has_char(&s, 300, 102, 6, '1', text));
        assert!(has_char(&s, 300, 102, 8, '3', text));
        assert!(has_char(&s, 300, 92, 0, 'A', text));
    }

    #[test]
    fn test_arrival_wraps_midnight() {
        let (mut s, r) = standard();
        let text = ColorSchema::default().text;
        let now = UtcTime {
            hour: 23,
            minute: 0,
            second: 0.0,
        };
        r.print_route_totals(&mut s, 100.0, 0.0, 2.0, Some(now));
        // "ETA:  1:00:00"
        assert!(has_char(&s, 300, 192, 6, '1', text));
        r.print_route_totals(&mut s, 100.0, 0.0, 50.0, Some(now));
        assert!(has_char(&s, 300, 192, 5, '-', text));
        r.print_route_totals(&mut s, 100.0, 0.0, 2.0, None);
        assert!(has_char(&s, 300, 192, 6, '-', text));
    }

    #[test]
    fn test_nav_status() {
        let (mut s, r) = standard();
        let text = ColorSchema::default().text;
        assert!(r.print_nav_status(&mut s, NavStatus::ToWaypoint, "LIRU"));
        assert!(has_char(&s, 300, 52, 5, 'N', text));
        assert!(has_char(&s, 300, 62, 5, 'L', text));
        assert_eq!(NavStatus::Planning.label().len(), NavStatus::NoRoute.label().len());
    }
}
