//! Last displayed telemetry values.
//!
//! Every `update_*` method stores the new value and returns `true` only if it
//! differs from what is on screen, so the caller knows whether to repaint.

/// Minimum ground speed for the GPS track to be trusted as heading.
pub const MIN_TRACK_SPEED_KMH: f64 = 2.0;

/// Receiver fix mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FixMode {
    #[default]
    Unknown,
    NoFix,
    Fix2D,
    Fix3D,
    /// Fix reported without a 2D/3D qualifier.
    GpsFix,
}

impl FixMode {
    pub const fn has_fix(self) -> bool { matches!(self, Self::Fix2D | Self::Fix3D | Self::GpsFix) }
}

/// Dilution of precision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dilution {
    pub position: f32,
    pub horizontal: f32,
    pub vertical: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UtcTime {
    pub hour: u8,
    pub minute: u8,
    pub second: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Date {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

/// Position in signed decimal degrees (north and east positive).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Default)]
pub struct TelemetrySnapshot {
    speed_kmh: Option<f64>,
    true_track: Option<f64>,
    magnetic_track: f64,
    position: Option<Position>,
    altitude_ft: Option<f64>,
    fix_mode: FixMode,
    active_sats: Option<u8>,
    sats_in_view: Option<u8>,
    dilution: Option<Dilution>,
    time: Option<UtcTime>,
    date: Option<Date>,
}

impl TelemetrySnapshot {
    pub fn new() -> Self { Self::default() }

    pub const fn speed_kmh(&self) -> Option<f64> { self.speed_kmh }

    pub const fn true_track(&self) -> Option<f64> { self.true_track }

    pub const fn magnetic_track(&self) -> f64 { self.magnetic_track }

    pub const fn position(&self) -> Option<Position> { self.position }

    pub const fn altitude_ft(&self) -> Option<f64> { self.altitude_ft }

    pub const fn fix_mode(&self) -> FixMode { self.fix_mode }

    pub fn satellites(&self) -> (u8, u8) { (self.active_sats.unwrap_or(0), self.sats_in_view.unwrap_or(0)) }

    pub const fn dilution(&self) -> Option<Dilution> { self.dilution }

    pub const fn time(&self) -> Option<UtcTime> { self.time }

    pub const fn date(&self) -> Option<Date> { self.date }

    pub fn update_speed(
        &mut self,
        kmh: f64,
    ) -> bool {
        replace_if_changed(&mut self.speed_kmh, kmh)
    }

    /// GPS track is noise while standing still; it is taken only above
    /// [`MIN_TRACK_SPEED_KMH`] (using the last known speed).
    pub fn update_track(
        &mut self,
        true_track: f64,
        magnetic_track: f64,
    ) -> bool {
        if self.speed_kmh.is_none_or(|kmh| kmh <= MIN_TRACK_SPEED_KMH) {
            return false;
        }
        if !replace_if_changed(&mut self.true_track, true_track) {
            return false;
        }
        self.magnetic_track = magnetic_track;
        true
    }

    pub fn update_position(
        &mut self,
        position: Position,
    ) -> bool {
        replace_if_changed(&mut self.position, position)
    }

    pub fn update_altitude(
        &mut self,
        feet: f64,
    ) -> bool {
        replace_if_changed(&mut self.altitude_ft, feet)
    }

    /// A plain [`FixMode::GpsFix`] report never downgrades a known 2D/3D fix.
    pub fn update_fix_mode(
        &mut self,
        mode: FixMode,
    ) -> bool {
        if mode == self.fix_mode {
            return false;
        }
        if mode == FixMode::GpsFix && matches!(self.fix_mode, FixMode::Fix2D | FixMode::Fix3D) {
            return false;
        }
        self.fix_mode = mode;
        true
    }

    pub fn update_active_satellites(
        &mut self,
        count: u8,
    ) -> bool {
        replace_if_changed(&mut self.active_sats, count)
    }

    pub fn update_satellites_in_view(
        &mut self,
        count: u8,
    ) -> bool {
        replace_if_changed(&mut self.sats_in_view, count)
    }

    pub fn update_satellite_counts(
        &mut self,
        active: u8,
        in_view: u8,
    ) -> bool {
        // Both must be stored, no short-circuit
        let active_changed = self.update_active_satellites(active);
        let view_changed = self.update_satellites_in_view(in_view);
        active_changed || view_changed
    }

    pub fn update_dilution(
        &mut self,
        dilution: Dilution,
    ) -> bool {
        replace_if_changed(&mut self.dilution, dilution)
    }

    /// Horizontal dilution only; the other two keep their last value (or the
    /// horizontal one if none is known yet).
    pub fn update_horizontal_dilution(
        &mut self,
        horizontal: f32,
    ) -> bool {
        let dilution = match self.dilution {
            Some(d) => Dilution { horizontal, ..d },
            None => Dilution {
                position: horizontal,
                horizontal,
                vertical: horizontal,
            },
        };
        self.update_dilution(dilution)
    }

    pub fn update_time(
        &mut self,
        time: UtcTime,
    ) -> bool {
        replace_if_changed(&mut self.time, time)
    }

    /// Two-digit years are taken as 20xx.
    pub fn update_date(
        &mut self,
        mut date: Date,
    ) -> bool {
        if date.year < 2000 {
            date.year += 2000;
        }
        replace_if_changed(&mut self.date, date)
    }
}

fn replace_if_changed<T: PartialEq>(
    slot: &mut Option<T>,
    value: T,
) -> bool {
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_value_is_a_change() {
        let mut t = TelemetrySnapshot::new();
        assert!(t.update_speed(0.0));
        assert!(!t.update_speed(0.0));
        assert!(t.update_speed(12.5));
    }

    #[test]
    fn test_track_needs_speed() {
        let mut t = TelemetrySnapshot::new();
        assert!(!t.update_track(90.0, 88.0));
        t.update_speed(2.0);
        assert!(!t.update_track(90.0, 88.0));
        t.update_speed(2.1);
        assert!(t.update_track(90.0, 88.0));
        assert!(!t.update_track(90.0, 87.0));
        assert_eq!(t.true_track(), Some(90.0));
        assert_eq!(t.magnetic_track(), 88.0);
    }

    #[test]
    fn test_gps_fix_never_downgrades() {
        let mut t = TelemetrySnapshot::new();
        assert!(t.update_fix_mode(FixMode::GpsFix));
        assert!(t.update_fix_mode(FixMode::Fix3D));
        assert!(!t.update_fix_mode(FixMode::GpsFix));
        assert_eq!(t.fix_mode(), FixMode::Fix3D);
        assert!(t.update_fix_mode(FixMode::Fix2D));
        assert!(!t.update_fix_mode(FixMode::GpsFix));
        assert!(t.update_fix_mode(FixMode::NoFix));
        assert!(t.update_fix_mode(FixMode::GpsFix));
    }

    #[test]
    fn test_satellite_counts() {
        let mut t = TelemetrySnapshot::new();
        assert_eq!(t.satellites(), (0, 0));
        assert!(t.update_satellite_counts(4, 9));
        assert!(!t.update_satellite_counts(4, 9));
        assert!(t.update_satellite_counts(5, 9));
        assert!(t.update_satellites_in_view(10));
        assert_eq!(t.satellites(), (5, 10));
    }

    #[test]
    fn test_horizontal_dilution() {
        let mut t = TelemetrySnapshot::new();
        assert!(t.update_horizontal_dilution(1.5));
        assert_eq!(t.dilution().map(|d| d.vertical), Some(1.5));
        assert!(t.update_dilution(Dilution { position: 2.0, horizontal: 1.5, vertical: 3.0 }));
        assert!(t.update_horizontal_dilution(1.0));
        assert_eq!(t.dilution(), Some(Dilution { position: 2.0, horizontal: 1.0, vertical: 3.0 }));
        assert!(!t.update_horizontal_dilution(1.0));
    }

    #[test]
    fn test_two_digit_year() {
        let mut t = TelemetrySnapshot::new();
        assert!(t.update_date(Date { day: 3, month: 7, year: 24 }));
        assert_eq!(t.date().map(|d| d.year), Some(2024));
        assert!(!t.update_date(Date { day: 3, month: 7, year: 2024 }));
    }
}
