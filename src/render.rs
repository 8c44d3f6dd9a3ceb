//! Render context and the update loop that serializes all drawing.
//!
//! Nothing in the surface or the instruments is thread-safe. Sensor threads
//! therefore never draw: they send [`Update`]s over a channel and a single
//! [`RenderLoop`] applies them to the [`Cockpit`], which owns everything that
//! draws.
//!
//! # Flush Strategy
//!
//! | Event | Flush |
//! |-------|-------|
//! | Batch of updates applied, something drawn | Once, after the batch |
//! | Batch applied, nothing changed on screen | None |
//! | Fix lost | Immediately |
//! | Time update while there is no fix | Immediately |
//!
//! The last two keep the screen alive when the receiver loses the sky and only
//! time messages keep coming.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::colors::ColorSchema;
use crate::config::{POLL_INTERVAL, Settings};
use crate::hsi::{Hsi, Redraw};
use crate::readout::{NavStatus, Readouts};
use crate::surface::{FrameDevice, Surface};
use crate::telemetry::{Date, Dilution, FixMode, Position, TelemetrySnapshot, UtcTime};

// =============================================================================
// Updates
// =============================================================================

/// One collaborator call, carried from a sensor thread to the render thread.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    /// Heading from a heading source (true, magnetic).
    Direction { heading: f64, magnetic: f64 },
    /// GPS track over ground, used as heading when moving.
    Track { true_track: f64, magnetic: f64 },
    /// Desired course and cross-track deviation in metres (positive right).
    Course { course: f64, deviation: f64 },
    Deviation(f64),
    /// Altitude in feet.
    Altitude(f64),
    /// Expected altitude in feet.
    ExpectedAltitude(f64),
    /// Ground speed in km/h.
    Speed(f64),
    FixMode(FixMode),
    Satellites { active: u8, in_view: u8 },
    Dilution(Dilution),
    HorizontalDilution(f32),
    Time(UtcTime),
    Date(Date),
    Position(Position),
    NavStatus { status: NavStatus, waypoint: String },
    /// Remaining leg: distance (km), average speed (km/h), time enroute (h).
    NavLeg { distance_km: f64, avg_kmh: f64, hours: f64 },
    /// Distance to the active waypoint in radians of arc.
    NavDistance(f64),
    /// Along-track distance in radians of arc.
    NavAlongTrack(f64),
    /// Whole route: distance (km), average speed (km/h), time to go (h).
    NavTotals { distance_km: f64, avg_kmh: f64, hours: f64 },
}

// =============================================================================
// Cockpit
// =============================================================================

/// Everything that draws, owned by the render thread.
pub struct Cockpit<D: FrameDevice> {
    surface: Surface<D>,
    colors: ColorSchema,
    hsi: Hsi,
    readouts: Readouts,
    telemetry: TelemetrySnapshot,
}

impl<D: FrameDevice> Cockpit<D> {
    /// Paint the initial screen (rose heading north, no satellites, unknown
    /// fix) and show it.
    pub fn new(
        surface: Surface<D>,
        settings: &Settings,
    ) -> Self {
        let colors = ColorSchema::DEFAULT.with_overrides(&settings.colors);
        let height = surface.height();
        let mut cockpit = Self {
            surface,
            colors,
            hsi: Hsi::new(height, colors, settings.units.track_error),
            readouts: Readouts::new(height, colors, settings.units),
            telemetry: TelemetrySnapshot::new(),
        };
        cockpit.first_draw();
        cockpit
    }

    fn first_draw(&mut self) {
        let s = &mut self.surface;
        s.clear_rows(0, s.height(), self.colors.background);
        self.hsi.first_draw(s);
        self.hsi.update_direction(s, 0.0, 0.0);
        self.readouts.print_satellites(s, 0, 0);
        self.readouts.print_fix_mode(s, FixMode::Unknown);
        s.flush();
        log::info!("Initial screen drawn ({}x{})", s.width(), s.height());
    }

    pub const fn surface(&self) -> &Surface<D> { &self.surface }

    pub const fn hsi(&self) -> &Hsi { &self.hsi }

    pub const fn telemetry(&self) -> &TelemetrySnapshot { &self.telemetry }

    pub const fn colors(&self) -> &ColorSchema { &self.colors }

    /// Show everything drawn since the last flush.
    pub fn flush(&mut self) { self.surface.flush(); }

    /// Release the display. Later updates draw nothing.
    pub fn close(&mut self) { self.surface.close(); }

    // =========================================================================
    // HSI
    // =========================================================================

    pub fn update_direction(
        &mut self,
        heading: f64,
        magnetic: f64,
    ) -> Redraw {
        self.hsi.update_direction(&mut self.surface, heading, magnetic)
    }

    /// GPS track becomes the heading only while moving.
    pub fn update_track(
        &mut self,
        true_track: f64,
        magnetic: f64,
    ) -> Redraw {
        if !self.telemetry.update_track(true_track, magnetic) {
            return Redraw::Unchanged;
        }
        self.hsi.update_direction(&mut self.surface, true_track, magnetic)
    }

    pub fn update_course(
        &mut self,
        course: f64,
        deviation: f64,
    ) -> Redraw {
        self.hsi.update_course(&mut self.surface, course, deviation)
    }

    pub fn update_deviation(
        &mut self,
        deviation: f64,
    ) -> Redraw {
        self.hsi.update_deviation(&mut self.surface, deviation)
    }

    /// Altitude in feet: tape and the numeric readout.
    pub fn update_altitude(
        &mut self,
        feet: f64,
    ) -> bool {
        if !self.telemetry.update_altitude(feet) {
            return false;
        }
        let tape = self.hsi.draw_altitude_scale(&mut self.surface, feet);
        let text = self.readouts.print_altitude(&mut self.surface, feet);
        tape || text
    }

    pub fn update_expected_altitude(
        &mut self,
        feet: f64,
    ) -> bool {
        self.hsi.update_vsi(&mut self.surface, feet)
    }

    // =========================================================================
    // Receiver
    // =========================================================================

    pub fn update_speed(
        &mut self,
        kmh: f64,
    ) -> bool {
        self.telemetry.update_speed(kmh) && self.readouts.print_speed(&mut self.surface, kmh)
    }

    pub fn update_fix_mode(
        &mut self,
        mode: FixMode,
    ) -> bool {
        if !self.telemetry.update_fix_mode(mode) {
            return false;
        }
        log::info!("Fix mode {mode:?}");
        let drawn = self.readouts.print_fix_mode(&mut self.surface, mode);
        if mode == FixMode::NoFix {
            self.surface.flush();
        }
        drawn
    }

    pub fn update_satellite_counts(
        &mut self,
        active: u8,
        in_view: u8,
    ) -> bool {
        self.telemetry.update_satellite_counts(active, in_view)
            && self.readouts.print_satellites(&mut self.surface, active, in_view)
    }

    pub fn update_dilution(
        &mut self,
        dilution: Dilution,
    ) -> bool {
        self.telemetry.update_dilution(dilution) && self.readouts.print_dilution(&mut self.surface, dilution)
    }

    pub fn update_horizontal_dilution(
        &mut self,
        horizontal: f32,
    ) -> bool {
        if !self.telemetry.update_horizontal_dilution(horizontal) {
            return false;
        }
        match self.telemetry.dilution() {
            Some(dilution) => self.readouts.print_dilution(&mut self.surface, dilution),
            None => false,
        }
    }

    pub fn update_time(
        &mut self,
        time: UtcTime,
    ) -> bool {
        if !self.telemetry.update_time(time) {
            return false;
        }
        let has_fix = self.telemetry.fix_mode().has_fix();
        let drawn = self.readouts.print_time(&mut self.surface, time, has_fix);
        if !has_fix {
            self.surface.flush();
        }
        drawn
    }

    /// Stored only, the date is not displayed.
    pub fn update_date(
        &mut self,
        date: Date,
    ) -> bool {
        let changed = self.telemetry.update_date(date);
        if let Some(date) = self.telemetry.date().filter(|_| changed) {
            log::debug!("Date {:04}-{:02}-{:02}", date.year, date.month, date.day);
        }
        changed
    }

    pub fn update_position(
        &mut self,
        position: Position,
    ) -> bool {
        self.telemetry.update_position(position) && self.readouts.print_position(&mut self.surface, position)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn update_nav_status(
        &mut self,
        status: NavStatus,
        waypoint: &str,
    ) -> bool {
        self.readouts.print_nav_status(&mut self.surface, status, waypoint)
    }

    pub fn update_nav_leg(
        &mut self,
        distance_km: f64,
        avg_kmh: f64,
        hours: f64,
    ) -> bool {
        self.readouts.print_waypoint_leg(&mut self.surface, distance_km, avg_kmh, hours)
    }

    pub fn update_nav_distance(
        &mut self,
        distance_rad: f64,
    ) -> bool {
        self.readouts.print_distance_to_go(&mut self.surface, distance_rad)
    }

    pub fn update_nav_along_track(
        &mut self,
        along_track_rad: f64,
    ) -> bool {
        self.readouts.print_along_track(&mut self.surface, along_track_rad)
    }

    pub fn update_nav_totals(
        &mut self,
        distance_km: f64,
        avg_kmh: f64,
        hours: f64,
    ) -> bool {
        let now = self.telemetry.time();
        self.readouts.print_route_totals(&mut self.surface, distance_km, avg_kmh, hours, now)
    }

    /// Dispatch one update. Returns `true` if it changed the screen.
    pub fn apply(
        &mut self,
        update: Update,
    ) -> bool {
        match update {
            Update::Direction { heading, magnetic } => self.update_direction(heading, magnetic).repainted(),
            Update::Track { true_track, magnetic } => self.update_track(true_track, magnetic).repainted(),
            Update::Course { course, deviation } => self.update_course(course, deviation).repainted(),
            Update::Deviation(deviation) => self.update_deviation(deviation).repainted(),
            Update::Altitude(feet) => self.update_altitude(feet),
            Update::ExpectedAltitude(feet) => self.update_expected_altitude(feet),
            Update::Speed(kmh) => self.update_speed(kmh),
            Update::FixMode(mode) => self.update_fix_mode(mode),
            Update::Satellites { active, in_view } => self.update_satellite_counts(active, in_view),
            Update::Dilution(dilution) => self.update_dilution(dilution),
            Update::HorizontalDilution(horizontal) => self.update_horizontal_dilution(horizontal),
            Update::Time(time) => self.update_time(time),
            Update::Date(date) => self.update_date(date),
            Update::Position(position) => self.update_position(position),
            Update::NavStatus { status, waypoint } => self.update_nav_status(status, &waypoint),
            Update::NavLeg { distance_km, avg_kmh, hours } => self.update_nav_leg(distance_km, avg_kmh, hours),
            Update::NavDistance(rad) => self.update_nav_distance(rad),
            Update::NavAlongTrack(rad) => self.update_nav_along_track(rad),
            Update::NavTotals { distance_km, avg_kmh, hours } => self.update_nav_totals(distance_km, avg_kmh, hours),
        }
    }
}

// =============================================================================
// Render Loop
// =============================================================================

/// Counters reported when the loop ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub updates: u64,
    pub flushes: u64,
}

/// Single consumer of the update channel.
#[derive(Clone, Copy, Debug)]
pub struct RenderLoop {
    poll: Duration,
}

impl Default for RenderLoop {
    fn default() -> Self { Self::new(POLL_INTERVAL) }
}

impl RenderLoop {
    /// `poll` bounds how long a shutdown request can go unnoticed.
    pub const fn new(poll: Duration) -> Self { Self { poll } }

    /// Apply updates until `shutdown` is set or every sender is gone.
    ///
    /// Waits at most `poll` for the next update, then drains whatever else is
    /// queued and flushes once for the whole batch.
    pub fn run<D: FrameDevice>(
        &self,
        cockpit: &mut Cockpit<D>,
        updates: &Receiver<Update>,
        shutdown: &AtomicBool,
    ) -> LoopStats {
        log::info!("Render loop started");
        let mut stats = LoopStats::default();
        while !shutdown.load(Ordering::Relaxed) {
            match updates.recv_timeout(self.poll) {
                Ok(update) => {
                    cockpit.apply(update);
                    stats.updates += 1;
                    for update in updates.try_iter() {
                        cockpit.apply(update);
                        stats.updates += 1;
                    }
                    if cockpit.surface().is_dirty() {
                        cockpit.flush();
                        stats.flushes += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("All update feeds closed");
                    break;
                }
            }
        }
        log::info!("Render loop stopped: {} updates, {} flushes", stats.updates, stats.flushes);
        stats
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::error::FeedError;
    use crate::feed::parse_line;
    use crate::surface::MemoryDevice;

    fn cockpit() -> Cockpit<MemoryDevice> {
        Cockpit::new(Surface::with_device(MemoryDevice::new(480, 272)), &Settings::default())
    }

    fn presents(c: &Cockpit<MemoryDevice>) -> usize { c.surface().device().map_or(0, MemoryDevice::presents) }

    #[test]
    fn test_initial_screen_is_shown() {
        let c = cockpit();
        assert_eq!(presents(&c), 1);
        assert!(!c.surface().is_dirty());
        assert_eq!(c.hsi().display_direction(), Some(360));
        let device = c.surface().device().unwrap();
        assert_eq!(device.pixels(), c.surface().back_buffer());
    }

    #[test]
    fn test_color_overrides_apply() {
        let mut settings = Settings::default();
        settings.colors.background = Some(0x001F);
        let c = Cockpit::new(Surface::with_device(MemoryDevice::new(480, 272)), &settings);
        assert_eq!(c.colors().background, crate::colors::from_raw(0x001F));
        assert_eq!(c.surface().pixel(479, 271), Some(crate::colors::from_raw(0x001F)));
    }

    #[test]
    fn test_updates_wait_for_flush() {
        let mut c = cockpit();
        assert!(c.update_speed(100.0));
        assert!(!c.update_speed(100.0));
        assert!(c.update_altitude(1500.0));
        assert_eq!(presents(&c), 1);
        c.flush();
        assert_eq!(presents(&c), 2);
    }

    #[test]
    fn test_fix_loss_flushes_immediately() {
        let mut c = cockpit();
        assert!(c.update_fix_mode(FixMode::Fix3D));
        assert_eq!(presents(&c), 1);
        assert!(c.update_fix_mode(FixMode::NoFix));
        assert_eq!(presents(&c), 2);
    }

    #[test]
    fn test_time_without_fix_flushes() {
        let mut c = cockpit();
        let time = UtcTime {
            hour: 12,
            minute: 0,
            second: 1.0,
        };
        assert!(c.update_time(time));
        assert_eq!(presents(&c), 2);

        c.update_fix_mode(FixMode::Fix3D);
        let later = UtcTime { second: 2.0, ..time };
        assert!(c.update_time(later));
        assert_eq!(presents(&c), 2);
    }

    #[test]
    fn test_track_needs_ground_speed() {
        let mut c = cockpit();
        assert_eq!(c.update_track(90.0, 88.0), Redraw::Unchanged);
        assert_eq!(c.hsi().direction(), 0.0);
        c.update_speed(30.0);
        assert_eq!(c.update_track(90.0, 88.0), Redraw::Full);
        assert_eq!(c.hsi().direction(), 90.0);
    }

    #[test]
    fn test_apply_dispatches() {
        let mut c = cockpit();
        assert!(c.apply(Update::Course { course: 45.0, deviation: 10.0 }));
        assert_eq!(c.hsi().course(), Some(45.0));
        assert!(c.apply(Update::Satellites { active: 5, in_view: 9 }));
        assert_eq!(c.telemetry().satellites(), (5, 9));
        assert!(!c.apply(Update::Direction { heading: 400.0, magnetic: 0.0 }));
        assert!(c.apply(Update::NavStatus {
            status: NavStatus::ToWaypoint,
            waypoint: "LIRU".into(),
        }));
    }

    #[test]
    fn test_non_finite_feed_values_never_reach_the_display() {
        for line in ["alt inf", "exp -inf", "spd NaN", "dev inf", "utc 300 -5 nan", "dop 1 nan 1"] {
            assert!(matches!(parse_line(line), Err(FeedError::OutOfRange { .. })), "{line}");
        }
    }

    #[test]
    fn test_extreme_samples_do_not_crash() {
        let mut c = cockpit();
        let lines = [
            "dir 359.99 0",
            "alt 1e300",
            "exp -1e300",
            "alt -1e300",
            "spd 1e300",
            "crs 0 1e300",
            "dev -1e300",
            "pos 1e300 -1e300",
            "utc 23 59 60.9",
            "sat 99 99",
            "dop 99 99 99",
            "date 31 12 9999",
        ];
        for line in lines {
            let update = parse_line(line).unwrap().unwrap();
            c.apply(update);
        }
        c.apply(Update::Altitude(f64::INFINITY));
        c.apply(Update::ExpectedAltitude(f64::NAN));
        c.apply(Update::NavLeg {
            distance_km: f64::MAX,
            avg_kmh: f64::INFINITY,
            hours: f64::NAN,
        });
        c.apply(Update::NavTotals {
            distance_km: -f64::MAX,
            avg_kmh: 1e300,
            hours: 47.99,
        });
        c.flush();
        assert_eq!(c.hsi().altitude_ft(), Some(-100_000));
        assert_eq!(c.hsi().expected_altitude_ft(), Some(-100_000));
    }

    #[test]
    fn test_closed_cockpit_draws_nothing() {
        let mut c = cockpit();
        c.close();
        c.close();
        assert!(!c.surface().is_open());
        c.update_direction(90.0, 90.0);
        c.update_altitude(1000.0);
        c.flush();
        assert!(c.surface().back_buffer().is_empty());
    }

    #[test]
    fn test_loop_flushes_once_per_batch() {
        let mut c = cockpit();
        let (tx, rx) = mpsc::channel();
        tx.send(Update::Direction { heading: 90.0, magnetic: 88.0 }).unwrap();
        tx.send(Update::Altitude(1200.0)).unwrap();
        tx.send(Update::Speed(80.0)).unwrap();
        drop(tx);

        let shutdown = AtomicBool::new(false);
        let stats = RenderLoop::new(Duration::from_millis(5)).run(&mut c, &rx, &shutdown);
        assert_eq!(stats, LoopStats { updates: 3, flushes: 1 });
        assert_eq!(presents(&c), 2);
    }

    #[test]
    fn test_loop_skips_flush_when_nothing_changed() {
        let mut c = cockpit();
        let (tx, rx) = mpsc::channel();
        tx.send(Update::Direction { heading: 0.0, magnetic: 0.0 }).unwrap();
        drop(tx);
        let stats = RenderLoop::default().run(&mut c, &rx, &AtomicBool::new(false));
        assert_eq!(stats, LoopStats { updates: 1, flushes: 0 });
    }

    #[test]
    fn test_loop_honors_shutdown() {
        let mut c = cockpit();
        let (tx, rx) = mpsc::channel();
        tx.send(Update::Speed(10.0)).unwrap();
        let stats = RenderLoop::default().run(&mut c, &rx, &AtomicBool::new(true));
        assert_eq!(stats, LoopStats::default());
        drop(tx);
    }
}
