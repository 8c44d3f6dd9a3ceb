//! Display layout constants and the per-size-class layout table.
//!
//! # Pre-computed Layout Constants
//!
//! Scale factors of the instruments are compile-time constants. Everything that
//! depends on the screen resolution is either derived once when the HSI is created
//! (see [`crate::hsi::HsiGeometry`]) or looked up in the [`ReadoutLayout`] table
//! below, keyed by [`SizeClass`].
//!
//! # Size Classes
//!
//! | Class | Screen height | Readouts | Altitude half-scale |
//! |-------|---------------|----------|---------------------|
//! | Standard | anything but 240 px (480x272 panels) | labelled | 500 ft |
//! | Compact | 240 px (320x240 panels) | terse, fewer rows | 438 ft |
//!
//! A new panel size means a new table row, not new branches in the renderers.

use std::time::Duration;

// =============================================================================
// Device & Timing
// =============================================================================

/// Framebuffer device opened when neither the command line nor the config names one.
pub const DEFAULT_DEVICE: &str = "/dev/fb";

/// Upper bound on how long the render loop waits for an update before
/// re-checking the shutdown flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

// =============================================================================
// Course Deviation Indicator
// =============================================================================

/// Cross-track distance (metres) at which the deviation needle saturates.
/// 500 m is roughly 0.3 NM.
pub const CDI_FULL_SCALE_M: f64 = 500.0;

/// Needle offset in pixels at full scale deflection.
pub const CDI_PIXEL_SCALE: i32 = 75;

/// Scale dots on each side of the centre dot.
pub const CDI_SCALE_TICKS: i32 = 5;

// =============================================================================
// Altitude Tape
// =============================================================================

/// Tape resolution: 0.26 px per foot.
pub const ALT_PX_PER_FT: f64 = 0.26;

/// Feet between two tick lines.
pub const ALT_TICK_STEP_FT: i64 = 50;

/// Pixels between two tick lines (`ALT_TICK_STEP_FT * ALT_PX_PER_FT`).
pub const ALT_TICK_STEP_PX: i32 = 13;

/// Ticks on multiples of this altitude carry a label (in hundreds of feet).
pub const ALT_LABEL_STEP_FT: i64 = 100;

// =============================================================================
// Readout Panel
// =============================================================================

/// Screen height that selects the compact layout.
pub const COMPACT_HEIGHT: i32 = 240;

/// Gap between the altitude tape and the readout column.
/// The column starts at `screen height + READOUT_MARGIN`.
pub const READOUT_MARGIN: i32 = 28;

/// Screen size classes with their own layout.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SizeClass {
    /// 320x240 panels.
    Compact,
    /// 480x272 panels and anything else.
    Standard,
}

impl SizeClass {
    /// Pick the class for a screen height.
    pub const fn from_height(height: i32) -> Self {
        if height == COMPACT_HEIGHT { Self::Compact } else { Self::Standard }
    }

    /// Layout table row for this class.
    pub const fn layout(self) -> &'static ReadoutLayout {
        match self {
            Self::Compact => &COMPACT_LAYOUT,
            Self::Standard => &STANDARD_LAYOUT,
        }
    }
}

/// Readout fields placed by the layout table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    Latitude,
    Longitude,
    Speed,
    NavStatus,
    Waypoint,
    DistanceToGo,
    AlongTrack,
    AverageSpeed,
    TimeEnroute,
    Altitude,
    TotalDistanceToGo,
    TotalAverageSpeed,
    ArrivalTime,
    Dilution,
    Time,
    Satellites,
    FixMode,
}

/// Row positions of each readout field for one size class.
///
/// `None` hides the field in that class.
#[derive(Debug)]
pub struct ReadoutLayout {
    /// Short number-only formats instead of labelled ones.
    pub terse: bool,
    /// Feet shown above (and below) the current altitude on the tape.
    pub half_alt_scale_ft: i64,
    pub latitude: Option<i32>,
    pub longitude: Option<i32>,
    pub speed: Option<i32>,
    pub nav_status: Option<i32>,
    pub waypoint: Option<i32>,
    pub distance_to_go: Option<i32>,
    pub along_track: Option<i32>,
    pub average_speed: Option<i32>,
    pub time_enroute: Option<i32>,
    pub altitude: Option<i32>,
    pub total_distance_to_go: Option<i32>,
    pub total_average_speed: Option<i32>,
    pub arrival_time: Option<i32>,
    pub dilution: Option<i32>,
    pub time: Option<i32>,
    pub satellites: Option<i32>,
    pub fix_mode: Option<i32>,
}

impl ReadoutLayout {
    /// Top row of `field`, if it is shown in this layout.
    pub const fn row(
        &self,
        field: Field,
    ) -> Option<i32> {
        match field {
            Field::Latitude => self.latitude,
            Field::Longitude => self.longitude,
            Field::Speed => self.speed,
            Field::NavStatus => self.nav_status,
            Field::Waypoint => self.waypoint,
            Field::DistanceToGo => self.distance_to_go,
            Field::AlongTrack => self.along_track,
            Field::AverageSpeed => self.average_speed,
            Field::TimeEnroute => self.time_enroute,
            Field::Altitude => self.altitude,
            Field::TotalDistanceToGo => self.total_distance_to_go,
            Field::TotalAverageSpeed => self.total_average_speed,
            Field::ArrivalTime => self.arrival_time,
            Field::Dilution => self.dilution,
            Field::Time => self.time,
            Field::Satellites => self.satellites,
            Field::FixMode => self.fix_mode,
        }
    }
}

/// 480x272: every field, with labels.
pub const STANDARD_LAYOUT: ReadoutLayout = ReadoutLayout {
    terse: false,
    half_alt_scale_ft: 500,
    latitude: Some(2),
    longitude: Some(12),
    speed: Some(32),
    nav_status: Some(52),
    waypoint: Some(62),
    distance_to_go: Some(72),
    along_track: Some(82),
    average_speed: Some(92),
    time_enroute: Some(102),
    altitude: Some(133),
    total_distance_to_go: Some(172),
    total_average_speed: Some(182),
    arrival_time: Some(192),
    dilution: Some(212),
    time: Some(240),
    satellites: Some(250),
    fix_mode: Some(260),
};

/// 320x240: the readout column is only 52 px wide, so no position, no
/// along-track distance and no averages.
pub const COMPACT_LAYOUT: ReadoutLayout = ReadoutLayout {
    terse: true,
    half_alt_scale_ft: 438,
    latitude: None,
    longitude: None,
    speed: Some(32),
    nav_status: Some(52),
    waypoint: Some(62),
    distance_to_go: Some(72),
    along_track: None,
    average_speed: None,
    time_enroute: Some(102),
    altitude: Some(133),
    total_distance_to_go: Some(172),
    total_average_speed: None,
    arrival_time: Some(192),
    dilution: None,
    time: Some(202),
    satellites: Some(212),
    fix_mode: Some(222),
};

// =============================================================================
// Tests
// =============================================================================
