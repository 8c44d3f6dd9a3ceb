//! Display units and conversions.
//!
//! Telemetry arrives in SI-ish base units (km/h, km, metres, feet for altitude,
//! radians of arc for great-circle distances). The readout panel converts to the
//! configured display unit at the moment it formats a value.

use core::fmt;

use serde::Deserialize;

// =============================================================================
// Conversion Constants
// =============================================================================

/// Kilometres per nautical mile.
pub const KM_PER_NM: f64 = 1.852;

/// Kilometres per statute mile.
pub const KM_PER_MILE: f64 = 1.609_344;

/// Metres per foot.
pub const M_PER_FT: f64 = 0.3048;

/// Feet per statute mile.
pub const FT_PER_MILE: f64 = 5280.0;

/// Mean earth radius used to turn radians of arc into distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// =============================================================================
// Conversions
// =============================================================================

#[inline]
pub fn km_to_nm(km: f64) -> f64 { km / KM_PER_NM }

#[inline]
pub fn km_to_miles(km: f64) -> f64 { km / KM_PER_MILE }

#[inline]
pub fn m_to_ft(m: f64) -> f64 { m / M_PER_FT }

#[inline]
pub fn ft_to_m(ft: f64) -> f64 { ft * M_PER_FT }

#[inline]
pub fn m_to_nm(m: f64) -> f64 { km_to_nm(m / 1000.0) }

/// Radians of arc to nautical miles (one minute of arc is one NM).
#[inline]
pub fn rad_to_nm(rad: f64) -> f64 { rad.to_degrees() * 60.0 }

#[inline]
pub fn rad_to_km(rad: f64) -> f64 { rad * EARTH_RADIUS_KM }

#[inline]
pub fn rad_to_miles(rad: f64) -> f64 { km_to_miles(rad_to_km(rad)) }

// =============================================================================
// Unit Selection
// =============================================================================

/// Ground speed display unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    #[default]
    Kmh,
    Knots,
    Mph,
}

impl SpeedUnit {
    /// Convert from km/h.
    pub fn convert_kmh(
        self,
        kmh: f64,
    ) -> f64 {
        match self {
            Self::Kmh => kmh,
            Self::Knots => km_to_nm(kmh),
            Self::Mph => km_to_miles(kmh),
        }
    }

    /// Padded label, all three are the same width.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kmh => "Km/h ",
            Self::Knots => "Knots",
            Self::Mph => "MPH  ",
        }
    }
}

/// Route distance display unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Km,
    Nm,
    Mi,
}

impl DistanceUnit {
    /// Convert from kilometres.
    pub fn convert_km(
        self,
        km: f64,
    ) -> f64 {
        match self {
            Self::Km => km,
            Self::Nm => km_to_nm(km),
            Self::Mi => km_to_miles(km),
        }
    }

    /// Convert from radians of great-circle arc.
    pub fn convert_rad(
        self,
        rad: f64,
    ) -> f64 {
        match self {
            Self::Km => rad_to_km(rad),
            Self::Nm => rad_to_nm(rad),
            Self::Mi => rad_to_miles(rad),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Km => "Km",
            Self::Nm => "NM",
            Self::Mi => "Mi",
        }
    }
}

/// Cross-track error display unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackErrorUnit {
    #[default]
    M,
    Ft,
    Nm,
}

/// Unit selection for every readout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Units {
    pub speed: SpeedUnit,
    pub distance: DistanceUnit,
    pub track_error: TrackErrorUnit,
}

// =============================================================================
// Track Error Formatting
// =============================================================================

/// Cross-track error formatted for the compass readout.
///
/// The sign is dropped: the needle already shows the side. Large values switch to
/// the bigger unit of the same system (km above 1000 m, miles above 5280 ft).
#[derive(Clone, Copy, Debug)]
pub struct TrackError {
    pub metres: f64,
    pub unit: TrackErrorUnit,
}

impl fmt::Display for TrackError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let metres = self.metres.abs();
        match self.unit {
            TrackErrorUnit::M if metres >= 1000.0 => write!(f, "{:6.2} Km", metres / 1000.0),
            TrackErrorUnit::M => write!(f, "{metres:5.0}m"),
            TrackErrorUnit::Ft => {
                let feet = m_to_ft(metres);
                if feet >= FT_PER_MILE {
                    write!(f, "{:6.2} Mi", feet / FT_PER_MILE)
                } else {
                    write!(f, "{feet:5.0} Ft")
                }
            }
            TrackErrorUnit::Nm => write!(f, "{:6.2} NM", m_to_nm(metres)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
