//! Error types for the framebuffer device, the configuration file and the
//! telemetry feed.
//!
//! Drawing itself never fails: everything outside the clip window is dropped
//! silently. A malformed feed line is logged and skipped.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while opening and mapping a framebuffer device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot open framebuffer device {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read fixed screen information: {0}")]
    FixedInfo(#[source] io::Error),

    #[error("cannot read variable screen information: {0}")]
    VariableInfo(#[source] io::Error),

    #[error("unsupported color depth: {0} bits per pixel (only 16 is supported)")]
    UnsupportedDepth(u32),

    #[error("invalid framebuffer geometry: {width}x{height}, line length {line_length} bytes")]
    InvalidGeometry {
        width: u32,
        height: u32,
        line_length: u32,
    },

    #[error("cannot map framebuffer memory: {0}")]
    Map(#[source] io::Error),
}

/// Failures while loading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A feed line that is not a valid update.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` takes {expected} argument(s), got {found}")]
    Arity {
        command: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("unknown fix mode `{0}` (expected none, 2d, 3d, gps or unknown)")]
    UnknownFixMode(String),

    #[error("`{command}` value `{value}` out of range")]
    OutOfRange {
        command: String,
        value: String,
    },
}
