//! Horizontal Situation Indicator renderer for Linux framebuffer displays.
//!
//! The crate draws an aviation HSI (rotating compass rose, course arrow, CDI
//! needle, altitude tape with expected-altitude chevron) and a column of
//! textual readouts into an off-screen back buffer, and copies the buffer to a
//! memory-mapped 16-bit framebuffer on flush.
//!
//! - [`surface`]: Back buffer, clip window, primitives, text blitter, devices
//! - [`hsi`]: Instrument state machine and its drawing
//! - [`readout`]: Readout panel (speed, navigation, time, satellites, ...)
//! - [`telemetry`]: Last displayed receiver values and change detection
//! - [`render`]: [`Cockpit`] context, [`Update`] messages and the [`RenderLoop`]
//! - [`feed`]: Threads producing updates from a text stream or a demo
//! - [`config`]: Layout constants, size-class table, TOML settings
//! - [`colors`]: Color schema
//! - [`units`]: Display units and conversions
//! - [`geometry`]: Integer square root, rotation, angle helpers
//! - [`font`]: 5x8 bitmap font
//!
//! # Threading
//!
//! Drawing is single-threaded. Sensor threads send [`Update`]s over a channel;
//! the render thread owns the [`Cockpit`] and applies them.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod colors;
pub mod config;
pub mod error;
pub mod feed;
pub mod font;
pub mod geometry;
pub mod hsi;
pub mod readout;
pub mod render;
pub mod surface;
pub mod telemetry;
pub mod units;

// Re-export commonly used items
pub use colors::ColorSchema;
pub use config::Settings;
pub use error::{ConfigError, DeviceError, FeedError};
pub use hsi::{Hsi, Redraw};
pub use readout::{NavStatus, Readouts};
pub use render::{Cockpit, LoopStats, RenderLoop, Update};
pub use surface::{FrameDevice, LinuxFramebuffer, MemoryDevice, Surface};
pub use telemetry::{FixMode, TelemetrySnapshot};
