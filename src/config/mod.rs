//! Application configuration.
//!
//! - `layout`: Compile-time constants and the per-size-class layout table
//! - `file`: Runtime settings loaded from a TOML file (device, units, colors)

pub mod file;
pub mod layout;

// Re-export at config level for convenience
pub use file::{ColorOverrides, DisplaySettings, Settings};
pub use layout::{
    ALT_LABEL_STEP_FT,
    ALT_PX_PER_FT,
    ALT_TICK_STEP_FT,
    ALT_TICK_STEP_PX,
    CDI_FULL_SCALE_M,
    CDI_PIXEL_SCALE,
    CDI_SCALE_TICKS,
    COMPACT_HEIGHT,
    DEFAULT_DEVICE,
    Field,
    POLL_INTERVAL,
    READOUT_MARGIN,
    ReadoutLayout,
    SizeClass,
};
