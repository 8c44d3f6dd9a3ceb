//! `hsi-display`: drive a framebuffer HSI from a text feed or the demo.
//!
//! # Modes
//!
//! | Invocation | Device | Updates from |
//! |------------|--------|--------------|
//! | `hsi-display` | framebuffer | stdin, one command per line |
//! | `hsi-display --demo` | framebuffer | synthetic flight |
//! | `hsi-display --snapshot out.png` | in memory | synthetic flight, then PNG |
//!
//! The program exits when the feed ends (end of stdin, or `--frames` demo
//! steps). A device that cannot be opened is logged and gives exit status 1.

use std::fs::File;
use std::io;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use anyhow::{Context, Result};
use clap::Parser;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay};
use hsi_display::feed::{DEMO_PERIOD, demo_updates, spawn_demo_feed, spawn_reader_feed};
use hsi_display::{Cockpit, MemoryDevice, RenderLoop, Settings, Surface};

/// Demo steps rendered into a snapshot when `--frames` is not given.
const SNAPSHOT_FRAMES: u32 = 120;

/// Horizontal Situation Indicator for Linux framebuffer displays
#[derive(Parser, Debug)]
#[command(name = "hsi-display")]
#[command(version)]
#[command(about = "Render an aviation HSI on a Linux framebuffer")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Framebuffer device (overrides the configuration file)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Use the built-in demo flight instead of reading stdin
    #[arg(long)]
    demo: bool,

    /// Render the demo in memory and write it to this PNG file
    #[arg(long, value_name = "PNG")]
    snapshot: Option<PathBuf>,

    /// Snapshot width in pixels
    #[arg(long, default_value_t = 480)]
    width: u32,

    /// Snapshot height in pixels
    #[arg(long, default_value_t = 272)]
    height: u32,

    /// Number of demo steps (endless on a device when omitted)
    #[arg(long)]
    frames: Option<u32>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    if let Some(path) = &cli.snapshot {
        return snapshot(cli, &settings, path);
    }

    let device = cli.device.as_ref().unwrap_or(&settings.display.device);
    let surface = Surface::open(device).with_context(|| format!("display {} unavailable", device.display()))?;
    let mut cockpit = Cockpit::new(surface, &settings);

    let shutdown = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let feed = if cli.demo {
        spawn_demo_feed(tx, Arc::clone(&shutdown), DEMO_PERIOD, cli.frames)?
    } else {
        // Unbuffered handle on fd 0, readiness is polled on the descriptor
        let stdin = File::from(io::stdin().as_fd().try_clone_to_owned()?);
        spawn_reader_feed(stdin, tx, Arc::clone(&shutdown))?
    };

    RenderLoop::default().run(&mut cockpit, &rx, &shutdown);
    shutdown.store(true, Ordering::Relaxed);
    if feed.join().is_err() {
        log::warn!("Feed thread panicked");
    }
    cockpit.close();
    Ok(())
}

/// Fly the demo on an in-memory device and save what it shows.
fn snapshot(
    cli: &Cli,
    settings: &Settings,
    path: &Path,
) -> Result<()> {
    let surface = Surface::with_device(MemoryDevice::new(cli.width, cli.height));
    let mut cockpit = Cockpit::new(surface, settings);
    for step in 0..cli.frames.unwrap_or(SNAPSHOT_FRAMES) {
        for update in demo_updates(step) {
            cockpit.apply(update);
        }
        cockpit.flush();
    }

    let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(cli.width, cli.height));
    if let Some(device) = cockpit.surface().device() {
        display.draw_iter(device.frame()).ok();
    }
    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    display
        .to_rgb_output_image(&output_settings)
        .save_png(path)
        .with_context(|| format!("cannot write snapshot {}", path.display()))?;
    log::info!("Snapshot written to {}", path.display());
    Ok(())
}
