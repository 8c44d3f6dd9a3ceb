//! Display device boundary.
//!
//! A [`FrameDevice`] is whatever sits behind the visible pixels: the memory-mapped
//! Linux framebuffer on the target, or a plain heap buffer in tests and snapshot
//! mode. The [`Surface`](super::Surface) never touches the device except in
//! `flush`, which hands over one complete frame.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;

/// Screen geometry reported by a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenInfo {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Distance between two rows, in pixels. At least `width`.
    pub stride: usize,
}

impl ScreenInfo {
    /// Pixels in one frame including row padding.
    pub const fn pixel_count(&self) -> usize { self.stride * self.height as usize }
}

/// Sink for complete frames.
pub trait FrameDevice {
    fn info(&self) -> ScreenInfo;

    /// Copy `frame` (`info().pixel_count()` packed 5-6-5 values) to the visible buffer
    /// in one contiguous transfer.
    fn present(
        &mut self,
        frame: &[u16],
    );
}

// =============================================================================
// Memory Device
// =============================================================================

/// Heap-backed device: the "visible" buffer is a `Vec`.
#[derive(Debug)]
pub struct MemoryDevice {
    info: ScreenInfo,
    pixels: Vec<u16>,
    presents: usize,
}

impl MemoryDevice {
    pub fn new(
        width: u32,
        height: u32,
    ) -> Self {
        let info = ScreenInfo {
            width,
            height,
            bits_per_pixel: 16,
            stride: width as usize,
        };
        Self {
            info,
            pixels: vec![0; info.pixel_count()],
            presents: 0,
        }
    }

    /// Visible pixels as packed 5-6-5 values.
    pub fn pixels(&self) -> &[u16] { &self.pixels }

    /// Number of frames presented so far.
    pub const fn presents(&self) -> usize { self.presents }

    /// Visible pixels as embedded-graphics pixels, for drawing into another target.
    pub fn frame(&self) -> impl Iterator<Item = Pixel<Rgb565>> + '_ {
        let width = self.info.width as usize;
        let stride = self.info.stride;
        self.pixels.chunks(stride).enumerate().flat_map(move |(y, row)| {
            row[..width].iter().enumerate().map(move |(x, &raw)| {
                Pixel(Point::new(x as i32, y as i32), Rgb565::from(RawU16::new(raw)))
            })
        })
    }
}

impl FrameDevice for MemoryDevice {
    fn info(&self) -> ScreenInfo { self.info }

    fn present(
        &mut self,
        frame: &[u16],
    ) {
        let n = frame.len().min(self.pixels.len());
        self.pixels[..n].copy_from_slice(&frame[..n]);
        self.presents += 1;
    }
}
