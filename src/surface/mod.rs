//! Double-buffered pixel surface with a clip window.
//!
//! # Buffers
//!
//! | Buffer | Owner | Written by |
//! |--------|-------|------------|
//! | back buffer (`Vec<u16>`) | [`Surface`] | every drawing primitive |
//! | visible buffer | the [`FrameDevice`] | [`Surface::flush`] only |
//!
//! Drawing never touches the device. A batch of primitives becomes visible all at
//! once when `flush` hands the whole back buffer to the device in one copy.
//!
//! # Clipping
//!
//! Every primitive goes through the clip window (`top..bottom` rows,
//! `min..max` columns, both half-open). The window starts as the whole screen and
//! can only be narrowed, so nothing is ever written outside the surface.
//!
//! # Lifecycle
//!
//! `open`/`with_device` acquire the device and allocate the back buffer.
//! `close` releases both and may be called any number of times. A closed surface
//! has no pixels: drawing and flushing are no-ops.

mod device;
mod fbdev;
mod text;

use core::convert::Infallible;
use std::path::Path;

pub use device::{FrameDevice, MemoryDevice, ScreenInfo};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
pub use fbdev::LinuxFramebuffer;

use crate::error::DeviceError;
use crate::geometry::fix_sqrt;

/// Active clip window. `bottom` and `max` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clip {
    pub top: i32,
    pub bottom: i32,
    pub min: i32,
    pub max: i32,
}

impl Clip {
    const EMPTY: Self = Self {
        top: 0,
        bottom: 0,
        min: 0,
        max: 0,
    };

    const fn full(
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            top: 0,
            bottom: height,
            min: 0,
            max: width,
        }
    }

    #[inline]
    pub const fn contains(
        &self,
        x: i32,
        y: i32,
    ) -> bool {
        x >= self.min && x < self.max && y >= self.top && y < self.bottom
    }
}

/// Back buffer plus the device it is flushed to.
pub struct Surface<D: FrameDevice> {
    device: Option<D>,
    width: i32,
    height: i32,
    /// Row pitch of `back` in pixels, same as the device's.
    stride: usize,
    back: Vec<u16>,
    clip: Clip,
    /// Back buffer written since the last flush.
    dirty: bool,
}

impl Surface<LinuxFramebuffer> {
    /// Open and map a framebuffer device.
    pub fn open(path: &Path) -> Result<Self, DeviceError> { LinuxFramebuffer::open(path).map(Self::with_device) }
}

impl<D: FrameDevice> Surface<D> {
    /// Wrap an already acquired device and allocate a matching back buffer.
    pub fn with_device(device: D) -> Self {
        let info = device.info();
        let width = info.width as i32;
        let height = info.height as i32;
        log::debug!("Surface {width}x{height}, back buffer {} px", info.pixel_count());
        Self {
            device: Some(device),
            width,
            height,
            stride: info.stride,
            back: vec![0; info.pixel_count()],
            clip: Clip::full(width, height),
            dirty: false,
        }
    }

    /// Release the device and the back buffer. Safe to call again.
    pub fn close(&mut self) {
        if self.device.take().is_none() {
            return;
        }
        self.back = Vec::new();
        self.width = 0;
        self.height = 0;
        self.stride = 0;
        self.clip = Clip::EMPTY;
        self.dirty = false;
        log::info!("Surface closed");
    }

    pub const fn is_open(&self) -> bool { self.device.is_some() }

    pub const fn width(&self) -> i32 { self.width }

    pub const fn height(&self) -> i32 { self.height }

    pub fn device(&self) -> Option<&D> { self.device.as_ref() }

    /// Raw back buffer, row pitch [`ScreenInfo::stride`].
    pub fn back_buffer(&self) -> &[u16] { &self.back }

    /// Something was drawn that the device does not show yet.
    pub const fn is_dirty(&self) -> bool { self.dirty }

    // =========================================================================
    // Clip Window
    // =========================================================================

    pub const fn clip(&self) -> Clip { self.clip }

    /// Restrict drawing to `area` (intersected with the screen).
    pub fn set_clip(
        &mut self,
        area: Rectangle,
    ) {
        let area = area.intersection(&self.bounding_box());
        self.clip = match area.bottom_right() {
            Some(br) => Clip {
                top: area.top_left.y,
                bottom: br.y + 1,
                min: area.top_left.x,
                max: br.x + 1,
            },
            None => Clip::EMPTY,
        };
    }

    pub fn reset_clip(&mut self) { self.clip = Clip::full(self.width, self.height); }

    // =========================================================================
    // Primitives
    // =========================================================================

    #[inline]
    const fn index(
        &self,
        x: i32,
        y: i32,
    ) -> usize {
        y as usize * self.stride + x as usize
    }

    /// Fill `rows` whole rows starting at `from`.
    pub fn clear_rows(
        &mut self,
        from: i32,
        rows: i32,
        color: Rgb565,
    ) {
        let raw = color.into_storage();
        let top = from.max(self.clip.top);
        let bottom = from.saturating_add(rows).min(self.clip.bottom);
        if top >= bottom || self.clip.min >= self.clip.max {
            return;
        }
        self.dirty = true;
        if self.clip.min == 0 && self.clip.max == self.width {
            // Whole rows are contiguous, padding included
            let start = self.index(0, top);
            let end = self.index(0, bottom);
            self.back[start..end].fill(raw);
        } else {
            for y in top..bottom {
                let start = self.index(self.clip.min, y);
                let end = self.index(self.clip.max, y);
                self.back[start..end].fill(raw);
            }
        }
    }

    /// Write one pixel if it lies inside the clip window.
    #[inline]
    pub fn put_pixel(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
    ) {
        if self.clip.contains(x, y) {
            let i = self.index(x, y);
            self.back[i] = color.into_storage();
            self.dirty = true;
        }
    }

    /// Read back a pixel of the back buffer.
    pub fn pixel(
        &self,
        x: i32,
        y: i32,
    ) -> Option<Rgb565> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(RawU16::new(self.back[self.index(x, y)]).into())
    }

    /// `width` pixels to the right of `(x, y)`, clipped.
    pub fn draw_horizontal_line(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        color: Rgb565,
    ) {
        if y < self.clip.top || y >= self.clip.bottom {
            return;
        }
        let mut x = i64::from(x);
        let mut w = i64::from(width);
        let min = i64::from(self.clip.min);
        if x < min {
            w -= min - x;
            x = min;
        }
        w = w.min(i64::from(self.clip.max) - x);
        if w <= 0 {
            return;
        }
        let start = self.index(x as i32, y);
        self.back[start..start + w as usize].fill(color.into_storage());
        self.dirty = true;
    }

    /// Line from `a` towards `b`; `b` itself is not plotted.
    ///
    /// Steps along y when the slope is steeper than 45 degrees and along x
    /// otherwise, so consecutive pixels always touch.
    pub fn draw_line(
        &mut self,
        a: Point,
        b: Point,
        color: Rgb565,
    ) {
        // Rows and columns outside the clip window draw nothing
        let rows = a.y.min(b.y).max(self.clip.top)..a.y.max(b.y).min(self.clip.bottom);
        let columns = a.x.min(b.x).max(self.clip.min)..a.x.max(b.x).min(self.clip.max);
        if a.x == b.x {
            for y in rows {
                self.put_pixel(a.x, y, color);
            }
            return;
        }
        let m = (f64::from(b.y) - f64::from(a.y)) / (f64::from(b.x) - f64::from(a.x));
        let q = f64::from(a.y) - m * f64::from(a.x);
        if m.abs() > 1.0 {
            for y in rows {
                let x = ((f64::from(y) - q) / m).round() as i32;
                self.put_pixel(x, y, color);
            }
        } else {
            for x in columns {
                let y = (m * f64::from(x) + q).round() as i32;
                self.put_pixel(x, y, color);
            }
        }
    }

    /// Filled disc, one horizontal line per scanline.
    pub fn fill_circle(
        &mut self,
        center: Point,
        radius: i32,
        color: Rgb565,
    ) {
        let r = i64::from(radius);
        let top = center.y.saturating_sub(radius).max(self.clip.top);
        let bottom = center.y.saturating_add(radius).min(self.clip.bottom - 1);
        for y in top..=bottom {
            let dy = i64::from(y) - i64::from(center.y);
            let span = (r * r - dy * dy).clamp(0, i64::from(u32::MAX)) as u32;
            let half = fix_sqrt(span) as i32;
            self.draw_horizontal_line(center.x.saturating_sub(half), y, half.saturating_mul(2), color);
        }
    }

    /// Rows `top_left.y..=bottom_right.y`, each `bottom_right.x - top_left.x` pixels wide.
    pub fn fill_rect(
        &mut self,
        top_left: Point,
        bottom_right: Point,
        color: Rgb565,
    ) {
        let width = bottom_right.x - top_left.x;
        for y in top_left.y..=bottom_right.y {
            self.draw_horizontal_line(top_left.x, y, width, color);
        }
    }

    /// Make the back buffer visible.
    pub fn flush(&mut self) {
        if let Some(device) = self.device.as_mut() {
            device.present(&self.back);
        }
        self.dirty = false;
    }
}

// =============================================================================
// embedded-graphics Integration
// =============================================================================

impl<D: FrameDevice> OriginDimensions for Surface<D> {
    fn size(&self) -> Size { Size::new(self.width as u32, self.height as u32) }
}

impl<D: FrameDevice> DrawTarget for Surface<D> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.put_pixel(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        if let Some(br) = area.bottom_right() {
            self.fill_rect(area.top_left, Point::new(br.x + 1, br.y), color);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
