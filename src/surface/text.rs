//! Bitmap text on the surface.
//!
//! Glyphs are opaque: both the set bits (foreground) and the clear bits
//! (background) of the 5x8 cell are written, so a string overwrites whatever
//! was there before without a separate erase. Readouts rely on this and pad
//! their text with spaces to wipe longer previous values.
//!
//! Text is formatted into a fixed-capacity `heapless::String`; a string that
//! does not fit is dropped whole rather than drawn truncated.

use core::fmt::{self, Write};

use embedded_graphics::pixelcolor::Rgb565;
use heapless::String;

use super::{FrameDevice, Surface};
use crate::font::{CHAR_WIDTH, GLYPH_ROWS, glyph};

/// Longest string a single `blit_text` call can draw.
pub const TEXT_CAPACITY: usize = 64;

impl<D: FrameDevice> Surface<D> {
    /// Draw one character with its top-left corner at `(x, y)`.
    pub fn blit_char(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
        back: Rgb565,
        c: char,
    ) {
        self.blit_glyph(x, y, color, back, c, false);
    }

    /// Same as [`blit_char`](Self::blit_char), slanted one pixel left per row.
    pub fn blit_char_italic(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
        back: Rgb565,
        c: char,
    ) {
        self.blit_glyph(x, y, color, back, c, true);
    }

    fn blit_glyph(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
        back: Rgb565,
        c: char,
        italic: bool,
    ) {
        if x < 0 || y < 0 || x > self.width - CHAR_WIDTH - 1 || y > self.height - GLYPH_ROWS {
            return;
        }
        let columns = glyph(c);
        for row in 0..GLYPH_ROWS {
            let left = if italic { x - row } else { x };
            for (col, bits) in (0i32..).zip(columns) {
                let on = (bits >> row) & 1 != 0;
                self.put_pixel(left + col, y + row, if on { color } else { back });
            }
        }
    }

    /// Format `args` and draw it left to right from `(x, y)`.
    ///
    /// Returns the number of characters formatted, or `None` if formatting failed
    /// (in which case nothing is drawn).
    pub fn blit_text(
        &mut self,
        x: i32,
        y: i32,
        color: Rgb565,
        back: Rgb565,
        italic: bool,
        args: fmt::Arguments<'_>,
    ) -> Option<usize> {
        let mut text: String<TEXT_CAPACITY> = String::new();
        if text.write_fmt(args).is_err() {
            log::debug!("Text at ({x}, {y}) exceeds {TEXT_CAPACITY} bytes, skipped");
            return None;
        }
        let mut cursor = x;
        for c in text.chars() {
            self.blit_glyph(cursor, y, color, back, c, italic);
            cursor += CHAR_WIDTH;
        }
        Some(text.chars().count())
    }
}
