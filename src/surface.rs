// src/surface.rs

//! Drawable surfaces.
//!
//! The core only needs two things from a drawable: its size in pixels and a
//! solid rectangle fill. `Screen` is the allocator side ("give me a surface of
//! this size"); the operation loop calls it twice on start to get its "next"
//! and "prev" buffers.

use crate::color::Rgba;
use anyhow::{ensure, Result};

const BYTES_PER_PIXEL: usize = 4;

/// An integer pixel rectangle, half-open: `[x0, x1) x [y0, y1)`.
///
/// Corners are signed so that draws landing partially or fully off-surface
/// can be expressed; `Surface::fill` clips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl PixelRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// A rectangle is empty when it is inverted or has zero area.
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Intersect with `[0, width) x [0, height)`. Returns `None` if nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<PixelRect> {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        let clipped = PixelRect {
            x0: self.x0.clamp(0, w),
            y0: self.y0.clamp(0, h),
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
        };
        if clipped.is_empty() {
            None
        } else {
            Some(clipped)
        }
    }
}

/// A 2-D pixel grid supporting solid rectangle fills.
pub trait Surface: Send {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill `rect` with `color`.
    ///
    /// Out-of-bounds parts are clipped; empty or inverted rectangles fill
    /// nothing. This never fails.
    fn fill(&mut self, rect: PixelRect, color: Rgba);

    /// The whole surface as a rectangle.
    fn bounds(&self) -> PixelRect {
        let (w, h) = self.size();
        PixelRect::new(
            0,
            0,
            i32::try_from(w).unwrap_or(i32::MAX),
            i32::try_from(h).unwrap_or(i32::MAX),
        )
    }
}

/// Allocates surfaces for the operation loop.
pub trait Screen {
    type Surface: Surface + Clone + 'static;

    fn new_surface(&self, width: u32, height: u32) -> Result<Self::Surface>;
}

/// Software RGBA8 surface, tightly packed, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Box<[u8]>,
}

impl PixelBuffer {
    /// Create a buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels =
            vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL].into_boxed_slice();
        for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x as usize, y as usize);
        let mut bytes = [0u8; BYTES_PER_PIXEL];
        bytes.copy_from_slice(&self.pixels[idx..idx + BYTES_PER_PIXEL]);
        Some(Rgba::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width as usize + x) * BYTES_PER_PIXEL
    }
}

impl Surface for PixelBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill(&mut self, rect: PixelRect, color: Rgba) {
        let Some(rect) = rect.clip(self.width, self.height) else {
            return;
        };
        let bytes = color.to_bytes();
        for y in rect.y0 as usize..rect.y1 as usize {
            let start = self.index(rect.x0 as usize, y);
            let end = self.index(rect.x1 as usize, y);
            for px in self.pixels[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&bytes);
            }
        }
    }
}

/// Screen that hands out in-memory `PixelBuffer`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessScreen;

impl Screen for HeadlessScreen {
    type Surface = PixelBuffer;

    fn new_surface(&self, width: u32, height: u32) -> Result<PixelBuffer> {
        ensure!(
            width > 0 && height > 0,
            "surface dimensions must be non-zero, got {}x{}",
            width,
            height
        );
        Ok(PixelBuffer::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, RED, WHITE};

    #[test]
    fn new_buffer_is_black() {
        let buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.size(), (4, 3));
        assert_eq!(buf.as_bytes().len(), 4 * 3 * 4);
        assert_eq!(buf.pixel(0, 0), Some(BLACK));
        assert_eq!(buf.pixel(3, 2), Some(BLACK));
        assert_eq!(buf.pixel(4, 0), None);
    }

    #[test]
    fn fill_is_half_open() {
        let mut buf = PixelBuffer::new(10, 10);
        buf.fill(PixelRect::new(2, 3, 5, 6), RED);
        assert_eq!(buf.pixel(2, 3), Some(RED));
        assert_eq!(buf.pixel(4, 5), Some(RED));
        assert_eq!(buf.pixel(5, 5), Some(BLACK));
        assert_eq!(buf.pixel(4, 6), Some(BLACK));
        assert_eq!(buf.pixel(1, 3), Some(BLACK));
    }

    #[test]
    fn fill_clips_off_surface_parts() {
        let mut buf = PixelBuffer::new(10, 10);
        buf.fill(PixelRect::new(-5, -5, 3, 3), WHITE);
        assert_eq!(buf.pixel(0, 0), Some(WHITE));
        assert_eq!(buf.pixel(2, 2), Some(WHITE));
        assert_eq!(buf.pixel(3, 3), Some(BLACK));

        buf.fill(PixelRect::new(8, 8, 100, 100), RED);
        assert_eq!(buf.pixel(9, 9), Some(RED));
    }

    #[test]
    fn inverted_and_fully_outside_rects_fill_nothing() {
        let mut buf = PixelBuffer::new(10, 10);
        let before = buf.clone();
        buf.fill(PixelRect::new(8, 8, 2, 2), WHITE);
        buf.fill(PixelRect::new(20, 20, 30, 30), WHITE);
        buf.fill(PixelRect::new(-30, 0, -20, 10), WHITE);
        assert_eq!(buf, before);
    }

    #[test]
    fn headless_screen_rejects_empty_surfaces() {
        assert!(HeadlessScreen.new_surface(0, 10).is_err());
        let surface = HeadlessScreen.new_surface(3, 2).unwrap();
        assert_eq!(surface.size(), (3, 2));
    }
}
