//! In-memory RGB framebuffer.
//!
//! Stands in for the watch surface during development and tests: the renderer
//! draws into it like any other `DrawTarget`, and the result can be inspected
//! pixel by pixel or exported as a binary PPM image.

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::{Rgb888, RgbColor},
    Pixel,
};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Errors raised while exporting a frame.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Writing the image file failed
    #[error("frame IO: {0}")]
    Io(#[from] io::Error),
}

/// Row-major `Rgb888` framebuffer. Out-of-bounds pixels are clipped.
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl FrameBuffer {
    /// Create a black framebuffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; (width * height) as usize],
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        if x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Colour at `point`, `None` outside the buffer.
    pub fn pixel(&self, point: Point) -> Option<Rgb888> {
        self.index(point).map(|i| self.pixels[i])
    }

    /// Number of pixels with exactly this colour.
    pub fn count(&self, color: Rgb888) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// Binary PPM (P6) encoding of the buffer.
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        for p in &self.pixels {
            out.extend_from_slice(&[p.r(), p.g(), p.b()]);
        }
        out
    }

    /// Write the buffer to `path` as a PPM image.
    pub fn write_ppm<P: AsRef<Path>>(&self, path: P) -> Result<(), FrameError> {
        fs::write(path, self.to_ppm())?;
        Ok(())
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
