// THEORY:
// The `frame` module holds the "dumb" data containers shared by every layer of the
// trail engine: the color `Frame`, the per-frame `BinaryMask` of foreground pixels,
// and the integer `Point` used for contours and particle positions.
//
// A `BinaryMask` has no identity beyond the frame that produced it. Any non-zero
// value counts as foreground; writers always store 255 so masks stay compatible
// with 0/255 masks produced by external background subtractors.

use image::{GrayImage, Luma, RgbImage};

/// A color video frame (8-bit RGB, row-major).
pub type Frame = RgbImage;

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// An integer pixel coordinate. May lie outside a frame; drawing clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A 2D grid of foreground flags.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    pixels: GrayImage,
}

impl BinaryMask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: GrayImage::new(width, height),
        }
    }

    /// Wraps an intensity image; every non-zero pixel is foreground.
    pub fn from_gray(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Out-of-bounds coordinates are background.
    pub fn is_foreground(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return false;
        }
        self.pixels.get_pixel(x as u32, y as u32)[0] > 0
    }

    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let value = if foreground { FOREGROUND } else { BACKGROUND };
        self.pixels.put_pixel(x, y, Luma([value]));
    }

    /// Marks every pixel of the axis-aligned rectangle, clipped to the mask.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = x.saturating_add(width).min(self.width());
        let y_end = y.saturating_add(height).min(self.height());
        for yy in y..y_end {
            for xx in x..x_end {
                self.set(xx, yy, true);
            }
        }
    }

    /// All foreground coordinates in raster order.
    pub fn foreground_points(&self) -> Vec<Point> {
        self.pixels
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 0)
            .map(|(x, y, _)| Point::new(x as i32, y as i32))
            .collect()
    }

    pub fn foreground_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.pixels.pixels().any(|p| p[0] > 0)
    }
}
