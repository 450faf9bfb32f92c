// THEORY:
// The `MotionExtractor` is the glue between a raw frame and the artifact a trail style
// stores. It owns the injected background model and runs the shared
// "subtract -> clean up" front half of every style, then finishes with the style's
// own reduction:
//
// - Silhouette: close + open, external contours, area filter.
// - Edge:       close + open, Canny edges.
// - Particle:   close only; the mask itself is the sampling domain.
//
// An empty mask is never an error; it simply produces an empty artifact. A change in
// frame size resets the background model before the new frame reaches it.

use crate::core_modules::background::BackgroundModel;
use crate::core_modules::contour_finder::contour_finder::{
    Contour, filter_by_area, find_external_contours,
};
use crate::core_modules::edges::canny;
use crate::core_modules::frame::{BinaryMask, Frame};
use crate::core_modules::morphology::{self, validate_kernel};
use crate::error::TrailResult;
use tracing::{debug, trace};

pub struct MotionExtractor {
    background: Box<dyn BackgroundModel>,
    kernel_size: u32,
    frame_size: Option<(u32, u32)>,
}

impl MotionExtractor {
    pub fn new(background: Box<dyn BackgroundModel>, kernel_size: u32) -> TrailResult<Self> {
        validate_kernel(kernel_size)?;
        Ok(Self {
            background,
            kernel_size,
            frame_size: None,
        })
    }

    /// Raw subtractor output, before any cleanup.
    pub fn foreground(&mut self, frame: &Frame) -> TrailResult<BinaryMask> {
        let size = frame.dimensions();
        if self.frame_size.is_some_and(|previous| previous != size) {
            debug!(?size, "frame size changed; resetting background model");
            self.background.reset();
        }
        self.frame_size = Some(size);
        self.background.apply(frame)
    }

    /// Region outlines of moving objects enclosing at least `min_area`.
    pub fn contours(&mut self, frame: &Frame, min_area: f64) -> TrailResult<Vec<Contour>> {
        let mask = self.cleaned(frame)?;
        let found = find_external_contours(&mask);
        let total = found.len();
        let kept = filter_by_area(found, min_area);
        trace!(total, kept = kept.len(), "contours extracted");
        Ok(kept)
    }

    /// One-pixel-wide boundaries of moving regions.
    pub fn edges(&mut self, frame: &Frame, low: f32, high: f32) -> TrailResult<BinaryMask> {
        let mask = self.cleaned(frame)?;
        Ok(canny(&mask, low, high))
    }

    /// Foreground mask closed once, used directly for particle sampling.
    pub fn motion_domain(&mut self, frame: &Frame) -> TrailResult<BinaryMask> {
        let raw = self.foreground(frame)?;
        Ok(morphology::close(&raw, self.kernel_size))
    }

    fn cleaned(&mut self, frame: &Frame) -> TrailResult<BinaryMask> {
        let raw = self.foreground(frame)?;
        let closed = morphology::close(&raw, self.kernel_size);
        Ok(morphology::open(&closed, self.kernel_size))
    }
}
