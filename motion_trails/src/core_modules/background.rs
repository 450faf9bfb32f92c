// THEORY:
// The background model is the stateful collaborator that turns a color frame into a
// foreground mask. It is injected into the `MotionExtractor` rather than living as
// hidden global state, so any subtractor (the in-crate running average, an OpenCV
// MOG2 instance, a test oracle) can drive the trail effects.
//
// Adaptation contract of `RunningAverageModel`:
// 1.  **Seeding**: The first frame it sees (or the first frame after a size change
//     or `reset`) becomes the background estimate and yields an empty mask.
// 2.  **Classification**: A pixel is foreground when any channel differs from the
//     estimate by more than `threshold`.
// 3.  **Exponential Update**: After classification every pixel moves towards the
//     new frame, `bg += learning_rate * (frame - bg)`, foreground included.

use crate::core_modules::frame::{BinaryMask, Frame};
use crate::error::{TrailError, TrailResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Produces a foreground mask for each frame, adapting its internal model as it goes.
pub trait BackgroundModel {
    fn apply(&mut self, frame: &Frame) -> TrailResult<BinaryMask>;
    fn reset(&mut self);
}

/// Tunables for `RunningAverageModel`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Weight of the newest frame in the exponential update, in `[0, 1]`.
    pub learning_rate: f32,
    /// Per-channel absolute difference above which a pixel is foreground.
    pub threshold: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            threshold: 30.0,
        }
    }
}

impl BackgroundConfig {
    pub fn validate(&self) -> TrailResult<()> {
        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err(TrailError::invalid_config(format!(
                "background learning_rate must be within [0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.threshold >= 0.0) {
            return Err(TrailError::invalid_config(format!(
                "background threshold must be non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// A per-pixel exponential running-average background subtractor.
#[derive(Debug, Clone)]
pub struct RunningAverageModel {
    config: BackgroundConfig,
    width: u32,
    height: u32,
    /// Interleaved RGB estimate, `None` until seeded.
    background: Option<Vec<f32>>,
}

impl RunningAverageModel {
    pub fn new(config: BackgroundConfig) -> TrailResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            width: 0,
            height: 0,
            background: None,
        })
    }

    /// Seeds the model from a clean plate so the very next frame is classified.
    pub fn with_background(background: &Frame, config: BackgroundConfig) -> TrailResult<Self> {
        let mut model = Self::new(config)?;
        model.seed(background);
        Ok(model)
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn is_seeded(&self) -> bool {
        self.background.is_some()
    }

    fn seed(&mut self, frame: &Frame) {
        self.width = frame.width();
        self.height = frame.height();
        self.background = Some(frame.as_raw().iter().map(|&v| v as f32).collect());
    }
}

impl BackgroundModel for RunningAverageModel {
    fn apply(&mut self, frame: &Frame) -> TrailResult<BinaryMask> {
        let (width, height) = frame.dimensions();
        if (self.width, self.height) != (width, height) {
            self.background = None;
        }
        let Some(background) = self.background.as_mut() else {
            debug!(width, height, "seeding background model");
            self.seed(frame);
            return Ok(BinaryMask::new(width, height));
        };

        let rate = self.config.learning_rate;
        let threshold = self.config.threshold;
        let mut mask = BinaryMask::new(width, height);

        for (i, (estimate, sample)) in background
            .chunks_exact_mut(3)
            .zip(frame.as_raw().chunks_exact(3))
            .enumerate()
        {
            let mut max_diff = 0.0f32;
            for (bg, &value) in estimate.iter_mut().zip(sample) {
                let value = value as f32;
                max_diff = max_diff.max((value - *bg).abs());
                *bg += rate * (value - *bg);
            }
            if max_diff > threshold {
                mask.set(i as u32 % width, i as u32 / width, true);
            }
        }

        Ok(mask)
    }

    fn reset(&mut self) {
        self.background = None;
    }
}
