// THEORY:
// The `pipeline` module is the top-level API of the trail engine. It wraps one trail
// style behind a single `process_frame` call and drives the frame-sequential run loop
// against abstract video collaborators.
//
// Run loop contract (one tick per frame, strictly sequential):
// 1.  Read the next frame from the `FrameSource`. `None` is end-of-stream, a normal
//     terminal signal, and ends the run.
// 2.  Extract motion, update the style's memory and composite the trails.
// 3.  Hand the composited frame to the `FrameSink` (display, writer, or both).
// 4.  Poll the sink's stop signal once; a stop request ends the run.
//
// There are no retries. Any error from a collaborator ends the run and is returned.
// Resources owned by the collaborators are released by their own `Drop`, so every exit
// path, early or not, cleans up.

use crate::config::TrailConfig;
use crate::core_modules::background::{BackgroundModel, RunningAverageModel};
use crate::core_modules::frame::Frame;
use crate::core_modules::trails::{EdgeTrail, ParticleTrail, SilhouetteTrail, TrailEffect};
use crate::error::TrailResult;
use tracing::{debug, info, instrument, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::trails::TrailKind;

/// Supplies frames in presentation order.
pub trait FrameSource {
    /// `Ok(None)` signals end-of-stream.
    fn next_frame(&mut self) -> TrailResult<Option<Frame>>;
}

/// Consumes composited frames.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> TrailResult<()>;

    /// Polled once per frame after writing; `true` ends the run.
    fn stop_requested(&mut self) -> TrailResult<bool> {
        Ok(false)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    /// `true` when the sink asked to stop before the source ran dry.
    pub stopped_early: bool,
}

/// The main, top-level struct for the trail engine.
pub struct TrailPipeline {
    effect: Box<dyn TrailEffect>,
    frame_count: u64,
    progress_interval: u64,
    frame_size: Option<(u32, u32)>,
}

impl TrailPipeline {
    pub fn new(effect: Box<dyn TrailEffect>) -> Self {
        Self {
            effect,
            frame_count: 0,
            progress_interval: TrailConfig::default().progress_interval,
            frame_size: None,
        }
    }

    /// Builds the chosen style with the in-crate running-average background model.
    pub fn from_config(kind: TrailKind, config: &TrailConfig) -> TrailResult<Self> {
        let background = RunningAverageModel::new(config.background)?;
        Self::with_background(kind, config, Box::new(background))
    }

    /// Builds the chosen style around an externally supplied background model.
    pub fn with_background(
        kind: TrailKind,
        config: &TrailConfig,
        background: Box<dyn BackgroundModel>,
    ) -> TrailResult<Self> {
        config.validate()?;
        let effect: Box<dyn TrailEffect> = match kind {
            TrailKind::Silhouette => {
                Box::new(SilhouetteTrail::new(config.silhouette.clone(), background)?)
            }
            TrailKind::Edge => Box::new(EdgeTrail::new(config.edge.clone(), background)?),
            TrailKind::Particle => {
                Box::new(ParticleTrail::new(config.particle.clone(), background)?)
            }
        };
        Ok(Self::new(effect).with_progress_interval(config.progress_interval))
    }

    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames;
        self
    }

    pub fn kind(&self) -> TrailKind {
        self.effect.kind()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Processes one frame and returns it with trails painted on.
    pub fn process_frame(&mut self, frame: &Frame) -> TrailResult<Frame> {
        let size = frame.dimensions();
        match self.frame_size {
            Some(previous) if previous != size => {
                warn!(?previous, current = ?size, "frame size changed mid-stream");
            }
            _ => {}
        }
        self.frame_size = Some(size);

        let output = self.effect.process_frame(frame)?;
        self.frame_count += 1;
        debug!(frame = self.frame_count, "frame composited");
        Ok(output)
    }

    /// Drives `source` to exhaustion (or until `sink` asks to stop).
    #[instrument(skip_all, fields(style = %self.kind()))]
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> TrailResult<RunSummary>
    where
        S: FrameSource + ?Sized,
        K: FrameSink + ?Sized,
    {
        info!("trail run started");
        let mut frames_processed = 0u64;
        let mut stopped_early = false;

        while let Some(frame) = source.next_frame()? {
            let composited = self.process_frame(&frame)?;
            sink.write_frame(&composited)?;
            frames_processed += 1;

            if self.progress_interval > 0 && frames_processed % self.progress_interval == 0 {
                info!(frames = frames_processed, "progress");
            }
            if sink.stop_requested()? {
                stopped_early = true;
                break;
            }
        }

        info!(frames = frames_processed, stopped_early, "trail run finished");
        Ok(RunSummary {
            frames_processed,
            stopped_early,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrailError;
    use std::collections::VecDeque;

    struct Frames(VecDeque<Frame>);

    impl FrameSource for Frames {
        fn next_frame(&mut self) -> TrailResult<Option<Frame>> {
            Ok(self.0.pop_front())
        }
    }

    #[derive(Default)]
    struct Collector {
        frames: Vec<Frame>,
        stop_after: Option<usize>,
    }

    impl FrameSink for Collector {
        fn write_frame(&mut self, frame: &Frame) -> TrailResult<()> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn stop_requested(&mut self) -> TrailResult<bool> {
            Ok(self.stop_after.is_some_and(|n| self.frames.len() >= n))
        }
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn next_frame(&mut self) -> TrailResult<Option<Frame>> {
            Err(TrailError::source("device unplugged"))
        }
    }

    fn still_frames(count: usize) -> Frames {
        Frames((0..count).map(|_| Frame::new(32, 24)).collect())
    }

    #[test]
    fn runs_until_end_of_stream() {
        for kind in TrailKind::ALL {
            let mut pipeline = TrailPipeline::from_config(kind, &TrailConfig::default()).unwrap();
            let mut sink = Collector::default();
            let summary = pipeline.run(&mut still_frames(6), &mut sink).unwrap();
            assert_eq!(
                summary,
                RunSummary {
                    frames_processed: 6,
                    stopped_early: false
                }
            );
            assert_eq!(sink.frames.len(), 6);
            assert_eq!(pipeline.frame_count(), 6);
            assert_eq!(pipeline.kind(), kind);
        }
    }

    #[test]
    fn stop_signal_halts_after_current_frame() {
        let mut pipeline =
            TrailPipeline::from_config(TrailKind::Edge, &TrailConfig::default()).unwrap();
        let mut sink = Collector {
            stop_after: Some(2),
            ..Collector::default()
        };
        let summary = pipeline.run(&mut still_frames(10), &mut sink).unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(sink.frames.len(), 2);
    }

    #[test]
    fn source_errors_are_not_retried() {
        let mut pipeline =
            TrailPipeline::from_config(TrailKind::Silhouette, &TrailConfig::default()).unwrap();
        let mut sink = Collector::default();
        let err = pipeline.run(&mut FailingSource, &mut sink).unwrap_err();
        assert!(matches!(err, TrailError::Source(_)));
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let mut config = TrailConfig::default();
        config.particle.trail_length = 0;
        assert!(TrailPipeline::from_config(TrailKind::Particle, &config).is_err());
    }

    #[test]
    fn unbounded_trail_lengths_build_and_run() {
        let mut config = TrailConfig::default();
        config.silhouette.trail_length = usize::MAX;
        config.edge.trail_length = usize::MAX;
        config.particle.trail_length = usize::MAX;
        config.validate().unwrap();
        for kind in TrailKind::ALL {
            let mut pipeline = TrailPipeline::from_config(kind, &config).unwrap();
            let mut sink = Collector::default();
            let summary = pipeline.run(&mut still_frames(3), &mut sink).unwrap();
            assert_eq!(summary.frames_processed, 3);
        }
    }
}
