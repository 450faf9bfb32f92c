// THEORY:
// This file is the main entry point for the `motion_trails` library crate. It defines
// the public API that external consumers (like the `trail_player` binary) build on.
//
// The primary export is `TrailPipeline` together with its configuration (`TrailConfig`)
// and the `FrameSource` / `FrameSink` collaborator traits. The building blocks in
// `core_modules` (bounded history, background models, contour finding, compositors,
// particle system) stay public for callers that want to assemble their own effects.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use config::{EdgeConfig, ParticleConfig, SilhouetteConfig, TrailConfig};
pub use core_modules::background::{BackgroundConfig, BackgroundModel, RunningAverageModel};
pub use core_modules::frame::{BinaryMask, Frame, Point};
pub use error::{TrailError, TrailResult};
pub use pipeline::{FrameSink, FrameSource, RunSummary, TrailKind, TrailPipeline};
