// THEORY:
// Construction-time tunables for the trail engine. Every section carries the defaults
// of its trail style, and `#[serde(default)]` lets a JSON file override only the
// fields it names. `validate` runs before any tracker is built, so a bad value is
// reported at startup rather than mid-stream.

use crate::core_modules::background::BackgroundConfig;
use crate::core_modules::morphology::validate_kernel;
use crate::error::{TrailError, TrailResult};
use serde::{Deserialize, Serialize};

/// Settings for the filled-silhouette trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilhouetteConfig {
    /// Number of contour sets kept in history.
    pub trail_length: usize,
    /// Stroke width of the outline drawn around each filled silhouette.
    pub contour_thickness: u32,
    /// Contours enclosing less area than this (px^2) are dropped as noise.
    pub min_contour_area: f64,
    pub kernel_size: u32,
    /// Maximum opacity of a single layer.
    pub damping: f32,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self {
            trail_length: 15,
            contour_thickness: 3,
            min_contour_area: 1000.0,
            kernel_size: 5,
            damping: 0.3,
        }
    }
}

/// Settings for the edge-highlight trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    pub trail_length: usize,
    pub kernel_size: u32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub damping: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            trail_length: 20,
            kernel_size: 3,
            low_threshold: 50.0,
            high_threshold: 150.0,
            damping: 0.6,
        }
    }
}

/// Settings for the particle trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Lifespan of a particle in frames, and the capacity of its position trail.
    pub trail_length: usize,
    /// Upper bound on particles spawned per frame.
    pub num_particles: usize,
    pub kernel_size: u32,
    pub marker_radius: u32,
    /// Fixed seed for reproducible sampling; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            trail_length: 30,
            num_particles: 10_000,
            kernel_size: 5,
            marker_radius: 2,
            seed: None,
        }
    }
}

/// Top-level configuration for every trail style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub silhouette: SilhouetteConfig,
    pub edge: EdgeConfig,
    pub particle: ParticleConfig,
    pub background: BackgroundConfig,
    /// Log a progress line every this many frames; 0 disables it.
    pub progress_interval: u64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            silhouette: SilhouetteConfig::default(),
            edge: EdgeConfig::default(),
            particle: ParticleConfig::default(),
            background: BackgroundConfig::default(),
            progress_interval: 100,
        }
    }
}

impl SilhouetteConfig {
    pub fn validate(&self) -> TrailResult<()> {
        ensure_trail_length("silhouette", self.trail_length)?;
        ensure_damping("silhouette", self.damping)?;
        validate_kernel(self.kernel_size)?;
        if self.contour_thickness == 0 {
            return Err(TrailError::invalid_config(
                "silhouette contour_thickness must be at least 1",
            ));
        }
        if !(self.min_contour_area >= 0.0) {
            return Err(TrailError::invalid_config(format!(
                "silhouette min_contour_area must be non-negative, got {}",
                self.min_contour_area
            )));
        }
        Ok(())
    }
}

impl EdgeConfig {
    pub fn validate(&self) -> TrailResult<()> {
        ensure_trail_length("edge", self.trail_length)?;
        ensure_damping("edge", self.damping)?;
        validate_kernel(self.kernel_size)?;
        if !(self.low_threshold <= self.high_threshold) {
            return Err(TrailError::invalid_config(format!(
                "edge low_threshold ({}) must not exceed high_threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

impl ParticleConfig {
    pub fn validate(&self) -> TrailResult<()> {
        ensure_trail_length("particle", self.trail_length)?;
        validate_kernel(self.kernel_size)
    }
}

impl TrailConfig {
    pub fn validate(&self) -> TrailResult<()> {
        self.silhouette.validate()?;
        self.edge.validate()?;
        self.particle.validate()?;
        self.background.validate()
    }
}

fn ensure_trail_length(section: &str, trail_length: usize) -> TrailResult<()> {
    if trail_length == 0 {
        return Err(TrailError::invalid_config(format!(
            "{section} trail_length must be at least 1"
        )));
    }
    Ok(())
}

fn ensure_damping(section: &str, damping: f32) -> TrailResult<()> {
    if !(damping > 0.0 && damping <= 1.0) {
        return Err(TrailError::invalid_config(format!(
            "{section} damping must be within (0, 1], got {damping}"
        )));
    }
    Ok(())
}
