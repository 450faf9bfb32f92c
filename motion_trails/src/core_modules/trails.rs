// THEORY:
// The `trails` module is the compositing engine. Each trail style pairs a
// `MotionExtractor` with a memory (a `BoundedHistory` of artifacts, or a
// `ParticleSystem`) and paints that memory onto a copy of the current frame.
//
// Layer compositing for the history-based styles, oldest slot first:
// 1.  `alpha = (index + 1) / len` and `color = palette[index % palette_len]`.
// 2.  The overlay starts as a copy of the working frame as it stands now, i.e. with
//     every older layer already blended in.
// 3.  The slot's artifact is painted opaquely onto the overlay.
// 4.  `working = overlay * (alpha * damping) + working * (1 - alpha * damping)`.
//
// Because every layer is blended onto the result of the previous ones, opacity
// compounds across layers where trails overlap. That compounding is part of the look
// and the oldest -> newest order must be preserved to reproduce it.
//
// The particle style draws opaquely with no cross-blending.

use crate::config::{EdgeConfig, ParticleConfig, SilhouetteConfig};
use crate::core_modules::background::BackgroundModel;
use crate::core_modules::bounded_history::BoundedHistory;
use crate::core_modules::contour_finder::contour_finder::Contour;
use crate::core_modules::frame::{BinaryMask, Frame};
use crate::core_modules::motion_extractor::MotionExtractor;
use crate::core_modules::palette::{EDGE_PALETTE, PARTICLE_PALETTE, SILHOUETTE_PALETTE, cycle};
use crate::core_modules::particle::ParticleSystem;
use crate::core_modules::raster::{
    Color, add_weighted, draw_closed_polyline, fill_polygon, paint_mask,
};
use crate::error::{TrailError, TrailResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The three trail styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailKind {
    Silhouette,
    Edge,
    Particle,
}

impl TrailKind {
    pub const ALL: [TrailKind; 3] = [TrailKind::Silhouette, TrailKind::Edge, TrailKind::Particle];

    /// Window title for the live display.
    pub fn title(self) -> &'static str {
        match self {
            TrailKind::Silhouette => "Person Silhouette Tracker",
            TrailKind::Edge => "Edge Trail Tracker",
            TrailKind::Particle => "Particle Trail Tracker",
        }
    }

    /// One-line description shown in the interactive menu.
    pub fn menu_label(self) -> &'static str {
        match self {
            TrailKind::Silhouette => "Silhouette Trails (colorful silhouette outlines)",
            TrailKind::Edge => "Edge Trails (colorful edge detection)",
            TrailKind::Particle => "Particle Trails (particle system following motion)",
        }
    }

    /// Menu answer: "1" and "2" pick silhouette and edge, anything else particles.
    pub fn from_menu_choice(choice: &str) -> Self {
        match choice.trim() {
            "1" => TrailKind::Silhouette,
            "2" => TrailKind::Edge,
            _ => TrailKind::Particle,
        }
    }
}

impl fmt::Display for TrailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrailKind::Silhouette => "silhouette",
            TrailKind::Edge => "edge",
            TrailKind::Particle => "particle",
        };
        f.write_str(name)
    }
}

impl FromStr for TrailKind {
    type Err = TrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "silhouette" => Ok(TrailKind::Silhouette),
            "2" | "edge" => Ok(TrailKind::Edge),
            "3" | "particle" | "particles" => Ok(TrailKind::Particle),
            other => Err(TrailError::invalid_config(format!(
                "unknown trail style '{other}'"
            ))),
        }
    }
}

/// A trail style: consumes frames in order and returns each one with trails painted on.
pub trait TrailEffect {
    fn kind(&self) -> TrailKind;
    fn process_frame(&mut self, frame: &Frame) -> TrailResult<Frame>;
}

/// Blends every stored contour set onto a copy of `frame`, oldest first.
pub fn composite_silhouettes(
    frame: &Frame,
    history: &BoundedHistory<Vec<Contour>>,
    palette: &[Color],
    thickness: u32,
    damping: f32,
) -> TrailResult<Frame> {
    ensure_palette(palette)?;
    let mut working = frame.clone();
    for (index, alpha, contours) in history.iter_with_age() {
        let color = cycle(palette, index);
        let mut overlay = working.clone();
        for contour in contours {
            fill_polygon(&mut overlay, &contour.points, color);
            draw_closed_polyline(&mut overlay, &contour.points, color, thickness);
        }
        add_weighted(&mut working, &overlay, alpha * damping)?;
    }
    Ok(working)
}

/// Blends every stored edge mask onto a copy of `frame`, oldest first.
pub fn composite_edges(
    frame: &Frame,
    history: &BoundedHistory<BinaryMask>,
    palette: &[Color],
    damping: f32,
) -> TrailResult<Frame> {
    ensure_palette(palette)?;
    let mut working = frame.clone();
    for (index, alpha, edges) in history.iter_with_age() {
        TrailError::ensure_same_size(working.dimensions(), edges.dimensions())?;
        if edges.is_empty() {
            continue;
        }
        let mut overlay = working.clone();
        paint_mask(&mut overlay, edges, cycle(palette, index))?;
        add_weighted(&mut working, &overlay, alpha * damping)?;
    }
    Ok(working)
}

fn ensure_palette(palette: &[Color]) -> TrailResult<()> {
    if palette.is_empty() {
        return Err(TrailError::invalid_config("trail palette must not be empty"));
    }
    Ok(())
}

/// Filled, outlined silhouettes of recent motion.
pub struct SilhouetteTrail {
    extractor: MotionExtractor,
    history: BoundedHistory<Vec<Contour>>,
    config: SilhouetteConfig,
}

impl SilhouetteTrail {
    pub fn new(
        config: SilhouetteConfig,
        background: Box<dyn BackgroundModel>,
    ) -> TrailResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: MotionExtractor::new(background, config.kernel_size)?,
            history: BoundedHistory::new(config.trail_length),
            config,
        })
    }

    pub fn history(&self) -> &BoundedHistory<Vec<Contour>> {
        &self.history
    }
}

impl TrailEffect for SilhouetteTrail {
    fn kind(&self) -> TrailKind {
        TrailKind::Silhouette
    }

    fn process_frame(&mut self, frame: &Frame) -> TrailResult<Frame> {
        let contours = self.extractor.contours(frame, self.config.min_contour_area)?;
        // Frames without qualifying regions leave the history untouched.
        if !contours.is_empty() {
            debug!(contours = contours.len(), "silhouette layer recorded");
            self.history.push(contours);
        }
        composite_silhouettes(
            frame,
            &self.history,
            &SILHOUETTE_PALETTE,
            self.config.contour_thickness,
            self.config.damping,
        )
    }
}

/// Colored edge outlines of recent motion.
pub struct EdgeTrail {
    extractor: MotionExtractor,
    history: BoundedHistory<BinaryMask>,
    config: EdgeConfig,
}

impl EdgeTrail {
    pub fn new(config: EdgeConfig, background: Box<dyn BackgroundModel>) -> TrailResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: MotionExtractor::new(background, config.kernel_size)?,
            history: BoundedHistory::new(config.trail_length),
            config,
        })
    }

    pub fn history(&self) -> &BoundedHistory<BinaryMask> {
        &self.history
    }
}

impl TrailEffect for EdgeTrail {
    fn kind(&self) -> TrailKind {
        TrailKind::Edge
    }

    fn process_frame(&mut self, frame: &Frame) -> TrailResult<Frame> {
        let edges = self.extractor.edges(
            frame,
            self.config.low_threshold,
            self.config.high_threshold,
        )?;
        self.history.push(edges);
        composite_edges(frame, &self.history, &EDGE_PALETTE, self.config.damping)
    }
}

/// Short-lived particles scattered over moving regions.
pub struct ParticleTrail {
    extractor: MotionExtractor,
    system: ParticleSystem,
    config: ParticleConfig,
}

impl ParticleTrail {
    pub fn new(config: ParticleConfig, background: Box<dyn BackgroundModel>) -> TrailResult<Self> {
        config.validate()?;
        let system = ParticleSystem::with_seed(
            &PARTICLE_PALETTE,
            config.trail_length,
            config.num_particles,
            config.seed,
        );
        Ok(Self {
            extractor: MotionExtractor::new(background, config.kernel_size)?,
            system,
            config,
        })
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }
}

impl TrailEffect for ParticleTrail {
    fn kind(&self) -> TrailKind {
        TrailKind::Particle
    }

    fn process_frame(&mut self, frame: &Frame) -> TrailResult<Frame> {
        let domain = self.extractor.motion_domain(frame)?;
        let spawned = self.system.update(&domain);
        debug!(spawned, active = self.system.len(), "particles updated");
        let mut canvas = frame.clone();
        self.system.render(&mut canvas, self.config.marker_radius);
        Ok(canvas)
    }
}
