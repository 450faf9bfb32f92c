// THEORY:
// Fixed color palettes for the three trail styles. History-based trails cycle through
// their palette by slot index (`index % len`), so a given age slot always has the same
// color. Particles instead draw a palette entry uniformly at random when spawned.

use crate::core_modules::raster::Color;
use image::Rgb;

/// Rainbow ramp for silhouette layers, red through pink.
pub const SILHOUETTE_PALETTE: [Color; 12] = [
    Rgb([255, 0, 0]),
    Rgb([255, 127, 0]),
    Rgb([255, 255, 0]),
    Rgb([127, 255, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 255, 127]),
    Rgb([0, 255, 255]),
    Rgb([0, 127, 255]),
    Rgb([0, 0, 255]),
    Rgb([127, 0, 255]),
    Rgb([255, 0, 255]),
    Rgb([255, 0, 127]),
];

/// High-saturation colors for edge layers.
pub const EDGE_PALETTE: [Color; 8] = [
    Rgb([0, 255, 255]),
    Rgb([255, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([0, 255, 0]),
    Rgb([255, 0, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 127, 0]),
    Rgb([127, 0, 255]),
];

pub const PARTICLE_PALETTE: [Color; 9] = [
    Rgb([255, 100, 100]),
    Rgb([100, 255, 100]),
    Rgb([100, 100, 255]),
    Rgb([255, 255, 100]),
    Rgb([255, 100, 255]),
    Rgb([100, 255, 255]),
    Rgb([255, 150, 0]),
    Rgb([150, 0, 255]),
    Rgb([0, 255, 150]),
];

/// Color for history slot `index`, cycling through `palette`, which must be non-empty.
pub fn cycle(palette: &[Color], index: usize) -> Color {
    palette[index % palette.len()]
}
