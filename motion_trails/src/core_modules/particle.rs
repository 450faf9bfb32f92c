// THEORY:
// The `ParticleSystem` is the memory of the particle trail. Unlike the silhouette and
// edge trails it does not keep a frame-level history; it keeps a population of
// individually aged particles sampled from the motion mask.
//
// Lifecycle of a particle:
// 1.  **Birth**: Each update samples up to `num_particles` distinct foreground pixels
//     uniformly at random. Every sample becomes a particle whose trail holds just that
//     pixel, whose color is drawn at random from the palette, and whose remaining life
//     is `trail_length`.
// 2.  **Ageing**: Right after births, every particle (newborns included) loses one unit
//     of life.
// 3.  **Death**: Particles whose life reaches zero leave the active set.
//
// Particles are snapshots of sampled motion; they do not move after birth, so their
// trail never grows past the spawn point. The renderer still handles longer trails.
//
// Randomness comes from an injected generator so tests can fix the seed.

use crate::core_modules::bounded_history::BoundedHistory;
use crate::core_modules::frame::{BinaryMask, Frame, Point};
use crate::core_modules::raster::{Color, draw_filled_circle, draw_line};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

/// Stroke width never exceeds this at the newest end of a trail.
const MAX_TRAIL_THICKNESS: f32 = 3.0;

#[derive(Debug, Clone)]
pub struct Particle {
    /// Positions from oldest to newest, bounded by the system's trail length.
    pub trail: BoundedHistory<Point>,
    pub color: Color,
    pub remaining_life: u32,
}

impl Particle {
    pub fn spawn(position: Point, color: Color, trail_length: usize) -> Self {
        let mut trail = BoundedHistory::new(trail_length);
        trail.push(position);
        Self {
            trail,
            color,
            remaining_life: u32::try_from(trail_length).unwrap_or(u32::MAX),
        }
    }

    pub fn position(&self) -> Option<Point> {
        self.trail.newest().copied()
    }

    /// Draws the trail opaquely, thickening toward the newest point, then a marker.
    pub fn render(&self, frame: &mut Frame, marker_radius: u32) {
        let points: Vec<Point> = self.trail.iter().map(|(_, p)| *p).collect();
        let len = points.len() as f32;
        for i in 1..points.len() {
            let thickness = (MAX_TRAIL_THICKNESS * i as f32 / len).round().max(1.0) as u32;
            draw_line(frame, points[i - 1], points[i], self.color, thickness);
        }
        if let Some(head) = points.last() {
            draw_filled_circle(frame, *head, marker_radius as f32, self.color);
        }
    }
}

/// A population of particles spawned from motion masks.
pub struct ParticleSystem<R: Rng = StdRng> {
    particles: Vec<Particle>,
    palette: Vec<Color>,
    trail_length: usize,
    num_particles: usize,
    rng: R,
}

impl ParticleSystem<StdRng> {
    /// Seeded when `seed` is given, otherwise seeded from the operating system.
    pub fn with_seed(
        palette: &[Color],
        trail_length: usize,
        num_particles: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::new(palette, trail_length, num_particles, rng)
    }
}

impl<R: Rng> ParticleSystem<R> {
    pub fn new(palette: &[Color], trail_length: usize, num_particles: usize, rng: R) -> Self {
        Self {
            particles: Vec::new(),
            palette: palette.to_vec(),
            trail_length: trail_length.max(1),
            num_particles,
            rng,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawns from `mask`, then ages every particle. Returns the number spawned.
    pub fn update(&mut self, mask: &BinaryMask) -> usize {
        let spawned = self.spawn_from(mask);
        self.particles.retain_mut(|particle| {
            particle.remaining_life = particle.remaining_life.saturating_sub(1);
            particle.remaining_life > 0
        });
        spawned
    }

    /// Draws every active particle directly onto `frame`.
    pub fn render(&self, frame: &mut Frame, marker_radius: u32) {
        for particle in &self.particles {
            particle.render(frame, marker_radius);
        }
    }

    fn spawn_from(&mut self, mask: &BinaryMask) -> usize {
        let motion_points = mask.foreground_points();
        if motion_points.is_empty() || self.palette.is_empty() {
            return 0;
        }
        let amount = self.num_particles.min(motion_points.len());
        let picks = sample(&mut self.rng, motion_points.len(), amount);
        for index in picks.iter() {
            let Some(&color) = self.palette.choose(&mut self.rng) else {
                continue;
            };
            self.particles.push(Particle::spawn(
                motion_points[index],
                color,
                self.trail_length,
            ));
        }
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::palette::PARTICLE_PALETTE;
    use image::Rgb;
    use std::collections::HashSet;

    fn system(trail_length: usize, num_particles: usize) -> ParticleSystem {
        ParticleSystem::with_seed(&PARTICLE_PALETTE, trail_length, num_particles, Some(42))
    }

    fn mask_with_pixels(count: u32) -> BinaryMask {
        let mut mask = BinaryMask::new(50, 50);
        for i in 0..count {
            mask.set(i % 50, i / 50, true);
        }
        mask
    }

    #[test]
    fn spawns_min_of_motion_pixels_and_budget_without_duplicates() {
        let mut particles = system(5, 10);
        assert_eq!(particles.update(&mask_with_pixels(4)), 4);

        let mut particles = system(5, 10);
        let spawned = particles.update(&mask_with_pixels(300));
        assert_eq!(spawned, 10);
        assert_eq!(particles.len(), 10);
        let positions: HashSet<Point> = particles
            .particles()
            .iter()
            .filter_map(Particle::position)
            .collect();
        assert_eq!(positions.len(), 10);
        let mask = mask_with_pixels(300);
        assert!(positions.iter().all(|p| mask.is_foreground(p.x, p.y)));
    }

    #[test]
    fn particle_lives_exactly_trail_length_ticks() {
        let life = 4;
        let mut particles = system(life, 1);
        let empty = BinaryMask::new(50, 50);

        // Tick 1 spawns and ages.
        particles.update(&mask_with_pixels(1));
        for _ in 2..life {
            particles.update(&empty);
        }
        // After L - 1 ticks the particle is still alive.
        assert_eq!(particles.len(), 1);
        assert_eq!(particles.particles()[0].remaining_life, 1);
        particles.update(&empty);
        assert!(particles.is_empty());
    }

    #[test]
    fn single_tick_particles_never_survive() {
        let mut particles = system(1, 8);
        assert_eq!(particles.update(&mask_with_pixels(20)), 8);
        assert!(particles.is_empty());
    }

    #[test]
    fn particles_are_static_and_colored_from_palette() {
        let mut particles = system(6, 3);
        particles.update(&mask_with_pixels(50));
        let before: Vec<Point> = particles
            .particles()
            .iter()
            .filter_map(Particle::position)
            .collect();
        particles.update(&BinaryMask::new(50, 50));
        let after: Vec<Point> = particles
            .particles()
            .iter()
            .filter_map(Particle::position)
            .collect();
        assert_eq!(before, after);
        for particle in particles.particles() {
            assert_eq!(particle.trail.len(), 1);
            assert!(PARTICLE_PALETTE.contains(&particle.color));
        }
    }

    #[test]
    fn same_seed_gives_same_particles() {
        let mask = mask_with_pixels(500);
        let mut a = system(3, 20);
        let mut b = system(3, 20);
        a.update(&mask);
        b.update(&mask);
        let summary = |s: &ParticleSystem| -> Vec<(Point, Color)> {
            s.particles()
                .iter()
                .map(|p| (p.position().unwrap(), p.color))
                .collect()
        };
        assert_eq!(summary(&a), summary(&b));
    }

    #[test]
    fn render_draws_opaque_markers() {
        let mut frame = Frame::new(20, 20);
        let particle = Particle::spawn(Point::new(10, 10), Rgb([1, 2, 3]), 5);
        particle.render(&mut frame, 2);
        assert_eq!(*frame.get_pixel(10, 10), Rgb([1, 2, 3]));
        assert_eq!(*frame.get_pixel(12, 10), Rgb([1, 2, 3]));
        assert_eq!(*frame.get_pixel(12, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn longer_trails_are_joined_by_segments() {
        let mut frame = Frame::new(30, 30);
        let mut particle = Particle::spawn(Point::new(2, 15), Rgb([9, 9, 9]), 4);
        particle.trail.push(Point::new(14, 15));
        particle.trail.push(Point::new(26, 15));
        particle.render(&mut frame, 2);
        for x in 2..=26 {
            assert_eq!(*frame.get_pixel(x, 15), Rgb([9, 9, 9]), "gap at x={x}");
        }
        // Newest segment is the thickest: round(3 * 2 / 3) = 2.
        assert_eq!(*frame.get_pixel(20, 16), Rgb([9, 9, 9]));
    }
}
