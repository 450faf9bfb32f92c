// THEORY:
// The raster module is the paint layer of the trail engine. Compositors never touch
// pixels directly; they draw shapes onto an overlay and cross-blend that overlay into
// the working frame.
//
// Contracts:
// 1.  **Clipping**: Every primitive accepts coordinates outside the frame and silently
//     clips to it.
// 2.  **Opaque Drawing**: Shapes replace pixel colors outright. Translucency comes only
//     from `add_weighted`.
// 3.  **Cross-Blend**: `add_weighted` computes `overlay * w + working * (1 - w)` per
//     channel, rounded and saturated to 8 bits, with no brightness offset.

use crate::core_modules::frame::{BinaryMask, Frame, Point};
use crate::error::{TrailError, TrailResult};
use image::Rgb;

pub type Color = Rgb<u8>;

fn put(frame: &mut Frame, x: i32, y: i32, color: Color) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

/// Blends `overlay` into `working` in place with weight `weight` on the overlay.
pub fn add_weighted(working: &mut Frame, overlay: &Frame, weight: f32) -> TrailResult<()> {
    TrailError::ensure_same_size(working.dimensions(), overlay.dimensions())?;
    let keep = 1.0 - weight;
    for (dst, &src) in working.iter_mut().zip(overlay.iter()) {
        let mixed = src as f32 * weight + *dst as f32 * keep;
        *dst = mixed.round().clamp(0.0, 255.0) as u8;
    }
    Ok(())
}

/// Sets every foreground pixel of `mask` to `color`.
pub fn paint_mask(frame: &mut Frame, mask: &BinaryMask, color: Color) -> TrailResult<()> {
    TrailError::ensure_same_size(frame.dimensions(), mask.dimensions())?;
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        if mask.is_foreground(x as i32, y as i32) {
            *pixel = color;
        }
    }
    Ok(())
}

/// Fills a disc of `radius` around `center`.
pub fn draw_filled_circle(frame: &mut Frame, center: Point, radius: f32, color: Color) {
    let reach = radius.ceil() as i32;
    let limit = radius * radius;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            if (dx * dx + dy * dy) as f32 <= limit {
                put(frame, center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// Draws a segment; thickness 1 is a plain Bresenham line, wider strokes stamp a
/// disc of diameter `thickness` at every step.
pub fn draw_line(frame: &mut Frame, from: Point, to: Point, color: Color, thickness: u32) {
    let radius = thickness as f32 / 2.0;
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if thickness <= 1 {
            put(frame, x, y, color);
        } else {
            draw_filled_circle(frame, Point::new(x, y), radius, color);
        }
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Strokes the closed outline through `points`.
pub fn draw_closed_polyline(frame: &mut Frame, points: &[Point], color: Color, thickness: u32) {
    match points {
        [] => {}
        [only] => draw_line(frame, *only, *only, color, thickness),
        _ => {
            for (i, &from) in points.iter().enumerate() {
                let to = points[(i + 1) % points.len()];
                draw_line(frame, from, to, color, thickness);
            }
        }
    }
}

/// Scanline fill with the even-odd rule, sampling at pixel centres.
pub fn fill_polygon(frame: &mut Frame, points: &[Point], color: Color) {
    if points.len() < 3 {
        return;
    }
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_y = points
        .iter()
        .map(|p| p.y)
        .max()
        .unwrap_or(0)
        .min(frame.height() as i32 - 1);

    let mut crossings: Vec<f64> = Vec::new();
    for y in min_y..=max_y {
        crossings.clear();
        let scan = y as f64;
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            let (lo, hi) = if a.y <= b.y { (*a, b) } else { (b, *a) };
            // Half-open span so shared vertices count once.
            if lo.y == hi.y || scan < lo.y as f64 || scan >= hi.y as f64 {
                continue;
            }
            let t = (scan - lo.y as f64) / (hi.y - lo.y) as f64;
            crossings.push(lo.x as f64 + t * (hi.x - lo.x) as f64);
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0].ceil() as i32).max(0);
            let end = (pair[1].floor() as i32).min(frame.width() as i32 - 1);
            for x in start..=end {
                put(frame, x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Rgb([255, 0, 0]);

    fn count(frame: &Frame, color: Color) -> usize {
        frame.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn add_weighted_is_a_rounded_cross_blend() {
        let mut working = Frame::from_pixel(2, 1, Rgb([100, 0, 255]));
        let overlay = Frame::from_pixel(2, 1, Rgb([200, 255, 0]));
        add_weighted(&mut working, &overlay, 0.25).unwrap();
        // 200*0.25 + 100*0.75 = 125; 255*0.25 = 63.75 -> 64; 255*0.75 = 191.25 -> 191
        assert_eq!(*working.get_pixel(0, 0), Rgb([125, 64, 191]));
    }

    #[test]
    fn add_weighted_with_identical_images_is_identity() {
        let original = Frame::from_fn(7, 5, |x, y| Rgb([x as u8 * 30, y as u8 * 40, 17]));
        let mut working = original.clone();
        add_weighted(&mut working, &original, 0.18).unwrap();
        assert_eq!(working, original);
    }

    #[test]
    fn add_weighted_rejects_mismatched_sizes() {
        let mut working = Frame::new(4, 4);
        assert!(add_weighted(&mut working, &Frame::new(4, 5), 0.5).is_err());
    }

    #[test]
    fn filled_square_covers_its_interior() {
        let mut frame = Frame::new(20, 20);
        let square = [
            Point::new(2, 2),
            Point::new(11, 2),
            Point::new(11, 11),
            Point::new(2, 11),
        ];
        fill_polygon(&mut frame, &square, RED);
        assert_eq!(*frame.get_pixel(6, 6), RED);
        assert_eq!(*frame.get_pixel(2, 2), RED);
        assert_eq!(*frame.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(15, 6), Rgb([0, 0, 0]));
        // Bottom row is excluded by the half-open rule; the outline stroke covers it.
        assert_eq!(count(&frame, RED), 10 * 9);
    }

    #[test]
    fn polygon_fill_clips_to_frame() {
        let mut frame = Frame::new(5, 5);
        let huge = [
            Point::new(-10, -10),
            Point::new(20, -10),
            Point::new(20, 20),
            Point::new(-10, 20),
        ];
        fill_polygon(&mut frame, &huge, RED);
        assert_eq!(count(&frame, RED), 25);
    }

    #[test]
    fn thick_outline_spans_three_pixels() {
        let mut frame = Frame::new(30, 30);
        let square = [
            Point::new(5, 5),
            Point::new(24, 5),
            Point::new(24, 24),
            Point::new(5, 24),
        ];
        draw_closed_polyline(&mut frame, &square, RED, 3);
        assert_eq!(*frame.get_pixel(15, 4), RED);
        assert_eq!(*frame.get_pixel(15, 5), RED);
        assert_eq!(*frame.get_pixel(15, 6), RED);
        assert_eq!(*frame.get_pixel(15, 7), Rgb([0, 0, 0]));
        assert_eq!(*frame.get_pixel(15, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn thin_line_touches_both_endpoints() {
        let mut frame = Frame::new(10, 10);
        draw_line(&mut frame, Point::new(1, 1), Point::new(8, 4), RED, 1);
        assert_eq!(*frame.get_pixel(1, 1), RED);
        assert_eq!(*frame.get_pixel(8, 4), RED);
        assert_eq!(count(&frame, RED), 8);
    }

    #[test]
    fn marker_of_radius_two_is_a_small_disc() {
        let mut frame = Frame::new(9, 9);
        draw_filled_circle(&mut frame, Point::new(4, 4), 2.0, RED);
        assert_eq!(count(&frame, RED), 13);
        draw_filled_circle(&mut frame, Point::new(-5, -5), 2.0, RED);
        assert_eq!(count(&frame, RED), 13);
    }

    #[test]
    fn paint_mask_colors_foreground_only() {
        let mut frame = Frame::new(4, 4);
        let mut mask = BinaryMask::new(4, 4);
        mask.set(1, 2, true);
        paint_mask(&mut frame, &mask, RED).unwrap();
        assert_eq!(count(&frame, RED), 1);
        assert_eq!(*frame.get_pixel(1, 2), RED);
    }
}
