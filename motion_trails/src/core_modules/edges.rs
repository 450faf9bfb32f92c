// THEORY:
// Edge extraction for the edge trail. The input is a cleaned foreground mask, so the
// "image" is two-level and every strong gradient sits on a region boundary. The
// classic Canny stages are applied: Sobel gradients, non-maximum suppression along
// the quantised gradient direction, and double-threshold hysteresis.

use crate::core_modules::frame::BinaryMask;

/// tan(22.5 deg) and tan(67.5 deg), bounds of the four direction sectors.
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Canny edge detection over a mask treated as a 0/255 intensity image.
///
/// Gradient magnitude is the L1 norm `|gx| + |gy|`. Pixels above `high` seed edges;
/// pixels above `low` survive when 8-connected to a seed.
pub fn canny(mask: &BinaryMask, low: f32, high: f32) -> BinaryMask {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as i32, height as i32);
    let mut edges = BinaryMask::new(width, height);
    if width == 0 || height == 0 {
        return edges;
    }

    // Replicated border.
    let intensity = |x: i32, y: i32| -> f32 {
        let x = x.clamp(0, w - 1);
        let y = y.clamp(0, h - 1);
        if mask.is_foreground(x, y) { 255.0 } else { 0.0 }
    };

    let len = (width * height) as usize;
    let mut gx = vec![0.0f32; len];
    let mut gy = vec![0.0f32; len];
    let mut magnitude = vec![0.0f32; len];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            gx[i] = (intensity(x + 1, y - 1) + 2.0 * intensity(x + 1, y) + intensity(x + 1, y + 1))
                - (intensity(x - 1, y - 1) + 2.0 * intensity(x - 1, y) + intensity(x - 1, y + 1));
            gy[i] = (intensity(x - 1, y + 1) + 2.0 * intensity(x, y + 1) + intensity(x + 1, y + 1))
                - (intensity(x - 1, y - 1) + 2.0 * intensity(x, y - 1) + intensity(x + 1, y - 1));
            magnitude[i] = gx[i].abs() + gy[i].abs();
        }
    }

    let mag_at = |x: i32, y: i32| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0.0
        } else {
            magnitude[(y * w + x) as usize]
        }
    };

    // Non-maximum suppression: 0 = dropped, 1 = weak, 2 = strong.
    let mut class = vec![0u8; len];
    let mut seeds = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let m = magnitude[i];
            if m <= low {
                continue;
            }
            let (ax, ay) = (gx[i].abs(), gy[i].abs());
            let is_max = if ay <= ax * TAN_22_5 {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else if ay > ax * TAN_67_5 {
                m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
            } else if (gx[i] < 0.0) != (gy[i] < 0.0) {
                m > mag_at(x - 1, y + 1) && m > mag_at(x + 1, y - 1)
            } else {
                m > mag_at(x - 1, y - 1) && m > mag_at(x + 1, y + 1)
            };
            if !is_max {
                continue;
            }
            if m > high {
                class[i] = 2;
                seeds.push((x, y));
            } else {
                class[i] = 1;
            }
        }
    }

    // Hysteresis.
    while let Some((x, y)) = seeds.pop() {
        edges.set(x as u32, y as u32, true);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let j = (ny * w + nx) as usize;
                if class[j] == 1 {
                    class[j] = 2;
                    seeds.push((nx, ny));
                }
            }
        }
    }

    edges
}
