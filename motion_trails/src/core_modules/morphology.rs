// THEORY:
// Morphological cleanup of foreground masks. Raw subtractor output is speckled with
// single-pixel noise and pinholes; `close` fills small gaps inside moving regions and
// `open` removes isolated specks.
//
// All operators use a `k x k` square structuring element anchored at its centre.
// Window pixels that fall outside the image are ignored, so the border neither grows
// nor erodes the mask. A square kernel is separable, so each pass runs as a row
// filter followed by a column filter.

use crate::core_modules::frame::BinaryMask;
use crate::error::{TrailError, TrailResult};

pub fn validate_kernel(kernel_size: u32) -> TrailResult<()> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(TrailError::invalid_config(format!(
            "kernel size must be odd and positive, got {kernel_size}"
        )));
    }
    Ok(())
}

/// Grows foreground: a pixel is set if any pixel under the kernel is set.
pub fn dilate(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
    square_filter(mask, kernel_size, true)
}

/// Shrinks foreground: a pixel stays set only if every in-bounds pixel under the kernel is set.
pub fn erode(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
    square_filter(mask, kernel_size, false)
}

/// Dilation followed by erosion.
pub fn close(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
    erode(&dilate(mask, kernel_size), kernel_size)
}

/// Erosion followed by dilation.
pub fn open(mask: &BinaryMask, kernel_size: u32) -> BinaryMask {
    dilate(&erode(mask, kernel_size), kernel_size)
}

fn square_filter(mask: &BinaryMask, kernel_size: u32, grow: bool) -> BinaryMask {
    let (width, height) = mask.dimensions();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return mask.clone();
    }
    let radius = (kernel_size / 2) as i32;
    let (w, h) = (width as i32, height as i32);

    let source: Vec<bool> = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| mask.is_foreground(x, y))
        .collect();

    // Horizontal pass.
    let mut rows = vec![false; source.len()];
    for y in 0..h {
        for x in 0..w {
            let lo = (x - radius).max(0);
            let hi = (x + radius).min(w - 1);
            let window = &source[(y * w + lo) as usize..=(y * w + hi) as usize];
            rows[(y * w + x) as usize] = reduce(window.iter().copied(), grow);
        }
    }

    // Vertical pass.
    let mut out = BinaryMask::new(width, height);
    for y in 0..h {
        let lo = (y - radius).max(0);
        let hi = (y + radius).min(h - 1);
        for x in 0..w {
            let column = (lo..=hi).map(|yy| rows[(yy * w + x) as usize]);
            if reduce(column, grow) {
                out.set(x as u32, y as u32, true);
            }
        }
    }
    out
}

fn reduce(mut window: impl Iterator<Item = bool>, grow: bool) -> bool {
    if grow {
        window.any(|v| v)
    } else {
        window.all(|v| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_removes_isolated_specks() {
        let mut mask = BinaryMask::new(20, 20);
        mask.fill_rect(5, 5, 8, 8);
        mask.set(17, 2, true);
        let cleaned = open(&mask, 5);
        assert!(!cleaned.is_foreground(17, 2));
        assert_eq!(cleaned.foreground_count(), 64);
    }

    #[test]
    fn close_fills_pinholes() {
        let mut mask = BinaryMask::new(20, 20);
        mask.fill_rect(4, 4, 10, 10);
        mask.set(8, 8, false);
        mask.set(9, 9, false);
        let cleaned = close(&mask, 3);
        assert!(cleaned.is_foreground(8, 8));
        assert!(cleaned.is_foreground(9, 9));
        assert_eq!(cleaned.foreground_count(), 100);
    }

    #[test]
    fn border_regions_do_not_erode() {
        let mut mask = BinaryMask::new(10, 10);
        mask.fill_rect(0, 0, 10, 10);
        assert_eq!(erode(&mask, 5).foreground_count(), 100);
    }

    #[test]
    fn dilate_grows_by_kernel_radius() {
        let mut mask = BinaryMask::new(9, 9);
        mask.set(4, 4, true);
        assert_eq!(dilate(&mask, 3).foreground_count(), 9);
        assert_eq!(dilate(&mask, 5).foreground_count(), 25);
    }

    #[test]
    fn even_kernels_are_rejected() {
        assert!(validate_kernel(4).is_err());
        assert!(validate_kernel(0).is_err());
        assert!(validate_kernel(3).is_ok());
    }
}
