// THEORY:
// The contour finder is the spatial grouping step of the silhouette trail. It turns a
// cleaned foreground mask into closed polygons, one per moving region, which the
// compositor fills and outlines.
//
// Algorithm steps:
// 1.  **Component Labelling**: A breadth-first flood fill groups foreground pixels into
//     8-connected components. Components are discovered in raster order, so the first
//     pixel of each is its top-most, left-most pixel.
// 2.  **Boundary Tracing**: Starting from that first pixel (whose west neighbour is
//     always background) the outer boundary is walked clockwise with Moore-neighbour
//     tracing. The walk stops when it is about to repeat its very first move.
// 3.  **Chain Compression**: Runs of boundary pixels along one direction collapse to
//     their end points, leaving only the vertices of the polygon.
// 4.  **Stateless Utility**: No memory of previous frames. Area filtering is left to the
//     caller (`Contour::area`), measured as the polygon area enclosed by pixel centres.

use crate::core_modules::frame::{BinaryMask, Point};

pub mod contour_finder {
    use super::*;

    /// Clockwise neighbour offsets (image y grows downward), starting east.
    const DIRECTIONS: [(i32, i32); 8] = [
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
    ];
    const WEST: usize = 4;

    /// A closed polygon outlining one foreground region.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Contour {
        /// Polygon vertices in clockwise order; the closing edge is implicit.
        pub points: Vec<Point>,
    }

    impl Contour {
        pub fn new(points: Vec<Point>) -> Self {
            Self { points }
        }

        /// Shoelace area of the polygon. Degenerate contours have zero area.
        pub fn area(&self) -> f64 {
            let n = self.points.len();
            if n < 3 {
                return 0.0;
            }
            let twice: i64 = (0..n)
                .map(|i| {
                    let a = self.points[i];
                    let b = self.points[(i + 1) % n];
                    a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
                })
                .sum();
            twice.abs() as f64 / 2.0
        }

        /// Inclusive `(top_left, bottom_right)` corners, `None` for an empty contour.
        pub fn bounding_box(&self) -> Option<(Point, Point)> {
            let first = *self.points.first()?;
            Some(self.points.iter().fold((first, first), |(lo, hi), p| {
                (
                    Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                    Point::new(hi.x.max(p.x), hi.y.max(p.y)),
                )
            }))
        }
    }

    /// Finds the outer boundary of every 8-connected foreground component.
    pub fn find_external_contours(mask: &BinaryMask) -> Vec<Contour> {
        let (width, height) = mask.dimensions();
        let (w, h) = (width as i32, height as i32);
        let mut labels = vec![0u32; (width * height) as usize];
        let mut next_label = 0u32;
        let mut contours = Vec::new();

        for y in 0..h {
            for x in 0..w {
                if !mask.is_foreground(x, y) || labels[(y * w + x) as usize] != 0 {
                    continue;
                }
                next_label += 1;
                label_component(mask, &mut labels, Point::new(x, y), next_label);
                let boundary = trace_boundary(&labels, w, h, Point::new(x, y), next_label);
                contours.push(Contour::new(compress_chain(boundary)));
            }
        }

        contours
    }

    /// Keeps contours whose area is at least `min_area`.
    pub fn filter_by_area(contours: Vec<Contour>, min_area: f64) -> Vec<Contour> {
        contours.into_iter().filter(|c| c.area() >= min_area).collect()
    }

    /// Breadth-first flood fill over 8-connected foreground pixels.
    fn label_component(mask: &BinaryMask, labels: &mut [u32], seed: Point, label: u32) {
        let w = mask.width() as i32;
        let mut queue = vec![seed];
        labels[(seed.y * w + seed.x) as usize] = label;

        while let Some(current) = queue.pop() {
            for (dx, dy) in DIRECTIONS {
                let (nx, ny) = (current.x + dx, current.y + dy);
                if !mask.is_foreground(nx, ny) {
                    continue;
                }
                let index = (ny * w + nx) as usize;
                if labels[index] == 0 {
                    labels[index] = label;
                    queue.push(Point::new(nx, ny));
                }
            }
        }
    }

    /// Moore-neighbour tracing of the component carrying `label`.
    fn trace_boundary(labels: &[u32], w: i32, h: i32, start: Point, label: u32) -> Vec<Point> {
        let inside = |p: Point| {
            p.x >= 0 && p.y >= 0 && p.x < w && p.y < h && labels[(p.y * w + p.x) as usize] == label
        };

        // Returns the next boundary pixel and the direction from it back to the last
        // background neighbour examined, which seeds the following search.
        let step = |current: Point, search_from: usize| -> Option<(Point, usize)> {
            for i in 0..8 {
                let dir = (search_from + i) % 8;
                let (dx, dy) = DIRECTIONS[dir];
                let candidate = Point::new(current.x + dx, current.y + dy);
                if inside(candidate) {
                    let (bx, by) = DIRECTIONS[(dir + 7) % 8];
                    let backtrack = Point::new(current.x + bx, current.y + by);
                    let back_dir = direction_between(candidate, backtrack);
                    return Some((candidate, back_dir));
                }
            }
            None
        };

        let Some((first_move, mut search_from)) = step(start, WEST) else {
            return vec![start];
        };

        let mut boundary = vec![start];
        let mut current = first_move;
        // A boundary pixel is visited at most four times.
        let limit = labels.len() * 4 + 8;

        while boundary.len() < limit {
            let Some((next, back_dir)) = step(current, search_from) else {
                break;
            };
            if current == start && next == first_move {
                break;
            }
            boundary.push(current);
            current = next;
            search_from = back_dir;
        }

        boundary
    }

    /// Direction index of `to` as seen from its 8-neighbour `from`.
    fn direction_between(from: Point, to: Point) -> usize {
        let delta = (to.x - from.x, to.y - from.y);
        DIRECTIONS
            .iter()
            .position(|&d| d == delta)
            .unwrap_or(WEST)
    }

    /// Drops every vertex that continues the direction of the previous segment.
    fn compress_chain(points: Vec<Point>) -> Vec<Point> {
        let n = points.len();
        if n < 3 {
            return points;
        }
        (0..n)
            .filter(|&i| {
                let prev = points[(i + n - 1) % n];
                let here = points[i];
                let next = points[(i + 1) % n];
                (here.x - prev.x, here.y - prev.y) != (next.x - here.x, next.y - here.y)
            })
            .map(|i| points[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::contour_finder::*;
    use super::*;

    #[test]
    fn square_block_traces_to_four_corners() {
        let mut mask = BinaryMask::new(80, 80);
        mask.fill_rect(10, 20, 50, 50);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        assert_eq!(
            contour.points,
            vec![
                Point::new(10, 20),
                Point::new(59, 20),
                Point::new(59, 69),
                Point::new(10, 69),
            ]
        );
        assert_eq!(contour.area(), 49.0 * 49.0);
        assert_eq!(
            contour.bounding_box(),
            Some((Point::new(10, 20), Point::new(59, 69)))
        );
    }

    #[test]
    fn small_regions_are_filtered_out() {
        let mut mask = BinaryMask::new(200, 120);
        // 500 px region.
        mask.fill_rect(10, 10, 20, 25);
        // 2000 px region.
        mask.fill_rect(100, 40, 40, 50);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 2);

        let kept = filter_by_area(contours, 1000.0);
        assert_eq!(kept.len(), 1);
        assert_eq!(
            kept[0].bounding_box(),
            Some((Point::new(100, 40), Point::new(139, 89)))
        );
    }

    #[test]
    fn isolated_pixel_and_thin_line_are_degenerate() {
        let mut mask = BinaryMask::new(10, 10);
        mask.set(1, 1, true);
        mask.fill_rect(4, 6, 5, 1);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].points, vec![Point::new(1, 1)]);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(contours[1].points, vec![Point::new(4, 6), Point::new(8, 6)]);
        assert_eq!(contours[1].area(), 0.0);
    }

    #[test]
    fn diagonal_neighbours_join_one_component() {
        let mut mask = BinaryMask::new(6, 6);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        mask.set(3, 3, true);
        assert_eq!(find_external_contours(&mask).len(), 1);
    }

    #[test]
    fn l_shaped_region_has_expected_area() {
        let mut mask = BinaryMask::new(20, 20);
        mask.fill_rect(2, 2, 10, 4);
        mask.fill_rect(2, 6, 4, 6);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        // The inner corner is cut diagonally, adding half a pixel of area.
        assert_eq!(
            contours[0].points,
            vec![
                Point::new(2, 2),
                Point::new(11, 2),
                Point::new(11, 5),
                Point::new(6, 5),
                Point::new(5, 6),
                Point::new(5, 11),
                Point::new(2, 11),
            ]
        );
        assert_eq!(contours[0].area(), 9.0 * 3.0 + 3.0 * 6.0 + 0.5);
    }

    #[test]
    fn empty_mask_yields_no_contours() {
        assert!(find_external_contours(&BinaryMask::new(5, 5)).is_empty());
    }
}
