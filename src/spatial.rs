//! Nearest land point lookup
//!
//! `nearest_linear` is the reference brute-force scan. `LandIndex` buckets
//! points into a uniform grid and searches outward ring by ring; it returns
//! exactly what the linear scan returns, including the tie-break (the
//! earliest point in set order wins).

use crate::terrain::LandPoint;

/// Average number of points per grid cell the index aims for
const POINTS_PER_CELL: f64 = 4.0;

/// Index of the land point closest to `(x, y)`, or `None` for an empty set.
pub fn nearest_linear(points: &[LandPoint], x: f64, y: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, p) in points.iter().enumerate() {
        let d = p.dist_sq(x, y);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((idx, d)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Uniform grid over a fixed land point set
#[derive(Clone, Debug)]
pub struct LandIndex<'a> {
    points: &'a [LandPoint],
    min_x: f64,
    min_y: f64,
    cell_size: f64,
    cols: usize,
    rows: usize,
    /// Point indices per cell, ascending
    cells: Vec<Vec<u32>>,
}

impl<'a> LandIndex<'a> {
    pub fn new(points: &'a [LandPoint]) -> Self {
        if points.is_empty() {
            return Self {
                points,
                min_x: 0.0,
                min_y: 0.0,
                cell_size: 1.0,
                cols: 0,
                rows: 0,
                cells: Vec::new(),
            };
        }

        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let span_x = (max_x - min_x) as f64 + 1.0;
        let span_y = (max_y - min_y) as f64 + 1.0;
        let target_cells = (points.len() as f64 / POINTS_PER_CELL).max(1.0);
        let cell_size = (span_x * span_y / target_cells).sqrt().ceil().max(1.0);

        let cols = ((max_x - min_x) as f64 / cell_size).floor() as usize + 1;
        let rows = ((max_y - min_y) as f64 / cell_size).floor() as usize + 1;

        let mut index = Self {
            points,
            min_x: min_x as f64,
            min_y: min_y as f64,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        };
        for (idx, p) in points.iter().enumerate() {
            let (cx, cy) = index.cell_of(p.x as f64, p.y as f64);
            index.cells[cy * cols + cx].push(idx as u32);
        }
        index
    }

    /// Grid cell containing a position, clamped onto the grid.
    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let cx = ((x - self.min_x) / self.cell_size).floor();
        let cy = ((y - self.min_y) / self.cell_size).floor();
        let cx = (cx.max(0.0) as usize).min(self.cols - 1);
        let cy = (cy.max(0.0) as usize).min(self.rows - 1);
        (cx, cy)
    }

    /// Index of the land point closest to `(x, y)`.
    pub fn nearest(&self, x: f64, y: f64) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        if !x.is_finite() || !y.is_finite() {
            return nearest_linear(self.points, x, y);
        }

        let (cx, cy) = self.cell_of(x, y);
        let max_ring = self.cols.max(self.rows);
        let mut best: Option<(usize, f64)> = None;

        for ring in 0..=max_ring {
            self.visit_ring(cx, cy, ring, |idx| {
                let d = self.points[idx].dist_sq(x, y);
                let better = match best {
                    None => true,
                    Some((best_idx, best_d)) => d < best_d || (d == best_d && idx < best_idx),
                };
                if better {
                    best = Some((idx, d));
                }
            });

            // Anything beyond this ring is at least `ring` whole cells away
            if let Some((_, best_d)) = best {
                let bound = ring as f64 * self.cell_size;
                if best_d < bound * bound {
                    break;
                }
            }
        }

        best.map(|(idx, _)| idx)
    }

    /// The land point closest to `(x, y)`.
    pub fn nearest_point(&self, x: f64, y: f64) -> Option<LandPoint> {
        self.nearest(x, y).map(|idx| self.points[idx])
    }

    /// Call `f` for every point in cells at Chebyshev distance `ring`.
    fn visit_ring(&self, cx: usize, cy: usize, ring: usize, mut f: impl FnMut(usize)) {
        let (cx, cy, r) = (cx as i64, cy as i64, ring as i64);
        let mut visit_cell = |i: i64, j: i64| {
            if i < 0 || j < 0 || i >= self.cols as i64 || j >= self.rows as i64 {
                return;
            }
            for &idx in &self.cells[j as usize * self.cols + i as usize] {
                f(idx as usize);
            }
        };

        if r == 0 {
            visit_cell(cx, cy);
            return;
        }
        for i in (cx - r)..=(cx + r) {
            visit_cell(i, cy - r);
            visit_cell(i, cy + r);
        }
        for j in (cy - r + 1)..=(cy + r - 1) {
            visit_cell(cx - r, j);
            visit_cell(cx + r, j);
        }
    }
}
