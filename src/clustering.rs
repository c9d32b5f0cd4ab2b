//! Constrained k-means over land points
//!
//! Lloyd's algorithm with one change: after each update the cluster mean is
//! replaced by the nearest real land point. A mean can land in a lake or
//! off a concave coastline; a portal cannot.

use rand::Rng;
use tracing::{debug, info};

use crate::error::{PlannerError, Result};
use crate::params::{PlannerParams, MAX_ROUNDS};
use crate::spatial::LandIndex;
use crate::terrain::LandPoint;

/// Result of one clustering run
#[derive(Clone, Debug)]
pub struct ClusterOutcome {
    /// Exactly `k` centroids, each one of the input land points
    pub centroids: Vec<LandPoint>,
    /// Relocation rounds executed
    pub iterations: usize,
    /// True if the run stopped because centroids settled
    pub converged: bool,
    /// Points assigned to each final centroid
    pub cluster_sizes: Vec<usize>,
    /// Largest centroid move in the last round executed
    pub last_shift: f64,
}

/// Accumulator for one cluster's mean
#[derive(Clone, Copy, Default)]
struct ClusterSum {
    sum_x: f64,
    sum_y: f64,
    count: usize,
}

/// Index of the centroid nearest to `p`. Ties go to the lowest index.
fn nearest_centroid(p: &LandPoint, centroids: &[LandPoint]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = p.dist_sq(c.x as f64, c.y as f64);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn assign(points: &[LandPoint], centroids: &[LandPoint]) -> Vec<ClusterSum> {
    let mut sums = vec![ClusterSum::default(); centroids.len()];
    for p in points {
        let sum = &mut sums[nearest_centroid(p, centroids)];
        sum.sum_x += p.x as f64;
        sum.sum_y += p.y as f64;
        sum.count += 1;
    }
    sums
}

/// Partition `points` into `k` clusters whose centers sit on land.
///
/// Initial centroids are drawn uniformly with replacement from `points`
/// using `rng`, so a seeded generator gives reproducible placements.
pub fn constrained_kmeans<R: Rng + ?Sized>(
    points: &[LandPoint],
    k: usize,
    params: &PlannerParams,
    rng: &mut R,
) -> Result<ClusterOutcome> {
    if k == 0 {
        return Err(PlannerError::InvalidPortalCount(k));
    }
    if points.is_empty() {
        return Err(PlannerError::EmptyLandSet);
    }

    let index = LandIndex::new(points);
    let mut centroids: Vec<LandPoint> = (0..k)
        .map(|_| points[rng.gen_range(0..points.len())])
        .collect();

    let max_rounds = params.max_iterations.min(MAX_ROUNDS);
    let mut iterations = 0;
    let mut converged = false;
    let mut last_shift = 0.0;

    while iterations < max_rounds {
        iterations += 1;
        let sums = assign(points, &centroids);

        let mut max_shift = 0.0f64;
        for (centroid, sum) in centroids.iter_mut().zip(&sums) {
            if sum.count == 0 {
                continue;
            }
            let mean_x = sum.sum_x / sum.count as f64;
            let mean_y = sum.sum_y / sum.count as f64;
            let Some(snapped) = index.nearest_point(mean_x, mean_y) else {
                continue;
            };

            max_shift = max_shift.max(snapped.distance(centroid));
            *centroid = snapped;
        }

        debug!("Round {}: max centroid shift {:.2}", iterations, max_shift);
        last_shift = max_shift;
        if max_shift < params.convergence_shift {
            converged = true;
            break;
        }
    }

    let cluster_sizes = assign(points, &centroids).iter().map(|s| s.count).collect();

    info!(
        "Placed {} centroids over {} land points in {} rounds ({})",
        k,
        points.len(),
        iterations,
        if converged { "converged" } else { "round limit reached" }
    );

    Ok(ClusterOutcome {
        centroids,
        iterations,
        converged,
        cluster_sizes,
        last_shift,
    })
}
