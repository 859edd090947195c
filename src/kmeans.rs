//! K-means clustering (k-means++ seeding, Lloyd iterations).
//!
//! Each iteration builds a KD-tree over the current centroids, assigns every
//! point to its nearest centroid, then recomputes centroids as the mean of
//! their assigned points. Iteration stops when the largest per-centroid
//! movement falls below the tolerance, or after `max_iterations`.

use crate::cluster::{self, Cluster, Clustering};
use crate::distance::{squared_euclidean, DistanceMetric};
use crate::error::{ClusterError, Result};
use crate::kdtree::KdTree;
use crate::point::{self, Point};
use log::debug;
use num_traits::Float;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

// Defaults for parameters.
const MAX_ITERATIONS_DEFAULT: usize = 100;
const TOLERANCE_DEFAULT: f64 = 1e-4;

/// Strategy for choosing the initial centroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CenterInit {
    /// K-means++ (Arthur & Vassilvitskii 2007): the first center is uniform
    /// at random; each subsequent center is chosen with probability
    /// proportional to its squared distance to the nearest center already
    /// chosen.
    #[default]
    KmeansPlusPlus,
    /// K distinct points chosen uniformly at random.
    Random,
}

impl CenterInit {
    pub(crate) fn choose<T: Float, const N: usize>(
        &self,
        points: &[Point<T, N>],
        k: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Point<T, N>> {
        match self {
            CenterInit::KmeansPlusPlus => kmeans_pp_centers(points, k, rng),
            CenterInit::Random => rand::seq::index::sample(rng, points.len(), k)
                .into_iter()
                .map(|i| points[i])
                .collect(),
        }
    }
}

fn kmeans_pp_centers<T: Float, const N: usize>(
    points: &[Point<T, N>],
    k: usize,
    rng: &mut dyn RngCore,
) -> Vec<Point<T, N>> {
    let n = points.len();
    let mut centers = Vec::with_capacity(k);
    let mut best_sq = vec![T::infinity(); n];

    centers.push(points[rng.random_range(0..n)]);
    while centers.len() < k {
        let latest = centers[centers.len() - 1];
        let mut total = T::zero();
        let mut cumulative = Vec::with_capacity(n);
        for (i, p) in points.iter().enumerate() {
            let d = squared_euclidean(latest.as_slice(), p.as_slice());
            if d < best_sq[i] {
                best_sq[i] = d;
            }
            total = total + best_sq[i];
            cumulative.push(total);
        }

        // Roulette wheel over the cumulative squared distances. A zero
        // total means every point coincides with a chosen center; fall
        // back to a uniform pick.
        let chosen = if total > T::zero() {
            let r = T::from(rng.random::<f64>()).unwrap_or_else(T::zero) * total;
            cumulative.iter().position(|&c| c >= r).unwrap_or(n - 1)
        } else {
            rng.random_range(0..n)
        };
        centers.push(points[chosen]);
    }
    centers
}

/// K-means clustering.
#[derive(Debug, Clone)]
pub struct Kmeans<T> {
    k: usize,
    max_iterations: usize,
    tolerance: T,
    init: CenterInit,
    metric: DistanceMetric,
    seed: Option<u64>,
}

impl<T: Float> Kmeans<T> {
    /// Creates a clusterer targeting `k` clusters, with default settings:
    /// k-means++ seeding, Euclidean assignment, 100 iterations maximum,
    /// tolerance `1e-4`, unseeded randomness.
    ///
    /// `k` of zero is rejected.
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        Ok(Kmeans {
            k,
            max_iterations: MAX_ITERATIONS_DEFAULT,
            tolerance: T::from(TOLERANCE_DEFAULT).unwrap_or_else(T::epsilon),
            init: CenterInit::default(),
            metric: DistanceMetric::default(),
            seed: None,
        })
    }

    /// Sets the iteration cap. Zero is rejected.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        self.max_iterations = max_iterations;
        Ok(self)
    }

    /// Sets the convergence tolerance: iteration stops once no centroid
    /// moves further than this (Euclidean) in one round. Must be finite and
    /// non-negative.
    pub fn with_tolerance(mut self, tolerance: T) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < T::zero() {
            return Err(ClusterError::InvalidParameter {
                name: "tolerance",
                message: "must be finite and non-negative",
            });
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Sets the centroid initialisation strategy.
    pub fn with_init(mut self, init: CenterInit) -> Self {
        self.init = init;
        self
    }

    /// Sets the distance measure used for centroid assignment.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Fixes the random seed, making repeated fits on identical input
    /// produce identical clusters.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(rand::rng()),
        }
    }
}

impl<T: Float, const N: usize> Clustering<T, N> for Kmeans<T> {
    /// Fits on `points`. An empty slice yields an empty cluster list;
    /// `points.len() <= k` short-circuits to one singleton cluster per
    /// point.
    fn fit(&self, points: &[Point<T, N>]) -> Result<Vec<Cluster<T, N>>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }
        point::validate_finite(points)?;

        if points.len() <= self.k {
            return Ok((0..points.len())
                .map(|i| Cluster::new(i, vec![i], points))
                .collect());
        }

        let mut rng = self.rng();
        let mut centroids = self.init.choose(points, self.k, rng.as_mut());
        let mut assignment = vec![0usize; points.len()];

        for iteration in 0..self.max_iterations {
            assign_nearest(points, &centroids, self.metric, &mut assignment)?;

            let mut sums = vec![[T::zero(); N]; self.k];
            let mut counts = vec![0usize; self.k];
            for (i, &c) in assignment.iter().enumerate() {
                counts[c] += 1;
                for (axis, sum) in sums[c].iter_mut().enumerate() {
                    *sum = *sum + points[i][axis];
                }
            }

            let mut movement = T::zero();
            for (c, sum) in sums.into_iter().enumerate() {
                if counts[c] == 0 {
                    // An orphaned centroid keeps its position for the next
                    // round.
                    continue;
                }
                let count = T::from(counts[c]).unwrap_or_else(T::one);
                let updated = Point::new(sum.map(|s| s / count));
                let moved = crate::distance::euclidean(
                    centroids[c].as_slice(),
                    updated.as_slice(),
                );
                if moved > movement {
                    movement = moved;
                }
                centroids[c] = updated;
            }

            if movement <= self.tolerance {
                debug!(
                    "k-means converged after {} iteration(s), max centroid movement {}",
                    iteration + 1,
                    movement.to_f64().unwrap_or(f64::NAN)
                );
                break;
            }
        }

        // Final assignment against the converged centroids.
        assign_nearest(points, &centroids, self.metric, &mut assignment)?;
        let labels: Vec<Option<usize>> = assignment.into_iter().map(Some).collect();
        Ok(cluster::clusters_from_labels(points, &labels))
    }
}

fn assign_nearest<T: Float, const N: usize>(
    points: &[Point<T, N>],
    centroids: &[Point<T, N>],
    metric: DistanceMetric,
    assignment: &mut [usize],
) -> Result<()> {
    let tree = KdTree::build(centroids, metric)?;
    for (slot, p) in assignment.iter_mut().zip(points) {
        *slot = tree.nearest(p)?.index;
    }
    Ok(())
}
