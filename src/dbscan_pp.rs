//! DBSCAN++: approximate DBSCAN over a subsampled set of candidate core
//! points (Jang & Jiang, 2019).
//!
//! Instead of testing every point for core status, candidates are taken at
//! stride `round(1 / probability)` through the input. Core detection still
//! counts neighbours in the full point set, but only candidates can become
//! core points, making the detection pass O(n * probability) queries. Core
//! points are then clustered among themselves (a second KD-tree over just
//! the cores), and every input point is assigned to the cluster of its
//! nearest core point if within `epsilon`, else left as noise.
//!
//! Trades recall for speed: with low probabilities, thin clusters may lose
//! their only candidate and dissolve into noise.

use crate::cluster::{self, Cluster, Clustering};
use crate::distance::DistanceMetric;
use crate::error::{ClusterError, Result};
use crate::kdtree::KdTree;
use crate::point::{self, Point};
use log::debug;
use num_traits::Float;
use std::collections::VecDeque;

/// Approximate DBSCAN clustering.
#[derive(Debug, Clone)]
pub struct DbscanPp<T> {
    epsilon: T,
    min_points: usize,
    probability: f64,
    metric: DistanceMetric,
}

impl<T: Float> DbscanPp<T> {
    /// Creates a clusterer with neighbourhood radius `epsilon`, core
    /// threshold `min_points` and candidate sampling `probability` in
    /// `(0, 1]`. A probability of 1 tests every point, matching classic
    /// DBSCAN core detection.
    pub fn new(epsilon: T, min_points: usize, probability: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= T::zero() {
            return Err(ClusterError::InvalidParameter {
                name: "epsilon",
                message: "must be a positive finite number",
            });
        }
        if min_points == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "min_points",
                message: "must be at least 1",
            });
        }
        if !probability.is_finite() || probability <= 0.0 || probability > 1.0 {
            return Err(ClusterError::InvalidParameter {
                name: "probability",
                message: "must be in (0, 1]",
            });
        }
        Ok(DbscanPp {
            epsilon,
            min_points,
            probability,
            metric: DistanceMetric::default(),
        })
    }

    /// Sets the distance measure. `epsilon` is interpreted in the measure's
    /// units.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Per-point cluster labels, `None` for unassigned points. An empty
    /// input slice yields an empty label list.
    pub fn fit_labels<const N: usize>(
        &self,
        points: &[Point<T, N>],
    ) -> Result<Vec<Option<usize>>> {
        let n = points.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        point::validate_finite(points)?;

        let full_tree = KdTree::build(points, self.metric)?;

        // Deterministic candidate subsample at a fixed stride.
        let stride = (1.0 / self.probability).round().max(1.0) as usize;
        let mut cores: Vec<usize> = Vec::new();
        for candidate in (0..n).step_by(stride) {
            let neighborhood = full_tree.within_radius(&points[candidate], self.epsilon)?;
            if neighborhood.len() >= self.min_points {
                cores.push(candidate);
            }
        }
        debug!(
            "dbscan++ kept {} core(s) from {} candidate(s) of {} points",
            cores.len(),
            n.div_ceil(stride),
            n
        );
        if cores.is_empty() {
            return Ok(vec![None; n]);
        }

        // Cluster the core points among themselves: connected components of
        // the "within epsilon" graph, found by BFS over a core-only tree.
        let core_points: Vec<Point<T, N>> = cores.iter().map(|&i| points[i]).collect();
        let core_tree = KdTree::build(&core_points, self.metric)?;
        let mut core_labels: Vec<Option<usize>> = vec![None; cores.len()];
        let mut next_cluster = 0;
        for seed in 0..cores.len() {
            if core_labels[seed].is_some() {
                continue;
            }
            let cluster_id = next_cluster;
            next_cluster += 1;
            core_labels[seed] = Some(cluster_id);
            let mut frontier = VecDeque::from([seed]);
            while let Some(current) = frontier.pop_front() {
                for nb in core_tree.within_radius(&core_points[current], self.epsilon)? {
                    if core_labels[nb.index].is_none() {
                        core_labels[nb.index] = Some(cluster_id);
                        frontier.push_back(nb.index);
                    }
                }
            }
        }

        // Assign every original point to its nearest core's cluster, if the
        // core is within epsilon.
        let mut labels = Vec::with_capacity(n);
        for p in points {
            let nearest_core = core_tree.nearest(p)?;
            if nearest_core.distance.get() <= self.epsilon {
                labels.push(core_labels[nearest_core.index]);
            } else {
                labels.push(None);
            }
        }
        Ok(labels)
    }
}

impl<T: Float, const N: usize> Clustering<T, N> for DbscanPp<T> {
    /// Fits on `points`, excluding unassigned points from the returned
    /// clusters.
    fn fit(&self, points: &[Point<T, N>]) -> Result<Vec<Cluster<T, N>>> {
        let labels = self.fit_labels(points)?;
        Ok(cluster::clusters_from_labels(points, &labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs_with_noise() -> Vec<Point<f64, 2>> {
        [
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [10.0, 10.0],
            [11.0, 10.0],
            [10.0, 11.0],
            [11.0, 11.0],
            [30.0, 30.0],
        ]
        .into_iter()
        .map(Point::from)
        .collect()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(DbscanPp::new(0.0, 3, 0.5).is_err());
        assert!(DbscanPp::new(1.0, 0, 0.5).is_err());
        assert!(DbscanPp::new(1.0, 3, 0.0).is_err());
        assert!(DbscanPp::new(1.0, 3, -0.5).is_err());
        assert!(DbscanPp::new(1.0, 3, 1.5).is_err());
        assert!(DbscanPp::new(1.0, 3, 1.0).is_ok());
    }

    #[test]
    fn full_probability_matches_dense_blobs() {
        let points = two_blobs_with_noise();
        let labels = DbscanPp::new(2.0, 3, 1.0)
            .unwrap()
            .fit_labels(&points)
            .unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[3]);
        assert_eq!(labels[4], labels[7]);
        assert_ne!(labels[0], labels[4]);
        assert!(labels[8].is_none());
    }

    #[test]
    fn subsampled_candidates_still_cover_dense_blobs() {
        // probability 0.5 -> stride 2 -> candidates 0, 2, 4, 6, 8. Both
        // blobs contain candidates, so both survive.
        let points = two_blobs_with_noise();
        let clusters = DbscanPp::new(2.0, 3, 0.5).unwrap().fit(&points).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members(), &[0, 1, 2, 3]);
        assert_eq!(clusters[1].members(), &[4, 5, 6, 7]);
    }

    #[test]
    fn cluster_without_candidate_core_dissolves() {
        // probability 0.25 -> stride 4 -> candidates 0, 4, 8. The second
        // blob's only candidate is index 4 and the outlier never qualifies.
        let points = two_blobs_with_noise();
        let labels = DbscanPp::new(2.0, 3, 0.25)
            .unwrap()
            .fit_labels(&points)
            .unwrap();
        assert!(labels[0].is_some());
        assert!(labels[4].is_some());
        assert!(labels[8].is_none());
    }

    #[test]
    fn empty_input_is_empty_output() {
        let points: Vec<Point<f64, 2>> = Vec::new();
        let clusters = DbscanPp::new(1.0, 2, 0.5).unwrap().fit(&points).unwrap();
        assert!(clusters.is_empty());
    }
}
