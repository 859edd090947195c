//! DBSCAN: density-based clustering with noise (Ester et al., 1996).
//!
//! Every unvisited point has its ε-neighbourhood looked up in a KD-tree.
//! Points with at least `min_points` neighbours (the point itself counts)
//! are core points and seed a breadth-first expansion through every
//! density-reachable point; points never promoted to core remain noise.

use crate::cluster::{self, Cluster, Clustering};
use crate::distance::DistanceMetric;
use crate::error::{ClusterError, Result};
use crate::kdtree::KdTree;
use crate::point::{self, Point};
use log::debug;
use num_traits::Float;
use std::collections::VecDeque;

/// DBSCAN clustering.
///
/// Border points (non-core points within ε of core points from more than
/// one cluster) go to whichever cluster's expansion reaches them first.
/// This iteration-order tie-break is standard DBSCAN behaviour, kept here
/// deliberately rather than made canonical.
#[derive(Debug, Clone)]
pub struct Dbscan<T> {
    epsilon: T,
    min_points: usize,
    metric: DistanceMetric,
}

impl<T: Float> Dbscan<T> {
    /// Creates a clusterer with neighbourhood radius `epsilon` and core
    /// threshold `min_points` (which counts the point itself).
    ///
    /// `epsilon` must be positive and finite; `min_points` at least 1.
    pub fn new(epsilon: T, min_points: usize) -> Result<Self> {
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
        Ok(Dbscan {
            epsilon,
            min_points,
            metric: DistanceMetric::default(),
        })
    }

    /// Sets the distance measure. Note that `epsilon` is interpreted in the
    /// measure's units (a squared radius under `SquaredEuclidean`).
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Per-point cluster labels, `None` for noise. An empty input slice
    /// yields an empty label list.
    pub fn fit_labels<const N: usize>(
        &self,
        points: &[Point<T, N>],
    ) -> Result<Vec<Option<usize>>> {
        let n = points.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        point::validate_finite(points)?;

        let tree = KdTree::build(points, self.metric)?;
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut next_cluster = 0;

        for seed in 0..n {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;

            let neighbors = tree.within_radius(&points[seed], self.epsilon)?;
            if neighbors.len() < self.min_points {
                // Provisional noise; a later expansion may still reclaim
                // this point as a border point.
                continue;
            }

            let cluster_id = next_cluster;
            next_cluster += 1;
            labels[seed] = Some(cluster_id);

            let mut frontier: VecDeque<usize> =
                neighbors.into_iter().map(|nb| nb.index).collect();
            while let Some(current) = frontier.pop_front() {
                // Label before the visited check so previously visited
                // provisional-noise points are promoted to border points.
                if labels[current].is_none() {
                    labels[current] = Some(cluster_id);
                }
                if visited[current] {
                    continue;
                }
                visited[current] = true;

                let reachable = tree.within_radius(&points[current], self.epsilon)?;
                if reachable.len() >= self.min_points {
                    for nb in reachable {
                        if !visited[nb.index] || labels[nb.index].is_none() {
                            frontier.push_back(nb.index);
                        }
                    }
                }
            }
        }

        debug!(
            "dbscan found {} cluster(s), {} noise point(s) of {}",
            next_cluster,
            labels.iter().filter(|l| l.is_none()).count(),
            n
        );
        Ok(labels)
    }
}

impl<T: Float, const N: usize> Clustering<T, N> for Dbscan<T> {
    /// Fits on `points`, excluding noise from the returned clusters.
    fn fit(&self, points: &[Point<T, N>]) -> Result<Vec<Cluster<T, N>>> {
        let labels = self.fit_labels(points)?;
        Ok(cluster::clusters_from_labels(points, &labels))
    }
}
