//! Arena-indexed KD-tree over a borrowed, immutable point slice.
//!
//! Nodes live in a flat `Vec` and reference each other by index, so there
//! are no ownership cycles and no recursion during build or queries: both
//! run over explicit work stacks. Splits are positional (the median of the
//! axis-sorted index range), which keeps the tree balanced even when every
//! coordinate is identical, bounding stack size at `O(log n)` entries.
//!
//! The tree is built once from a snapshot of the point set and is read-only
//! afterwards; rebuild on change rather than mutating in place.

use crate::distance::{Distance, DistanceMetric, Neighbor};
use crate::error::{ClusterError, Result};
use crate::point::{self, Point};
use num_traits::Float;
use std::collections::BinaryHeap;

/// Default leaf bucket capacity. Larger buckets trade tree depth for linear
/// scans at the leaves.
pub const DEFAULT_LEAF_SIZE: usize = 10;

enum Node {
    Split {
        /// Index of the splitting point in the source array.
        point: usize,
        axis: usize,
        left: usize,
        right: usize,
    },
    Leaf {
        bucket: Vec<usize>,
    },
}

/// A KD-tree spatial index supporting nearest-one, k-nearest and radius
/// queries. The index borrows the point slice for its lifetime and never
/// outlives it.
pub struct KdTree<'a, T, const N: usize> {
    points: &'a [Point<T, N>],
    nodes: Vec<Node>,
    metric: DistanceMetric,
}

/// Max-heap entry ordered by distance, used to keep the k best candidates.
struct Candidate<T> {
    dist: T,
    index: usize,
}

impl<T: Float> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.index == other.index
    }
}

impl<T: Float> Eq for Candidate<T> {}

impl<T: Float> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Float> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .expect("finite distance")
            .then(self.index.cmp(&other.index))
    }
}

struct BuildTask {
    start: usize,
    end: usize,
    depth: usize,
    /// Arena index of the parent split, or `usize::MAX` for the root.
    parent: usize,
    is_left: bool,
}

impl<'a, T: Float, const N: usize> KdTree<'a, T, N> {
    /// Builds an index over `points` with the default leaf size.
    ///
    /// Fails on an empty point set or any non-finite coordinate.
    pub fn build(points: &'a [Point<T, N>], metric: DistanceMetric) -> Result<Self> {
        Self::build_with(points, DEFAULT_LEAF_SIZE, metric)
    }

    /// Builds an index over `points` with an explicit leaf bucket size.
    pub fn build_with(
        points: &'a [Point<T, N>],
        leaf_size: usize,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if points.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        if leaf_size == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "leaf_size",
                message: "must be at least 1",
            });
        }
        point::validate_finite(points)?;

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::new();
        let mut stack = vec![BuildTask {
            start: 0,
            end: points.len(),
            depth: 0,
            parent: usize::MAX,
            is_left: false,
        }];

        while let Some(task) = stack.pop() {
            let len = task.end - task.start;
            let node_id = nodes.len();
            if len <= leaf_size {
                nodes.push(Node::Leaf {
                    bucket: indices[task.start..task.end].to_vec(),
                });
            } else {
                let axis = task.depth % N;
                // Stable sort so equal axis values keep input order, making
                // the split deterministic under ties.
                indices[task.start..task.end].sort_by(|&a, &b| {
                    points[a][axis]
                        .partial_cmp(&points[b][axis])
                        .expect("finite coordinate")
                });
                let mid = task.start + len / 2;
                nodes.push(Node::Split {
                    point: indices[mid],
                    axis,
                    left: 0,
                    right: 0,
                });
                stack.push(BuildTask {
                    start: task.start,
                    end: mid,
                    depth: task.depth + 1,
                    parent: node_id,
                    is_left: true,
                });
                stack.push(BuildTask {
                    start: mid + 1,
                    end: task.end,
                    depth: task.depth + 1,
                    parent: node_id,
                    is_left: false,
                });
            }
            if task.parent != usize::MAX {
                if let Node::Split { left, right, .. } = &mut nodes[task.parent] {
                    if task.is_left {
                        *left = node_id;
                    } else {
                        *right = node_id;
                    }
                }
            }
        }

        Ok(KdTree {
            points,
            nodes,
            metric,
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: building from an empty point set is rejected.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The single nearest indexed point to `query`.
    pub fn nearest(&self, query: &Point<T, N>) -> Result<Neighbor<T>> {
        let mut best_dist = T::infinity();
        let mut best_index = 0;

        let mut stack = vec![(0usize, T::zero())];
        while let Some((node_id, margin)) = stack.pop() {
            if margin > best_dist {
                continue;
            }
            match &self.nodes[node_id] {
                Node::Leaf { bucket } => {
                    for &i in bucket {
                        let d = self.metric.calc(query, &self.points[i]);
                        if d < best_dist {
                            best_dist = d;
                            best_index = i;
                        }
                    }
                }
                Node::Split {
                    point,
                    axis,
                    left,
                    right,
                } => {
                    let d = self.metric.calc(query, &self.points[*point]);
                    if d < best_dist {
                        best_dist = d;
                        best_index = *point;
                    }
                    let delta = query[*axis] - self.points[*point][*axis];
                    let far_margin = self.metric.axis_margin(delta);
                    let (near, far) = if delta <= T::zero() {
                        (*left, *right)
                    } else {
                        (*right, *left)
                    };
                    // Far side first so the near side is explored first.
                    stack.push((far, far_margin));
                    stack.push((near, T::zero()));
                }
            }
        }

        Ok(Neighbor {
            index: best_index,
            distance: Distance::new(best_dist)?,
        })
    }

    /// The `k` nearest indexed points to `query`, sorted by ascending
    /// distance. Returns fewer than `k` neighbours when the index holds
    /// fewer points. `k == 0` is a range error.
    pub fn nearest_k(&self, query: &Point<T, N>, k: usize) -> Result<Vec<Neighbor<T>>> {
        if k == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }

        // Bounded max-heap: the root is the current worst of the k best.
        let mut heap: BinaryHeap<Candidate<T>> = BinaryHeap::with_capacity(k + 1);
        let consider = |heap: &mut BinaryHeap<Candidate<T>>, index: usize| {
            let dist = self.metric.calc(query, &self.points[index]);
            if heap.len() < k {
                heap.push(Candidate { dist, index });
            } else if dist < heap.peek().map(|c| c.dist).unwrap_or(T::infinity()) {
                heap.pop();
                heap.push(Candidate { dist, index });
            }
        };

        let mut stack = vec![(0usize, T::zero())];
        while let Some((node_id, margin)) = stack.pop() {
            if heap.len() == k {
                let worst = heap.peek().map(|c| c.dist).unwrap_or(T::infinity());
                if margin > worst {
                    continue;
                }
            }
            match &self.nodes[node_id] {
                Node::Leaf { bucket } => {
                    for &i in bucket {
                        consider(&mut heap, i);
                    }
                }
                Node::Split {
                    point,
                    axis,
                    left,
                    right,
                } => {
                    consider(&mut heap, *point);
                    let delta = query[*axis] - self.points[*point][*axis];
                    let far_margin = self.metric.axis_margin(delta);
                    let (near, far) = if delta <= T::zero() {
                        (*left, *right)
                    } else {
                        (*right, *left)
                    };
                    stack.push((far, far_margin));
                    stack.push((near, T::zero()));
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| {
                Ok(Neighbor {
                    index: c.index,
                    distance: Distance::new(c.dist)?,
                })
            })
            .collect()
    }

    /// Every indexed point within `radius` of `query` (inclusive), sorted by
    /// ascending distance. The radius is in the units of the tree's metric,
    /// so under `SquaredEuclidean` it is a squared radius. `radius <= 0` is
    /// a range error.
    pub fn within_radius(&self, query: &Point<T, N>, radius: T) -> Result<Vec<Neighbor<T>>> {
        if !radius.is_finite() || radius <= T::zero() {
            return Err(ClusterError::InvalidParameter {
                name: "radius",
                message: "must be a positive finite number",
            });
        }

        let mut hits: Vec<(T, usize)> = Vec::new();
        let consider = |hits: &mut Vec<(T, usize)>, index: usize| {
            let dist = self.metric.calc(query, &self.points[index]);
            if dist <= radius {
                hits.push((dist, index));
            }
        };

        let mut stack = vec![0usize];
        while let Some(node_id) = stack.pop() {
            match &self.nodes[node_id] {
                Node::Leaf { bucket } => {
                    for &i in bucket {
                        consider(&mut hits, i);
                    }
                }
                Node::Split {
                    point,
                    axis,
                    left,
                    right,
                } => {
                    consider(&mut hits, *point);
                    let delta = query[*axis] - self.points[*point][*axis];
                    let margin = self.metric.axis_margin(delta);
                    let (near, far) = if delta <= T::zero() {
                        (*left, *right)
                    } else {
                        (*right, *left)
                    };
                    stack.push(near);
                    if margin <= radius {
                        stack.push(far);
                    }
                }
            }
        }

        hits.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .expect("finite distance")
                .then(a.1.cmp(&b.1))
        });
        hits.into_iter()
            .map(|(dist, index)| {
                Ok(Neighbor {
                    index,
                    distance: Distance::new(dist)?,
                })
            })
            .collect()
    }
}
