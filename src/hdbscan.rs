//! HDBSCAN: hierarchical density-based clustering (Campello, Moulavi,
//! Sander 2013).
//!
//! Five stages compose the pipeline:
//!
//! 1. **Core distances** — each point's distance to its `min_samples`-th
//!    nearest neighbour (the point itself included), via the KD-tree.
//! 2. **Mutual reachability MST** — Prim's algorithm under
//!    `weight(u, v) = max(dist(u, v), core(u), core(v))`.
//! 3. **Single linkage** — MST edges merged in ascending weight order
//!    through a label-allocating union-find, forming a binary dendrogram
//!    over `2n - 1` labels.
//! 4. **Condensation** — the dendrogram pruned to splits where both sides
//!    reach `min_cluster_size`; smaller sides shed their points as noise at
//!    the split's lambda (`1 / weight`).
//! 5. **Stability extraction** — condensed clusters scored by
//!    `sum((lambda_child - lambda_birth) * size)` and selected bottom-up
//!    into a non-overlapping antichain; points under no selected cluster
//!    are outliers.

use crate::cluster::{self, Cluster, Clustering};
use crate::distance::DistanceMetric;
use crate::error::{ClusterError, Result};
use crate::kdtree::KdTree;
use crate::mst::{self, WeightedEdge};
use crate::point::{self, Point};
use crate::union_find::DendrogramUnionFind;
use log::debug;
use num_traits::Float;
use std::collections::VecDeque;

// Defaults for parameters.
const MIN_CLUSTER_SIZE_DEFAULT: usize = 5;

/// An internal dendrogram node: the merge of two single-linkage subtrees.
/// Node `i` of this list carries label `n + i`; labels below `n` are
/// original points.
#[derive(Debug, Clone)]
struct DendrogramNode<T> {
    left: usize,
    right: usize,
    weight: T,
    size: usize,
}

/// A row of the condensed tree: either a child cluster splitting off its
/// parent (`id >= n`, `size > 1`) or a point falling out of a cluster as
/// noise (`id < n`, `size == 1`), both at density threshold `lambda_birth`.
#[derive(Debug, Clone)]
struct CondensedNode<T> {
    id: usize,
    parent: usize,
    lambda_birth: T,
    size: usize,
}

/// HDBSCAN clustering.
#[derive(Debug, Clone)]
pub struct Hdbscan {
    min_cluster_size: usize,
    min_samples: usize,
    allow_single_cluster: bool,
    metric: DistanceMetric,
}

impl Hdbscan {
    /// Creates a clusterer with the given minimum cluster size (groupings
    /// smaller than this become noise) and defaults otherwise:
    /// `min_samples = min_cluster_size`, Euclidean distances, no single
    /// root cluster.
    ///
    /// `min_cluster_size` below 2 is rejected.
    pub fn new(min_cluster_size: usize) -> Result<Self> {
        if min_cluster_size < 2 {
            return Err(ClusterError::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 2",
            });
        }
        Ok(Hdbscan {
            min_cluster_size,
            min_samples: min_cluster_size,
            allow_single_cluster: false,
            metric: DistanceMetric::default(),
        })
    }

    /// As [`Hdbscan::new`] with `min_cluster_size` of 5.
    pub fn default_params() -> Self {
        Hdbscan {
            min_cluster_size: MIN_CLUSTER_SIZE_DEFAULT,
            min_samples: MIN_CLUSTER_SIZE_DEFAULT,
            allow_single_cluster: false,
            metric: DistanceMetric::default(),
        }
    }

    /// Sets `min_samples`, the neighbour count used for core distances.
    /// Zero is rejected.
    pub fn with_min_samples(mut self, min_samples: usize) -> Result<Self> {
        if min_samples == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        self.min_samples = min_samples;
        Ok(self)
    }

    /// Allows the root of the condensed tree to win extraction, producing a
    /// single cluster spanning the whole dataset. Off by default.
    pub fn with_allow_single_cluster(mut self, allow: bool) -> Self {
        self.allow_single_cluster = allow;
        self
    }

    /// Sets the distance measure used for core and mutual reachability
    /// distances.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Per-point cluster labels, `None` for outliers. An empty input slice
    /// yields an empty label list.
    pub fn fit_labels<T: Float, const N: usize>(
        &self,
        points: &[Point<T, N>],
    ) -> Result<Vec<Option<usize>>> {
        let n = points.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        point::validate_finite(points)?;
        if n < self.min_cluster_size {
            // No grouping can reach the minimum size.
            return Ok(vec![None; n]);
        }

        let core = self.core_distances(points)?;
        let mut edges = mst::prim_mst(n, |u, v| {
            let direct = self.metric.calc(&points[u], &points[v]);
            direct.max(core[u]).max(core[v])
        });
        edges.sort_by(|a, b| a.weight.partial_cmp(&b.weight).expect("finite edge weight"));
        debug!("hdbscan: mutual reachability MST with {} edge(s)", edges.len());

        let dendrogram = single_linkage(&edges, n);
        let condensed = self.condense(&dendrogram, n);
        let selected = self.select_clusters(&condensed, n);
        debug!(
            "hdbscan: {} condensed row(s), {} selected cluster(s)",
            condensed.len(),
            selected.len()
        );
        Ok(label_points(&condensed, &selected, n))
    }

    /// Distance of each point to its `min_samples`-th nearest neighbour,
    /// the point itself counted as its own first neighbour.
    fn core_distances<T: Float, const N: usize>(&self, points: &[Point<T, N>]) -> Result<Vec<T>> {
        let tree = KdTree::build(points, self.metric)?;
        let k = self.min_samples.min(points.len());
        points
            .iter()
            .map(|p| {
                let neighbors = tree.nearest_k(p, k)?;
                Ok(neighbors
                    .last()
                    .map(|nb| nb.distance.get())
                    .unwrap_or_else(T::zero))
            })
            .collect()
    }

    /// Prunes the dendrogram to its meaningful splits, relabelling the
    /// surviving clusters with fresh ids starting at `n` (the root).
    fn condense<T: Float>(&self, dendrogram: &[DendrogramNode<T>], n: usize) -> Vec<CondensedNode<T>> {
        let root = n + dendrogram.len() - 1;
        let mut relabel = vec![0usize; root + 1];
        relabel[root] = n;
        let mut next_label = n + 1;
        let mut pruned = vec![false; root + 1];
        let mut condensed = Vec::new();

        // Top-down breadth-first walk over internal nodes.
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if id < n || pruned[id] {
                continue;
            }
            let node = &dendrogram[id - n];
            let lambda = lambda_of(node.weight);
            let parent_label = relabel[id];
            let left_size = subtree_size(dendrogram, n, node.left);
            let right_size = subtree_size(dendrogram, n, node.right);
            let left_qualifies = left_size >= self.min_cluster_size;
            let right_qualifies = right_size >= self.min_cluster_size;

            if left_qualifies && right_qualifies {
                // A true split: both sides become new condensed clusters.
                for (child, size) in [(node.left, left_size), (node.right, right_size)] {
                    relabel[child] = next_label;
                    next_label += 1;
                    condensed.push(CondensedNode {
                        id: relabel[child],
                        parent: parent_label,
                        lambda_birth: lambda,
                        size,
                    });
                }
            } else if !left_qualifies && !right_qualifies {
                shed_points(dendrogram, n, node.left, parent_label, lambda, &mut pruned, &mut condensed);
                shed_points(dendrogram, n, node.right, parent_label, lambda, &mut pruned, &mut condensed);
            } else if left_qualifies {
                // The qualifying side carries the cluster on under the same
                // label; the other side's members fall out as noise here.
                relabel[node.left] = parent_label;
                shed_points(dendrogram, n, node.right, parent_label, lambda, &mut pruned, &mut condensed);
            } else {
                relabel[node.right] = parent_label;
                shed_points(dendrogram, n, node.left, parent_label, lambda, &mut pruned, &mut condensed);
            }

            queue.push_back(node.left);
            queue.push_back(node.right);
        }
        condensed
    }

    /// Bottom-up stability selection over the condensed tree. Returns the
    /// selected cluster ids in ascending order; they form an antichain.
    fn select_clusters<T: Float>(&self, condensed: &[CondensedNode<T>], n: usize) -> Vec<usize> {
        let (mut stability, child_clusters) = cluster_stabilities(condensed, n);
        let m = stability.len();
        let mut selected = vec![false; m];

        // Ids were allocated top-down, so walking them in reverse visits
        // every child before its parent.
        for slot in (0..m).rev() {
            if slot == 0 && !self.allow_single_cluster {
                continue;
            }
            let combined = child_clusters[slot]
                .iter()
                .map(|&c| stability[c])
                .fold(T::zero(), std::ops::Add::add);

            if stability[slot] >= combined {
                selected[slot] = true;
                // Discard every previously selected descendant.
                let mut queue: VecDeque<usize> = child_clusters[slot].iter().copied().collect();
                while let Some(c) = queue.pop_front() {
                    selected[c] = false;
                    queue.extend(child_clusters[c].iter().copied());
                }
            } else {
                // The children persist longer together; propagate their
                // combined stability upward.
                stability[slot] = combined;
            }
        }

        selected
            .into_iter()
            .enumerate()
            .filter(|(_, keep)| *keep)
            .map(|(slot, _)| slot + n)
            .collect()
    }
}

impl<T: Float, const N: usize> Clustering<T, N> for Hdbscan {
    /// Fits on `points`, excluding outliers from the returned clusters.
    fn fit(&self, points: &[Point<T, N>]) -> Result<Vec<Cluster<T, N>>> {
        let labels = self.fit_labels(points)?;
        Ok(cluster::clusters_from_labels(points, &labels))
    }
}

/// Merges sorted MST edges into a binary dendrogram: row `i` is the merge
/// creating label `n + i`.
fn single_linkage<T: Float>(edges: &[WeightedEdge<T>], n: usize) -> Vec<DendrogramNode<T>> {
    let mut forest = DendrogramUnionFind::new(n);
    let mut nodes = Vec::with_capacity(edges.len());
    for edge in edges {
        let left = forest.find(edge.u);
        let right = forest.find(edge.v);
        let size = forest.size_of(left) + forest.size_of(right);
        forest.union(left, right);
        nodes.push(DendrogramNode {
            left,
            right,
            weight: edge.weight,
            size,
        });
    }
    nodes
}

/// Density threshold at which a merge of this weight dissolves.
fn lambda_of<T: Float>(weight: T) -> T {
    if weight > T::zero() {
        T::one() / weight
    } else {
        T::infinity()
    }
}

fn subtree_size<T>(dendrogram: &[DendrogramNode<T>], n: usize, id: usize) -> usize {
    if id < n {
        1
    } else {
        dendrogram[id - n].size
    }
}

/// Sheds every point in the subtree at `id` out of cluster `parent_label`
/// at the given lambda, pruning the subtree from further condensation.
fn shed_points<T: Float>(
    dendrogram: &[DendrogramNode<T>],
    n: usize,
    id: usize,
    parent_label: usize,
    lambda: T,
    pruned: &mut [bool],
    condensed: &mut Vec<CondensedNode<T>>,
) {
    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        pruned[current] = true;
        if current < n {
            condensed.push(CondensedNode {
                id: current,
                parent: parent_label,
                lambda_birth: lambda,
                size: 1,
            });
        } else {
            let node = &dendrogram[current - n];
            queue.push_back(node.left);
            queue.push_back(node.right);
        }
    }
}

/// Per-cluster stability scores and the cluster-child adjacency, indexed by
/// `cluster_id - n` (slot 0 is the root, whose lambda of birth is zero).
fn cluster_stabilities<T: Float>(
    condensed: &[CondensedNode<T>],
    n: usize,
) -> (Vec<T>, Vec<Vec<usize>>) {
    let m = condensed.iter().filter(|row| row.id >= n).count() + 1;

    let mut birth = vec![T::zero(); m];
    for row in condensed {
        if row.id >= n {
            birth[row.id - n] = row.lambda_birth;
        }
    }

    let mut stability = vec![T::zero(); m];
    let mut child_clusters: Vec<Vec<usize>> = vec![Vec::new(); m];
    for row in condensed {
        let slot = row.parent - n;
        let weight = T::from(row.size).unwrap_or_else(T::one);
        stability[slot] = stability[slot] + (row.lambda_birth - birth[slot]) * weight;
        if row.id >= n {
            child_clusters[slot].push(row.id - n);
        }
    }
    (stability, child_clusters)
}

/// Maps original points to their governing selected cluster through the
/// condensed tree; points under no selected cluster stay `None`.
fn label_points<T>(
    condensed: &[CondensedNode<T>],
    selected: &[usize],
    n: usize,
) -> Vec<Option<usize>> {
    let mut labels = vec![None; n];
    for (cluster_index, &cluster_id) in selected.iter().enumerate() {
        let mut queue = VecDeque::from([cluster_id]);
        while let Some(current) = queue.pop_front() {
            for row in condensed {
                if row.parent != current {
                    continue;
                }
                if row.id < n {
                    if labels[row.id].is_none() {
                        labels[row.id] = Some(cluster_index);
                    }
                } else {
                    queue.push_back(row.id);
                }
            }
        }
    }
    labels
}
