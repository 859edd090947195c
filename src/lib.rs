//! Clustering of fixed-dimension numeric points into dominant groups,
//! without being told how many groups exist. Generic over floating point
//! numeric types.
//!
//! The crate provides four clustering algorithms over a shared set of
//! spatial primitives:
//!
//! - [`Kmeans`] — partitional clustering with k-means++ seeding and Lloyd
//!   iterations;
//! - [`Dbscan`] — density-reachability clustering with noise detection;
//! - [`DbscanPp`] — an approximate DBSCAN that only tests a subsample of
//!   candidate core points;
//! - [`Hdbscan`] — hierarchical density clustering with stability-based
//!   flat extraction.
//!
//! Underneath them sit a KD-tree index ([`KdTree`]), a minimum spanning
//! tree builder ([`prim_mst`]), and a disjoint-set forest ([`UnionFind`]).
//! All algorithms are single-threaded, synchronous and free of hidden
//! state; given a fixed seed they are fully deterministic, so a whole run
//! can be moved onto a worker thread as one pure function call.
//!
//! Point dimensionality is part of the type ([`Point<T, N>`](Point)). The
//! production use case clusters 5-dimensional points (three normalised LAB
//! colour channels plus two normalised pixel coordinates) to find dominant
//! image regions, but any arity works.
//!
//! # Examples
//! ```
//! use clusterkit::{Clustering, Hdbscan, Point};
//!
//! let points: Vec<Point<f32, 2>> = vec![
//!     [1.5, 2.2], [1.0, 1.1], [1.2, 1.4], [0.8, 1.0], [1.1, 1.0],
//!     [3.7, 4.0], [3.9, 3.9], [3.6, 4.1], [3.8, 3.9], [4.0, 4.1],
//!     [10.0, 10.0],
//! ]
//! .into_iter()
//! .map(Point::from)
//! .collect();
//!
//! let clusters = Hdbscan::default_params().fit(&points).unwrap();
//! // Two dense regions; the far point is noise and joins neither.
//! assert_eq!(clusters.len(), 2);
//! assert!(clusters.iter().all(|c| c.size() == 5));
//! ```
//!
//! # References
//! * [Campello, R.J.G.B.; Moulavi, D.; Sander, J. Density-based clustering based on hierarchical density estimates.](https://link.springer.com/chapter/10.1007/978-3-642-37456-2_14)
//! * [Ester, M.; Kriegel, H.P.; Sander, J.; Xu, X. A density-based algorithm for discovering clusters.](https://dl.acm.org/doi/10.5555/3001460.3001507)
//! * [Jang, J.; Jiang, H. DBSCAN++: Towards fast and scalable density clustering.](https://proceedings.mlr.press/v97/jang19a.html)

#![forbid(unsafe_code)]

mod cluster;
mod dbscan;
mod dbscan_pp;
mod distance;
mod error;
mod hdbscan;
mod kdtree;
mod kmeans;
mod mst;
mod point;
mod union_find;

pub use crate::cluster::{Cluster, Clustering};
pub use crate::dbscan::Dbscan;
pub use crate::dbscan_pp::DbscanPp;
pub use crate::distance::{Distance, DistanceMetric, Neighbor};
pub use crate::error::{ClusterError, Result};
pub use crate::hdbscan::Hdbscan;
pub use crate::kdtree::{KdTree, DEFAULT_LEAF_SIZE};
pub use crate::kmeans::{CenterInit, Kmeans};
pub use crate::mst::{prim_mst, WeightedEdge};
pub use crate::point::Point;
pub use crate::union_find::UnionFind;
