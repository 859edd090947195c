//! Minimum spanning tree over a complete graph, via Prim's algorithm.

use num_traits::Float;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// An undirected weighted edge referencing vertex indices in a
/// caller-supplied vertex array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEdge<T> {
    pub u: usize,
    pub v: usize,
    pub weight: T,
}

struct CandidateEdge<T> {
    weight: T,
    u: usize,
    v: usize,
}

impl<T: Float> PartialEq for CandidateEdge<T> {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.u == other.u && self.v == other.v
    }
}

impl<T: Float> Eq for CandidateEdge<T> {}

impl<T: Float> PartialOrd for CandidateEdge<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Float> Ord for CandidateEdge<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.weight
            .partial_cmp(&other.weight)
            .expect("finite edge weight")
            .then(self.v.cmp(&other.v))
    }
}

/// Computes a minimum spanning tree of the complete graph on
/// `0..n_vertices` under the supplied symmetric weight function.
///
/// Starts from vertex 0 and maintains a priority queue of candidate edges
/// from the attached set to the frontier, always taking the globally
/// cheapest edge to an unattached vertex. Enumerating every edge from each
/// newly attached vertex makes this O(V^2 log V); acceptable here since V
/// is a point or centroid count, not a pixel count.
///
/// Zero or one vertex yields an empty edge set.
pub fn prim_mst<T, F>(n_vertices: usize, weight: F) -> Vec<WeightedEdge<T>>
where
    T: Float,
    F: Fn(usize, usize) -> T,
{
    if n_vertices <= 1 {
        return Vec::new();
    }

    let mut attached = vec![false; n_vertices];
    let mut edges = Vec::with_capacity(n_vertices - 1);
    let mut heap = BinaryHeap::new();

    attached[0] = true;
    for v in 1..n_vertices {
        heap.push(Reverse(CandidateEdge {
            weight: weight(0, v),
            u: 0,
            v,
        }));
    }

    while edges.len() < n_vertices - 1 {
        let Some(Reverse(candidate)) = heap.pop() else {
            break;
        };
        if attached[candidate.v] {
            // Stale: a cheaper edge already attached this vertex.
            continue;
        }
        attached[candidate.v] = true;
        edges.push(WeightedEdge {
            u: candidate.u,
            v: candidate.v,
            weight: candidate.weight,
        });
        for next in 0..n_vertices {
            if !attached[next] {
                heap.push(Reverse(CandidateEdge {
                    weight: weight(candidate.v, next),
                    u: candidate.v,
                    v: next,
                }));
            }
        }
    }

    edges
}
