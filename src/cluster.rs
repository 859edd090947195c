use crate::error::Result;
use crate::point::{self, Point};
use num_traits::Float;

/// A group of points produced by one clustering run.
///
/// `members` holds indices into the point slice the algorithm was fitted
/// on, in ascending order. The centroid is the element-wise mean of the
/// member points. A point belongs to at most one cluster per run; DBSCAN,
/// DBSCAN++ and HDBSCAN additionally leave noise points out of every
/// cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<T, const N: usize> {
    id: usize,
    members: Vec<usize>,
    centroid: Point<T, N>,
}

impl<T: Float, const N: usize> Cluster<T, N> {
    pub(crate) fn new(id: usize, members: Vec<usize>, points: &[Point<T, N>]) -> Self {
        let centroid = point::centroid(points, &members);
        Cluster {
            id,
            members,
            centroid,
        }
    }

    /// Cluster label, sequential from 0 within one run.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Indices of the member points in the fitted point slice.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Number of member points.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Element-wise mean of the member points.
    pub fn centroid(&self) -> &Point<T, N> {
        &self.centroid
    }
}

/// Common interface for the clustering algorithms in this crate.
///
/// By convention, fitting an empty point slice succeeds with an empty
/// cluster list; all other input and parameter problems surface as errors
/// before any computation starts.
pub trait Clustering<T: Float, const N: usize> {
    /// Groups `points` into clusters.
    fn fit(&self, points: &[Point<T, N>]) -> Result<Vec<Cluster<T, N>>>;
}

/// Converts per-point labels into `Cluster` values. Unlabelled (noise)
/// points are dropped. Output ids are renumbered sequentially in ascending
/// label order.
pub(crate) fn clusters_from_labels<T: Float, const N: usize>(
    points: &[Point<T, N>],
    labels: &[Option<usize>],
) -> Vec<Cluster<T, N>> {
    let n_clusters = labels
        .iter()
        .flatten()
        .copied()
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_clusters];
    for (index, label) in labels.iter().enumerate() {
        if let Some(label) = label {
            members[*label].push(index);
        }
    }

    members
        .into_iter()
        .filter(|m| !m.is_empty())
        .enumerate()
        .map(|(id, m)| Cluster::new(id, m, points))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_to_clusters_drops_noise_and_renumbers() {
        let points: Vec<Point<f64, 2>> = [[0.0, 0.0], [2.0, 2.0], [9.0, 9.0], [4.0, 0.0]]
            .into_iter()
            .map(Point::from)
            .collect();
        let labels = vec![Some(0), Some(0), None, Some(2)];

        let clusters = clusters_from_labels(&points, &labels);
        assert_eq!(clusters.len(), 2);

        assert_eq!(clusters[0].id(), 0);
        assert_eq!(clusters[0].members(), &[0, 1]);
        assert_eq!(clusters[0].centroid(), &Point::new([1.0, 1.0]));

        // Label 2 renumbers to id 1 once the empty label 1 is dropped.
        assert_eq!(clusters[1].id(), 1);
        assert_eq!(clusters[1].members(), &[3]);
        assert_eq!(clusters[1].size(), 1);
    }

    #[test]
    fn all_noise_yields_no_clusters() {
        let points: Vec<Point<f64, 2>> = vec![Point::new([0.0, 0.0])];
        assert!(clusters_from_labels(&points, &[None]).is_empty());
    }
}
