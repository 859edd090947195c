use crate::error::{ClusterError, Result};
use crate::point::Point;
use num_traits::Float;

/// Distance measures available to the clustering algorithms and the KD-tree.
///
/// Both measures are symmetric and non-negative. `SquaredEuclidean` omits the
/// square root and is intended for ranking-only comparisons (it does not obey
/// the triangle inequality, but is monotone in the Euclidean distance, so
/// nearest-neighbour queries and spatial pruning remain correct).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMetric {
    /// sqrt of the sum of squared coordinate differences.
    #[default]
    Euclidean,
    /// Sum of squared coordinate differences, without the square root.
    SquaredEuclidean,
}

impl DistanceMetric {
    /// Distance between two points under this measure.
    pub fn calc<T: Float, const N: usize>(&self, a: &Point<T, N>, b: &Point<T, N>) -> T {
        match *self {
            Self::Euclidean => euclidean(a.as_slice(), b.as_slice()),
            Self::SquaredEuclidean => squared_euclidean(a.as_slice(), b.as_slice()),
        }
    }

    /// Maps a single-axis coordinate gap into the same units as [`calc`],
    /// for comparing a splitting-plane distance against a full distance when
    /// pruning KD-tree subtrees.
    ///
    /// [`calc`]: DistanceMetric::calc
    pub(crate) fn axis_margin<T: Float>(&self, delta: T) -> T {
        match *self {
            Self::Euclidean => delta.abs(),
            Self::SquaredEuclidean => delta * delta,
        }
    }
}

pub(crate) fn euclidean<T: Float>(a: &[T], b: &[T]) -> T {
    squared_euclidean(a, b).sqrt()
}

pub(crate) fn squared_euclidean<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x - *y) * (*x - *y))
        .fold(T::zero(), std::ops::Add::add)
}

/// A validated, finite, non-negative distance.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Distance<T>(T);

impl<T: Float> Distance<T> {
    /// Wraps a raw scalar, rejecting NaN, negative and infinite values.
    pub fn new(value: T) -> Result<Self> {
        if !value.is_finite() || value < T::zero() {
            return Err(ClusterError::InvalidDistance(format!(
                "{} is not a finite non-negative number",
                value.to_f64().unwrap_or(f64::NAN)
            )));
        }
        Ok(Distance(value))
    }

    /// The underlying scalar.
    pub fn get(&self) -> T {
        self.0
    }
}

/// A nearest-neighbour query result, referencing the queried point array by
/// position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<T> {
    /// Index of the neighbour in the source point array.
    pub index: usize,
    /// Distance from the query point, in the units of the query's metric.
    pub distance: Distance<T>,
}
