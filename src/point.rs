use crate::error::{ClusterError, Result};
use num_traits::Float;
use std::ops::Index;

/// A fixed-arity point. The dimension is part of the type, so point sets of
/// mismatched dimensionality are rejected at compile time rather than at
/// runtime.
///
/// Points are plain immutable values with no identity. The production use
/// case passes 5-dimensional points (three normalised LAB colour channels
/// plus two normalised pixel coordinates), but any arity works.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<T, const N: usize>([T; N]);

impl<T: Float, const N: usize> Point<T, N> {
    /// Wraps a coordinate array as a point.
    pub fn new(coords: [T; N]) -> Self {
        Point(coords)
    }

    /// The coordinate array.
    pub fn coords(&self) -> &[T; N] {
        &self.0
    }

    /// Coordinates as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Whether every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

impl<T: Float, const N: usize> From<[T; N]> for Point<T, N> {
    fn from(coords: [T; N]) -> Self {
        Point(coords)
    }
}

impl<T, const N: usize> Index<usize> for Point<T, N> {
    type Output = T;

    fn index(&self, axis: usize) -> &T {
        &self.0[axis]
    }
}

/// Checks that every point in a dataset has only finite coordinates, naming
/// the first offending index otherwise.
pub(crate) fn validate_finite<T: Float, const N: usize>(points: &[Point<T, N>]) -> Result<()> {
    for (n, point) in points.iter().enumerate() {
        if !point.is_finite() {
            return Err(ClusterError::NonFiniteCoordinate(format!(
                "point {n} contains non-finite coordinate(s)"
            )));
        }
    }
    Ok(())
}

/// Element-wise mean of the points selected by `members`. Returns the origin
/// for an empty member list.
pub(crate) fn centroid<T: Float, const N: usize>(
    points: &[Point<T, N>],
    members: &[usize],
) -> Point<T, N> {
    let mut sums = [T::zero(); N];
    for &m in members {
        for (axis, sum) in sums.iter_mut().enumerate() {
            *sum = *sum + points[m][axis];
        }
    }
    if members.is_empty() {
        return Point::new(sums);
    }
    let count = T::from(members.len()).unwrap_or_else(T::one);
    Point::new(sums.map(|s| s / count))
}
