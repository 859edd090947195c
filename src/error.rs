use thiserror::Error;

/// Errors returned by the clustering algorithms and spatial structures in
/// this crate.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    /// The input point set is empty where at least one point is required.
    #[error("empty input")]
    EmptyInput,

    /// An algorithm parameter failed validation at construction time.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// A point contains a NaN or infinite coordinate.
    #[error("non-finite coordinate: {0}")]
    NonFiniteCoordinate(String),

    /// A distance value is NaN, negative or infinite. Distances are computed
    /// from validated coordinates, so this signals a caller bug upstream.
    #[error("invalid distance: {0}")]
    InvalidDistance(String),
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, ClusterError>;
