//! Error types for geocurve.

use thiserror::Error;

/// All errors produced by this crate.
///
/// Inputs are pure values, so every failure is deterministic: retrying the
/// same call yields the same error. Nothing here is recoverable without a
/// different call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocurveError {
    /// Curve resolution (order) outside the supported `1..=30` window.
    #[error("invalid curve resolution {0}, expected a value in 1..=30")]
    InvalidResolution(u32),

    /// Latitude outside `[-90, 90]`, or a non-finite component.
    /// Longitude is never rejected; it is normalized modulo 360.
    #[error("invalid coordinate ({lon}, {lat})")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// The query rectangle has no piece inside the grid after
    /// longitude wrapping and pole clipping.
    #[error("query rectangle lies entirely outside the indexed world")]
    OutOfWorld,

    /// Compaction was invoked on an empty range list. This is a caller bug,
    /// not a data condition: an empty search result is not an error.
    #[error("cannot compact an empty range list")]
    EmptyRanges,

    /// A validating constructor found items out of curve-index order.
    #[error("items are not sorted ascending by curve index")]
    InputNotSorted,
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GeocurveError>;
