//! Error handling for LayerView core
//!
//! Errors raised while validating print data handed to the renderer.
//! The tube builder itself does not validate (see `debug_assert!`s there);
//! these checks are available to callers that want to pre-filter input.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Data-model error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A segment is shorter than the degenerate-length threshold
    #[error("Segment {index} is degenerate (length {length:.6} mm)")]
    InvalidSegment {
        /// Index of the offending segment.
        index: usize,
        /// Measured segment length.
        length: f32,
    },

    /// Width or height is not strictly positive
    #[error("Segment {index} has non-positive cross-section ({width} x {height})")]
    InvalidCrossSection {
        /// Index of the offending segment.
        index: usize,
        /// Extrusion width.
        width: f32,
        /// Extrusion height.
        height: f32,
    },

    /// Per-segment arrays do not line up with the polyline
    #[error("Expected {expected} per-segment values, got {actual}")]
    MismatchedArrays {
        /// Number of segments in the polyline.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Polyline has fewer than two points
    #[error("Polyline has no segments")]
    EmptyPolyline,
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
