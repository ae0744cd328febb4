//! Error types for scaleshift
//!
//! The layer itself validates nothing. Every failure originates in the
//! tensor runtime (or in configuration checks) and propagates unchanged
//! to the caller through `?`.

use thiserror::Error;

/// Result type alias using scaleshift's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tensor and layer operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand shapes are incompatible for an element-wise operation
    #[error("Shape mismatch in {op}: {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        /// The operation that rejected the operands
        op: &'static str,
        /// Left-hand side shape
        lhs: Vec<usize>,
        /// Right-hand side shape
        rhs: Vec<usize>,
    },

    /// Flat data buffer does not hold exactly `product(shape)` elements
    #[error("Data length ({len}) doesn't match shape {shape:?}")]
    DataLength {
        /// Number of elements supplied
        len: usize,
        /// Requested shape
        shape: Vec<usize>,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl Error {
    pub(crate) fn shape_mismatch(op: &'static str, lhs: &[usize], rhs: &[usize]) -> Self {
        Error::ShapeMismatch {
            op,
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }
}
