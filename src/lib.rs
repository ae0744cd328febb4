//! Scaleshift: a per-feature affine layer
//!
//! Multiplies each feature column of a batch by a learnable scale and adds a
//! learnable shift, with an explicit backward pass for training.
//!
//! # Modules
//!
//! - [`tensor`] - Dense row-major matrix with row broadcasting
//! - [`layers`] - The scale-and-shift layer (free functions and struct)
//! - [`gradients`] - Gradient norm and clipping
//! - [`gradcheck`] - Finite-difference verification of the backward pass
//! - [`config`] - Serializable layer configuration
//! - [`error`] - Error type shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use scaleshift::{backward, forward, init, Tensor};
//!
//! let x = Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]])?;
//! let (gamma, beta) = init(2);
//!
//! let out = forward(&x, &gamma, &beta)?;
//! assert_eq!(out, x);
//!
//! let dout = Tensor::ones(2, 2);
//! let (dx, dgamma, dbeta) = backward(&dout, &out, &x, &gamma, &beta)?;
//! assert_eq!(dx, dout);
//! assert_eq!(dgamma.data, vec![4.0, 6.0]);
//! assert_eq!(dbeta.data, vec![2.0, 2.0]);
//! # Ok::<(), scaleshift::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod gradcheck;
pub mod gradients;
pub mod layers;
pub mod tensor;

// Re-export main types for convenience
pub use config::ScaleShiftConfig;
pub use error::{Error, Result};
pub use layers::scale_shift::{backward, forward, init};
pub use layers::{ScaleShiftCache, ScaleShiftGradients, TrainableScaleShift};
pub use tensor::Tensor;
