//! Gradient Utilities
//!
//! Norm computation and clipping for the parameter gradients of a
//! scale-and-shift layer.
//!
//! ## Algorithm
//!
//! ```text
//! norm = √(Σ grad_gamma² + Σ grad_beta²)
//! if norm > max_norm:
//!     grad_gamma, grad_beta *= (max_norm / norm)
//! ```
//!
//! Only parameter gradients participate. `grads.x` flows to the previous
//! layer and is left untouched.
//!
//! ## Example
//!
//! ```rust
//! use scaleshift::gradients::{clip_gradients, compute_grad_norm};
//! use scaleshift::{Tensor, TrainableScaleShift};
//!
//! let layer = TrainableScaleShift::new(2);
//! let x = Tensor::from_rows(&[vec![3.0, 4.0]])?;
//! let (_, cache) = layer.forward(&x)?;
//! let mut grads = layer.backward(&Tensor::ones(1, 2), &cache)?;
//!
//! clip_gradients(&mut grads, 1.0);
//! assert!(compute_grad_norm(&grads) <= 1.0 + 1e-6);
//! # Ok::<(), scaleshift::Error>(())
//! ```

use rayon::prelude::*;
use tracing::debug;

use crate::layers::ScaleShiftGradients;

/// Compute the L2 norm of the parameter gradients
///
/// # Returns
///
/// √(Σ g²) over every element of `grads.gamma` and `grads.beta`
pub fn compute_grad_norm(grads: &ScaleShiftGradients) -> f32 {
    (grads.gamma.sum_sq() + grads.beta.sum_sq()).sqrt()
}

/// Clip parameter gradients to a maximum norm
///
/// When the norm exceeds `max_norm`, gamma and beta gradients are scaled by
/// the same factor so the norm becomes exactly `max_norm`.
pub fn clip_gradients(grads: &mut ScaleShiftGradients, max_norm: f32) {
    let norm = compute_grad_norm(grads);

    if norm > max_norm {
        let scale = max_norm / norm;
        debug!(norm, max_norm, scale, "clipping scale_shift gradients");

        let scale_parallel = |data: &mut Vec<f32>| {
            data.par_iter_mut().for_each(|val| *val *= scale);
        };

        scale_parallel(&mut grads.gamma.data);
        scale_parallel(&mut grads.beta.data);
    }
}
