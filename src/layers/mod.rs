//! Neural Network Layers
//!
//! Each layer provides explicit forward and backward passes so it can be
//! sequenced by an external training loop.
//!
//! ## Layers
//!
//! - **scale_shift**: Per-feature scale (gamma) and shift (beta)
//!
//! ## Design Pattern
//!
//! Every trainable layer follows the same shape:
//!
//! ```rust,ignore
//! pub struct TrainableLayer {
//!     // Parameters (weights, biases, etc.)
//! }
//!
//! impl TrainableLayer {
//!     pub fn new(...) -> Self { }
//!     pub fn forward(&self, x: &Tensor) -> Result<(Tensor, Cache)> { }
//!     pub fn backward(&self, grad: &Tensor, cache: &Cache) -> Result<Gradients> { }
//! }
//! ```
//!
//! The free functions `init`, `forward` and `backward` expose the same math
//! without the struct, for callers that own their parameters.

pub mod scale_shift;

// Re-export main types for convenience
pub use scale_shift::{ScaleShiftCache, ScaleShiftGradients, TrainableScaleShift};
