//! Scale-and-Shift Layer
//!
//! A per-feature affine transform: every feature column is multiplied by a
//! learnable scale (gamma) and offset by a learnable shift (beta). This is the
//! tail end of layer/batch normalization on its own, without the statistics.
//!
//! ## Forward Pass
//!
//! ```text
//! Input:  x     [N, D]
//! Scale:  gamma [1, D]
//! Shift:  beta  [1, D]
//! Output: y = x * gamma + beta   [N, D]   (gamma, beta broadcast over rows)
//! ```
//!
//! ## Backward Pass
//!
//! The map is linear in each of its inputs, so the gradients are direct:
//!
//! ```text
//! grad_gamma = sum_rows(grad_y * x)
//! grad_beta  = sum_rows(grad_y)
//! grad_x     = grad_y * gamma
//! ```
//!
//! ## Initialization
//!
//! gamma = 1, beta = 0: the layer starts out as the identity.

use tracing::{debug, trace};

use crate::config::ScaleShiftConfig;
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Initial parameters for `num_features` features
///
/// Returns `(gamma, beta)` with gamma `[1, D]` all ones and beta `[1, D]`
/// all zeros.
pub fn init(num_features: usize) -> (Tensor, Tensor) {
    (
        Tensor::ones(1, num_features),
        Tensor::zeros(1, num_features),
    )
}

/// Forward pass: `out[i][j] = x[i][j] * gamma[0][j] + beta[0][j]`
///
/// # Errors
///
/// [`Error::ShapeMismatch`] from the tensor runtime if the column counts of
/// `x`, `gamma` and `beta` disagree, or if either parameter is not a single
/// row.
///
/// # Example
///
/// ```rust
/// use scaleshift::{forward, Tensor};
///
/// let x = Tensor::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]])?;
/// let gamma = Tensor::from_rows(&[vec![2.0, 0.5]])?;
/// let beta = Tensor::from_rows(&[vec![1.0, -1.0]])?;
/// let out = forward(&x, &gamma, &beta)?;
/// assert_eq!(out.to_rows(), vec![vec![3.0, 0.0], vec![7.0, 1.0]]);
/// # Ok::<(), scaleshift::Error>(())
/// ```
pub fn forward(x: &Tensor, gamma: &Tensor, beta: &Tensor) -> Result<Tensor> {
    trace!(x = ?x.shape, gamma = ?gamma.shape, beta = ?beta.shape, "scale_shift forward");
    x.mul(gamma)?.add(beta)
}

/// Backward pass
///
/// Returns `(grad_x, grad_gamma, grad_beta)`. `out` and `beta` do not enter
/// the math; they are accepted so the call site matches sibling layers.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `dout` and `x` differ in shape (a `[1, D]`
/// input is not broadcast against an `[N, D]` upstream gradient) or `gamma`
/// does not broadcast against `dout`.
pub fn backward(
    dout: &Tensor,
    _out: &Tensor,
    x: &Tensor,
    gamma: &Tensor,
    _beta: &Tensor,
) -> Result<(Tensor, Tensor, Tensor)> {
    trace!(dout = ?dout.shape, x = ?x.shape, "scale_shift backward");
    let grad_gamma = dout.hadamard(x)?.sum_rows();
    let grad_beta = dout.sum_rows();
    let grad_x = dout.mul(gamma)?;
    Ok((grad_x, grad_gamma, grad_beta))
}

/// Trainable scale-and-shift layer
///
/// Holds gamma and beta and wraps [`forward`]/[`backward`] with a cache so
/// it composes like the other layers in a network.
#[derive(Clone, Debug)]
pub struct TrainableScaleShift {
    pub gamma: Tensor, // Scale parameter [1, D]
    pub beta: Tensor,  // Shift parameter [1, D]
}

impl TrainableScaleShift {
    /// Create a new layer initialized to the identity transform
    ///
    /// # Arguments
    ///
    /// * `num_features` - Size of the feature dimension (D)
    pub fn new(num_features: usize) -> Self {
        let (gamma, beta) = init(num_features);
        debug!(num_features, "initialized scale_shift layer");
        Self { gamma, beta }
    }

    /// Create a layer from a validated configuration
    pub fn from_config(config: &ScaleShiftConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.num_features))
    }

    /// Wrap existing parameters
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] unless gamma and beta are both `[1, D]`
    /// for the same D.
    pub fn from_parameters(gamma: Tensor, beta: Tensor) -> Result<Self> {
        if !gamma.is_row_vector() || gamma.shape != beta.shape {
            return Err(Error::shape_mismatch(
                "from_parameters",
                &gamma.shape,
                &beta.shape,
            ));
        }
        Ok(Self { gamma, beta })
    }

    /// Width of the feature dimension
    pub fn num_features(&self) -> usize {
        self.gamma.cols()
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `x` - Input batch [N, D]
    ///
    /// # Returns
    ///
    /// Tuple of (output, cache) where:
    /// - output: [N, D]
    /// - cache: stores x and output for backward pass
    pub fn forward(&self, x: &Tensor) -> Result<(Tensor, ScaleShiftCache)> {
        let out = forward(x, &self.gamma, &self.beta)?;
        let cache = ScaleShiftCache {
            x: x.clone(),
            out: out.clone(),
        };
        Ok((out, cache))
    }

    /// Backward pass
    ///
    /// # Arguments
    ///
    /// * `grad_out` - Gradient from next layer [N, D]
    /// * `cache` - Cached values from forward pass
    pub fn backward(
        &self,
        grad_out: &Tensor,
        cache: &ScaleShiftCache,
    ) -> Result<ScaleShiftGradients> {
        let (x, gamma, beta) = backward(
            grad_out,
            &cache.out,
            &cache.x,
            &self.gamma,
            &self.beta,
        )?;
        Ok(ScaleShiftGradients { gamma, beta, x })
    }

    /// Learnable parameters, gamma first
    pub fn parameters(&self) -> Vec<&Tensor> {
        vec![&self.gamma, &self.beta]
    }
}

/// Cache for scale-and-shift backward pass
#[derive(Clone, Debug)]
pub struct ScaleShiftCache {
    pub x: Tensor,
    pub out: Tensor,
}

/// Gradients for scale-and-shift
#[derive(Clone, Debug)]
pub struct ScaleShiftGradients {
    pub gamma: Tensor,
    pub beta: Tensor,
    pub x: Tensor, // Gradient to pass to previous layer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f32]]) -> Tensor {
        let rows: Vec<Vec<f32>> = rows.iter().map(|r| r.to_vec()).collect();
        Tensor::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_init_is_identity() {
        let (gamma, beta) = init(3);
        assert_eq!(gamma.shape, vec![1, 3]);
        assert_eq!(beta.shape, vec![1, 3]);
        assert!(gamma.data.iter().all(|&g| g == 1.0));
        assert!(beta.data.iter().all(|&b| b == 0.0));

        let x = matrix(&[&[1.5, -2.0, 0.25], &[7.0, 0.0, -3.0]]);
        assert_eq!(forward(&x, &gamma, &beta).unwrap(), x);
    }

    #[test]
    fn test_init_zero_features() {
        let (gamma, beta) = init(0);
        assert_eq!(gamma.shape, vec![1, 0]);
        assert!(beta.data.is_empty());
    }

    #[test]
    fn test_forward_worked_example() {
        let x = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let gamma = matrix(&[&[2.0, 0.5]]);
        let beta = matrix(&[&[1.0, -1.0]]);

        let out = forward(&x, &gamma, &beta).unwrap();
        assert_eq!(out.to_rows(), vec![vec![3.0, 0.0], vec![7.0, 1.0]]);
    }

    #[test]
    fn test_forward_gamma_too_wide() {
        let x = Tensor::zeros(2, 2);
        let gamma = Tensor::ones(1, 3);
        let beta = Tensor::zeros(1, 2);

        let err = forward(&x, &gamma, &beta).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { op: "mul", .. }));
    }

    #[test]
    fn test_forward_beta_too_narrow() {
        let x = Tensor::zeros(2, 3);
        let gamma = Tensor::ones(1, 3);
        let beta = Tensor::zeros(1, 2);

        let err = forward(&x, &gamma, &beta).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { op: "add", .. }));
    }

    #[test]
    fn test_backward_values() {
        let x = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let gamma = matrix(&[&[2.0, 0.5]]);
        let beta = matrix(&[&[1.0, -1.0]]);
        let dout = matrix(&[&[1.0, -1.0], &[0.5, 2.0]]);
        let out = forward(&x, &gamma, &beta).unwrap();

        let (dx, dgamma, dbeta) = backward(&dout, &out, &x, &gamma, &beta).unwrap();

        // dx = dout * gamma
        assert_eq!(dx.to_rows(), vec![vec![2.0, -0.5], vec![1.0, 1.0]]);
        // dgamma = [1*1 + 0.5*3, -1*2 + 2*4]
        assert_eq!(dgamma.data, vec![2.5, 6.0]);
        // dbeta = [1 + 0.5, -1 + 2]
        assert_eq!(dbeta.data, vec![1.5, 1.0]);
        assert_eq!(dgamma.shape, vec![1, 2]);
        assert_eq!(dbeta.shape, vec![1, 2]);
    }

    #[test]
    fn test_backward_ignores_out_and_beta() {
        let x = matrix(&[&[1.0, 2.0]]);
        let gamma = matrix(&[&[3.0, 4.0]]);
        let dout = matrix(&[&[1.0, 1.0]]);

        let (zeros, ones) = (Tensor::zeros(1, 2), Tensor::ones(1, 2));
        let a = backward(&dout, &zeros, &x, &gamma, &zeros).unwrap();
        let b = backward(&dout, &ones, &x, &gamma, &ones).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
        assert_eq!(a.2, b.2);
    }

    #[test]
    fn test_backward_shape_mismatch() {
        let x = Tensor::zeros(3, 2);
        let dout = Tensor::zeros(2, 2);
        let (gamma, beta) = init(2);
        let err = backward(&dout, &dout, &x, &gamma, &beta).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_backward_rejects_broadcast_input() {
        // A single input row must not be spread over a batch of gradients
        let dout = Tensor::ones(3, 2);
        let x = matrix(&[&[1.0, 2.0]]);
        let (gamma, beta) = init(2);
        let err = backward(&dout, &dout, &x, &gamma, &beta).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                op: "hadamard",
                lhs: vec![3, 2],
                rhs: vec![1, 2]
            }
        );
    }

    #[test]
    fn test_layer_forward_backward() {
        let layer = TrainableScaleShift::from_parameters(
            matrix(&[&[2.0, 0.5]]),
            matrix(&[&[1.0, -1.0]]),
        )
        .unwrap();
        let x = matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);

        let (out, cache) = layer.forward(&x).unwrap();
        assert_eq!(out.to_rows(), vec![vec![3.0, 0.0], vec![7.0, 1.0]]);
        assert_eq!(cache.x, x);

        let grads = layer.backward(&Tensor::ones(2, 2), &cache).unwrap();
        assert_eq!(grads.beta.data, vec![2.0, 2.0]);
        assert_eq!(grads.gamma.data, vec![4.0, 6.0]);
        assert_eq!(grads.x.to_rows(), vec![vec![2.0, 0.5], vec![2.0, 0.5]]);
    }

    #[test]
    fn test_from_parameters_rejects_mismatch() {
        let narrow_beta =
            TrainableScaleShift::from_parameters(Tensor::ones(1, 2), Tensor::zeros(1, 3));
        assert!(narrow_beta.is_err());
        let not_a_row =
            TrainableScaleShift::from_parameters(Tensor::ones(2, 2), Tensor::zeros(2, 2));
        assert!(not_a_row.is_err());
    }

    #[test]
    fn test_from_config() {
        let config = ScaleShiftConfig { num_features: 4 };
        let layer = TrainableScaleShift::from_config(&config).unwrap();
        assert_eq!(layer.num_features(), 4);
        assert_eq!(layer.parameters().len(), 2);
        assert!(TrainableScaleShift::from_config(&ScaleShiftConfig { num_features: 0 }).is_err());
    }
}
