//! Finite-Difference Gradient Checking
//!
//! Verifies the analytic backward pass against central differences of the
//! scalar loss
//!
//! ```text
//! L(x, gamma, beta) = Σ dout ⊙ forward(x, gamma, beta)
//! ```
//!
//! whose exact gradients are what `backward(dout, ..)` returns. Each element
//! of `x`, `gamma` and `beta` is nudged by `±step` in turn:
//!
//! ```text
//! dL/dθ ≈ (L(θ + h) - L(θ - h)) / ((θ + h) - (θ - h))
//! ```
//!
//! The denominator uses the perturbed values as actually stored in `f32`,
//! and the loss is accumulated in `f64`. The forward map is linear, so the
//! remaining error is the `f32` rounding of the perturbed outputs divided by
//! the step. A step of `5e-2` keeps that well under `1e-3` for inputs of
//! order one; the map has no curvature, so a wide step costs no accuracy.

use tracing::debug;

use crate::error::{Error, Result};
use crate::layers::scale_shift::{backward, forward};
use crate::layers::ScaleShiftGradients;
use crate::tensor::Tensor;

/// Default perturbation for central differences
pub const DEFAULT_STEP: f32 = 5e-2;

/// Largest absolute disagreement between numerical and analytic gradients
#[derive(Clone, Debug, PartialEq)]
pub struct GradCheckReport {
    pub max_error_x: f32,
    pub max_error_gamma: f32,
    pub max_error_beta: f32,
}

impl GradCheckReport {
    /// Worst error across all three gradients
    pub fn max_error(&self) -> f32 {
        self.max_error_x
            .max(self.max_error_gamma)
            .max(self.max_error_beta)
    }

    /// True when every gradient agrees within `tolerance`
    pub fn passes(&self, tolerance: f32) -> bool {
        self.max_error() <= tolerance
    }
}

fn validate_step(step: f32) -> Result<()> {
    if !(step.is_finite() && step > 0.0) {
        return Err(Error::InvalidArgument {
            arg: "step",
            reason: format!("must be positive and finite, got {}", step),
        });
    }
    Ok(())
}

/// `Σ dout ⊙ forward(x, gamma, beta)`, accumulated in f64
fn weighted_loss(x: &Tensor, gamma: &Tensor, beta: &Tensor, dout: &Tensor) -> Result<f64> {
    let out = forward(x, gamma, beta)?;
    if out.shape != dout.shape {
        return Err(Error::shape_mismatch("weighted_loss", &out.shape, &dout.shape));
    }
    Ok(out
        .data
        .iter()
        .zip(&dout.data)
        .map(|(&o, &g)| o as f64 * g as f64)
        .sum())
}

/// Central difference of `loss` with respect to every element of `target`
fn central_differences<F>(target: &Tensor, step: f32, loss: F) -> Result<Tensor>
where
    F: Fn(&Tensor) -> Result<f64>,
{
    let mut probe = target.clone();
    let mut grad = Vec::with_capacity(target.data.len());

    for i in 0..target.data.len() {
        let original = probe.data[i];
        let hi = original + step;
        let lo = original - step;

        probe.data[i] = hi;
        let loss_hi = loss(&probe)?;
        probe.data[i] = lo;
        let loss_lo = loss(&probe)?;
        probe.data[i] = original;

        grad.push(((loss_hi - loss_lo) / (hi as f64 - lo as f64)) as f32);
    }

    Tensor::new(grad, target.shape.clone())
}

/// Numerical gradients of `Σ dout ⊙ forward(x, gamma, beta)`
///
/// # Errors
///
/// - [`Error::InvalidArgument`] if `step` is not positive and finite
/// - [`Error::ShapeMismatch`] if the operands are incompatible
pub fn numerical_gradients(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    dout: &Tensor,
    step: f32,
) -> Result<ScaleShiftGradients> {
    validate_step(step)?;

    let grad_x = central_differences(x, step, |p| weighted_loss(p, gamma, beta, dout))?;
    let grad_gamma = central_differences(gamma, step, |p| weighted_loss(x, p, beta, dout))?;
    let grad_beta = central_differences(beta, step, |p| weighted_loss(x, gamma, p, dout))?;

    Ok(ScaleShiftGradients {
        gamma: grad_gamma,
        beta: grad_beta,
        x: grad_x,
    })
}

/// Compare numerical gradients with the analytic backward pass
///
/// # Example
///
/// ```rust
/// use scaleshift::gradcheck::{check_gradients, DEFAULT_STEP};
/// use scaleshift::Tensor;
///
/// let x = Tensor::randn(4, 3, 0);
/// let gamma = Tensor::randn(1, 3, 1);
/// let beta = Tensor::randn(1, 3, 2);
/// let dout = Tensor::randn(4, 3, 3);
///
/// let report = check_gradients(&x, &gamma, &beta, &dout, DEFAULT_STEP)?;
/// assert!(report.passes(1e-3));
/// # Ok::<(), scaleshift::Error>(())
/// ```
pub fn check_gradients(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    dout: &Tensor,
    step: f32,
) -> Result<GradCheckReport> {
    let numerical = numerical_gradients(x, gamma, beta, dout, step)?;
    let out = forward(x, gamma, beta)?;
    let (grad_x, grad_gamma, grad_beta) = backward(dout, &out, x, gamma, beta)?;

    let report = GradCheckReport {
        max_error_x: numerical.x.max_abs_diff(&grad_x)?,
        max_error_gamma: numerical.gamma.max_abs_diff(&grad_gamma)?,
        max_error_beta: numerical.beta.max_abs_diff(&grad_beta)?,
    };
    debug!(
        max_error_x = report.max_error_x,
        max_error_gamma = report.max_error_gamma,
        max_error_beta = report.max_error_beta,
        "gradient check"
    );
    Ok(report)
}
