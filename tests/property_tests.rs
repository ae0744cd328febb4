//! Property-based tests for the scale-and-shift layer.
//!
//! Key invariants:
//! - forward computes x * gamma + beta element by element
//! - backward returns dout * gamma, column sums of dout * x, column sums of dout
//! - init is the identity transform
//! - doubling gamma doubles the scale contribution
//! - finite differences agree with the analytic gradients
//! - a gamma one column too wide is a shape mismatch

use proptest::prelude::*;
use scaleshift::gradcheck::{check_gradients, DEFAULT_STEP};
use scaleshift::{backward, forward, init, Error, Tensor};

/// (x, gamma, beta, dout) with x and dout [N, D], gamma and beta [1, D]
fn layer_inputs() -> impl Strategy<Value = (Tensor, Tensor, Tensor, Tensor)> {
    (1usize..6, 1usize..6).prop_flat_map(|(n, d)| {
        (
            prop::collection::vec(-2.0f32..2.0, n * d),
            prop::collection::vec(-2.0f32..2.0, d),
            prop::collection::vec(-2.0f32..2.0, d),
            prop::collection::vec(-2.0f32..2.0, n * d),
        )
            .prop_map(move |(x, gamma, beta, dout)| {
                (
                    Tensor::new(x, vec![n, d]).unwrap(),
                    Tensor::new(gamma, vec![1, d]).unwrap(),
                    Tensor::new(beta, vec![1, d]).unwrap(),
                    Tensor::new(dout, vec![n, d]).unwrap(),
                )
            })
    })
}

proptest! {
    /// out[i][j] == x[i][j] * gamma[0][j] + beta[0][j]
    #[test]
    fn forward_is_elementwise_affine((x, gamma, beta, _dout) in layer_inputs()) {
        let out = forward(&x, &gamma, &beta).unwrap();
        prop_assert_eq!(&out.shape, &x.shape);
        for i in 0..x.rows() {
            for j in 0..x.cols() {
                prop_assert_eq!(out.get(i, j), x.get(i, j) * gamma.get(0, j) + beta.get(0, j));
            }
        }
    }

    /// Analytic gradients match their closed forms exactly
    #[test]
    fn backward_matches_closed_form((x, gamma, beta, dout) in layer_inputs()) {
        let out = forward(&x, &gamma, &beta).unwrap();
        let (dx, dgamma, dbeta) = backward(&dout, &out, &x, &gamma, &beta).unwrap();

        prop_assert_eq!(&dgamma.shape, &vec![1, x.cols()]);
        prop_assert_eq!(&dbeta.shape, &vec![1, x.cols()]);
        for j in 0..x.cols() {
            let want_gamma: f32 = (0..x.rows()).map(|i| dout.get(i, j) * x.get(i, j)).sum();
            let want_beta: f32 = (0..x.rows()).map(|i| dout.get(i, j)).sum();
            prop_assert_eq!(dgamma.get(0, j), want_gamma);
            prop_assert_eq!(dbeta.get(0, j), want_beta);
            for i in 0..x.rows() {
                prop_assert_eq!(dx.get(i, j), dout.get(i, j) * gamma.get(0, j));
            }
        }
    }

    /// init(D) leaves any [N, D] batch unchanged
    #[test]
    fn init_is_identity((x, _gamma, _beta, _dout) in layer_inputs()) {
        let (gamma, beta) = init(x.cols());
        prop_assert_eq!(forward(&x, &gamma, &beta).unwrap(), x);
    }

    /// forward(x, 2g, b) - b == 2 * (forward(x, g, b) - b)
    #[test]
    fn doubling_gamma_doubles_scale((x, gamma, beta, _dout) in layer_inputs()) {
        let doubled = forward(&x, &gamma.mul_scalar(2.0), &beta).unwrap().sub(&beta).unwrap();
        let twice = forward(&x, &gamma, &beta).unwrap().sub(&beta).unwrap().mul_scalar(2.0);
        // (p + b) - b only recovers p up to f32 rounding
        prop_assert!(doubled.max_abs_diff(&twice).unwrap() < 1e-5);
    }

    /// Central differences agree with backward
    #[test]
    fn numerical_gradients_agree((x, gamma, beta, dout) in layer_inputs()) {
        let report = check_gradients(&x, &gamma, &beta, &dout, DEFAULT_STEP).unwrap();
        prop_assert!(report.passes(1e-3), "{:?}", report);
    }

    /// gamma of width D + 1 never truncates against x of width D
    #[test]
    fn wider_gamma_is_shape_mismatch((x, _gamma, beta, _dout) in layer_inputs()) {
        let wide = Tensor::ones(1, x.cols() + 1);
        let err = forward(&x, &wide, &beta).unwrap_err();
        let is_mismatch = matches!(err, Error::ShapeMismatch { .. });
        prop_assert!(is_mismatch);
    }
}
