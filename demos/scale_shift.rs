//! Scale-and-Shift Walkthrough
//!
//! Runs one forward and backward pass over a random batch, prints the
//! resulting tensors, and verifies the gradients with finite differences.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example scale_shift
//! cargo run --example scale_shift -- --batch 8 --features 4 --seed 42
//!
//! # Show layer-level tracing
//! RUST_LOG=scaleshift=trace cargo run --example scale_shift
//! ```

use clap::Parser;
use scaleshift::gradcheck::{check_gradients, DEFAULT_STEP};
use scaleshift::gradients::{clip_gradients, compute_grad_norm};
use scaleshift::{ScaleShiftConfig, Tensor, TrainableScaleShift};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scale_shift",
    about = "Forward, backward and gradient check for a scale-and-shift layer"
)]
struct Args {
    /// Number of examples in the batch (N)
    #[arg(long, default_value = "4")]
    batch: usize,

    /// Number of features (D)
    #[arg(long, default_value = "3")]
    features: usize,

    /// Seed for the random batch and parameters
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Finite-difference step for the gradient check
    #[arg(long, default_value_t = DEFAULT_STEP)]
    step: f32,

    /// Tolerance for the gradient check
    #[arg(long, default_value = "1e-3")]
    tolerance: f32,

    /// Gradient clipping max norm
    #[arg(long, default_value = "1.0")]
    grad_clip: f32,
}

fn print_tensor(name: &str, t: &Tensor) {
    println!("{} {:?}", name, t.shape);
    for row in t.to_rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>8.4}", v)).collect();
        println!("  [{}]", cells.join(", "));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = ScaleShiftConfig {
        num_features: args.features,
    };
    println!("Config: {}", serde_json::to_string(&config)?);

    // Random parameters so the transform is not the identity
    let layer = TrainableScaleShift::from_config(&config)?;
    let layer = TrainableScaleShift::from_parameters(
        layer.gamma.add(&Tensor::randn(1, args.features, args.seed + 1))?,
        layer.beta.add(&Tensor::randn(1, args.features, args.seed + 2))?,
    )?;

    let x = Tensor::randn(args.batch, args.features, args.seed);
    let dout = Tensor::randn(args.batch, args.features, args.seed + 3);

    println!("\n=== Forward ===");
    print_tensor("x", &x);
    print_tensor("gamma", &layer.gamma);
    print_tensor("beta", &layer.beta);
    let (out, cache) = layer.forward(&x)?;
    print_tensor("out", &out);

    println!("\n=== Backward ===");
    print_tensor("dout", &dout);
    let mut grads = layer.backward(&dout, &cache)?;
    print_tensor("dx", &grads.x);
    print_tensor("dgamma", &grads.gamma);
    print_tensor("dbeta", &grads.beta);

    println!("\n=== Gradient check ===");
    let report = check_gradients(&x, &layer.gamma, &layer.beta, &dout, args.step)?;
    println!("  max |error| x:     {:.3e}", report.max_error_x);
    println!("  max |error| gamma: {:.3e}", report.max_error_gamma);
    println!("  max |error| beta:  {:.3e}", report.max_error_beta);
    if report.passes(args.tolerance) {
        println!("  ✓ within tolerance {:.1e}", args.tolerance);
    } else {
        println!("  ✗ exceeds tolerance {:.1e}", args.tolerance);
    }

    println!("\n=== Clipping ===");
    let before = compute_grad_norm(&grads);
    clip_gradients(&mut grads, args.grad_clip);
    println!(
        "  grad norm {:.4} -> {:.4} (max {})",
        before,
        compute_grad_norm(&grads),
        args.grad_clip
    );

    Ok(())
}
