use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use half::f16;
use mpgemm_engine::{ActivationKind, BackendKind, Engine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::matrix_file::read_matrix;

#[derive(Args)]
pub struct RunArgs {
    /// Weight-level matrix file (`rows cols` header). Random levels if omitted.
    #[arg(long, requires = "activations")]
    weights: Option<PathBuf>,

    /// Activation matrix file. Random f16 activations if omitted.
    #[arg(long, requires = "weights")]
    activations: Option<PathBuf>,

    /// Dimensions used for random inputs.
    #[arg(long, default_value_t = 128)]
    m: usize,

    #[arg(long, default_value_t = 128)]
    k: usize,

    #[arg(long, default_value_t = 128)]
    n: usize,

    #[arg(long, default_value = "lut")]
    backend: String,

    #[arg(long, default_value_t = 4)]
    bit_width: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = 7)]
    bias_seed: u64,

    /// identity, relu, sigmoid, tanh, gelu or silu.
    #[arg(long, default_value = "relu")]
    activation: String,

    /// Number of leading row-0 values to print.
    #[arg(long, default_value_t = 5)]
    sample: usize,
}

pub fn run(args: RunArgs) -> Result<()> {
    let kind: ActivationKind = args.activation.parse()?;
    let backend: BackendKind = args.backend.parse()?;

    let mut engine = Engine::with_backend(backend);
    if backend == BackendKind::Lut {
        engine.generate_lut(args.bit_width)?;
    }

    let (out, m, n) = match (&args.weights, &args.activations) {
        (Some(w_path), Some(a_path)) => {
            let w = read_matrix::<u8>(w_path)?;
            let a = read_matrix::<f32>(a_path)?;
            if w.cols != a.rows {
                bail!(
                    "weights are {}x{} but activations are {}x{}",
                    w.rows,
                    w.cols,
                    a.rows,
                    a.cols
                );
            }
            let out = engine
                .matmul(&w.values, &a.values, w.rows, w.cols, a.cols)
                .context("matmul failed")?;
            (out, w.rows, a.cols)
        }
        _ => {
            let mut rng = StdRng::seed_from_u64(args.seed);
            let levels = 1u32 << args.bit_width.min(8);
            let weights: Vec<u8> = (0..args.m * args.k)
                .map(|_| rng.gen_range(0..levels) as u8)
                .collect();
            let activations: Vec<f16> = (0..args.k * args.n)
                .map(|_| f16::from_f32(rng.gen_range(-2.0f32..2.0)))
                .collect();
            let out = engine
                .matmul(&weights, &activations, args.m, args.k, args.n)
                .context("matmul failed")?;
            (out, args.m, args.n)
        }
    };

    let mut rng = StdRng::seed_from_u64(args.bias_seed);
    let bias: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    let biased = engine.add_bias(&out, m, n, &bias)?;
    let activated = engine.apply_activation(&biased, m, n, kind)?;

    println!("Backend: {}, activation: {}", engine.backend_name(), kind);
    println!("Output shape: ({}, {})", m, n);
    let sample = &activated[..args.sample.min(n)];
    println!("Sample output [0,:{}]: {:?}", sample.len(), sample);
    Ok(())
}
