use anyhow::{bail, Result};
use clap::Args;
use mpgemm_engine::{measure_error, validate_bit_width, BackendKind, Engine, ErrorStats};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(long, default_value_t = 64)]
    m: usize,

    #[arg(long, default_value_t = 64)]
    k: usize,

    #[arg(long, default_value_t = 64)]
    n: usize,

    #[arg(long, default_value_t = 4)]
    bit_width: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum allowed error relative to the largest reference magnitude.
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f64,

    /// Print a JSON report instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ValidateReport {
    m: usize,
    k: usize,
    n: usize,
    bit_width: u32,
    seed: u64,
    tolerance: f64,
    relative_max_error: f64,
    stats: ErrorStats,
    passed: bool,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    validate_bit_width(args.bit_width)?;
    let mut rng = StdRng::seed_from_u64(args.seed);
    let (weights, activations) = super::random_problem(&mut rng, args.m, args.k, args.n, args.bit_width)?;

    let naive = Engine::with_backend(BackendKind::Naive);
    let mut lut = Engine::with_backend(BackendKind::Lut);
    lut.generate_lut(args.bit_width)?;

    let reference = naive.matmul(&weights, &activations, args.m, args.k, args.n)?;
    let candidate = lut.matmul(&weights, &activations, args.m, args.k, args.n)?;
    let stats = measure_error(&reference, &candidate)?;
    let relative = stats.relative_max_error();
    let passed = relative <= args.tolerance;

    if args.json {
        let report = ValidateReport {
            m: args.m,
            k: args.k,
            n: args.n,
            bit_width: args.bit_width,
            seed: args.seed,
            tolerance: args.tolerance,
            relative_max_error: relative,
            stats,
            passed,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "lut vs naive [{}x{}]x[{}x{}] bw={}: mse={:.3e} max_error={:.3e} relative={:.3e}",
            args.m, args.k, args.k, args.n, args.bit_width, stats.mse, stats.max_error, relative
        );
        println!("{}", if passed { "PASS" } else { "FAIL" });
    }

    if !passed {
        bail!(
            "relative max error {:.3e} exceeds tolerance {:.3e}",
            relative,
            args.tolerance
        );
    }
    Ok(())
}
