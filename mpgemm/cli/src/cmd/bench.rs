use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use mpgemm_engine::{validate_bit_width, BackendKind, Engine, OptProfile, RuntimeConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Args)]
pub struct BenchArgs {
    #[arg(long, default_value_t = 128)]
    m: usize,

    #[arg(long, default_value_t = 128)]
    k: usize,

    #[arg(long, default_value_t = 128)]
    n: usize,

    /// Weight bit-width for the LUT backend (1-8).
    #[arg(long, default_value_t = 4)]
    bit_width: u32,

    /// Timed runs per backend (after one warmup run).
    #[arg(long, default_value_t = 10)]
    runs: usize,

    #[arg(long, value_enum, default_value_t = BackendChoice::All)]
    backend: BackendChoice,

    /// Parallelism profile.
    #[arg(long, value_enum, default_value_t = Profile::Optimized)]
    profile: Profile,

    /// Rayon worker threads (0 = all cores).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print a JSON report instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendChoice {
    Naive,
    Lut,
    All,
}

impl BackendChoice {
    fn kinds(self) -> Vec<BackendKind> {
        match self {
            BackendChoice::Naive => vec![BackendKind::Naive],
            BackendChoice::Lut => vec![BackendKind::Lut],
            BackendChoice::All => BackendKind::ALL.to_vec(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    Optimized,
    Baseline,
    Aggressive,
}

impl From<Profile> for OptProfile {
    fn from(p: Profile) -> Self {
        match p {
            Profile::Optimized => OptProfile::Optimized,
            Profile::Baseline => OptProfile::Baseline,
            Profile::Aggressive => OptProfile::Aggressive,
        }
    }
}

#[derive(Debug, Serialize)]
struct BenchReport {
    backend: BackendKind,
    m: usize,
    k: usize,
    n: usize,
    bit_width: u32,
    runs: usize,
    avg_ms: f64,
    min_ms: f64,
}

pub fn run(args: BenchArgs) -> Result<()> {
    validate_bit_width(args.bit_width)?;
    let runs = args.runs.max(1);
    let config = RuntimeConfig {
        num_threads: args.threads,
        ..OptProfile::from(args.profile).runtime_config()
    };
    config.apply()?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (weights, activations) = super::random_problem(&mut rng, args.m, args.k, args.n, args.bit_width)?;

    let mut reports = Vec::new();
    for kind in args.backend.kinds() {
        let mut engine = Engine::with_backend(kind);
        if kind == BackendKind::Lut {
            engine.generate_lut(args.bit_width)?;
        }

        let mut times = Vec::with_capacity(runs);
        for i in 0..=runs {
            let start = Instant::now();
            engine
                .matmul(&weights, &activations, args.m, args.k, args.n)
                .with_context(|| format!("{} matmul failed", kind))?;
            let ms = start.elapsed().as_secs_f64() * 1000.0;
            // Run 0 is warmup
            if i > 0 {
                times.push(ms);
            }
        }

        let avg_ms = times.iter().sum::<f64>() / times.len() as f64;
        let min_ms = times.iter().cloned().fold(f64::INFINITY, f64::min);
        log::debug!("[bench] {} avg {:.3}ms min {:.3}ms", kind, avg_ms, min_ms);
        reports.push(BenchReport {
            backend: kind,
            m: args.m,
            k: args.k,
            n: args.n,
            bit_width: args.bit_width,
            runs,
            avg_ms,
            min_ms,
        });
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!(
        "GEMM [{}x{}]x[{}x{}], {}-bit weights, SIMD: {}",
        args.m,
        args.k,
        args.k,
        args.n,
        args.bit_width,
        RuntimeConfig::detect_simd()
    );
    for r in &reports {
        println!(
            "{:<6} avg {:>9.3} ms  min {:>9.3} ms  over {} runs",
            r.backend.as_str(),
            r.avg_ms,
            r.min_ms,
            r.runs
        );
    }
    if let [naive, lut] = reports.as_slice() {
        println!("speedup (naive/lut): {:.2}x", naive.avg_ms / lut.avg_ms.max(f64::EPSILON));
    }
    Ok(())
}
