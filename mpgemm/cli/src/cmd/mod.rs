pub mod bench;
pub mod gen;
pub mod run;
pub mod validate;

use clap::Subcommand;
use mpgemm_engine::{max_level, GemmResult};
use rand::rngs::StdRng;
use rand::Rng;

#[derive(Subcommand)]
pub enum Command {
    /// Time matmul per backend on random inputs.
    Bench(bench::BenchArgs),

    /// Write a matrix file of consecutive integers.
    Gen(gen::GenArgs),

    /// Compare the LUT backend against the naive reference.
    Validate(validate::ValidateArgs),

    /// Run matmul, bias and activation end to end.
    Run(run::RunArgs),
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Bench(args) => bench::run(args),
        Command::Gen(args) => gen::run(args),
        Command::Validate(args) => validate::run(args),
        Command::Run(args) => run::run(args),
    }
}

/// Random weight levels in `[0, 2^bit_width)` and activations in `[-1, 1)`.
pub(crate) fn random_problem(
    rng: &mut StdRng,
    m: usize,
    k: usize,
    n: usize,
    bit_width: u32,
) -> GemmResult<(Vec<u8>, Vec<f32>)> {
    let max = max_level(bit_width)?;
    let weights = (0..m * k).map(|_| rng.gen_range(0..=max)).collect();
    let activations = (0..k * n).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    Ok((weights, activations))
}
