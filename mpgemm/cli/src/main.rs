mod cmd;
mod matrix_file;

use anyhow::Result;
use clap::Parser;

/// mpgemm — benchmark, validate and exercise the quantized GEMM engine.
#[derive(Parser)]
#[command(name = "mpgemm", version, about)]
struct Cli {
    #[command(subcommand)]
    command: cmd::Command,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cmd::run(cli.command)
}
