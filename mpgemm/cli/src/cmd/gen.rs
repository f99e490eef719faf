use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::matrix_file::write_sequential;

#[derive(Args)]
pub struct GenArgs {
    #[arg(long)]
    rows: usize,

    #[arg(long)]
    cols: usize,

    /// First value; the rest follow consecutively in row-major order.
    #[arg(long, default_value_t = 1)]
    start: i64,

    /// Output file path.
    #[arg(long, short)]
    output: PathBuf,
}

pub fn run(args: GenArgs) -> Result<()> {
    write_sequential(&args.output, args.rows, args.cols, args.start)?;
    println!(
        "Generated {}x{} matrix file: {}",
        args.rows,
        args.cols,
        args.output.display()
    );
    Ok(())
}
