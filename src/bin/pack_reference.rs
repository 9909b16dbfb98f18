use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use genhash::{pack_fasta, Policy};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pack FASTA nucleotides into the 2-bit reference layout read by gen-hash.
#[derive(Parser, Debug)]
#[command(name = "pack-reference", author, version, about)]
struct Args {
    /// Input FASTA (all records are concatenated)
    input: PathBuf,

    /// Output packed reference
    output: PathBuf,

    /// Handling of non-ACGT bases: a|c|g|t|random|break
    #[arg(short, long, default_value = "a")]
    policy: Policy,
}

fn run(args: &Args) -> Result<()> {
    let reader = File::open(&args.input)
        .map(BufReader::new)
        .with_context(|| format!("Error opening FASTA file \"{}\"", args.input.display()))?;
    let writer = File::create(&args.output)
        .map(BufWriter::new)
        .with_context(|| format!("Error creating \"{}\"", args.output.display()))?;

    let bases = pack_fasta(reader, writer, args.policy)?;
    info!(bases, policy = ?args.policy, "packed reference");
    eprintln!(
        "Packed {} bases into {} bytes",
        bases,
        bases.div_ceil(genhash::BASES_PER_BYTE as u64)
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
