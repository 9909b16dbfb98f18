use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use genhash::{IndexBuilder, IndexConfig, MappedReference, DEFAULT_NUM_BLOCKS};
use tracing_subscriber::EnvFilter;

/// Build the 12-mer prefix index (offsets + postings tables) of a packed reference.
#[derive(Parser, Debug)]
#[command(name = "gen-hash", author, version, about)]
struct Args {
    /// Packed binary reference sequence (4 bases per byte, no header)
    reference: PathBuf,

    /// Number of key-space partitions (power of two); lower peak memory with more
    #[arg(short, long, default_value_t = DEFAULT_NUM_BLOCKS)]
    blocks: u32,

    /// Directory receiving hash_table1.bin and hash_table2.bin
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Offsets table path (overrides --output-dir)
    #[arg(long)]
    offsets: Option<PathBuf>,

    /// Postings table path (overrides --output-dir)
    #[arg(long)]
    postings: Option<PathBuf>,

    /// Append the total postings count as a final offsets entry
    #[arg(long, default_value_t = false)]
    terminator: bool,

    /// Log progress (honours RUST_LOG)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all logging
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(args: &Args) {
    let filter = if args.quiet {
        EnvFilter::new("off")
    } else if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

const USAGE: &str = "usage: gen-hash <reference-genome>\n\
     <reference-genome> is the name of a packed binary reference sequence.";

/// Validates the configuration and maps the reference
fn setup(args: &Args) -> Result<(IndexBuilder, MappedReference)> {
    let mut config = IndexConfig::default()
        .num_blocks(args.blocks)
        .output_dir(&args.output_dir)
        .terminator(args.terminator);
    if let Some(path) = &args.offsets {
        config = config.offsets_path(path);
    }
    if let Some(path) = &args.postings {
        config = config.postings_path(path);
    }
    let builder = IndexBuilder::new(&config)?;

    let reference = MappedReference::open(&args.reference).with_context(|| {
        format!(
            "Error opening reference file \"{}\"",
            args.reference.display()
        )
    })?;
    Ok((builder, reference))
}

fn run(builder: &IndexBuilder, reference: &MappedReference) -> Result<()> {
    let summary = builder
        .build(&reference.view())
        .context("Error building the index")?;
    eprintln!(
        "Indexed {} bytes: {} postings over {} blocks ({} offsets entries)",
        reference.len(),
        summary.total_postings,
        summary.num_blocks,
        summary.offsets_entries
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are not failures
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(&args);

    let (builder, reference) = match setup(&args) {
        Ok(ready) => ready,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    match run(&builder, &reference) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
