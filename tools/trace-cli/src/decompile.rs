//! Decompile a binary trace to the text format

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use retrace_core::trace::{CallSource, TraceReader, TraceScript};

/// Arguments for the decompile command
#[derive(Args)]
pub struct DecompileArgs {
    /// Input binary trace (.trace)
    pub input: PathBuf,

    /// Output text trace (.toml)
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Execute the decompile command
pub fn execute(args: DecompileArgs) -> Result<()> {
    println!(
        "Decompiling: {} -> {}",
        args.input.display(),
        args.output.display()
    );

    let calls = decompile(&args.input, &args.output)?;

    println!();
    println!("=== Decompilation Complete ===");
    println!("Calls: {}", calls);

    Ok(())
}

/// Decompile `input` into `output`, returning the number of calls written.
///
/// Unlike playback, a damaged trace is an error here rather than an early end.
pub fn decompile(input: &Path, output: &Path) -> Result<usize> {
    let mut reader = TraceReader::open(input)
        .with_context(|| format!("Failed to open trace: {}", input.display()))?;

    let mut records = Vec::new();
    while let Some(record) = reader
        .next_call()
        .with_context(|| format!("Failed to read call #{}", records.len() + 1))?
    {
        records.push(record);
    }

    let text = TraceScript::from_records(&records)
        .to_toml_string()
        .context("Failed to serialize to TOML")?;
    std::fs::write(output, text)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    Ok(records.len())
}
