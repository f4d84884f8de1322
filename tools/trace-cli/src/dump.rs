//! Print the calls of a trace

use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

use retrace_core::trace::{self, CallSource};

/// Arguments for the dump command
#[derive(Args)]
pub struct DumpArgs {
    /// Trace file (.trace or .toml)
    pub trace: PathBuf,

    /// Stop after this many calls
    #[arg(short = 'n', long)]
    pub limit: Option<u64>,
}

/// Execute the dump command
pub fn execute(args: DumpArgs) -> Result<()> {
    let mut source = trace::open(&args.trace)
        .with_context(|| format!("Failed to open trace: {}", args.trace.display()))?;
    let stdout = std::io::stdout();
    dump(&mut source, args.limit, &mut stdout.lock())?;
    Ok(())
}

/// Write one `N glName(args)` line per call, returning the number written.
pub fn dump(
    source: &mut dyn CallSource,
    limit: Option<u64>,
    out: &mut dyn Write,
) -> Result<u64> {
    let mut call_no = 0u64;
    while limit.is_none_or(|limit| call_no < limit) {
        let Some(record) = source
            .next_call()
            .with_context(|| format!("Failed to read call #{}", call_no + 1))?
        else {
            break;
        };
        call_no += 1;
        writeln!(out, "{} {}", call_no, record)?;
    }
    Ok(call_no)
}
