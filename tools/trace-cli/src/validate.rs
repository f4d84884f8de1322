//! Validate a trace against the replay call table without running it

use anyhow::{Context, Result};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use retrace_core::retrace::{CallTable, Materializer, Target};
use retrace_core::trace::{self, CallSource};

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Trace file (.trace or .toml)
    pub trace: PathBuf,
}

/// What validation found.
#[derive(Debug, Default)]
pub struct Validation {
    pub calls: u64,
    /// Unsupported call names and how often each occurs
    pub unsupported: BTreeMap<String, u64>,
    /// Calls whose arguments fail to materialize, as `(call number, message)`
    pub failures: Vec<(u64, String)>,
}

/// Execute the validate command
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("Validating trace: {}", args.trace.display());

    let mut source = trace::open(&args.trace)
        .with_context(|| format!("Failed to open trace: {}", args.trace.display()))?;
    let validation = validate(&mut source)?;

    println!();
    println!("=== Trace Summary ===");
    println!("Calls: {}", validation.calls);
    println!("Unsupported names: {}", validation.unsupported.len());

    if !validation.unsupported.is_empty() {
        println!();
        println!("=== Unsupported Calls (skipped on replay) ===");
        for (name, count) in &validation.unsupported {
            println!("  {} x{}", name, count);
        }
    }

    if validation.failures.is_empty() {
        println!();
        println!("All supported calls materialize correctly.");
    } else {
        println!();
        println!("=== Materialization Errors ===");
        for (call_no, message) in &validation.failures {
            println!("  call #{}: {}", call_no, message);
        }
        anyhow::bail!("{} call(s) failed to materialize", validation.failures.len());
    }

    Ok(())
}

/// Resolve and materialize every call of a trace.
pub fn validate(source: &mut dyn CallSource) -> Result<Validation> {
    let table = CallTable::new();
    let materializer = Materializer::new();
    let mut validation = Validation::default();

    while let Some(record) = source
        .next_call()
        .with_context(|| format!("Failed to read call #{}", validation.calls + 1))?
    {
        validation.calls += 1;
        let Some(entry) = table.lookup(&record.name) else {
            *validation.unsupported.entry(record.name).or_default() += 1;
            continue;
        };
        if let Target::Gl(_) = entry.target {
            if let Err(e) = materializer.materialize_all(&record.name, entry.params(), &record.args)
            {
                validation.failures.push((validation.calls, e.to_string()));
            }
        }
    }

    Ok(validation)
}
