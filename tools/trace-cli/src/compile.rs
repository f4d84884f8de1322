//! Compile a text trace to the binary format

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use retrace_core::trace::{TraceFlags, TraceScript, TraceWriter};

/// Arguments for the compile command
#[derive(Args)]
pub struct CompileArgs {
    /// Input text trace (.toml)
    pub input: PathBuf,

    /// Output binary trace (.trace)
    #[arg(short, long)]
    pub output: PathBuf,

    /// LZ4-compress the call body
    #[arg(long)]
    pub compress: bool,
}

/// Execute the compile command
pub fn execute(args: CompileArgs) -> Result<()> {
    println!(
        "Compiling: {} -> {}",
        args.input.display(),
        args.output.display()
    );

    let calls = compile(&args.input, &args.output, args.compress)?;

    println!();
    println!("=== Compilation Complete ===");
    println!("Calls: {}", calls);
    println!("Compressed: {}", args.compress);

    Ok(())
}

/// Compile `input` into `output`, returning the number of calls written.
pub fn compile(input: &Path, output: &Path, compress: bool) -> Result<usize> {
    let script = TraceScript::from_file(input)
        .with_context(|| format!("Failed to parse trace: {}", input.display()))?;
    let records = script
        .into_records()
        .with_context(|| format!("Invalid call in trace: {}", input.display()))?;

    let flags = if compress {
        TraceFlags::COMPRESSED
    } else {
        TraceFlags::empty()
    };

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    TraceWriter::new(BufWriter::new(file), flags)
        .write_trace(&records)
        .context("Failed to write binary trace")?;

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core::trace::{CallSource, TraceReader, Value};

    const SCRIPT: &str = r#"
[[call]]
name = "glClearColor"
args = [0.0, 0.5, 1.0, 1.0]

[[call]]
name = "glVertexPointer"
args = [2, "uint:5126", 0, "ptr:0x10"]

[[call]]
name = "glFlush"
args = []
"#;

    #[test]
    fn test_compile_text_trace() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.toml");
        let output = dir.path().join("scene.trace");
        std::fs::write(&input, SCRIPT).unwrap();

        assert_eq!(compile(&input, &output, true).unwrap(), 3);

        let mut reader = TraceReader::open(&output).unwrap();
        assert!(reader.header().flags.contains(TraceFlags::COMPRESSED));
        assert_eq!(reader.header().call_count, 3);

        let first = reader.next_call().unwrap().unwrap();
        assert_eq!(first.name, "glClearColor");
        let second = reader.next_call().unwrap().unwrap();
        assert_eq!(second.args[1], Value::UInt(5126));
        assert_eq!(second.args[3], Value::Pointer(0x10));
        assert_eq!(reader.next_call().unwrap().unwrap().name, "glFlush");
        assert!(reader.next_call().unwrap().is_none());
    }

    #[test]
    fn test_compile_rejects_bad_script() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.toml");
        std::fs::write(&input, "[[call]]\nargs = []\n").unwrap();
        assert!(compile(&input, &dir.path().join("out.trace"), false).is_err());
    }
}
