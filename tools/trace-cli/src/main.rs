//! gltrace - Offline utilities for OpenGL call traces
//!
//! # Commands
//!
//! - `gltrace compile` - Compile a text trace (.toml) to the binary format
//! - `gltrace decompile` - Decompile a binary trace to an editable text trace
//! - `gltrace dump` - Print every call of a trace, numbered
//! - `gltrace validate` - Check every call against the replay call table
//!
//! # Usage
//!
//! ```bash
//! gltrace compile scene.toml -o scene.trace --compress
//! gltrace decompile scene.trace -o scene.toml
//! gltrace dump scene.trace
//! gltrace validate scene.trace
//! ```

mod compile;
mod decompile;
mod dump;
mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// gltrace - Offline utilities for OpenGL call traces
#[derive(Parser)]
#[command(name = "gltrace")]
#[command(about = "Offline utilities for OpenGL call traces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a text trace (.toml) to the binary format
    Compile(compile::CompileArgs),

    /// Decompile a binary trace to a text trace
    Decompile(decompile::DecompileArgs),

    /// Print every call of a trace
    Dump(dump::DumpArgs),

    /// Check every call against the replay call table
    Validate(validate::ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile(args) => compile::execute(args),
        Commands::Decompile(args) => decompile::execute(args),
        Commands::Dump(args) => dump::execute(args),
        Commands::Validate(args) => validate::execute(args),
    }
}
