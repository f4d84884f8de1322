//! glretrace - OpenGL trace player
//!
//! Replays one or more recorded call traces, in order, and prints a summary
//! line for each.
//!
//! # Usage
//!
//! ```bash
//! glretrace scene.trace
//! glretrace --db scene.trace other.trace
//! glretrace -vv scene.toml
//! glretrace --headless --report report.json scene.trace
//! ```

mod app;
mod graphics;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use retrace_core::config::{self, ReplayConfig};
use retrace_core::retrace::{Playback, PlaybackOptions, PlaybackReport, reports_to_json};
use retrace_core::trace::{self, CallSource};
use retrace_core::{HeadlessHost, SoftGl};

#[derive(Parser, Debug)]
#[command(name = "glretrace")]
#[command(author, version, about = "Replay recorded OpenGL call traces")]
struct Args {
    /// Trace files to play, in order (.trace or .toml)
    #[arg(required = true, value_name = "TRACE")]
    traces: Vec<PathBuf>,

    /// Replay against a double-buffered surface (swaps end frames)
    #[arg(long = "double-buffer", short = 'd', visible_alias = "db")]
    double_buffer: bool,

    /// Increase verbosity (-v dumps every call, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Play without opening a window
    #[arg(long)]
    headless: bool,

    /// Write the playback reports of this run as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Settings shared by every trace of one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub traces: Vec<PathBuf>,
    pub double_buffered: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    pub verbosity: u8,
}

impl RunSettings {
    /// Merge command-line flags over the loaded configuration.
    fn resolve(args: &Args, config: &ReplayConfig) -> Self {
        Self {
            traces: args.traces.clone(),
            double_buffered: args.double_buffer || config.playback.double_buffer,
            window_width: config.window.width.max(1),
            window_height: config.window.height.max(1),
            title: config.window.title.clone(),
            verbosity: args.verbose,
        }
    }

    pub fn playback_options(&self, path: &Path) -> PlaybackOptions {
        PlaybackOptions {
            trace_name: trace_name(path),
            double_buffered: self.double_buffered,
            window_width: self.window_width,
            window_height: self.window_height,
            verbosity: self.verbosity,
        }
    }

    /// Open a trace for playback. Failing to open is fatal for the run.
    pub fn open(&self, path: &Path) -> Result<Playback<Box<dyn CallSource>>> {
        let source = trace::open(path)
            .with_context(|| format!("Failed to open trace: {}", path.display()))?;
        tracing::info!("Playing {}", path.display());
        Ok(Playback::new(source, self.playback_options(path)))
    }
}

fn trace_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 | 1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter(verbosity))),
        )
        .init();
}

/// Play every trace without a window.
fn run_headless(settings: &RunSettings) -> Result<Vec<PlaybackReport>> {
    let mut reports = Vec::with_capacity(settings.traces.len());
    for path in &settings.traces {
        let mut playback = settings.open(path)?;
        let mut gl = SoftGl::new();
        let mut host = HeadlessHost::new(settings.window_width, settings.window_height);
        let report = playback.run_to_end(&mut gl, &mut host);
        println!("{}", report);
        reports.push(report);
    }
    Ok(reports)
}

fn write_report(path: &Path, reports: &[PlaybackReport]) -> Result<()> {
    let json = reports_to_json(reports).context("Failed to serialize playback report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => config::load(),
    };
    let settings = RunSettings::resolve(&args, &config);

    let reports = if args.headless {
        run_headless(&settings)?
    } else {
        app::run(settings)?
    };

    if let Some(path) = &args.report {
        write_report(path, &reports)?;
    }

    Ok(())
}
