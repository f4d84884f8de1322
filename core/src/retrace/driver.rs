//! Playback driver
//!
//! Drives one trace through the dispatcher in the cooperative style of a
//! host event loop:
//!
//! ```text
//! Idle -> Running -> (FrameBoundary <-> Running) -> Finished
//! ```
//!
//! The host calls [`Playback::display`] when it is ready to draw; that runs
//! calls until a frame boundary or the end of the trace. On a boundary the
//! host calls [`Playback::idle`], which applies a pending resize and asks for
//! the next redraw.

use tracing::{debug, warn};

use super::dispatch::Dispatcher;
use super::report::PlaybackReport;
use super::state::ReplayState;
use crate::gl::GlApi;
use crate::host::Host;
use crate::trace::CallSource;

/// Playback settings fixed for the lifetime of one trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub trace_name: String,
    pub double_buffered: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub verbosity: u8,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            trace_name: "trace".to_string(),
            double_buffered: false,
            window_width: 256,
            window_height: 256,
            verbosity: 0,
        }
    }
}

/// Driver phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    FrameBoundary,
    Finished,
}

/// Result of one display pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// A frame completed; yield to the host.
    FrameBoundary,
    /// The trace ended.
    Finished(PlaybackReport),
}

/// Playback of a single trace.
pub struct Playback<S: CallSource> {
    source: Option<S>,
    state: ReplayState,
    dispatcher: Dispatcher,
    phase: Phase,
    trace_name: String,
    report: Option<PlaybackReport>,
}

impl<S: CallSource> Playback<S> {
    pub fn new(source: S, options: PlaybackOptions) -> Self {
        Self {
            source: Some(source),
            state: ReplayState::new(
                options.window_width,
                options.window_height,
                options.double_buffered,
            ),
            dispatcher: Dispatcher::new(options.verbosity),
            phase: Phase::Idle,
            trace_name: options.trace_name,
            report: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &ReplayState {
        &self.state
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn trace_name(&self) -> &str {
        &self.trace_name
    }

    /// The final report, once finished.
    pub fn report(&self) -> Option<&PlaybackReport> {
        self.report.as_ref()
    }

    /// Run calls until the next frame boundary or the end of the trace.
    pub fn display(&mut self, api: &mut dyn GlApi, host: &mut dyn Host) -> Step {
        if let Some(report) = &self.report {
            return Step::Finished(report.clone());
        }
        self.phase = Phase::Running;

        while let Some(record) = self.next_record() {
            self.dispatcher.dispatch(&record, &mut self.state, api, host);
            if self.state.take_frame_boundary() {
                self.phase = Phase::FrameBoundary;
                return Step::FrameBoundary;
            }
        }

        Step::Finished(self.finish(api))
    }

    /// Handle the yield after a frame boundary: apply a pending resize and
    /// request the next display pass. Does nothing while running or once
    /// finished.
    pub fn idle(&mut self, host: &mut dyn Host) {
        if !matches!(self.phase, Phase::Idle | Phase::FrameBoundary) {
            return;
        }
        if let Some((width, height)) = self.state.take_reshape() {
            debug!("Resizing window to {}x{}", width, height);
            host.resize(width, height);
        }
        host.request_redraw();
        self.phase = Phase::Running;
    }

    /// Play the whole trace without an external event loop.
    pub fn run_to_end(&mut self, api: &mut dyn GlApi, host: &mut dyn Host) -> PlaybackReport {
        loop {
            match self.display(api, host) {
                Step::FrameBoundary => self.idle(host),
                Step::Finished(report) => return report,
            }
        }
    }

    /// Pull the next record. Decoding errors end the trace early.
    fn next_record(&mut self) -> Option<crate::trace::CallRecord> {
        let source = self.source.as_mut()?;
        match source.next_call() {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "{}: {} after call #{}; treating as end of trace",
                    self.trace_name,
                    e,
                    self.dispatcher.stats().calls
                );
                None
            }
        }
    }

    fn finish(&mut self, api: &mut dyn GlApi) -> PlaybackReport {
        api.flush();
        // Release the trace as soon as it is exhausted
        self.source = None;

        let elapsed_secs = self.state.elapsed().as_secs_f64();
        let frames = self.state.frame_count();
        let stats = self.dispatcher.stats();
        let (window_width, window_height) = self.state.window_size();
        let report = PlaybackReport {
            trace: self.trace_name.clone(),
            frames,
            elapsed_secs,
            fps: PlaybackReport::fps_for(frames, elapsed_secs),
            calls: stats.calls,
            executed: stats.executed,
            skipped: stats.skipped,
            gl_errors: stats.gl_errors,
            window_width,
            window_height,
        };
        debug!("{}: {}", self.trace_name, report);

        self.phase = Phase::Finished;
        self.report = Some(report.clone());
        report
    }
}
