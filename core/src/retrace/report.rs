//! Playback report types and serialization

use serde::Serialize;
use std::fmt;

/// Summary of one finished trace playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackReport {
    /// Trace file name
    pub trace: String,
    /// Frames completed (flushes on single-buffered, swaps on double-buffered)
    pub frames: u64,
    /// Wall-clock seconds since playback started
    pub elapsed_secs: f64,
    /// Average frames per second, 0 when no time elapsed
    pub fps: f64,
    /// Call records dispatched
    pub calls: u64,
    pub executed: u64,
    pub skipped: u64,
    /// Errors reported by the native error check
    pub gl_errors: u64,
    /// Final surface size
    pub window_width: u32,
    pub window_height: u32,
}

impl PlaybackReport {
    pub fn fps_for(frames: u64, elapsed_secs: f64) -> f64 {
        if elapsed_secs > 0.0 {
            frames as f64 / elapsed_secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for PlaybackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rendered {} frames in {:.6} secs, average of {:.6} fps",
            self.frames, self.elapsed_secs, self.fps
        )
    }
}

/// Serialize the reports of a run as a JSON array.
pub fn reports_to_json(reports: &[PlaybackReport]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(reports)
}
