//! Replay state
//!
//! Owned by the playback driver and handed by reference to the dispatcher,
//! which mutates it only through policy hooks.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ReplayState {
    pub(crate) frame_count: u64,
    pub(crate) inside_begin_end: bool,
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) reshape_pending: bool,
    pub(crate) frame_boundary: bool,
    start_time: Instant,
    double_buffered: bool,
}

impl ReplayState {
    pub fn new(window_width: u32, window_height: u32, double_buffered: bool) -> Self {
        Self {
            frame_count: 0,
            inside_begin_end: false,
            window_width,
            window_height,
            reshape_pending: false,
            frame_boundary: false,
            start_time: Instant::now(),
            double_buffered,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn inside_begin_end(&self) -> bool {
        self.inside_begin_end
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn reshape_pending(&self) -> bool {
        self.reshape_pending
    }

    pub fn double_buffered(&self) -> bool {
        self.double_buffered
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Count a completed frame and ask the driver to yield.
    pub(crate) fn complete_frame(&mut self) {
        self.frame_count += 1;
        self.frame_boundary = true;
    }

    /// Consume the boundary signal raised by the last dispatch.
    pub(crate) fn take_frame_boundary(&mut self) -> bool {
        std::mem::take(&mut self.frame_boundary)
    }

    /// Consume a pending reshape, returning the size to resize to.
    pub(crate) fn take_reshape(&mut self) -> Option<(u32, u32)> {
        if std::mem::take(&mut self.reshape_pending) {
            Some(self.window_size())
        } else {
            None
        }
    }

    /// Grow the tracked surface to cover `x + width` by `y + height`.
    pub(crate) fn grow_window(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let right = i64::from(x) + i64::from(width);
        let top = i64::from(y) + i64::from(height);
        if right > i64::from(self.window_width) {
            self.window_width = clamp_dimension(right);
            self.reshape_pending = true;
        }
        if top > i64::from(self.window_height) {
            self.window_height = clamp_dimension(top);
            self.reshape_pending = true;
        }
    }
}

fn clamp_dimension(extent: i64) -> u32 {
    u32::try_from(extent).unwrap_or(u32::MAX)
}
