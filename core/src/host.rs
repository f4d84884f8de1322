//! Window-system host
//!
//! The playback driver talks to the host event loop only through [`Host`]:
//! it asks for a redraw when a frame boundary has been handled, resizes the
//! surface when the trace needs more room, and presents the back buffer when
//! a buffer swap is replayed on a double-buffered surface.

/// Host event loop collaborator.
pub trait Host {
    /// Schedule another display pass.
    fn request_redraw(&mut self);

    /// Resize the drawable surface.
    fn resize(&mut self, width: u32, height: u32);

    /// Present the back buffer.
    fn present(&mut self);
}

/// Host without a window, for batch runs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessHost {
    width: u32,
    height: u32,
    presents: u64,
    redraws: u64,
    resizes: Vec<(u32, u32)>,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Every resize requested so far, in order.
    pub fn resizes(&self) -> &[(u32, u32)] {
        &self.resizes
    }
}

impl Host for HeadlessHost {
    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn resize(&mut self, width: u32, height: u32) {
        tracing::debug!("Resizing headless surface to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.resizes.push((width, height));
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}
