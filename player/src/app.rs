//! Windowed playback
//!
//! A winit application that plays the traces of one run in order. Each
//! `RedrawRequested` runs the driver until the next frame boundary; the
//! `about_to_wait` pass that follows applies any pending resize and asks for
//! the next redraw.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use retrace_core::retrace::{Playback, PlaybackReport, Step};
use retrace_core::trace::CallSource;
use retrace_core::{Host, SoftGl};

use crate::RunSettings;
use crate::graphics::SurfacePresenter;

/// [`Host`] backed by the replay window.
///
/// Buffer swaps are recorded and shown once the frame boundary is reached,
/// when the clear color of the finished frame is known.
struct WindowHost<'a> {
    window: &'a Window,
    presenter: &'a mut SurfacePresenter,
    swapped: bool,
}

impl Host for WindowHost<'_> {
    fn request_redraw(&mut self) {
        self.window.request_redraw();
    }

    fn resize(&mut self, width: u32, height: u32) {
        // The window manager may refuse; the surface follows whatever size
        // the window actually gets through `WindowEvent::Resized`.
        let _ = self
            .window
            .request_inner_size(PhysicalSize::new(width, height));
        self.presenter.resize(width, height);
    }

    fn present(&mut self) {
        self.swapped = true;
    }
}

/// Whether a finished frame reaches the window. A double-buffered trace only
/// shows frames it swapped; a single-buffered one shows every frame.
fn shows_frame(double_buffered: bool, swapped: bool) -> bool {
    !double_buffered || swapped
}

/// The trace currently playing, with its own GL state.
struct ActiveTrace {
    playback: Playback<Box<dyn CallSource>>,
    gl: SoftGl,
}

struct ReplayApp {
    settings: RunSettings,
    pending: VecDeque<PathBuf>,
    active: Option<ActiveTrace>,
    window: Option<Arc<Window>>,
    presenter: Option<SurfacePresenter>,
    reports: Vec<PlaybackReport>,
    error: Option<anyhow::Error>,
}

impl ReplayApp {
    fn new(settings: RunSettings) -> Self {
        Self {
            pending: settings.traces.iter().cloned().collect(),
            settings,
            active: None,
            window: None,
            presenter: None,
            reports: Vec::new(),
            error: None,
        }
    }

    /// Record a fatal error and stop the event loop.
    fn fail(&mut self, error: anyhow::Error, event_loop: &ActiveEventLoop) {
        tracing::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    /// Open the next trace, or exit once every trace has played.
    fn start_next(&mut self, event_loop: &ActiveEventLoop) {
        let Some(path) = self.pending.pop_front() else {
            event_loop.exit();
            return;
        };
        match self.settings.open(&path) {
            Ok(playback) => {
                self.active = Some(ActiveTrace {
                    playback,
                    gl: SoftGl::new(),
                });
            }
            Err(e) => self.fail(e, event_loop),
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.settings.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );
        let presenter = SurfacePresenter::new(window.clone())?;
        self.window = Some(window);
        self.presenter = Some(presenter);
        Ok(())
    }

    fn display(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(presenter), Some(active)) =
            (&self.window, &mut self.presenter, &mut self.active)
        else {
            return;
        };

        let mut host = WindowHost {
            window,
            presenter: &mut *presenter,
            swapped: false,
        };
        let step = active.playback.display(&mut active.gl, &mut host);
        let swapped = host.swapped;

        match step {
            Step::FrameBoundary => {
                if !shows_frame(self.settings.double_buffered, swapped) {
                    return;
                }
                if let Err(e) = presenter.present(active.gl.clear_color_value()) {
                    tracing::error!("Present error: {:#}", e);
                }
            }
            Step::Finished(report) => {
                println!("{}", report);
                tracing::debug!("{} frames presented", presenter.presents());
                self.reports.push(report);
                self.active = None;
                self.start_next(event_loop);
            }
        }
    }

    fn idle(&mut self) {
        let (Some(window), Some(presenter), Some(active)) =
            (&self.window, &mut self.presenter, &mut self.active)
        else {
            return;
        };
        let mut host = WindowHost {
            window,
            presenter,
            swapped: false,
        };
        active.playback.idle(&mut host);
    }

    fn into_reports(self) -> Result<Vec<PlaybackReport>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.reports),
        }
    }
}

impl ApplicationHandler for ReplayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fail(e.context("Failed to initialize window"), event_loop);
            return;
        }
        self.start_next(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.display(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.idle();
    }
}

/// Play every trace of the run in one window.
pub fn run(settings: RunSettings) -> Result<Vec<PlaybackReport>> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ReplayApp::new(settings);
    event_loop
        .run_app(&mut app)
        .context("Event loop error")?;
    app.into_reports()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shows_frame() {
        assert!(shows_frame(false, false));
        assert!(shows_frame(false, true));
        assert!(shows_frame(true, true));
        assert!(!shows_frame(true, false));
    }
}
