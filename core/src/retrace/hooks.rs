//! Replay policy hooks
//!
//! Call-specific behavior attached to call table entries. Each entry has at
//! most one [`PreHook`], run before arguments are materialized, and one
//! [`PostHook`], run after the native routine (or in its place, for calls
//! the table has no routine for).

use super::dispatch::SkipReason;
use super::materialize::Arg;
use super::state::ReplayState;
use crate::gl::GlApi;
use crate::gl::consts::ARRAY_BUFFER_BINDING;
use crate::host::Host;

/// Hooks that run before the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreHook {
    /// Skip draws that would read client memory instead of a bound buffer.
    BufferBindingGuard,
    /// Close the begin/end span before glEnd is issued.
    EndPrimitive,
}

/// Hooks that run after the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostHook {
    /// Track the surface size a viewport implies.
    WindowGrowth,
    /// Open the begin/end span once glBegin has been issued.
    BeginPrimitive,
    /// Frame boundary on flush when single-buffered.
    FlushBoundary,
    /// Replay a window-system buffer swap with the host's own.
    SwapBoundary,
}

/// Outcome of a pre-invocation hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreDecision {
    Proceed,
    Skip(SkipReason),
}

impl PreHook {
    pub fn run(self, state: &mut ReplayState, api: &mut dyn GlApi) -> PreDecision {
        match self {
            PreHook::BufferBindingGuard => {
                if api.get_integer(ARRAY_BUFFER_BINDING) == 0 {
                    PreDecision::Skip(SkipReason::NoBufferBound)
                } else {
                    PreDecision::Proceed
                }
            }
            PreHook::EndPrimitive => {
                state.inside_begin_end = false;
                PreDecision::Proceed
            }
        }
    }
}

impl PostHook {
    pub fn run(
        self,
        args: &[Arg],
        state: &mut ReplayState,
        api: &mut dyn GlApi,
        host: &mut dyn Host,
    ) {
        match self {
            PostHook::WindowGrowth => {
                if let [Arg::Int(x), Arg::Int(y), Arg::Int(width), Arg::Int(height)] = args {
                    state.grow_window(*x, *y, *width, *height);
                }
            }
            PostHook::BeginPrimitive => {
                state.inside_begin_end = true;
            }
            PostHook::FlushBoundary => {
                if !state.double_buffered() {
                    state.complete_frame();
                }
            }
            PostHook::SwapBoundary => {
                if state.double_buffered() {
                    host.present();
                } else {
                    api.flush();
                }
                state.complete_frame();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::SoftGl;
    use crate::gl::consts::ARRAY_BUFFER;
    use crate::host::HeadlessHost;

    #[test]
    fn test_buffer_binding_guard() {
        let mut state = ReplayState::new(256, 256, false);
        let mut gl = SoftGl::new();
        assert_eq!(
            PreHook::BufferBindingGuard.run(&mut state, &mut gl),
            PreDecision::Skip(SkipReason::NoBufferBound)
        );

        gl.bind_buffer(ARRAY_BUFFER, 3);
        assert_eq!(
            PreHook::BufferBindingGuard.run(&mut state, &mut gl),
            PreDecision::Proceed
        );
    }

    #[test]
    fn test_begin_end_gate() {
        let mut state = ReplayState::new(256, 256, false);
        let mut gl = SoftGl::new();
        let mut host = HeadlessHost::new(256, 256);

        PostHook::BeginPrimitive.run(&[], &mut state, &mut gl, &mut host);
        assert!(state.inside_begin_end());
        PreHook::EndPrimitive.run(&mut state, &mut gl);
        assert!(!state.inside_begin_end());
    }

    #[test]
    fn test_window_growth() {
        let mut state = ReplayState::new(256, 256, false);
        let mut gl = SoftGl::new();
        let mut host = HeadlessHost::new(256, 256);
        let args = [Arg::Int(0), Arg::Int(0), Arg::Int(512), Arg::Int(300)];

        PostHook::WindowGrowth.run(&args, &mut state, &mut gl, &mut host);
        assert_eq!(state.window_size(), (512, 300));
        assert!(state.reshape_pending());
        // Resizing is left to the driver
        assert!(host.resizes().is_empty());
    }

    #[test]
    fn test_flush_boundary_single_buffered_only() {
        let mut gl = SoftGl::new();
        let mut host = HeadlessHost::new(256, 256);

        let mut single = ReplayState::new(256, 256, false);
        PostHook::FlushBoundary.run(&[], &mut single, &mut gl, &mut host);
        assert_eq!(single.frame_count(), 1);

        let mut double = ReplayState::new(256, 256, true);
        PostHook::FlushBoundary.run(&[], &mut double, &mut gl, &mut host);
        assert_eq!(double.frame_count(), 0);
    }

    #[test]
    fn test_swap_boundary() {
        let mut gl = SoftGl::new();
        let mut host = HeadlessHost::new(256, 256);

        let mut double = ReplayState::new(256, 256, true);
        PostHook::SwapBoundary.run(&[], &mut double, &mut gl, &mut host);
        assert_eq!(host.presents(), 1);
        assert_eq!(gl.stats().flushes, 0);
        assert_eq!(double.frame_count(), 1);

        let mut single = ReplayState::new(256, 256, false);
        PostHook::SwapBoundary.run(&[], &mut single, &mut gl, &mut host);
        assert_eq!(host.presents(), 1);
        assert_eq!(gl.stats().flushes, 1);
        assert_eq!(single.frame_count(), 1);
    }
}
