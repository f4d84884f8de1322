//! Native error observer

use tracing::warn;

use super::error::NativeApiError;
use crate::gl::GlApi;
use crate::gl::consts::NO_ERROR;

/// Queries the native error flag after each call and reports what it finds.
///
/// Errors are only counted and logged; they never stop playback.
#[derive(Debug, Default, Clone)]
pub struct ErrorObserver {
    checks: u64,
    errors: u64,
}

impl ErrorObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check for an error raised by `call`. Must not be called between
    /// glBegin and glEnd.
    pub fn check(
        &mut self,
        api: &mut dyn GlApi,
        call_no: u64,
        call: &str,
    ) -> Option<NativeApiError> {
        self.checks += 1;
        let code = api.get_error();
        if code == NO_ERROR {
            return None;
        }

        let error = NativeApiError {
            call_no,
            call: call.to_string(),
            code,
        };
        warn!("{}", error);
        self.errors += 1;
        Some(error)
    }

    pub fn checks(&self) -> u64 {
        self.checks
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }
}
