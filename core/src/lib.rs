//! Retrace Core - GL call replay engine
//!
//! Replays recorded OpenGL call traces against a live implementation,
//! reproducing the recorded program's rendering for debugging, regression
//! testing and performance measurement.
//!
//! # Architecture
//!
//! - [`trace`] - Call records and the sources that decode them
//! - [`retrace`] - Argument materialization, call table, policy hooks,
//!   dispatcher, error observer and the playback driver
//! - [`gl`] - The native API surface ([`GlApi`]) and a state-tracking
//!   software implementation ([`SoftGl`])
//! - [`host`] - The window-system collaborator ([`Host`])
//! - [`config`] - Persistent replay settings

pub mod config;
pub mod gl;
pub mod host;
#[cfg(test)]
mod integration;
pub mod retrace;
#[cfg(test)]
pub mod test_utils;
pub mod trace;

pub use config::{ConfigError, ReplayConfig};
pub use gl::{GlApi, SoftGl};
pub use host::{HeadlessHost, Host};
pub use retrace::{
    DispatchOutcome, Dispatcher, MaterializationError, NativeApiError, Playback, PlaybackOptions,
    PlaybackReport, SkipReason, Step, UnsupportedCallError,
};
pub use trace::{CallRecord, CallSource, ParseError, Value};
