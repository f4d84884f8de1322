//! Call replay engine
//!
//! - [`materialize`]: serialized values to native arguments
//! - [`table`]: call name to native routine, with policy hooks attached
//! - [`hooks`]: buffer-binding guard, window growth, begin/end gate, frame
//!   boundaries
//! - [`dispatch`]: the per-call pipeline
//! - [`observer`]: native error checks
//! - [`driver`]: the playback state machine

pub mod dispatch;
pub mod driver;
mod error;
pub mod hooks;
pub mod materialize;
pub mod observer;
mod report;
mod state;
pub mod table;

pub use dispatch::{DispatchOutcome, DispatchStats, Dispatcher, SkipReason};
pub use driver::{Phase, Playback, PlaybackOptions, Step};
pub use error::{MaterializationError, NativeApiError, UnsupportedCallError};
pub use hooks::{PostHook, PreHook};
pub use materialize::{Arg, HandleKind, HandleMap, Materializer, Param, ParamKind};
pub use observer::ErrorObserver;
pub use report::{PlaybackReport, reports_to_json};
pub use state::ReplayState;
pub use table::{CallEntry, CallId, CallTable, Target};
