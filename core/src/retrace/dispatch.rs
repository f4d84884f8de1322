//! Call dispatcher
//!
//! Every call goes through the same fixed sequence:
//!
//! 1. pre-invocation hook (may decide to skip the native call)
//! 2. argument materialization
//! 3. native invocation, unless skipped
//! 4. post-invocation hook
//! 5. error check, unless inside glBegin/glEnd
//!
//! A materialization failure aborts the call after step 2; its error is still
//! checked so a failure left behind by an earlier call is not misattributed.
//! When the aborted call is a `glEnd`, the gate it cleared is re-armed and the
//! check is skipped: the native context never left the primitive.

use hashbrown::HashSet;
use serde::Serialize;
use tracing::{info, trace, warn};

use super::error::UnsupportedCallError;
use super::hooks::PreDecision;
use super::materialize::Materializer;
use super::observer::ErrorObserver;
use super::state::ReplayState;
use super::table::{self, CallTable, Target};
use crate::gl::GlApi;
use crate::host::Host;
use crate::trace::CallRecord;

/// Why a call was not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkipReason {
    /// A draw call with no buffer object bound
    NoBufferBound,
    /// No call table entry for the name
    Unsupported,
    /// An argument could not be materialized
    Materialization,
}

/// Per-call dispatch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    Executed,
    Skipped(SkipReason),
}

/// Running totals kept by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub calls: u64,
    pub executed: u64,
    pub skipped: u64,
    pub gl_errors: u64,
}

pub struct Dispatcher {
    table: CallTable,
    materializer: Materializer,
    observer: ErrorObserver,
    unsupported: HashSet<String>,
    verbosity: u8,
    stats: DispatchStats,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Dispatcher {
    /// Create a dispatcher. Verbosity 1 and above logs every call.
    pub fn new(verbosity: u8) -> Self {
        Self {
            table: CallTable::new(),
            materializer: Materializer::new(),
            observer: ErrorObserver::new(),
            unsupported: HashSet::new(),
            verbosity,
            stats: DispatchStats::default(),
        }
    }

    pub fn table(&self) -> &CallTable {
        &self.table
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            gl_errors: self.observer.errors(),
            ..self.stats
        }
    }

    /// Replay one call record.
    pub fn dispatch(
        &mut self,
        record: &CallRecord,
        state: &mut ReplayState,
        api: &mut dyn GlApi,
        host: &mut dyn Host,
    ) -> DispatchOutcome {
        self.stats.calls += 1;
        let call_no = self.stats.calls;
        if self.verbosity >= 1 {
            info!(target: "retrace::calls", "{} {}", call_no, record);
        }

        let Some(entry) = self.table.lookup(&record.name).copied() else {
            self.warn_unsupported(&record.name);
            self.observe(call_no, &record.name, state, api);
            return self.finish(DispatchOutcome::Skipped(SkipReason::Unsupported));
        };

        let gated = state.inside_begin_end();
        let mut outcome = DispatchOutcome::Executed;
        if let Some(pre) = entry.pre {
            if let PreDecision::Skip(reason) = pre.run(state, api) {
                trace!("{} {}: skipped ({:?})", call_no, record.name, reason);
                outcome = DispatchOutcome::Skipped(reason);
            }
        }

        let params = entry.params();
        let args = match entry.target {
            Target::Gl(_) => match self
                .materializer
                .materialize_all(&record.name, params, &record.args)
            {
                Ok(args) => args,
                Err(e) => {
                    warn!("call #{}: {}", call_no, e);
                    state.inside_begin_end = gated;
                    self.observe(call_no, &record.name, state, api);
                    return self.finish(DispatchOutcome::Skipped(SkipReason::Materialization));
                }
            },
            Target::WindowSystem => Default::default(),
        };

        if let (Target::Gl(id), DispatchOutcome::Executed) = (entry.target, outcome) {
            match table::invoke(id, api, &args) {
                Ok(Some(generated)) => {
                    self.materializer.bind_generated(params, &args, &generated);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("call #{}: {}", call_no, e);
                    state.inside_begin_end = gated;
                    outcome = DispatchOutcome::Skipped(SkipReason::Materialization);
                }
            }
        }

        if let Some(post) = entry.post {
            post.run(&args, state, api, host);
        }

        self.observe(call_no, &record.name, state, api);
        self.finish(outcome)
    }

    fn observe(&mut self, call_no: u64, name: &str, state: &ReplayState, api: &mut dyn GlApi) {
        if !state.inside_begin_end() {
            self.observer.check(api, call_no, name);
        }
    }

    fn warn_unsupported(&mut self, name: &str) {
        if !self.unsupported.contains(name) {
            warn!("{}", UnsupportedCallError { name: name.to_string() });
            self.unsupported.insert(name.to_string());
        }
    }

    fn finish(&mut self, outcome: DispatchOutcome) -> DispatchOutcome {
        match outcome {
            DispatchOutcome::Executed => self.stats.executed += 1,
            DispatchOutcome::Skipped(_) => self.stats.skipped += 1,
        }
        outcome
    }
}
