//! Shared test utilities for integration and unit tests

use crate::gl::SoftGl;
use crate::gl::consts::*;
use crate::host::HeadlessHost;
use crate::retrace::table::SWAP_CALLS;
use crate::retrace::{DispatchOutcome, Dispatcher, ReplayState};
use crate::trace::{CallRecord, Value};

// ============================================================================
// Trace building
// ============================================================================

pub fn call(name: &str, args: Vec<Value>) -> CallRecord {
    CallRecord::new(name, args)
}

pub fn uint(v: u32) -> Value {
    Value::UInt(u64::from(v))
}

pub fn int(v: i64) -> Value {
    Value::SInt(v)
}

pub fn float(v: f32) -> Value {
    Value::Float(v)
}

/// A two-frame scene mixing immediate mode, buffer-backed draws, an unbound
/// draw, an unsupported call and a viewport that outgrows the window.
pub fn sample_scene() -> Vec<CallRecord> {
    let quad: Vec<u8> = [0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();

    let mut frame = vec![
        call("glViewport", vec![int(0), int(0), int(320), int(240)]),
        call("glClearColor", vec![float(0.1), float(0.2), float(0.3), float(1.0)]),
        call("glClear", vec![uint(COLOR_BUFFER_BIT | DEPTH_BUFFER_BIT)]),
        call("glMatrixMode", vec![uint(PROJECTION)]),
        call("glLoadIdentity", vec![]),
        call(
            "glOrtho",
            vec![
                Value::Double(0.0),
                Value::Double(1.0),
                Value::Double(0.0),
                Value::Double(1.0),
                Value::Double(-1.0),
                Value::Double(1.0),
            ],
        ),
        call("glMatrixMode", vec![uint(MODELVIEW)]),
        call("glBegin", vec![uint(TRIANGLES)]),
        call("glColor3f", vec![float(1.0), float(0.0), float(0.0)]),
        call("glVertex2f", vec![float(0.0), float(0.0)]),
        call("glVertex2f", vec![float(1.0), float(0.0)]),
        call("glVertex2f", vec![float(0.0), float(1.0)]),
        call("glEnd", vec![]),
        // Client-memory draw: skipped by the guard
        call("glEnableClientState", vec![uint(VERTEX_ARRAY)]),
        call("glVertexPointer", vec![int(2), uint(FLOAT), int(0), Value::Pointer(0x7fff_0000)]),
        call("glDrawArrays", vec![uint(TRIANGLE_FAN), int(0), int(4)]),
        // Buffer-backed draw
        call("glGenBuffers", vec![int(1), Value::Array(vec![uint(9)])]),
        call("glBindBuffer", vec![uint(ARRAY_BUFFER), uint(9)]),
        call("glBufferData", vec![uint(ARRAY_BUFFER), int(quad.len() as i64), Value::Blob(quad), uint(STATIC_DRAW)]),
        call("glVertexPointer", vec![int(2), uint(FLOAT), int(0), Value::Null]),
        call("glDrawArrays", vec![uint(TRIANGLE_FAN), int(0), int(4)]),
        call("glBindBuffer", vec![uint(ARRAY_BUFFER), uint(0)]),
        call("glDisableClientState", vec![uint(VERTEX_ARRAY)]),
        call("glXQueryDrawable", vec![Value::Pointer(0x1), uint(2)]),
        call("glFlush", vec![]),
    ];

    let mut second = frame.clone();
    second[0] = call("glViewport", vec![int(0), int(0), int(512), int(300)]);
    second.push(call("glXSwapBuffers", vec![Value::Pointer(0x1), uint(2)]));
    frame.extend(second);
    frame
}

/// Frame boundaries a trace should produce, counted from call names alone.
pub fn count_frame_boundaries(records: &[CallRecord], double_buffered: bool) -> u64 {
    records
        .iter()
        .filter(|record| {
            SWAP_CALLS.contains(&record.name.as_str())
                || (!double_buffered && record.name == "glFlush")
        })
        .count() as u64
}

// ============================================================================
// Instrumented dispatch
// ============================================================================

/// Per-call observations from [`dispatch_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
    pub name: String,
    pub outcome: DispatchOutcome,
    /// Gate state once the call has been dispatched
    pub inside_begin_end: bool,
    pub window_size: (u32, u32),
    /// Native entry points this call reached, in order
    pub native_calls: Vec<&'static str>,
}

/// Result of [`dispatch_all`].
pub struct Dispatched {
    pub observed: Vec<Observed>,
    pub state: ReplayState,
    pub gl: SoftGl,
    pub host: HeadlessHost,
}

/// Dispatch every record against fresh state, recording what each call did.
pub fn dispatch_all(records: &[CallRecord], double_buffered: bool) -> Dispatched {
    let mut dispatcher = Dispatcher::new(0);
    let mut state = ReplayState::new(256, 256, double_buffered);
    let mut gl = SoftGl::with_call_log();
    let mut host = HeadlessHost::new(256, 256);

    let mut observed = Vec::with_capacity(records.len());
    for record in records {
        let before = gl.call_log().len();
        let outcome = dispatcher.dispatch(record, &mut state, &mut gl, &mut host);
        observed.push(Observed {
            name: record.name.clone(),
            outcome,
            inside_begin_end: state.inside_begin_end(),
            window_size: state.window_size(),
            native_calls: gl.call_log()[before..].to_vec(),
        });
    }

    Dispatched {
        observed,
        state,
        gl,
        host,
    }
}
