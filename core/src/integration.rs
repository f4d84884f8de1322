//! Integration tests for the replay engine
//!
//! Whole traces through the driver, dispatcher, hooks and reference backend.

use crate::gl::SoftGl;
use crate::gl::consts::*;
use crate::host::HeadlessHost;
use crate::retrace::{
    DispatchOutcome, Phase, Playback, PlaybackOptions, PlaybackReport, SkipReason, Step,
};
use crate::test_utils::*;
use crate::trace::{self, CallQueue, CallRecord, TraceFlags, TraceScript, TraceWriter};

fn play(records: Vec<CallRecord>, double_buffered: bool) -> (PlaybackReport, SoftGl, HeadlessHost) {
    let options = PlaybackOptions {
        double_buffered,
        ..Default::default()
    };
    let mut playback = Playback::new(CallQueue::new(records), options);
    let mut gl = SoftGl::with_call_log();
    let mut host = HeadlessHost::new(256, 256);
    let report = playback.run_to_end(&mut gl, &mut host);
    (report, gl, host)
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_frame_count_matches_boundaries() {
    let scene = sample_scene();
    for double_buffered in [false, true] {
        let (report, _, host) = play(scene.clone(), double_buffered);
        assert_eq!(
            report.frames,
            count_frame_boundaries(&scene, double_buffered),
            "double_buffered = {}",
            double_buffered
        );
        if double_buffered {
            assert_eq!(host.presents(), 1);
        }
    }
}

#[test]
fn test_buffer_guard_property() {
    let scene = sample_scene();
    let run = dispatch_all(&scene, false);
    let mut bound = false;
    let mut guarded = 0;
    for (record, observed) in scene.iter().zip(&run.observed) {
        if record.name == "glBindBuffer" {
            bound = record.args[1] != uint(0);
        }
        if record.name == "glDrawArrays" {
            guarded += 1;
            if bound {
                assert_eq!(observed.outcome, DispatchOutcome::Executed);
                assert!(observed.native_calls.contains(&"glDrawArrays"));
            } else {
                assert_eq!(
                    observed.outcome,
                    DispatchOutcome::Skipped(SkipReason::NoBufferBound)
                );
                assert!(!observed.native_calls.contains(&"glDrawArrays"));
            }
        }
    }
    assert_eq!(guarded, 4);
    assert_eq!(run.gl.stats().draw_calls, 2);
}

#[test]
fn test_no_error_query_inside_begin_end() {
    let run = dispatch_all(&sample_scene(), false);
    let mut inside = false;
    for observed in &run.observed {
        match observed.name.as_str() {
            "glBegin" => {
                assert!(observed.inside_begin_end);
                inside = true;
            }
            "glEnd" => {
                assert!(!observed.inside_begin_end);
                inside = false;
            }
            _ => assert_eq!(observed.inside_begin_end, inside, "{}", observed.name),
        }
        let queried = observed.native_calls.contains(&"glGetError");
        assert_eq!(queried, !observed.inside_begin_end, "{}", observed.name);
    }
    // Two flushes plus the swap replayed as a flush
    assert_eq!(run.state.frame_count(), 3);
}

#[test]
fn test_window_never_shrinks() {
    let mut scene = sample_scene();
    scene.push(call("glViewport", vec![int(0), int(0), int(64), int(64)]));
    let run = dispatch_all(&scene, false);

    let sizes: Vec<_> = run.observed.iter().map(|o| o.window_size).collect();
    for pair in sizes.windows(2) {
        assert!(pair[1].0 >= pair[0].0 && pair[1].1 >= pair[0].1);
    }
    assert_eq!(run.state.window_size(), (512, 300));
}

#[test]
fn test_replay_is_idempotent() {
    let first = dispatch_all(&sample_scene(), false);
    let second = dispatch_all(&sample_scene(), false);

    let outcomes = |run: &Dispatched| -> Vec<DispatchOutcome> {
        run.observed.iter().map(|o| o.outcome).collect()
    };
    assert_eq!(outcomes(&first), outcomes(&second));
    assert_eq!(first.state.frame_count(), second.state.frame_count());
}

#[test]
fn test_unsupported_and_generated_names_in_scene() {
    let run = dispatch_all(&sample_scene(), false);
    let unsupported: Vec<_> = run
        .observed
        .iter()
        .filter(|o| o.outcome == DispatchOutcome::Skipped(SkipReason::Unsupported))
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(unsupported, vec!["glXQueryDrawable", "glXQueryDrawable"]);

    // Recorded buffer 9 maps to the names handed out at replay time
    assert_eq!(run.gl.buffer_contents(1).map(<[u8]>::len), Some(32));
    assert_eq!(run.gl.buffer_contents(2).map(<[u8]>::len), Some(32));
    assert!(run.gl.buffer_contents(9).is_none());
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_viewport_scenario_resizes_at_frame_boundary() {
    let records = vec![
        call("glViewport", vec![int(0), int(0), int(512), int(300)]),
        call("glFlush", vec![]),
    ];
    let mut playback = Playback::new(CallQueue::new(records), PlaybackOptions::default());
    let mut gl = SoftGl::new();
    let mut host = HeadlessHost::new(256, 256);

    assert_eq!(playback.display(&mut gl, &mut host), Step::FrameBoundary);
    assert!(playback.state().reshape_pending());
    assert_eq!(host.size(), (256, 256));

    playback.idle(&mut host);
    assert!(!playback.state().reshape_pending());
    assert_eq!(playback.state().window_size(), (512, 300));
    assert_eq!(host.size(), (512, 300));
    assert_eq!(host.resizes(), &[(512, 300)]);
}

#[test]
fn test_viewport_scenario_without_flush() {
    let records = vec![call("glViewport", vec![int(0), int(0), int(512), int(300)])];
    let run = dispatch_all(&records, false);
    assert!(run.state.reshape_pending());
    assert_eq!(run.state.window_size(), (512, 300));
}

#[test]
fn test_unbound_draw_scenario() {
    let records = vec![call("glDrawArrays", vec![uint(TRIANGLES), int(0), int(3)])];
    let run = dispatch_all(&records, false);

    assert_eq!(run.observed.len(), 1);
    assert_eq!(
        run.observed[0].outcome,
        DispatchOutcome::Skipped(SkipReason::NoBufferBound)
    );
    assert!(!run.gl.call_log().contains(&"glDrawArrays"));
    assert_eq!(run.gl.stats().draw_calls, 0);
}

#[test]
fn test_flush_scenario() {
    const N: usize = 7;
    let records = vec![call("glFlush", vec![]); N];
    let (report, _, _) = play(records, false);
    assert_eq!(report.frames, N as u64);
    assert_eq!(report.executed, N as u64);
}

#[test]
fn test_double_buffered_flushes_are_not_frames() {
    let records = vec![call("glFlush", vec![]); 3];
    let (report, _, _) = play(records, true);
    assert_eq!(report.frames, 0);
}

// ============================================================================
// End to end through trace files
// ============================================================================

#[test]
fn test_binary_trace_file_playback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.trace");
    let file = std::fs::File::create(&path).unwrap();
    TraceWriter::new(file, TraceFlags::COMPRESSED)
        .write_trace(&sample_scene())
        .unwrap();

    let source = trace::open(&path).unwrap();
    let mut playback = Playback::new(source, PlaybackOptions::default());
    let report = playback.run_to_end(&mut SoftGl::new(), &mut HeadlessHost::new(256, 256));

    assert_eq!(playback.phase(), Phase::Finished);
    assert_eq!(report.frames, 3);
    assert_eq!(report.calls, sample_scene().len() as u64);
    assert_eq!((report.window_width, report.window_height), (512, 300));
    assert_eq!(report.gl_errors, 0);
}

#[test]
fn test_text_trace_file_playback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.toml");
    let text = TraceScript::from_records(&sample_scene())
        .to_toml_string()
        .unwrap();
    std::fs::write(&path, text).unwrap();

    let source = trace::open(&path).unwrap();
    let mut playback = Playback::new(source, PlaybackOptions::default());
    let report = playback.run_to_end(&mut SoftGl::new(), &mut HeadlessHost::new(256, 256));

    assert_eq!(report.frames, 3);
    assert_eq!(report.skipped, 4);
    assert_eq!(report.gl_errors, 0);
}
