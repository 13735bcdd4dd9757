//! Fault injection tests - encoder, actuator and export failures

mod common;

use belt_velocity_control::{
    ControlLoop, ControllerConfig, Error, FaultKind, RunState, SimulatedBelt, SimulationConfig,
    TickOutcome, Transition,
};
use common::{p_only, rig, CollectingSink, MotorCall, RecordingMotor, ScriptedEncoder};

fn running_rig(ticks: usize) -> common::Rig {
    let mut r = rig(p_only(2.0), 1.0);
    r.control.notify_start().unwrap();
    for _ in 0..ticks {
        r.control.on_tick();
    }
    r
}

// ============================================================================
// ENCODER FAILURES
// ============================================================================

#[test]
fn test_encoder_failure_skips_tick_without_touching_state() {
    let mut r = running_rig(3);
    let velocity = r.control.estimator().velocity();
    let position = r.control.estimator().previous_position();
    let measurement = r.control.pid().previous_measurement();
    let calls = r.motor.calls().len();

    r.encoder.fail_next(1);
    assert_eq!(r.control.on_tick(), TickOutcome::Skipped);

    assert_eq!(r.control.estimator().velocity(), velocity);
    assert_eq!(r.control.estimator().previous_position(), position);
    assert_eq!(r.control.pid().previous_measurement(), measurement);
    assert_eq!(r.motor.calls().len(), calls, "no command on a skipped tick");
    assert_eq!(r.control.recorder().len(), 3);
    assert_eq!(r.control.consecutive_failures(), 1);
    assert!(r.control.is_running());

    assert!(matches!(r.control.on_tick(), TickOutcome::Applied(_)));
    assert_eq!(r.control.consecutive_failures(), 0);
    assert_eq!(r.control.recorder().len(), 4);

    let faults = r.control.faults().read_all();
    assert_eq!(faults.len(), 1);
    assert!(matches!(faults[0].kind, FaultKind::Encoder(_)));
}

#[test]
fn test_consecutive_failures_force_a_stop() {
    let mut r = running_rig(10);
    r.encoder.fail_next(5);

    for _ in 0..4 {
        assert_eq!(r.control.on_tick(), TickOutcome::Skipped);
    }
    assert_eq!(r.control.on_tick(), TickOutcome::ForcedStop);

    assert_eq!(r.control.run_state(), RunState::Idle);
    assert_eq!(r.motor.calls().last(), Some(&MotorCall::Stop));
    assert_eq!(r.sink.exports(), 1);
    assert_eq!(r.sink.last().unwrap().len(), 10);

    let faults = r.control.faults().read_all();
    assert!(faults.iter().any(|f| f.kind
        == FaultKind::ForcedStop {
            consecutive_failures: 5
        }));

    let report = r.control.metrics().report();
    assert_eq!(report.io_failures, 5);
    assert_eq!(report.forced_stops, 1);

    assert_eq!(r.control.on_tick(), TickOutcome::Idle);
    assert_eq!(r.sink.exports(), 1, "forced stop must flush exactly once");
}

#[test]
fn test_success_resets_the_failure_streak() {
    let mut r = running_rig(1);

    r.encoder.fail_next(4);
    for _ in 0..4 {
        assert_eq!(r.control.on_tick(), TickOutcome::Skipped);
    }
    assert!(matches!(r.control.on_tick(), TickOutcome::Applied(_)));

    r.encoder.fail_next(4);
    for _ in 0..4 {
        assert_eq!(r.control.on_tick(), TickOutcome::Skipped);
    }
    assert!(r.control.is_running());
    assert_eq!(r.control.metrics().io_failures(), 8);
}

#[test]
fn test_forced_stop_threshold_is_configurable() {
    let config = ControllerConfig {
        max_consecutive_io_failures: 1,
        ..p_only(2.0)
    };
    let mut r = rig(config, 1.0);
    r.control.notify_start().unwrap();
    r.encoder.fail_next(1);
    assert_eq!(r.control.on_tick(), TickOutcome::ForcedStop);
}

// ============================================================================
// ACTUATOR FAILURES
// ============================================================================

#[test]
fn test_actuator_failure_is_counted_and_not_recorded() {
    let mut r = running_rig(2);
    r.motor.state.lock().fail_set_voltage = 1;

    assert_eq!(r.control.on_tick(), TickOutcome::Skipped);
    assert_eq!(r.control.recorder().len(), 2);
    assert_eq!(r.control.consecutive_failures(), 1);

    let faults = r.control.faults().read_all();
    assert!(matches!(faults[0].kind, FaultKind::Actuator(_)));

    assert!(matches!(r.control.on_tick(), TickOutcome::Applied(_)));
    assert_eq!(r.control.consecutive_failures(), 0);
}

#[test]
fn test_mixed_failures_share_one_streak() {
    let mut r = running_rig(1);
    r.encoder.fail_next(3);
    for _ in 0..3 {
        r.control.on_tick();
    }
    r.motor.state.lock().fail_set_voltage = 2;
    assert_eq!(r.control.on_tick(), TickOutcome::Skipped);
    assert_eq!(r.control.on_tick(), TickOutcome::ForcedStop);
}

// ============================================================================
// LIFECYCLE FAILURES
// ============================================================================

#[test]
fn test_failed_encoder_reset_keeps_loop_idle() {
    let mut r = rig(p_only(2.0), 1.0);
    r.encoder.state.lock().fail_reset = true;

    let err = r.control.notify_start().unwrap_err();
    assert!(matches!(err, Error::Encoder(_)));
    assert_eq!(r.control.run_state(), RunState::Idle);
    assert_eq!(r.motor.calls(), vec![MotorCall::Stop]);
    assert_eq!(r.control.on_tick(), TickOutcome::Idle);
}

#[test]
fn test_failed_motor_on_keeps_loop_idle() {
    let mut r = rig(p_only(2.0), 1.0);
    r.motor.state.lock().fail_on = true;

    let err = r.control.notify_start().unwrap_err();
    assert!(matches!(err, Error::Actuator(_)));
    assert!(!r.control.is_running());
    assert_eq!(r.motor.calls(), vec![MotorCall::Stop]);

    r.motor.state.lock().fail_on = false;
    assert_eq!(r.control.notify_start().unwrap(), Transition::Started);
}

#[test]
fn test_export_failure_still_stops() {
    let motor = RecordingMotor::default();
    let sink = CollectingSink {
        fail: true,
        ..CollectingSink::default()
    };
    let mut control =
        ControlLoop::new(p_only(2.0), ScriptedEncoder::with_step(1.0), motor.clone(), sink)
            .unwrap();

    control.notify_start().unwrap();
    control.on_tick();
    assert_eq!(control.notify_stop(), Transition::Stopped);
    assert_eq!(control.run_state(), RunState::Idle);
    assert_eq!(motor.calls().last(), Some(&MotorCall::Stop));

    let faults = control.faults().read_all();
    assert!(matches!(faults.last().unwrap().kind, FaultKind::Export(_)));
}

// ============================================================================
// SIMULATED BELT FAILURES
// ============================================================================

#[test]
fn test_dead_simulated_encoder_forces_stop() {
    let belt = SimulatedBelt::new(&SimulationConfig {
        failure_rate: 1.0,
        ..SimulationConfig::default()
    });
    let mut control = ControlLoop::new(
        ControllerConfig::default(),
        belt.encoder(),
        belt.motor(),
        CollectingSink::default(),
    )
    .unwrap();

    control.notify_start().unwrap();
    let outcomes: Vec<_> = (0..5).map(|_| control.on_tick()).collect();
    assert_eq!(outcomes[..4], [TickOutcome::Skipped; 4]);
    assert_eq!(outcomes[4], TickOutcome::ForcedStop);
    assert!(!belt.is_energized());
}
