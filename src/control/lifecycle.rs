use std::fmt;

use super::ControlLoop;
use crate::actuator::Motor;
use crate::error::Result;
use crate::ipc::FaultKind;
use crate::sensor::Encoder;
use crate::visualization::RunSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::Running => write!(f, "Running"),
        }
    }
}

/// Effect of a start or stop event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
    /// Start while running or stop while idle.
    Ignored,
}

impl<E: Encoder, M: Motor, S: RunSink> ControlLoop<E, M, S> {
    /// Idle -> Running.
    ///
    /// Clears the run log, resets filter and PID memory, re-zeroes the
    /// encoder and energizes the motor, in that order, before the state
    /// flips. If the encoder or motor refuses, the motor is stopped again
    /// and the loop stays idle.
    pub fn notify_start(&mut self) -> Result<Transition> {
        if self.state == RunState::Running {
            tracing::debug!("start ignored, already running");
            return Ok(Transition::Ignored);
        }

        self.recorder.clear();
        self.estimator.reset();
        self.pid.reset();
        self.consecutive_failures = 0;
        self.run_ticks = 0;

        if let Err(e) = self.energize() {
            tracing::error!(error = %e, "start failed, staying idle");
            if let Err(stop_err) = self.motor.stop() {
                tracing::error!(error = %stop_err, "motor stop after failed start also failed");
            }
            return Err(e);
        }

        self.state = RunState::Running;
        self.status.update(|s| {
            s.run_state = RunState::Running;
            s.run_ticks = 0;
            s.position = 0.0;
            s.velocity = 0.0;
            s.command = 0.0;
        });
        tracing::info!(
            reference = self.pid.reference(),
            run = self.runs_completed + 1,
            "Starting"
        );
        Ok(Transition::Started)
    }

    fn energize(&mut self) -> Result<()> {
        self.encoder.reset_position()?;
        self.motor.on()
    }

    /// Running -> Idle.
    ///
    /// De-energizes the motor, flips the state and hands the recorded run
    /// to the sink once. A motor that refuses to stop is reported but does
    /// not keep the loop running.
    pub fn notify_stop(&mut self) -> Transition {
        if self.state != RunState::Running {
            tracing::debug!("stop ignored, already idle");
            return Transition::Ignored;
        }

        if let Err(e) = self.motor.stop() {
            tracing::error!(error = %e, "motor stop failed");
            self.faults.write(FaultKind::Actuator(e.to_string()));
        }

        self.state = RunState::Idle;
        self.runs_completed += 1;
        let runs_completed = self.runs_completed;
        self.status.update(|s| {
            s.run_state = RunState::Idle;
            s.runs_completed = runs_completed;
        });

        let run = self.recorder.take();
        tracing::info!(ticks = run.len(), run = runs_completed, "Stopping");
        if let Err(e) = self.sink.export(run) {
            tracing::error!(error = %e, "run export failed");
            self.faults.write(FaultKind::Export(e.to_string()));
        }

        Transition::Stopped
    }

    /// Final stop before the controller goes away.
    pub fn shutdown(&mut self) -> Transition {
        self.notify_stop()
    }
}
