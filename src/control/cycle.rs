use super::{ControlLoop, RunState};
use crate::actuator::{ActuationCommand, Motor};
use crate::error::Error;
use crate::ipc::FaultKind;
use crate::sensor::Encoder;
use crate::visualization::{RunSink, TickRecord};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not running; nothing was read, computed or written.
    Idle,
    Applied(ActuationCommand),
    /// A transient encoder or actuator failure skipped this tick.
    Skipped,
    /// Too many consecutive failures; the loop stopped itself.
    ForcedStop,
}

#[derive(Debug, Clone, Copy)]
enum IoSource {
    Encoder,
    Actuator,
}

impl<E: Encoder, M: Motor, S: RunSink> ControlLoop<E, M, S> {
    /// One sampling period: read, estimate, control, actuate, record.
    ///
    /// Never fails. Transient I/O errors are counted and skip the tick;
    /// `max_consecutive_io_failures` of them in a row force a stop.
    pub fn on_tick(&mut self) -> TickOutcome {
        if self.state != RunState::Running {
            return TickOutcome::Idle;
        }

        let position = match self.encoder.position() {
            Ok(position) => position,
            Err(e) => return self.tick_failed(IoSource::Encoder, e),
        };

        let velocity = self.estimator.update(position);
        let output = self.pid.compute_output(velocity);

        if let Err(e) = self.motor.set_voltage(output.command) {
            return self.tick_failed(IoSource::Actuator, e);
        }

        self.consecutive_failures = 0;
        self.recorder.append(TickRecord::new(velocity, &output));
        self.run_ticks += 1;

        let run_ticks = self.run_ticks;
        self.status.update(|s| {
            s.run_ticks = run_ticks;
            s.position = position;
            s.velocity = velocity;
            s.command = output.command;
        });

        tracing::trace!(
            tick = run_ticks,
            position,
            velocity,
            command = output.command,
            p = output.actions.p,
            i = output.actions.i,
            d = output.actions.d,
            "tick applied"
        );

        TickOutcome::Applied(output)
    }

    fn tick_failed(&mut self, source: IoSource, error: Error) -> TickOutcome {
        self.consecutive_failures += 1;
        self.metrics.record_io_failure();

        let message = error.to_string();
        tracing::warn!(
            ?source,
            error = %message,
            consecutive = self.consecutive_failures,
            "tick skipped after I/O failure"
        );
        self.faults.write(match source {
            IoSource::Encoder => FaultKind::Encoder(message),
            IoSource::Actuator => FaultKind::Actuator(message),
        });

        let limit = self.config.max_consecutive_io_failures;
        if self.consecutive_failures >= limit {
            tracing::error!(
                consecutive = self.consecutive_failures,
                "too many consecutive I/O failures, forcing stop"
            );
            self.faults.write(FaultKind::ForcedStop {
                consecutive_failures: self.consecutive_failures,
            });
            self.metrics.record_forced_stop();
            self.notify_stop();
            return TickOutcome::ForcedStop;
        }

        TickOutcome::Skipped
    }
}
