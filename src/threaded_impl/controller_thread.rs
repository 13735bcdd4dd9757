use crossbeam::channel::Receiver;
use std::thread;
use std::time::Instant;

use crate::actuator::Motor;
use crate::control::{ControlLoop, TickOutcome};
use crate::ipc::channels::ControlCommand;
use crate::metrics::DeadlineMonitor;
use crate::sensor::Encoder;
use crate::visualization::RunSink;

/// Runs the controller as the single consumer of the command queue.
///
/// Ticks and start/stop events are handled strictly in arrival order, one
/// at a time, so each is a critical section over the run state, filter and
/// PID memory. The thread ends on `Shutdown` or when every sender is gone,
/// stopping the motor first, and hands the context back through `join`.
pub fn spawn_controller_thread<E, M, S>(
    mut control: ControlLoop<E, M, S>,
    rx: Receiver<ControlCommand>,
    monitor: DeadlineMonitor,
) -> std::io::Result<thread::JoinHandle<ControlLoop<E, M, S>>>
where
    E: Encoder + 'static,
    M: Motor + 'static,
    S: RunSink + 'static,
{
    thread::Builder::new()
        .name("belt-controller".to_string())
        .spawn(move || {
            loop {
                match rx.recv() {
                    Ok(ControlCommand::Tick { scheduled }) => {
                        let started = Instant::now();
                        let latency = started.saturating_duration_since(scheduled);
                        match control.on_tick() {
                            TickOutcome::Idle => monitor.tick_idle(latency),
                            _ => monitor.tick_done(latency, started.elapsed()),
                        }
                    }
                    Ok(ControlCommand::Start) => {
                        // A failed start is reported by the lifecycle and leaves the loop idle
                        let _ = control.notify_start();
                    }
                    Ok(ControlCommand::Stop) => {
                        control.notify_stop();
                    }
                    Ok(ControlCommand::Shutdown) | Err(_) => {
                        control.shutdown();
                        tracing::debug!("controller thread shutting down");
                        break;
                    }
                }
            }
            control
        })
}
