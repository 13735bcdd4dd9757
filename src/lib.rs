//! Closed-loop velocity control for a motor-driven conveyor belt.
//!
//! A periodic tick samples the belt encoder, a low-pass filter turns
//! positions into a velocity estimate, and a PID law drives the motor
//! toward a fixed reference. Operator start/stop events and ticks are
//! serialized through one command queue into a single controller thread.

pub mod actuator;
pub mod async_impl;
pub mod config;
pub mod control;
pub mod error;
pub mod ipc;
pub mod metrics;
pub mod plant;
pub mod sensor;
pub mod threaded_impl;
pub mod visualization;

pub use actuator::{ActuationCommand, Motor, PIDController, PidActions, PidGains};
pub use config::{ControllerConfig, RuntimeConfig, SimulationConfig, SystemConfig, TimerKind};
pub use control::{ControlLoop, RunState, TickOutcome, Transition};
pub use error::{Error, Result};
pub use ipc::{ControlChannels, ControlCommand, FaultKind, FaultLog, OperatorHandle, StatusBoard};
pub use metrics::{DeadlineMonitor, MetricsReport, MissCause, TimingMetrics};
pub use plant::{SimulatedBelt, SimulatedEncoder, SimulatedMotor};
pub use sensor::{Encoder, VelocityEstimator};
pub use visualization::{
    ChannelSink, PlotExporter, RunLog, RunMetadata, RunRecorder, RunSink, StepResponse,
    SummarySink, TickRecord,
};
