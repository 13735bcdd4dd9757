//! Control module - The owning context for one belt controller
//!
//! [`ControlLoop`] holds everything the periodic tick and the start/stop
//! handlers touch: run state, velocity filter, PID memory, the encoder and
//! motor handles, and the run recorder. All mutators take `&mut self`, so
//! a tick can never observe a half-applied transition. The threaded and
//! async runtimes move the context into a single controller thread and
//! feed it through one command queue.

pub mod cycle;
pub mod lifecycle;

pub use cycle::TickOutcome;
pub use lifecycle::{RunState, Transition};

use crate::actuator::{Motor, PIDController};
use crate::config::ControllerConfig;
use crate::error::Result;
use crate::ipc::{FaultLog, StatusBoard};
use crate::metrics::TimingMetrics;
use crate::sensor::{Encoder, VelocityEstimator};
use crate::visualization::{RunMetadata, RunRecorder, RunSink};

pub struct ControlLoop<E, M, S> {
    config: ControllerConfig,
    state: RunState,
    estimator: VelocityEstimator,
    pid: PIDController,
    encoder: E,
    motor: M,
    recorder: RunRecorder,
    sink: S,
    consecutive_failures: u32,
    run_ticks: u64,
    runs_completed: u64,
    metrics: TimingMetrics,
    faults: FaultLog,
    status: StatusBoard,
}

impl<E: Encoder, M: Motor, S: RunSink> ControlLoop<E, M, S> {
    /// Validates `config` and builds an idle controller with zeroed state.
    pub fn new(config: ControllerConfig, encoder: E, motor: M, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RunState::Idle,
            estimator: VelocityEstimator::new(config.filter_alpha, config.sample_interval),
            pid: PIDController::from_config(&config),
            recorder: RunRecorder::new(RunMetadata::from_config(&config)),
            encoder,
            motor,
            sink,
            consecutive_failures: 0,
            run_ticks: 0,
            runs_completed: 0,
            metrics: TimingMetrics::new(),
            faults: FaultLog::default(),
            status: StatusBoard::new(),
            config,
        })
    }

    pub fn with_metrics(mut self, metrics: TimingMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_fault_log(mut self, faults: FaultLog) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_status_board(mut self, status: StatusBoard) -> Self {
        self.status = status;
        self
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn estimator(&self) -> &VelocityEstimator {
        &self.estimator
    }

    pub fn pid(&self) -> &PIDController {
        &self.pid
    }

    pub fn recorder(&self) -> &RunRecorder {
        &self.recorder
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn metrics(&self) -> &TimingMetrics {
        &self.metrics
    }

    pub fn faults(&self) -> &FaultLog {
        &self.faults
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed
    }
}
