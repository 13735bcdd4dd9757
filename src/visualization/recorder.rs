use serde::{Deserialize, Serialize};

use crate::actuator::{ActuationCommand, PidActions, PidGains};
use crate::config::ControllerConfig;

/// One log entry, appended once per applied tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub velocity: f64,
    pub command: f64,
    pub actions: PidActions,
}

impl TickRecord {
    pub fn new(velocity: f64, output: &ActuationCommand) -> Self {
        Self {
            velocity,
            command: output.command,
            actions: output.actions,
        }
    }
}

/// Parameters a recorded run was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub gains: PidGains,
    pub reference_velocity: f64,
    pub sample_interval: f64,
    pub command_limit: f64,
}

impl RunMetadata {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            gains: PidGains {
                kp: config.kp,
                ki: config.ki,
                kd: config.kd,
            },
            reference_velocity: config.reference_velocity,
            sample_interval: config.sample_interval,
            command_limit: config.command_limit,
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Kp = {:.3} Ki = {:.3} Kd = {:.3} Refvel = {:.1} mm/s",
            self.gains.kp, self.gains.ki, self.gains.kd, self.reference_velocity
        )
    }
}

/// A complete run, handed off once at the Running -> Idle edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub metadata: RunMetadata,
    pub records: Vec<TickRecord>,
}

impl RunLog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sample time of record `index`, in seconds since the run started.
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 * self.metadata.sample_interval
    }

    pub fn velocities(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.velocity)
    }
}

/// Append-only, single-writer log of the active run.
pub struct RunRecorder {
    metadata: RunMetadata,
    records: Vec<TickRecord>,
}

impl RunRecorder {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, record: TickRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Moves the recorded run out, leaving the recorder empty.
    pub fn take(&mut self) -> RunLog {
        let capacity = self.records.capacity();
        RunLog {
            metadata: self.metadata,
            records: std::mem::replace(&mut self.records, Vec::with_capacity(capacity)),
        }
    }
}
