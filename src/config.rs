// Configuration loading and validation
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const MIN_SAMPLE_INTERVAL: f64 = 1e-6;

// ============================================================================
// CONTROLLER CONFIG - Fixed for the lifetime of the control loop
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub kp: f64,
    /// Integral gain, applied as `ki * integral` (gain form). Zero disables the I-term.
    pub ki: f64,
    pub kd: f64,
    /// Belt velocity setpoint in mm/s.
    pub reference_velocity: f64,
    /// Seconds between ticks. Used verbatim by the derivative and integral math.
    pub sample_interval: f64,
    /// Low-pass coefficient in (0, 1). Smaller is smoother with more lag.
    pub filter_alpha: f64,
    /// Symmetric actuator bound in DAC units.
    pub command_limit: f64,
    pub anti_windup: bool,
    /// Consecutive transient encoder/actuator failures that force a stop.
    pub max_consecutive_io_failures: u32,
    /// Consecutive deadline misses that raise the miss report to an error.
    pub deadline_miss_alarm: u32,
    pub queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            kp: 3.0,
            ki: 20.0,
            kd: 0.0,
            reference_velocity: 100.0,
            sample_interval: 0.01,
            filter_alpha: 0.3,
            command_limit: 1023.0,
            anti_windup: true,
            max_consecutive_io_failures: 5,
            deadline_miss_alarm: 10,
            queue_capacity: 64,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, gain) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be finite and non-negative, got {}",
                    name, gain
                )));
            }
        }
        if !self.reference_velocity.is_finite() {
            return Err(Error::Config(format!(
                "reference_velocity must be finite, got {}",
                self.reference_velocity
            )));
        }
        if !self.sample_interval.is_finite() || self.sample_interval < MIN_SAMPLE_INTERVAL {
            return Err(Error::Config(format!(
                "sample_interval must be at least 1 µs, got {} s",
                self.sample_interval
            )));
        }
        if !(self.filter_alpha > 0.0 && self.filter_alpha < 1.0) {
            return Err(Error::Config(format!(
                "filter_alpha must lie in (0, 1), got {}",
                self.filter_alpha
            )));
        }
        if !self.command_limit.is_finite() || self.command_limit <= 0.0 {
            return Err(Error::Config(format!(
                "command_limit must be positive, got {}",
                self.command_limit
            )));
        }
        if self.max_consecutive_io_failures == 0 {
            return Err(Error::Config(
                "max_consecutive_io_failures must be at least 1".to_string(),
            ));
        }
        if self.deadline_miss_alarm == 0 {
            return Err(Error::Config(
                "deadline_miss_alarm must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(self.sample_interval)
    }
}

// ============================================================================
// SIMULATION CONFIG - Parameters of the simulated belt
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Steady-state belt velocity per DAC unit (mm/s).
    pub gain: f64,
    /// Motor and belt time constant in seconds.
    pub time_constant: f64,
    /// Encoder resolution in mm.
    pub resolution: f64,
    /// Half-width of the uniform position noise in mm.
    pub noise_amplitude: f64,
    /// Probability that a single encoder read fails.
    pub failure_rate: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gain: 0.25,
            time_constant: 0.12,
            resolution: 0.05,
            noise_amplitude: 0.02,
            failure_rate: 0.0,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.gain.is_finite() {
            return Err(Error::Config(format!("simulation gain must be finite, got {}", self.gain)));
        }
        if !self.time_constant.is_finite() || self.time_constant <= 0.0 {
            return Err(Error::Config(format!(
                "simulation time_constant must be positive, got {}",
                self.time_constant
            )));
        }
        if !self.resolution.is_finite() || self.resolution < 0.0 {
            return Err(Error::Config(format!(
                "simulation resolution must be non-negative, got {}",
                self.resolution
            )));
        }
        if !self.noise_amplitude.is_finite() || self.noise_amplitude < 0.0 {
            return Err(Error::Config(format!(
                "simulation noise_amplitude must be non-negative, got {}",
                self.noise_amplitude
            )));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(Error::Config(format!(
                "simulation failure_rate must lie in [0, 1], got {}",
                self.failure_rate
            )));
        }
        Ok(())
    }
}

// ============================================================================
// RUNTIME CONFIG - How the binary drives the loop
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Dedicated OS thread with absolute deadlines.
    Thread,
    /// tokio interval on a current-thread runtime.
    Tokio,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub timer: TimerKind,
    /// Zero runs until the operator exits or stdin closes.
    pub run_seconds: u64,
    pub status_interval_ms: u64,
    pub plot_dir: String,
    pub plot_pid_actions: bool,
    pub autostart: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer: TimerKind::Thread,
            run_seconds: 0,
            status_interval_ms: 1000,
            plot_dir: "plots".to_string(),
            plot_pid_actions: true,
            autostart: false,
        }
    }
}

// ============================================================================
// SYSTEM CONFIG FILE LOADING
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    pub controller: ControllerConfig,
    pub simulation: SimulationConfig,
    pub runtime: RuntimeConfig,
}

impl SystemConfig {
    /// Reads a TOML file, falling back to defaults when the file is absent.
    /// A file that exists but does not parse or validate is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str::<SystemConfig>(s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.controller.validate()?;
        self.simulation.validate()
    }
}
