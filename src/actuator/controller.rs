use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Unclamped contribution of each PID term for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidActions {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

impl PidActions {
    pub fn sum(&self) -> f64 {
        self.p + self.i + self.d
    }
}

/// Output of one PID evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    /// Clamped to `[-command_limit, command_limit]`.
    pub command: f64,
    pub actions: PidActions,
}

impl ActuationCommand {
    pub fn is_saturated(&self) -> bool {
        self.command != self.actions.sum()
    }
}

pub struct PIDController {
    // Gains
    gains: PidGains,

    // Fixed for the run
    reference: f64,
    sample_interval: f64,
    command_limit: f64,

    // State
    integral: f64,
    previous_measurement: f64,
    last_error: f64,

    // Conditional integration while saturated
    anti_windup: bool,
}

impl PIDController {
    pub fn new(gains: PidGains, reference: f64, sample_interval: f64, command_limit: f64) -> Self {
        Self {
            gains,
            reference,
            sample_interval,
            command_limit,
            integral: 0.0,
            previous_measurement: 0.0,
            last_error: 0.0,
            anti_windup: true,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            PidGains {
                kp: config.kp,
                ki: config.ki,
                kd: config.kd,
            },
            config.reference_velocity,
            config.sample_interval,
            config.command_limit,
        )
        .with_anti_windup(config.anti_windup)
    }

    pub fn with_anti_windup(mut self, enabled: bool) -> Self {
        self.anti_windup = enabled;
        self
    }

    pub fn compute_output(&mut self, measured_velocity: f64) -> ActuationCommand {
        let dt = self.sample_interval;

        // Calculate error
        let error = self.reference - measured_velocity;
        self.last_error = error;

        // Proportional term
        let p = self.gains.kp * error;

        // Derivative on measurement, so a setpoint step never kicks
        let d = -self.gains.kd * (measured_velocity - self.previous_measurement) / dt;

        // Integral term (gain form)
        let candidate = self.integral + error * dt;
        let unclamped = p + self.gains.ki * candidate + d;
        let bound = self.command_limit.copysign(error);
        let winding_up = self.anti_windup
            && error != 0.0
            && unclamped.abs() > self.command_limit
            && error.signum() == unclamped.signum();
        if !winding_up {
            self.integral = candidate;
        } else if self.gains.ki > 0.0 {
            // Integrate only as far as the bound, never past it
            let landing = (bound - p - d) / self.gains.ki;
            self.integral = if error > 0.0 {
                self.integral.max(landing)
            } else {
                self.integral.min(landing)
            };
        }
        let i = self.gains.ki * self.integral;

        self.previous_measurement = measured_velocity;

        let actions = PidActions { p, i, d };
        let command = if winding_up {
            bound
        } else {
            actions.sum().clamp(-self.command_limit, self.command_limit)
        };
        ActuationCommand { command, actions }
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_measurement = 0.0;
        self.last_error = 0.0;
    }

    pub fn get_error(&self) -> f64 {
        self.last_error
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_measurement(&self) -> f64 {
        self.previous_measurement
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn command_limit(&self) -> f64 {
        self.command_limit
    }
}
