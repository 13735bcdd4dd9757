//! Velocity estimation from successive encoder positions.

/// First-order low-pass velocity estimator.
///
/// Differentiates consecutive position samples over the fixed sample
/// interval and smooths the result with an exponential moving average.
/// The first sample after a reset only primes the filter and reports zero.
#[derive(Debug, Clone)]
pub struct VelocityEstimator {
    alpha: f64,
    sample_interval: f64,
    previous_filtered_velocity: f64,
    previous_position: f64,
    has_prior_sample: bool,
}

impl VelocityEstimator {
    /// `alpha` and `sample_interval` are expected to be validated by
    /// [`ControllerConfig::validate`](crate::config::ControllerConfig::validate).
    pub fn new(alpha: f64, sample_interval: f64) -> Self {
        Self {
            alpha,
            sample_interval,
            previous_filtered_velocity: 0.0,
            previous_position: 0.0,
            has_prior_sample: false,
        }
    }

    pub fn update(&mut self, current_position: f64) -> f64 {
        if !self.has_prior_sample {
            self.previous_position = current_position;
            self.previous_filtered_velocity = 0.0;
            self.has_prior_sample = true;
            return 0.0;
        }

        let raw_velocity = (current_position - self.previous_position) / self.sample_interval;
        let filtered =
            self.alpha * raw_velocity + (1.0 - self.alpha) * self.previous_filtered_velocity;

        self.previous_position = current_position;
        self.previous_filtered_velocity = filtered;
        filtered
    }

    pub fn reset(&mut self) {
        self.previous_filtered_velocity = 0.0;
        self.previous_position = 0.0;
        self.has_prior_sample = false;
    }

    /// Last filtered velocity; stays frozen while the loop is idle.
    pub fn velocity(&self) -> f64 {
        self.previous_filtered_velocity
    }

    pub fn previous_position(&self) -> f64 {
        self.previous_position
    }

    pub fn has_prior_sample(&self) -> bool {
        self.has_prior_sample
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
