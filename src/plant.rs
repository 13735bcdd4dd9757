//! Simulated belt - First-order motor/belt model behind the encoder and motor seams

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

use crate::actuator::Motor;
use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::sensor::Encoder;

// ============================================================================
// BELT PLANT - Velocity follows gain * voltage with a first-order lag
// ============================================================================

enum Clock {
    /// Advanced explicitly with `step`.
    Manual,
    /// Advanced by elapsed wall time on every encoder read.
    Wall(Instant),
}

pub struct BeltPlant {
    rng: StdRng,
    clock: Clock,
    gain: f64,
    time_constant: f64,
    resolution: f64,
    noise_amplitude: f64,
    failure_rate: f64,
    // Opposing load in mm/s
    load: f64,
    velocity: f64,
    position: f64,
    zero_offset: f64,
    voltage: f64,
    energized: bool,
}

impl BeltPlant {
    fn new(config: &SimulationConfig, clock: Clock) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            clock,
            gain: config.gain,
            time_constant: config.time_constant,
            resolution: config.resolution,
            noise_amplitude: config.noise_amplitude,
            failure_rate: config.failure_rate,
            load: 0.0,
            velocity: 0.0,
            position: 0.0,
            zero_offset: 0.0,
            voltage: 0.0,
            energized: false,
        }
    }

    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let drive = if self.energized {
            self.gain * self.voltage
        } else {
            0.0
        };
        let target = drive - self.load;
        // Exact discretization of the first-order lag over dt
        let blend = 1.0 - (-dt / self.time_constant).exp();
        let start = self.velocity;
        self.velocity += (target - self.velocity) * blend;
        self.position += 0.5 * (start + self.velocity) * dt;
    }

    fn advance_to_now(&mut self) {
        if let Clock::Wall(last) = self.clock {
            let now = Instant::now();
            self.step(now.duration_since(last).as_secs_f64());
            self.clock = Clock::Wall(now);
        }
    }

    fn read_position(&mut self) -> Result<f64> {
        self.advance_to_now();
        if self.failure_rate > 0.0 && self.rng.gen_bool(self.failure_rate) {
            return Err(Error::Encoder("simulated read failure".to_string()));
        }
        let noise = if self.noise_amplitude > 0.0 {
            self.rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
        } else {
            0.0
        };
        let raw = self.position - self.zero_offset + noise;
        Ok(if self.resolution > 0.0 {
            (raw / self.resolution).round() * self.resolution
        } else {
            raw
        })
    }
}

// ============================================================================
// SIMULATED BELT - Shared plant handed out as encoder and motor halves
// ============================================================================

#[derive(Clone)]
pub struct SimulatedBelt {
    plant: Arc<Mutex<BeltPlant>>,
}

impl SimulatedBelt {
    /// Plant advanced manually with [`SimulatedBelt::step`].
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            plant: Arc::new(Mutex::new(BeltPlant::new(config, Clock::Manual))),
        }
    }

    /// Plant that integrates wall time between encoder reads.
    pub fn realtime(config: &SimulationConfig) -> Self {
        Self {
            plant: Arc::new(Mutex::new(BeltPlant::new(config, Clock::Wall(Instant::now())))),
        }
    }

    pub fn encoder(&self) -> SimulatedEncoder {
        SimulatedEncoder {
            plant: self.plant.clone(),
        }
    }

    pub fn motor(&self) -> SimulatedMotor {
        SimulatedMotor {
            plant: self.plant.clone(),
        }
    }

    pub fn step(&self, dt: f64) {
        self.plant.lock().step(dt);
    }

    pub fn velocity(&self) -> f64 {
        self.plant.lock().velocity
    }

    pub fn is_energized(&self) -> bool {
        self.plant.lock().energized
    }

    pub fn inject_disturbance(&self, load: f64) {
        self.plant.lock().load += load;
    }
}

pub struct SimulatedEncoder {
    plant: Arc<Mutex<BeltPlant>>,
}

impl Encoder for SimulatedEncoder {
    fn position(&mut self) -> Result<f64> {
        self.plant.lock().read_position()
    }

    fn reset_position(&mut self) -> Result<()> {
        let mut plant = self.plant.lock();
        plant.advance_to_now();
        plant.zero_offset = plant.position;
        Ok(())
    }
}

/// Motor half of the simulated belt. Clones share the same driver, so one
/// can stay outside the control loop for voltage polling.
#[derive(Clone)]
pub struct SimulatedMotor {
    plant: Arc<Mutex<BeltPlant>>,
}

impl Motor for SimulatedMotor {
    fn set_voltage(&mut self, command: f64) -> Result<()> {
        let mut plant = self.plant.lock();
        plant.advance_to_now();
        plant.voltage = command;
        Ok(())
    }

    fn on(&mut self) -> Result<()> {
        let mut plant = self.plant.lock();
        plant.advance_to_now();
        plant.energized = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut plant = self.plant.lock();
        plant.advance_to_now();
        plant.energized = false;
        plant.voltage = 0.0;
        Ok(())
    }

    fn voltage(&self) -> f64 {
        self.plant.lock().voltage
    }
}
