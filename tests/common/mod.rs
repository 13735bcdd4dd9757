//! Recording doubles for the encoder, motor and run sink seams.
#![allow(dead_code)]

use belt_velocity_control::{
    ControlLoop, ControllerConfig, Encoder, Error, Motor, Result, RunLog, RunSink,
};
use parking_lot::Mutex;
use std::sync::Arc;

// ============================================================================
// SCRIPTED ENCODER - Advances a fixed distance per read
// ============================================================================

#[derive(Debug, Default)]
pub struct EncoderState {
    pub position: f64,
    pub step: f64,
    pub reads: u32,
    pub resets: u32,
    pub fail_next: u32,
    pub fail_reset: bool,
}

#[derive(Clone, Default)]
pub struct ScriptedEncoder {
    pub state: Arc<Mutex<EncoderState>>,
}

impl ScriptedEncoder {
    /// Reads return 0, step, 2*step, ... after each reset.
    pub fn with_step(step: f64) -> Self {
        let enc = Self::default();
        enc.state.lock().step = step;
        enc
    }

    pub fn fail_next(&self, reads: u32) {
        self.state.lock().fail_next = reads;
    }

    pub fn reads(&self) -> u32 {
        self.state.lock().reads
    }

    pub fn resets(&self) -> u32 {
        self.state.lock().resets
    }
}

impl Encoder for ScriptedEncoder {
    fn position(&mut self) -> Result<f64> {
        let mut s = self.state.lock();
        s.reads += 1;
        if s.fail_next > 0 {
            s.fail_next -= 1;
            return Err(Error::Encoder("scripted read failure".to_string()));
        }
        let p = s.position;
        s.position += s.step;
        Ok(p)
    }

    fn reset_position(&mut self) -> Result<()> {
        let mut s = self.state.lock();
        if s.fail_reset {
            return Err(Error::Encoder("scripted reset failure".to_string()));
        }
        s.resets += 1;
        s.position = 0.0;
        Ok(())
    }
}

// ============================================================================
// RECORDING MOTOR - Keeps every driver call in order
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCall {
    On,
    SetVoltage(f64),
    Stop,
}

#[derive(Debug, Default)]
pub struct MotorState {
    pub calls: Vec<MotorCall>,
    pub voltage: f64,
    pub fail_set_voltage: u32,
    pub fail_on: bool,
}

#[derive(Clone, Default)]
pub struct RecordingMotor {
    pub state: Arc<Mutex<MotorState>>,
}

impl RecordingMotor {
    pub fn calls(&self) -> Vec<MotorCall> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: fn(&MotorCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| call(c)).count()
    }
}

impl Motor for RecordingMotor {
    fn set_voltage(&mut self, command: f64) -> Result<()> {
        let mut s = self.state.lock();
        if s.fail_set_voltage > 0 {
            s.fail_set_voltage -= 1;
            return Err(Error::Actuator("scripted write failure".to_string()));
        }
        s.calls.push(MotorCall::SetVoltage(command));
        s.voltage = command;
        Ok(())
    }

    fn on(&mut self) -> Result<()> {
        let mut s = self.state.lock();
        if s.fail_on {
            return Err(Error::Actuator("scripted on failure".to_string()));
        }
        s.calls.push(MotorCall::On);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut s = self.state.lock();
        s.calls.push(MotorCall::Stop);
        s.voltage = 0.0;
        Ok(())
    }

    fn voltage(&self) -> f64 {
        self.state.lock().voltage
    }
}

// ============================================================================
// COLLECTING SINK - Keeps every exported run
// ============================================================================

#[derive(Clone, Default)]
pub struct CollectingSink {
    pub runs: Arc<Mutex<Vec<RunLog>>>,
    pub fail: bool,
}

impl CollectingSink {
    pub fn exports(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn last(&self) -> Option<RunLog> {
        self.runs.lock().last().cloned()
    }
}

impl RunSink for CollectingSink {
    fn export(&mut self, run: RunLog) -> Result<()> {
        if self.fail {
            return Err(Error::Export("scripted export failure".to_string()));
        }
        self.runs.lock().push(run);
        Ok(())
    }
}

pub type TestLoop = ControlLoop<ScriptedEncoder, RecordingMotor, CollectingSink>;

pub struct Rig {
    pub control: TestLoop,
    pub encoder: ScriptedEncoder,
    pub motor: RecordingMotor,
    pub sink: CollectingSink,
}

/// Controller over scripted doubles; the encoder advances `step` mm per read.
pub fn rig(config: ControllerConfig, step: f64) -> Rig {
    let encoder = ScriptedEncoder::with_step(step);
    let motor = RecordingMotor::default();
    let sink = CollectingSink::default();
    let control = ControlLoop::new(config, encoder.clone(), motor.clone(), sink.clone())
        .expect("test config is valid");
    Rig {
        control,
        encoder,
        motor,
        sink,
    }
}

pub fn p_only(kp: f64) -> ControllerConfig {
    ControllerConfig {
        kp,
        ki: 0.0,
        kd: 0.0,
        reference_velocity: 100.0,
        sample_interval: 0.01,
        filter_alpha: 0.3,
        ..ControllerConfig::default()
    }
}
