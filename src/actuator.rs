//! Actuator module - PID control law and the motor driver seam

pub mod controller;
pub mod motor;

pub use controller::{ActuationCommand, PIDController, PidActions, PidGains};
pub use motor::Motor;
