//! Sensor module - Encoder readback and velocity estimation

pub mod encoder;
pub mod velocity;

pub use encoder::Encoder;
pub use velocity::VelocityEstimator;
