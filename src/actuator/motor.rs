use crate::error::Result;

/// Motor driver for the belt.
///
/// `stop` puts the driver into its de-energized safe state, which is not the
/// same as commanding zero volts while still energized.
pub trait Motor: Send {
    fn set_voltage(&mut self, command: f64) -> Result<()>;

    fn on(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    /// Last commanded value, for diagnostic polling.
    fn voltage(&self) -> f64;
}

impl<T: Motor + ?Sized> Motor for Box<T> {
    fn set_voltage(&mut self, command: f64) -> Result<()> {
        (**self).set_voltage(command)
    }

    fn on(&mut self) -> Result<()> {
        (**self).on()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn voltage(&self) -> f64 {
        (**self).voltage()
    }
}
