use crate::error::Result;

/// Position readback from the belt encoder.
///
/// Positions are cumulative and signed, in mm. Only differences between
/// consecutive reads carry meaning for the control loop.
pub trait Encoder: Send {
    fn position(&mut self) -> Result<f64>;

    /// Re-zero the cumulative position.
    fn reset_position(&mut self) -> Result<()>;
}

impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn position(&mut self) -> Result<f64> {
        (**self).position()
    }

    fn reset_position(&mut self) -> Result<()> {
        (**self).reset_position()
    }
}
