//! Error types shared by the control loop, its collaborators and the binary.

/// Errors raised by the belt controller.
///
/// Configuration errors are fatal at startup. Encoder and actuator errors are
/// transient: the control loop absorbs them per tick and only escalates to a
/// forced stop after a run of consecutive failures.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid gains, reference, interval or other construction parameter.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Position readback or encoder reset failed.
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// Motor driver rejected a voltage, on or stop request.
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Recorded run could not be handed off or rendered.
    #[error("Export error: {0}")]
    Export(String),

    /// The controller thread is gone and no longer accepts commands.
    #[error("Control channel closed")]
    ChannelClosed,

    #[error("Controller thread panicked")]
    ControllerPanicked,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures the tick handler recovers from locally.
    pub fn is_transient_io(&self) -> bool {
        matches!(self, Error::Encoder(_) | Error::Actuator(_))
    }
}

/// Result alias for controller operations.
pub type Result<T> = std::result::Result<T, Error>;
