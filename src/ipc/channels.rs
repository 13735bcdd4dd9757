use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use std::time::Instant;

use crate::error::{Error, Result};

/// Everything the controller thread reacts to, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    /// Periodic sample request; `scheduled` is the slot it belongs to.
    Tick { scheduled: Instant },
    Start,
    Stop,
    /// Stop if running, then end the controller thread.
    Shutdown,
}

// Producers (tick source, operator) -> controller thread
#[derive(Clone)]
pub struct ControlChannels {
    pub command_tx: Sender<ControlCommand>,
    pub command_rx: Receiver<ControlCommand>,
}

impl ControlChannels {
    pub fn new(buffer_size: usize) -> Self {
        let (command_tx, command_rx) = bounded(buffer_size);
        Self {
            command_tx,
            command_rx,
        }
    }

    pub fn operator(&self) -> OperatorHandle {
        OperatorHandle {
            tx: self.command_tx.clone(),
        }
    }
}

/// Outcome of posting a tick without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPost {
    Queued,
    /// Queue full; the tick was discarded.
    Dropped,
    /// The controller thread has exited.
    Closed,
}

pub fn post_tick(tx: &Sender<ControlCommand>, scheduled: Instant) -> TickPost {
    match tx.try_send(ControlCommand::Tick { scheduled }) {
        Ok(()) => TickPost::Queued,
        Err(TrySendError::Full(_)) => TickPost::Dropped,
        Err(TrySendError::Disconnected(_)) => TickPost::Closed,
    }
}

/// Operator-facing front end: the only external mutators of run state.
#[derive(Clone)]
pub struct OperatorHandle {
    tx: Sender<ControlCommand>,
}

impl OperatorHandle {
    pub fn notify_start(&self) -> Result<()> {
        self.send(ControlCommand::Start)
    }

    pub fn notify_stop(&self) -> Result<()> {
        self.send(ControlCommand::Stop)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(ControlCommand::Shutdown)
    }

    // Operator events wait for queue space; they are never dropped like ticks.
    fn send(&self, command: ControlCommand) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::ChannelClosed)
    }
}
