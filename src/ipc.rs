//! IPC module - Command queue into the controller thread and shared read-only views

pub mod channels;
pub mod shared_resource;

pub use channels::{post_tick, ControlChannels, ControlCommand, OperatorHandle, TickPost};
pub use shared_resource::{ControllerStatus, FaultEvent, FaultKind, FaultLog, StatusBoard};
