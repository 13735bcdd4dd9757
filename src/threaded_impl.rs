//! Threaded runtime - OS-thread tick source and the controller actor

pub mod controller_thread;
pub mod tick_thread;

pub use controller_thread::spawn_controller_thread;
pub use tick_thread::{spawn_tick_thread, TickStats};
