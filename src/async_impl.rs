//! Async runtime - tokio interval as an alternative tick source, plus the
//! Ctrl-C listener

pub mod interrupt;
pub mod tick_task;

pub use interrupt::{relay_interrupt, spawn_interrupt_listener};
pub use tick_task::tick_task;

use crossbeam::channel::Sender;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use crate::ipc::channels::ControlCommand;
use crate::metrics::DeadlineMonitor;

/// Runs [`tick_task`] on a current-thread tokio runtime in its own thread.
/// Setting the returned flag ends the task at its next tick.
pub fn spawn_tokio_ticker(
    tx: Sender<ControlCommand>,
    monitor: DeadlineMonitor,
) -> std::io::Result<(thread::JoinHandle<()>, Arc<AtomicBool>)> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let handle = thread::Builder::new()
        .name("tick-source-tokio".to_string())
        .spawn(move || runtime.block_on(tick_task(tx, monitor, flag)))?;

    Ok((handle, shutdown))
}
