use crossbeam::channel::Sender;
use std::future::Future;
use std::thread;

/// Waits for `signal` to fire, then posts `message` once.
///
/// Returns false if the signal could not be awaited or nobody is listening
/// for `message` anymore.
pub async fn relay_interrupt<F, T>(signal: F, tx: Sender<T>, message: T) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("interrupt received, shutting down");
            tx.send(message).is_ok()
        }
        Err(e) => {
            tracing::warn!(error = %e, "interrupt listener unavailable");
            false
        }
    }
}

/// Forwards the first Ctrl-C as `message`, so an interrupted console takes
/// the same stop and shutdown path as an explicit exit.
pub fn spawn_interrupt_listener<T>(
    tx: Sender<T>,
    message: T,
) -> std::io::Result<thread::JoinHandle<()>>
where
    T: Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    thread::Builder::new()
        .name("interrupt-listener".to_string())
        .spawn(move || {
            runtime.block_on(relay_interrupt(tokio::signal::ctrl_c(), tx, message));
        })
}
