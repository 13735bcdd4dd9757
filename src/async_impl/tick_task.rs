use crossbeam::channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::ipc::channels::{post_tick, ControlCommand, TickPost};
use crate::metrics::{DeadlineMonitor, MissCause};

/// Periodic tick source driven by a tokio interval.
///
/// Missed slots are skipped rather than burst, and every gap of two or
/// more periods between fired slots counts as one overrun.
pub async fn tick_task(
    tx: Sender<ControlCommand>,
    monitor: DeadlineMonitor,
    shutdown: Arc<AtomicBool>,
) {
    let period = monitor.period();
    let mut interval_timer = interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_slot: Option<Instant> = None;
    let mut last_wake: Option<Instant> = None;

    loop {
        let slot = interval_timer.tick().await;
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let woke = Instant::now();
        if let Some(previous) = last_wake {
            monitor.period_observed(woke.duration_since(previous));
        }
        last_wake = Some(woke);

        if let Some(previous) = last_slot {
            if slot.duration_since(previous) >= period * 2 {
                monitor.miss(MissCause::Overrun);
            }
        }
        last_slot = Some(slot);

        match post_tick(&tx, slot.into_std()) {
            TickPost::Queued => {}
            TickPost::Dropped => monitor.miss(MissCause::QueueFull),
            TickPost::Closed => break,
        }
    }
}
