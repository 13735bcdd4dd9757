use crossbeam::channel::Sender;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::ipc::channels::{post_tick, ControlCommand, TickPost};
use crate::metrics::{DeadlineMonitor, MissCause};

pub struct TickStats {
    pub posted: AtomicU64,
    pub dropped: AtomicU64,
    pub overruns: AtomicU64,
    pub shutdown: AtomicBool,
}

impl TickStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            posted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }
}

/// Periodic tick source on a dedicated thread.
///
/// Slots are absolute (`start + n * period`) so sleep error never
/// accumulates into drift. Whole slots lost to a late wakeup are skipped
/// and reported as one overrun; a full queue drops the tick instead of
/// blocking.
pub fn spawn_tick_thread(
    tx: Sender<ControlCommand>,
    monitor: DeadlineMonitor,
) -> std::io::Result<(thread::JoinHandle<()>, Arc<TickStats>)> {
    let stats = TickStats::new();
    let stats_clone = stats.clone();

    let handle = thread::Builder::new()
        .name("tick-source".to_string())
        .spawn(move || {
            let period = monitor.period();
            let mut next = Instant::now() + period;
            let mut last_wake: Option<Instant> = None;

            loop {
                if stats_clone.shutdown.load(Ordering::Relaxed) {
                    tracing::debug!("tick source shutting down");
                    break;
                }

                let now = Instant::now();
                if now < next {
                    thread::sleep(next - now);
                }
                let woke = Instant::now();

                if let Some(previous) = last_wake {
                    monitor.period_observed(woke.duration_since(previous));
                }
                last_wake = Some(woke);

                let late = woke.duration_since(next);
                if late >= period {
                    let skipped = (late.as_nanos() / period.as_nanos()) as u32;
                    stats_clone.overruns.fetch_add(1, Ordering::Relaxed);
                    monitor.miss(MissCause::Overrun);
                    next += period * skipped;
                }

                match post_tick(&tx, next) {
                    TickPost::Queued => {
                        stats_clone.posted.fetch_add(1, Ordering::Relaxed);
                    }
                    TickPost::Dropped => {
                        stats_clone.dropped.fetch_add(1, Ordering::Relaxed);
                        monitor.miss(MissCause::QueueFull);
                    }
                    TickPost::Closed => {
                        tracing::debug!("controller gone, tick source exiting");
                        break;
                    }
                }

                next += period;
            }
        })?;

    Ok((handle, stats))
}
