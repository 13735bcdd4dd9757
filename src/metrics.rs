//! Metrics module - Tick timing, deadline supervision and fault counters

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ipc::{FaultKind, FaultLog};

// ============================================================================
// MISS CAUSE - Why a tick did not complete inside its slot
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissCause {
    /// The tick source woke up after the following slot was already due.
    Overrun,
    /// The command queue was full, so the tick was dropped.
    QueueFull,
    /// The controller started the tick more than one period after it was scheduled.
    LateStart,
    /// Latency plus execution exceeded the period.
    SlowTick,
}

impl fmt::Display for MissCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissCause::Overrun => write!(f, "timer overrun"),
            MissCause::QueueFull => write!(f, "command queue full"),
            MissCause::LateStart => write!(f, "late start"),
            MissCause::SlowTick => write!(f, "slow tick"),
        }
    }
}

// ============================================================================
// TIMING METRICS - Thread-safe performance tracking
// ============================================================================

#[derive(Clone)]
pub struct TimingMetrics {
    execution_hist: Arc<Mutex<Histogram<u64>>>,
    latency_hist: Arc<Mutex<Histogram<u64>>>,
    // Deviation of the measured tick period from nominal
    jitter_hist: Arc<Mutex<Histogram<u64>>>,
    ticks: Arc<AtomicU64>,
    idle_ticks: Arc<AtomicU64>,
    deadline_misses: Arc<AtomicU64>,
    consecutive_misses: Arc<AtomicU64>,
    dropped_ticks: Arc<AtomicU64>,
    io_failures: Arc<AtomicU64>,
    forced_stops: Arc<AtomicU64>,
}

fn histogram() -> Arc<Mutex<Histogram<u64>>> {
    Arc::new(Mutex::new(
        Histogram::new(3).expect("three significant figures is a valid precision"),
    ))
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingMetrics {
    pub fn new() -> Self {
        Self {
            execution_hist: histogram(),
            latency_hist: histogram(),
            jitter_hist: histogram(),
            ticks: Arc::new(AtomicU64::new(0)),
            idle_ticks: Arc::new(AtomicU64::new(0)),
            deadline_misses: Arc::new(AtomicU64::new(0)),
            consecutive_misses: Arc::new(AtomicU64::new(0)),
            dropped_ticks: Arc::new(AtomicU64::new(0)),
            io_failures: Arc::new(AtomicU64::new(0)),
            forced_stops: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a processed tick. `latency` is the delay between the scheduled
    /// slot and the start of processing. Returns the miss cause if the tick
    /// blew its slot.
    pub fn record_tick(
        &self,
        latency: Duration,
        execution: Duration,
        period: Duration,
    ) -> Option<MissCause> {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.latency_hist.lock().record(latency.as_nanos() as u64).ok();
        self.execution_hist.lock().record(execution.as_nanos() as u64).ok();

        if latency > period {
            Some(MissCause::LateStart)
        } else if latency + execution > period {
            Some(MissCause::SlowTick)
        } else {
            self.consecutive_misses.store(0, Ordering::Relaxed);
            None
        }
    }

    /// Records a tick that arrived while the loop was idle. Only its start
    /// latency is judged; an on-time idle tick ends the current miss streak.
    pub fn record_idle_tick(&self, latency: Duration, period: Duration) -> Option<MissCause> {
        self.idle_ticks.fetch_add(1, Ordering::Relaxed);
        if latency > period {
            Some(MissCause::LateStart)
        } else {
            self.consecutive_misses.store(0, Ordering::Relaxed);
            None
        }
    }

    /// Record the measured interval between two consecutive tick slots.
    pub fn record_period(&self, measured: Duration, nominal: Duration) {
        let jitter = if measured > nominal {
            measured - nominal
        } else {
            nominal - measured
        };
        self.jitter_hist.lock().record(jitter.as_nanos() as u64).ok();
    }

    /// Counts a deadline miss and reports it. The report becomes an error
    /// once `alarm` misses happen back to back. Returns the current streak.
    pub fn deadline_missed(&self, cause: MissCause, alarm: u32) -> u64 {
        self.deadline_misses.fetch_add(1, Ordering::Relaxed);
        if cause == MissCause::QueueFull {
            self.dropped_ticks.fetch_add(1, Ordering::Relaxed);
        }
        let streak = self.consecutive_misses.fetch_add(1, Ordering::Relaxed) + 1;
        if streak >= u64::from(alarm) {
            tracing::error!(%cause, streak, "repeated deadline misses, sample interval assumption is violated");
        } else {
            tracing::warn!(%cause, streak, "tick deadline missed");
        }
        streak
    }

    pub fn record_io_failure(&self) {
        self.io_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forced_stop(&self) {
        self.forced_stops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn deadline_misses(&self) -> u64 {
        self.deadline_misses.load(Ordering::Relaxed)
    }

    pub fn io_failures(&self) -> u64 {
        self.io_failures.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> MetricsReport {
        let exec = self.execution_hist.lock();
        let latency = self.latency_hist.lock();
        let jitter = self.jitter_hist.lock();

        MetricsReport {
            execution_p50: Duration::from_nanos(exec.value_at_quantile(0.5)),
            execution_p99: Duration::from_nanos(exec.value_at_quantile(0.99)),
            execution_max: Duration::from_nanos(exec.max()),
            latency_p50: Duration::from_nanos(latency.value_at_quantile(0.5)),
            latency_p99: Duration::from_nanos(latency.value_at_quantile(0.99)),
            jitter_p50: Duration::from_nanos(jitter.value_at_quantile(0.5)),
            jitter_p99: Duration::from_nanos(jitter.value_at_quantile(0.99)),
            ticks: self.ticks.load(Ordering::Relaxed),
            idle_ticks: self.idle_ticks.load(Ordering::Relaxed),
            deadline_misses: self.deadline_misses.load(Ordering::Relaxed),
            dropped_ticks: self.dropped_ticks.load(Ordering::Relaxed),
            io_failures: self.io_failures.load(Ordering::Relaxed),
            forced_stops: self.forced_stops.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// DEADLINE MONITOR - Cadence supervision shared by tick sources and controller
// ============================================================================

#[derive(Clone)]
pub struct DeadlineMonitor {
    metrics: TimingMetrics,
    faults: FaultLog,
    period: Duration,
    alarm: u32,
}

impl DeadlineMonitor {
    pub fn new(metrics: TimingMetrics, faults: FaultLog, period: Duration, alarm: u32) -> Self {
        Self {
            metrics,
            faults,
            period,
            alarm,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn metrics(&self) -> &TimingMetrics {
        &self.metrics
    }

    pub fn miss(&self, cause: MissCause) {
        let streak = self.metrics.deadline_missed(cause, self.alarm);
        self.faults.write(FaultKind::DeadlineMiss { cause, streak });
    }

    pub fn tick_done(&self, latency: Duration, execution: Duration) {
        if let Some(cause) = self.metrics.record_tick(latency, execution, self.period) {
            self.miss(cause);
        }
    }

    pub fn tick_idle(&self, latency: Duration) {
        if let Some(cause) = self.metrics.record_idle_tick(latency, self.period) {
            self.miss(cause);
        }
    }

    pub fn period_observed(&self, measured: Duration) {
        self.metrics.record_period(measured, self.period);
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub execution_p50: Duration,
    pub execution_p99: Duration,
    pub execution_max: Duration,
    pub latency_p50: Duration,
    pub latency_p99: Duration,
    pub jitter_p50: Duration,
    pub jitter_p99: Duration,
    /// Ticks timed end to end while running.
    pub ticks: u64,
    /// Ticks that found the loop idle.
    pub idle_ticks: u64,
    pub deadline_misses: u64,
    pub dropped_ticks: u64,
    pub io_failures: u64,
    pub forced_stops: u64,
}

impl MetricsReport {
    /// Share of tick slots that met their deadline, in percent.
    ///
    /// Slots are every tick the controller saw, running or idle, plus the
    /// ticks dropped at a full queue. Misses from any state count against it.
    pub fn compliance(&self) -> f64 {
        let slots = self.ticks + self.idle_ticks + self.dropped_ticks;
        if slots == 0 {
            return if self.deadline_misses == 0 { 100.0 } else { 0.0 };
        }
        let met = slots.saturating_sub(self.deadline_misses);
        (met as f64 / slots as f64) * 100.0
    }
}
