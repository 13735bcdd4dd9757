use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::control::RunState;
use crate::metrics::MissCause;

// ============================================================================
// STATUS BOARD - Latest controller values for diagnostic polling
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerStatus {
    pub run_state: RunState,
    /// Ticks applied in the current (or last) run.
    pub run_ticks: u64,
    pub runs_completed: u64,
    pub position: f64,
    pub velocity: f64,
    pub command: f64,
}

impl Default for ControllerStatus {
    fn default() -> Self {
        Self {
            run_state: RunState::Idle,
            run_ticks: 0,
            runs_completed: 0,
            position: 0.0,
            velocity: 0.0,
            command: 0.0,
        }
    }
}

#[derive(Clone, Default)]
pub struct StatusBoard {
    data: Arc<RwLock<ControllerStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut ControllerStatus),
    {
        let mut status = self.data.write();
        f(&mut status);
    }

    pub fn get(&self) -> ControllerStatus {
        *self.data.read()
    }
}

// ============================================================================
// FAULT LOG - Bounded history of transient faults
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FaultKind {
    Encoder(String),
    Actuator(String),
    DeadlineMiss { cause: MissCause, streak: u64 },
    ForcedStop { consecutive_failures: u32 },
    Export(String),
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Encoder(msg) => write!(f, "encoder failure: {}", msg),
            FaultKind::Actuator(msg) => write!(f, "actuator failure: {}", msg),
            FaultKind::DeadlineMiss { cause, streak } => {
                write!(f, "deadline miss ({}), streak {}", cause, streak)
            }
            FaultKind::ForcedStop {
                consecutive_failures,
            } => write!(f, "forced stop after {} consecutive failures", consecutive_failures),
            FaultKind::Export(msg) => write!(f, "export failure: {}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FaultEvent {
    pub at: Instant,
    pub kind: FaultKind,
}

#[derive(Clone)]
pub struct FaultLog {
    entries: Arc<RwLock<VecDeque<FaultEvent>>>,
    max_size: usize,
}

impl Default for FaultLog {
    fn default() -> Self {
        Self::new(256)
    }
}

impl FaultLog {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    pub fn write(&self, kind: FaultKind) {
        let mut log = self.entries.write();
        log.push_back(FaultEvent {
            at: Instant::now(),
            kind,
        });
        if log.len() > self.max_size {
            log.pop_front();
        }
    }

    pub fn read_all(&self) -> Vec<FaultEvent> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
