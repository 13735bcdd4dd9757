use crossbeam::channel::{unbounded, Receiver, Sender};

use super::analysis::StepResponse;
use super::recorder::RunLog;
use crate::error::{Error, Result};

/// Receives each finished run, exactly once per Running -> Idle transition.
///
/// Called on the controller thread, so implementations must hand heavy
/// work (rendering, file I/O) off rather than doing it inline.
pub trait RunSink: Send {
    fn export(&mut self, run: RunLog) -> Result<()>;
}

impl<T: RunSink + ?Sized> RunSink for Box<T> {
    fn export(&mut self, run: RunLog) -> Result<()> {
        (**self).export(run)
    }
}

/// Forwards finished runs to another thread.
pub struct ChannelSink {
    tx: Sender<RunLog>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<RunLog>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }
}

impl RunSink for ChannelSink {
    fn export(&mut self, run: RunLog) -> Result<()> {
        self.tx
            .send(run)
            .map_err(|_| Error::Export("run receiver dropped".to_string()))
    }
}

/// Only logs the step response figures of each run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummarySink;

impl RunSink for SummarySink {
    fn export(&mut self, run: RunLog) -> Result<()> {
        log_summary(&run);
        Ok(())
    }
}

pub(crate) fn log_summary(run: &RunLog) {
    match StepResponse::analyze(run) {
        Some(resp) => tracing::info!(
            title = %run.metadata.title(),
            ticks = run.len(),
            "{}",
            resp.summary()
        ),
        None => tracing::info!(title = %run.metadata.title(), "run recorded no ticks"),
    }
}
