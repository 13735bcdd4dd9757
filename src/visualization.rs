//! Visualization module - Run recording, step response analysis and plot export

pub mod analysis;
pub mod plot;
pub mod recorder;
pub mod sink;

pub use analysis::StepResponse;
pub use plot::PlotExporter;
pub use recorder::{RunLog, RunMetadata, RunRecorder, TickRecord};
pub use sink::{ChannelSink, RunSink, SummarySink};
