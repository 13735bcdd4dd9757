use plotters::prelude::*;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use super::analysis::StepResponse;
use super::recorder::RunLog;
use super::sink::{log_summary, RunSink};
use crate::error::{Error, Result};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 640;

/// Renders each finished run to a PNG on a detached thread.
pub struct PlotExporter {
    dir: PathBuf,
    pid_actions: bool,
    runs: u64,
    pending: Vec<JoinHandle<()>>,
}

impl PlotExporter {
    pub fn new(dir: impl Into<PathBuf>, pid_actions: bool) -> Self {
        Self {
            dir: dir.into(),
            pid_actions,
            runs: 0,
            pending: Vec::new(),
        }
    }

    /// Blocks until every render started so far has finished.
    pub fn wait(&mut self) {
        for handle in self.pending.drain(..) {
            if handle.join().is_err() {
                tracing::error!("plot render thread panicked");
            }
        }
    }

    pub fn file_name(run: &RunLog, index: u64) -> String {
        let stem: String = run
            .metadata
            .title()
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '=' | '.' | '-' => c,
                _ => '_',
            })
            .collect();
        format!("{}_run{}.png", stem, index)
    }
}

impl RunSink for PlotExporter {
    fn export(&mut self, run: RunLog) -> Result<()> {
        log_summary(&run);
        if run.is_empty() {
            return Ok(());
        }

        self.runs += 1;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(&run, self.runs));
        let pid_actions = self.pid_actions;

        self.pending.retain(|h| !h.is_finished());
        let handle = thread::Builder::new()
            .name("plot-export".to_string())
            .spawn(move || match render_run(&path, &run, pid_actions) {
                Ok(()) => tracing::info!(path = %path.display(), "run plot written"),
                Err(e) => tracing::error!(path = %path.display(), error = %e, "run plot failed"),
            })?;
        self.pending.push(handle);
        Ok(())
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad, hi + pad)
}

pub fn render_run(path: &Path, run: &RunLog, pid_actions: bool) -> Result<()> {
    draw(path, run, pid_actions).map_err(|e| Error::Export(e.to_string()))
}

fn draw(
    path: &Path,
    run: &RunLog,
    pid_actions: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let meta = &run.metadata;
    let reference = meta.reference_velocity;
    let t_end = run.time_at(run.len().max(2) - 1);
    let time = |i: usize| run.time_at(i);

    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&meta.title(), ("sans-serif", 22))?;
    let (body, footer) = root.split_vertically(HEIGHT as i32 - 70);

    let (traces, actions_area) = if pid_actions {
        let (l, r) = body.split_horizontally(WIDTH as i32 / 2);
        (l, Some(r))
    } else {
        (body, None)
    };
    let (velocity_area, command_area) = traces.split_vertically((HEIGHT as i32 - 70) / 2);

    // Velocity with setpoint and settling band
    let band = [reference, 0.95 * reference, 1.05 * reference];
    let (v_lo, v_hi) = value_range(run.velocities().chain(band.iter().copied()));
    let mut chart = ChartBuilder::on(&velocity_area)
        .caption("Velocity [mm/s]", ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..t_end, v_lo..v_hi)?;
    chart.configure_mesh().x_desc("Time [s]").draw()?;
    chart.draw_series(LineSeries::new(
        run.records.iter().enumerate().map(|(i, r)| (time(i), r.velocity)),
        &RED,
    ))?;
    for level in band {
        chart.draw_series(LineSeries::new(
            vec![(0.0, level), (t_end, level)],
            &BLACK.mix(0.4),
        ))?;
    }

    // Commanded voltage
    let (c_lo, c_hi) = value_range(run.records.iter().map(|r| r.command));
    let mut chart = ChartBuilder::on(&command_area)
        .caption("Output Voltage [DAC units]", ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..t_end, c_lo..c_hi)?;
    chart.configure_mesh().x_desc("Time [s]").draw()?;
    chart.draw_series(LineSeries::new(
        run.records.iter().enumerate().map(|(i, r)| (time(i), r.command)),
        &BLUE,
    ))?;

    if let Some(area) = actions_area {
        let (a_lo, a_hi) = value_range(
            run.records
                .iter()
                .flat_map(|r| [r.actions.p, r.actions.i, r.actions.d]),
        );
        let mut chart = ChartBuilder::on(&area)
            .caption("PID actions over time", ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..t_end, a_lo..a_hi)?;
        chart.configure_mesh().x_desc("Time [s]").y_desc("Feedback action").draw()?;
        chart
            .draw_series(LineSeries::new(
                run.records.iter().enumerate().map(|(i, r)| (time(i), r.actions.p)),
                &RED,
            ))?
            .label("P action")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        chart
            .draw_series(LineSeries::new(
                run.records.iter().enumerate().map(|(i, r)| (time(i), r.actions.i)),
                &GREEN,
            ))?
            .label("I action")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GREEN));
        chart
            .draw_series(LineSeries::new(
                run.records.iter().enumerate().map(|(i, r)| (time(i), r.actions.d)),
                &MAGENTA,
            ))?
            .label("D action")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &MAGENTA));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    if let Some(resp) = StepResponse::analyze(run) {
        footer.draw(&Text::new(resp.summary(), (20, 20), ("sans-serif", 18)))?;
    }

    root.present()?;
    Ok(())
}
