//! Step response figures of a recorded run.

use super::recorder::RunLog;

/// Fraction of the reference that bounds the settling band.
const SETTLE_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResponse {
    /// Peak excursion past the reference, in mm/s. Negative when the belt
    /// never reached the reference.
    pub overshoot: f64,
    /// Seconds between the 10 % and 90 % crossings, if both happened.
    pub rise_time: Option<f64>,
    /// Time of the last sample outside the ±5 % band, or of the last sample
    /// when the whole trace stayed inside it.
    pub settle_time: f64,
}

impl StepResponse {
    pub fn analyze(run: &RunLog) -> Option<Self> {
        if run.is_empty() {
            return None;
        }
        let reference = run.metadata.reference_velocity;

        let max = run.velocities().fold(f64::NEG_INFINITY, f64::max);
        let min = run.velocities().fold(f64::INFINITY, f64::min);
        let overshoot = if reference > 0.0 {
            max - reference
        } else {
            reference - min
        };

        let rise_time = match (
            crossing_time(run, 0.1 * reference),
            crossing_time(run, 0.9 * reference),
        ) {
            (Some(low), Some(high)) => Some(high - low),
            _ => None,
        };

        let a = (1.0 - SETTLE_BAND) * reference;
        let b = (1.0 + SETTLE_BAND) * reference;
        let (band_min, band_max) = (a.min(b), a.max(b));
        let settle_time = run
            .velocities()
            .enumerate()
            .filter(|(_, v)| *v < band_min || *v > band_max)
            .last()
            .map(|(i, _)| run.time_at(i))
            .unwrap_or_else(|| run.time_at(run.len() - 1));

        Some(Self {
            overshoot,
            rise_time,
            settle_time,
        })
    }

    pub fn summary(&self) -> String {
        let rise = match self.rise_time {
            Some(t) => format!("{:.3} [s]", t),
            None => "n/a".to_string(),
        };
        format!(
            "overshoot={:.2} [mm/s]   risetime={}   settletime={:.3} [s]",
            self.overshoot, rise, self.settle_time
        )
    }
}

// First time the trace reaches `level` heading away from zero, linearly interpolated.
fn crossing_time(run: &RunLog, level: f64) -> Option<f64> {
    let reached = |v: f64| if level >= 0.0 { v >= level } else { v <= level };
    let mut previous: Option<(usize, f64)> = None;
    for (i, v) in run.velocities().enumerate() {
        if reached(v) {
            return Some(match previous {
                Some((j, pv)) if v != pv => {
                    let fraction = (level - pv) / (v - pv);
                    run.time_at(j) + fraction * (run.time_at(i) - run.time_at(j))
                }
                _ => run.time_at(i),
            });
        }
        previous = Some((i, v));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{PidActions, PidGains};
    use crate::visualization::recorder::{RunMetadata, TickRecord};
    use approx::assert_relative_eq;

    fn run(reference: f64, velocities: &[f64]) -> RunLog {
        RunLog {
            metadata: RunMetadata {
                gains: PidGains {
                    kp: 1.0,
                    ki: 0.0,
                    kd: 0.0,
                },
                reference_velocity: reference,
                sample_interval: 0.01,
                command_limit: 1023.0,
            },
            records: velocities
                .iter()
                .map(|&velocity| TickRecord {
                    velocity,
                    command: 0.0,
                    actions: PidActions::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn empty_run_has_no_response() {
        assert!(StepResponse::analyze(&run(100.0, &[])).is_none());
    }

    #[test]
    fn ramp_rise_time_is_interpolated() {
        // 0, 20, 40, ... 100, 110, 100
        let r = run(100.0, &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 110.0, 100.0]);
        let resp = StepResponse::analyze(&r).unwrap();
        assert_relative_eq!(resp.overshoot, 10.0);
        // 10 at t=0.005, 90 at t=0.045
        assert_relative_eq!(resp.rise_time.unwrap(), 0.04, epsilon = 1e-12);
        // 110 at index 6 is outside the band
        assert_relative_eq!(resp.settle_time, 0.06, epsilon = 1e-12);
    }

    #[test]
    fn negative_reference_mirrors_the_figures() {
        let r = run(-50.0, &[0.0, -30.0, -55.0, -50.0]);
        let resp = StepResponse::analyze(&r).unwrap();
        assert_relative_eq!(resp.overshoot, 5.0);
        assert!(resp.rise_time.is_some());
        assert_relative_eq!(resp.settle_time, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn trace_inside_the_band_settles_at_its_last_sample() {
        let r = run(100.0, &[100.0, 101.0, 99.0]);
        let resp = StepResponse::analyze(&r).unwrap();
        assert_relative_eq!(resp.settle_time, 0.02, epsilon = 1e-12);
        assert_relative_eq!(resp.overshoot, 1.0);
    }

    #[test]
    fn never_reaching_the_band_leaves_rise_time_open() {
        let r = run(100.0, &[0.0, 5.0, 50.0]);
        let resp = StepResponse::analyze(&r).unwrap();
        assert!(resp.rise_time.is_none());
        assert_relative_eq!(resp.overshoot, -50.0);
    }
}
