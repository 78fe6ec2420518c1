use std::time::Duration;

use thiserror::Error;

use crate::space::Sizing;

pub mod ngspice;
pub mod report;

/// Smallest magnitude admitted for any delay or power reading.
///
/// Zero or negative readings would corrupt reward shaping, so every parsed
/// value is taken as `max(FLOOR, |x|)`.
pub const PERF_FLOOR: f64 = 1e-15;

/// Fallback metrics returned when the simulator itself cannot be run.
///
/// Note the delay here (1e-8) differs from the per-field parse fallback
/// (1e-9) in [`report`]; the asymmetry is preserved from the original tool.
pub const FALLBACK_DELAY: f64 = 1e-8;
pub const FALLBACK_POWER: f64 = 1e-3;

/// Electrical metrics for one sizing, as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceRecord {
    /// Rising propagation delay, in seconds.
    pub t_plh: f64,
    /// Falling propagation delay, in seconds.
    pub t_phl: f64,
    /// Static power, in watts.
    pub static_power: f64,
    /// Dynamic power, in watts.
    pub dynamic_power: f64,
}

impl PerformanceRecord {
    pub fn new(t_plh: f64, t_phl: f64, static_power: f64, dynamic_power: f64) -> Self {
        Self {
            t_plh: floor(t_plh),
            t_phl: floor(t_phl),
            static_power: floor(static_power),
            dynamic_power: floor(dynamic_power),
        }
    }

    /// Arithmetic mean of the rising and falling propagation delays.
    pub fn avg_delay(&self) -> f64 {
        (self.t_plh + self.t_phl) / 2.0
    }
}

fn floor(x: f64) -> f64 {
    x.abs().max(PERF_FLOOR)
}

pub fn fallback_record() -> PerformanceRecord {
    PerformanceRecord::new(
        FALLBACK_DELAY,
        FALLBACK_DELAY,
        FALLBACK_POWER,
        FALLBACK_POWER,
    )
}

#[derive(Debug, Error)]
pub enum SimulationFailure {
    #[error("failed to start simulator `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("simulator did not finish within {0:?} and was killed")]
    Timeout(Duration),

    #[error("I/O error while communicating with simulator: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to render parameter file: {0}")]
    Template(#[from] tera::Error),
}

/// The evaluation seam between the design-space environment and whatever
/// produces electrical metrics. The production implementation is
/// [`ngspice::Ngspice`]; tests substitute synthetic surfaces.
///
/// Implementations never fail: simulator-adjacent errors degrade to
/// conservative fallback metrics so an optimization run can always complete.
pub trait Evaluate {
    fn evaluate(&mut self, sizing: &Sizing) -> PerformanceRecord;
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_record_floors_degenerate_readings() {
        let rec = PerformanceRecord::new(0.0, -2e-11, -1e-9, 0.0);
        assert_eq!(rec.t_plh, PERF_FLOOR);
        assert_relative_eq!(rec.t_phl, 2e-11);
        assert_relative_eq!(rec.static_power, 1e-9);
        assert_eq!(rec.dynamic_power, PERF_FLOOR);
    }

    #[test]
    fn test_avg_delay() {
        let rec = PerformanceRecord::new(100e-12, 50e-12, 1e-9, 1e-6);
        assert_relative_eq!(rec.avg_delay(), 75e-12);
    }

    #[test]
    fn test_fallback_record_values() {
        let rec = fallback_record();
        assert_eq!(rec.t_plh, 1e-8);
        assert_eq!(rec.t_phl, 1e-8);
        assert_eq!(rec.static_power, 1e-3);
        assert_eq!(rec.dynamic_power, 1e-3);
    }
}
