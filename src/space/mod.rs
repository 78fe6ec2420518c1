use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{Evaluate, PerformanceRecord};

/// Reward weights: delay dominates, then dynamic power, then static power.
/// These ratios define the cost surface and must not be retuned casually.
pub const DELAY_WEIGHT: f64 = 1.0;
pub const DYNAMIC_WEIGHT: f64 = 0.5;
pub const STATIC_WEIGHT: f64 = 0.1;

/// Cache keys round widths to 8 decimal places (10 nm resolution) to absorb
/// floating-point jitter between revisited sizings.
const CACHE_SCALE: f64 = 1e8;

/// One of the four fixed-step sizing moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    WidenNmos,
    NarrowNmos,
    WidenPmos,
    NarrowPmos,
}

impl Action {
    pub const COUNT: usize = 4;
    pub const ALL: [Action; 4] = [
        Action::WidenNmos,
        Action::NarrowNmos,
        Action::WidenPmos,
        Action::NarrowPmos,
    ];

    pub fn index(&self) -> usize {
        match self {
            Action::WidenNmos => 0,
            Action::NarrowNmos => 1,
            Action::WidenPmos => 2,
            Action::NarrowPmos => 3,
        }
    }
}

/// Legal channel width range for one transistor type, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthBounds {
    pub min: f64,
    pub max: f64,
}

impl WidthBounds {
    pub fn clamp(&self, w: f64) -> f64 {
        w.clamp(self.min, self.max)
    }

    /// Step size of one grid cell.
    pub fn step(&self, grid_size: usize) -> f64 {
        (self.max - self.min) / grid_size as f64
    }

    /// Quantizes a width into one of `grid_size` bins.
    pub fn bin(&self, w: f64, grid_size: usize) -> usize {
        let norm = (w - self.min) / (self.max - self.min) * (grid_size - 1) as f64;
        norm.clamp(0.0, (grid_size - 1) as f64) as usize
    }

    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        rng.gen_range(self.min..self.max)
    }
}

/// The pair of channel widths being optimized, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sizing {
    pub w_n: f64,
    pub w_p: f64,
}

/// Outcome of applying one action: the new discrete state, its reward, and
/// the raw metrics behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: usize,
    pub reward: f64,
    pub record: PerformanceRecord,
}

/// Scalar cost-negated performance score. Strictly negative for any record
/// with positive delay and power.
pub fn reward(record: &PerformanceRecord) -> f64 {
    let delay_ps = record.avg_delay() * 1e12;
    let dynamic_uw = record.dynamic_power * 1e6;
    let static_nw = record.static_power * 1e9;
    -(DELAY_WEIGHT * delay_ps + DYNAMIC_WEIGHT * dynamic_uw + STATIC_WEIGHT * static_nw)
}

/// The discretized 2-D design space over which the agent moves.
///
/// Owns the running sizing, its bounds, the evaluator, and the evaluation
/// cache. Exactly one instance may drive a given parameter file at a time.
pub struct DesignSpace<E> {
    sizing: Sizing,
    nmos: WidthBounds,
    pmos: WidthBounds,
    grid_size: usize,
    cache: HashMap<(i64, i64), PerformanceRecord>,
    evaluator: E,
}

impl<E: Evaluate> DesignSpace<E> {
    pub fn new(
        evaluator: E,
        nmos: WidthBounds,
        pmos: WidthBounds,
        initial: Sizing,
        grid_size: usize,
    ) -> Self {
        assert!(grid_size > 1, "grid size must be at least 2");
        Self {
            sizing: Sizing {
                w_n: nmos.clamp(initial.w_n),
                w_p: pmos.clamp(initial.w_p),
            },
            nmos,
            pmos,
            grid_size,
            cache: HashMap::new(),
            evaluator,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn num_states(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Number of distinct sizings evaluated so far.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Pure projection of the current sizing onto the discrete grid.
    pub fn state(&self) -> usize {
        let sn = self.nmos.bin(self.sizing.w_n, self.grid_size);
        let sp = self.pmos.bin(self.sizing.w_p, self.grid_size);
        sn * self.grid_size + sp
    }

    /// Re-draws both widths uniformly within bounds. Used by the driver's
    /// periodic exploration restart.
    pub fn reset_random(&mut self, rng: &mut impl Rng) {
        self.sizing.w_n = self.nmos.sample(rng);
        self.sizing.w_p = self.pmos.sample(rng);
    }

    /// Moves the sizing one step in the action's direction, clamped to the
    /// legal range, and evaluates the result (cache-checked).
    ///
    /// An action at a boundary degenerates to a no-op rather than an error;
    /// the environment always yields a valid next state.
    pub fn apply(&mut self, action: Action) -> Step {
        let step_n = self.nmos.step(self.grid_size);
        let step_p = self.pmos.step(self.grid_size);
        match action {
            Action::WidenNmos => self.sizing.w_n += step_n,
            Action::NarrowNmos => self.sizing.w_n -= step_n,
            Action::WidenPmos => self.sizing.w_p += step_p,
            Action::NarrowPmos => self.sizing.w_p -= step_p,
        }
        self.sizing.w_n = self.nmos.clamp(self.sizing.w_n);
        self.sizing.w_p = self.pmos.clamp(self.sizing.w_p);

        let key = cache_key(&self.sizing);
        let record = match self.cache.get(&key) {
            Some(record) => *record,
            None => {
                let record = self.evaluator.evaluate(&self.sizing);
                self.cache.insert(key, record);
                record
            }
        };

        Step {
            state: self.state(),
            reward: reward(&record),
            record,
        }
    }
}

fn cache_key(sizing: &Sizing) -> (i64, i64) {
    (
        (sizing.w_n * CACHE_SCALE).round() as i64,
        (sizing.w_p * CACHE_SCALE).round() as i64,
    )
}
