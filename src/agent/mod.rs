use grid::Grid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::space::Action;

pub const LEARNING_RATE: f64 = 0.1;
pub const DISCOUNT: f64 = 0.95;
pub const INITIAL_EPSILON: f64 = 0.5;
pub const EPSILON_DECAY: f64 = 0.995;
pub const EPSILON_MIN: f64 = 0.05;

/// Tabular Q-learning agent over the flat discrete state space.
///
/// The value table is dense (`num_states x 4`, zero-initialized) and is the
/// agent's only learned state. Exploration decays geometrically once per
/// `update` call, not per episode.
pub struct QAgent {
    q: Grid<f64>,
    lr: f64,
    gamma: f64,
    eps: f64,
    eps_decay: f64,
    eps_min: f64,
    rng: StdRng,
}

impl QAgent {
    pub fn new(num_states: usize) -> Self {
        Self::with_rng(num_states, StdRng::from_entropy())
    }

    /// Deterministic agent for reproducible runs and tests.
    pub fn seeded(num_states: usize, seed: u64) -> Self {
        Self::with_rng(num_states, StdRng::seed_from_u64(seed))
    }

    fn with_rng(num_states: usize, rng: StdRng) -> Self {
        Self {
            q: Grid::new(num_states, Action::COUNT),
            lr: LEARNING_RATE,
            gamma: DISCOUNT,
            eps: INITIAL_EPSILON,
            eps_decay: EPSILON_DECAY,
            eps_min: EPSILON_MIN,
            rng,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.eps
    }

    /// Epsilon-greedy selection: explore uniformly with probability
    /// `epsilon`, otherwise exploit the current value estimates.
    pub fn select_action(&mut self, state: usize) -> Action {
        if self.rng.gen::<f64>() < self.eps {
            Action::ALL[self.rng.gen_range(0..Action::COUNT)]
        } else {
            self.greedy(state)
        }
    }

    /// Highest-valued action for `state`; ties break toward the lowest
    /// action index.
    pub fn greedy(&self, state: usize) -> Action {
        let mut best = 0;
        for (i, &v) in self.q[state].iter().enumerate() {
            if v > self.q[state][best] {
                best = i;
            }
        }
        Action::ALL[best]
    }

    /// One-step Q-update, then epsilon decay (clamped at the floor).
    pub fn update(&mut self, state: usize, action: Action, reward: f64, next_state: usize) {
        let max_next = self
            .q[next_state]
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let target = reward + self.gamma * max_next;
        let q = &mut self.q[state][action.index()];
        *q += self.lr * (target - *q);

        self.eps = (self.eps * self.eps_decay).max(self.eps_min);
    }
}
