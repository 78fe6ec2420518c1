use indicatif::ProgressBar;
use log::info;
use rand::Rng;

use crate::agent::QAgent;
use crate::sim::{Evaluate, PerformanceRecord};
use crate::space::{DesignSpace, Sizing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeOpts {
    pub episodes: usize,
    pub steps_per_episode: usize,
    /// Re-draw the sizing uniformly at random every this many episodes
    /// (0 disables restarts). Episode 0 always restarts when enabled.
    pub reset_every: usize,
}

impl Default for OptimizeOpts {
    fn default() -> Self {
        Self {
            episodes: 100,
            steps_per_episode: 25,
            reset_every: 10,
        }
    }
}

/// Best transition observed across the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSolution {
    pub sizing: Sizing,
    pub reward: f64,
    pub record: PerformanceRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub best: Option<BestSolution>,
    /// Number of distinct simulations run (cache size).
    pub simulations: usize,
    pub final_epsilon: f64,
    /// Cumulative reward per episode.
    pub episode_rewards: Vec<f64>,
}

/// Runs the episodic optimization loop: select, apply, learn.
///
/// The environment is advanced one full evaluate-then-learn step at a time;
/// the best sizing seen is tracked on strictly greater reward.
pub fn optimize<E: Evaluate>(
    env: &mut DesignSpace<E>,
    agent: &mut QAgent,
    opts: &OptimizeOpts,
    rng: &mut impl Rng,
    progress: Option<&ProgressBar>,
) -> Summary {
    let mut best: Option<BestSolution> = None;
    let mut episode_rewards = Vec::with_capacity(opts.episodes);

    for ep in 0..opts.episodes {
        if opts.reset_every > 0 && ep % opts.reset_every == 0 {
            env.reset_random(rng);
        }

        let mut state = env.state();
        let mut total = 0.0;

        for _ in 0..opts.steps_per_episode {
            let action = agent.select_action(state);
            let step = env.apply(action);
            agent.update(state, action, step.reward, step.state);

            if best.map_or(true, |b| step.reward > b.reward) {
                best = Some(BestSolution {
                    sizing: env.sizing(),
                    reward: step.reward,
                    record: step.record,
                });
            }

            state = step.state;
            total += step.reward;
        }

        episode_rewards.push(total);

        if ep % 20 == 0 {
            info!(
                "episode {ep:4} | epsilon {:.2} | best reward {:.2}",
                agent.epsilon(),
                best.map_or(f64::NEG_INFINITY, |b| b.reward),
            );
        }
        if let Some(pb) = progress {
            pb.inc(1);
            if let Some(b) = &best {
                pb.set_message(format!("best {:.2}", b.reward));
            }
        }
    }

    Summary {
        best,
        simulations: env.cache_len(),
        final_epsilon: agent.epsilon(),
        episode_rewards,
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::sim::Evaluate;
    use crate::space::{reward, WidthBounds};

    use super::*;

    const W_MIN: f64 = 0.2e-6;
    const W_MAX: f64 = 5.0e-6;
    const GRID: usize = 20;

    /// Unimodal synthetic surface: delay grows quadratically with distance
    /// from a target sizing, powers are constant. The reward peak sits at
    /// the target.
    struct SyntheticSurface {
        target: Sizing,
    }

    fn surface_record(target: &Sizing, sizing: &Sizing) -> PerformanceRecord {
        let range = W_MAX - W_MIN;
        let dn = (sizing.w_n - target.w_n) / range;
        let dp = (sizing.w_p - target.w_p) / range;
        let delay = 1e-12 * (10.0 + 100.0 * (dn * dn + dp * dp));
        PerformanceRecord::new(delay, delay, 1e-9, 1e-6)
    }

    impl Evaluate for SyntheticSurface {
        fn evaluate(&mut self, sizing: &Sizing) -> PerformanceRecord {
            surface_record(&self.target, sizing)
        }
    }

    fn synthetic_env(target: Sizing) -> DesignSpace<SyntheticSurface> {
        let bounds = WidthBounds {
            min: W_MIN,
            max: W_MAX,
        };
        DesignSpace::new(
            SyntheticSurface { target },
            bounds,
            bounds,
            Sizing {
                w_n: 0.5e-6,
                w_p: 1.0e-6,
            },
            GRID,
        )
    }

    #[test]
    fn test_converges_near_global_optimum_on_unimodal_surface() {
        let target = Sizing {
            w_n: 2.6e-6,
            w_p: 2.6e-6,
        };
        let mut env = synthetic_env(target);
        let mut agent = QAgent::seeded(env.num_states(), 42);
        let mut rng = StdRng::seed_from_u64(7);

        let summary = optimize(
            &mut env,
            &mut agent,
            &OptimizeOpts::default(),
            &mut rng,
            None,
        );
        let best = summary.best.expect("no best solution tracked");

        // Global optimum over the lattice of reachable sizings. Restarts
        // land between lattice points, so scan at step/10 resolution to
        // bound the true surface optimum from above.
        let bounds = WidthBounds {
            min: W_MIN,
            max: W_MAX,
        };
        let fine = bounds.step(GRID) / 10.0;
        let mut optimum = f64::NEG_INFINITY;
        for i in 0..=(GRID * 10) {
            for j in 0..=(GRID * 10) {
                let s = Sizing {
                    w_n: W_MIN + i as f64 * fine,
                    w_p: W_MIN + j as f64 * fine,
                };
                optimum = optimum.max(reward(&surface_record(&target, &s)));
            }
        }

        // 2500 greedy-biased steps over a 20x20 grid should land within a
        // few cells of the peak; adjacent cells differ by well under 1.
        assert!(
            best.reward >= optimum - 10.0,
            "best {} too far from optimum {}",
            best.reward,
            optimum
        );
        assert_eq!(summary.episode_rewards.len(), 100);
        assert!(summary.final_epsilon >= 0.05);
        assert!(summary.simulations > 0);
    }

    #[test]
    fn test_best_solution_tracks_maximum_step_reward() {
        let target = Sizing {
            w_n: 1.0e-6,
            w_p: 1.0e-6,
        };
        let mut env = synthetic_env(target);
        let mut agent = QAgent::seeded(env.num_states(), 1);
        let mut rng = StdRng::seed_from_u64(1);
        let opts = OptimizeOpts {
            episodes: 5,
            steps_per_episode: 10,
            reset_every: 2,
        };

        let summary = optimize(&mut env, &mut agent, &opts, &mut rng, None);
        let best = summary.best.unwrap();
        assert_eq!(best.reward, reward(&best.record));
        assert_eq!(summary.episode_rewards.len(), 5);
        // Every per-step reward is negative on this surface.
        assert!(summary.episode_rewards.iter().all(|&r| r < 0.0));
        assert!(best.reward < 0.0);
    }

    #[test]
    fn test_restarts_disabled_never_draw_from_rng() {
        use rand::Rng;

        let target = Sizing {
            w_n: 1.0e-6,
            w_p: 1.0e-6,
        };
        let mut env = synthetic_env(target);
        let mut agent = QAgent::seeded(env.num_states(), 3);
        let mut rng = StdRng::seed_from_u64(3);
        let mut untouched = rng.clone();
        let opts = OptimizeOpts {
            episodes: 4,
            steps_per_episode: 3,
            reset_every: 0,
        };
        optimize(&mut env, &mut agent, &opts, &mut rng, None);
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }
}
