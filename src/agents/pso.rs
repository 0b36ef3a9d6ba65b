//! Particle Swarm Optimization agent
//!
//! Each particle carries a position, velocity, and personal best; the
//! swarm shares a global best. The organism takes one masked step
//! toward the global best each tick.

use rand::Rng;

use crate::agents::swarm::SwarmCore;
use crate::agents::{Agent, Decision};
use crate::core::config::SwarmConfig;
use crate::core::types::GridPos;
use crate::sim::observation::Observation;

// PSO hyperparameters
const INERTIA: f64 = 0.7;
const COGNITIVE: f64 = 1.5;
const SOCIAL: f64 = 2.0;
const MAX_VELOCITY: f64 = 3.0;

pub struct PsoAgent {
    core: SwarmCore,
    inner_iterations: u32,
    positions: Vec<(f64, f64)>,
    velocities: Vec<(f64, f64)>,
    personal_best: Vec<(f64, f64)>,
    personal_best_fit: Vec<f64>,
    global_best: (f64, f64),
    global_best_fit: f64,
    display_positions: Vec<GridPos>,
}

impl PsoAgent {
    pub fn new(seed: u64, config: &SwarmConfig) -> PsoAgent {
        PsoAgent {
            core: SwarmCore::new(config.population_size, config.search_radius, seed),
            inner_iterations: config.inner_iterations,
            positions: Vec::new(),
            velocities: Vec::new(),
            personal_best: Vec::new(),
            personal_best_fit: Vec::new(),
            global_best: (0.0, 0.0),
            global_best_fit: f64::NEG_INFINITY,
            display_positions: Vec::new(),
        }
    }

    fn ensure_initialized(&mut self, org: GridPos) {
        if !self.positions.is_empty() {
            return;
        }
        let n = self.core.pop_size;
        self.positions = self.core.init_population(org);
        self.velocities = (0..n)
            .map(|_| {
                (
                    self.core.rng.gen_range(-2.0..2.0),
                    self.core.rng.gen_range(-2.0..2.0),
                )
            })
            .collect();
        self.personal_best = self.positions.clone();
        self.personal_best_fit = vec![f64::NEG_INFINITY; n];
        self.global_best = (org.x as f64, org.y as f64);
        self.global_best_fit = f64::NEG_INFINITY;
    }

    fn run_iteration(&mut self, org: GridPos, obs: &Observation) -> (f64, f64) {
        self.ensure_initialized(org);
        let n = self.core.pop_size;

        for _ in 0..self.inner_iterations {
            for i in 0..n {
                let (px, py) = self.positions[i];
                let fit = self.core.fitness(px, py, obs);

                if fit > self.personal_best_fit[i] {
                    self.personal_best_fit[i] = fit;
                    self.personal_best[i] = self.positions[i];
                }
                if fit > self.global_best_fit {
                    self.global_best_fit = fit;
                    self.global_best = self.positions[i];
                }
            }

            for i in 0..n {
                let r1: f64 = self.core.rng.gen();
                let r2: f64 = self.core.rng.gen();
                let (px, py) = self.positions[i];
                let (vx, vy) = self.velocities[i];
                let (bx, by) = self.personal_best[i];
                let (gx, gy) = self.global_best;

                let nvx = (INERTIA * vx + COGNITIVE * r1 * (bx - px) + SOCIAL * r2 * (gx - px))
                    .clamp(-MAX_VELOCITY, MAX_VELOCITY);
                let nvy = (INERTIA * vy + COGNITIVE * r1 * (by - py) + SOCIAL * r2 * (gy - py))
                    .clamp(-MAX_VELOCITY, MAX_VELOCITY);

                self.velocities[i] = (nvx, nvy);
                self.positions[i] = (px + nvx, py + nvy);
            }
        }

        // Gentle re-centering keeps the swarm relevant to the organism
        for pos in &mut self.positions {
            pos.0 += 0.05 * (org.x as f64 - pos.0);
            pos.1 += 0.05 * (org.y as f64 - pos.1);
        }

        self.display_positions = self
            .positions
            .iter()
            .map(|&(x, y)| GridPos::new(x.round() as i32, y.round() as i32))
            .collect();

        self.global_best
    }
}

impl Agent for PsoAgent {
    fn decide(&mut self, obs: &Observation) -> Decision {
        self.core.step_count += 1;
        self.core.update_hunter_memory(obs);
        self.core.update_trophy_estimate(obs);

        if let Some(decision) = self.core.survival_override(obs) {
            return decision;
        }

        let org = obs.agent.pos;
        let best = self.run_iteration(org, obs);
        self.core.position_to_action(best, org, obs)
    }

    fn reset(&mut self) {
        self.core.reset();
        self.positions.clear();
        self.velocities.clear();
        self.personal_best.clear();
        self.personal_best_fit.clear();
        self.global_best = (0.0, 0.0);
        self.global_best_fit = f64::NEG_INFINITY;
        self.display_positions.clear();
    }

    fn swarm_positions(&self) -> Option<&[GridPos]> {
        (!self.display_positions.is_empty()).then_some(self.display_positions.as_slice())
    }
}
