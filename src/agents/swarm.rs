//! Shared machinery for population-search agents
//!
//! Swarm agents score candidate positions around the organism and walk
//! toward the best one. All swarm state is private to the agent; the
//! engine only ever sees the single chosen action. Because observations
//! are information-limited, the fitness function works from remembered
//! hunter sightings and accumulated trophy hints rather than raw world
//! grids.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::agents::heuristic::HeuristicAgent;
use crate::agents::{Agent, Decision};
use crate::core::types::{Action, Cardinal, GridPos};
use crate::sim::observation::Observation;
use crate::sim::trophy::{DistanceBand, Warmth};

/// Last known information about one hunter
#[derive(Debug, Clone)]
struct KnownHunter {
    pos: GridPos,
    is_chasing: bool,
    last_seen: u64,
}

/// Conservative guess at a hunter's detection radius, used for the
/// avoidance penalty while the real (hidden) radius is unknown.
const ESTIMATED_DETECTION_RADIUS: f64 = 7.0;

/// Hunters unseen for this many steps are forgotten
const HUNTER_MEMORY_STEPS: u64 = 30;

/// Shared state and scoring for swarm-based agents
pub struct SwarmCore {
    pub rng: ChaCha8Rng,
    pub pop_size: usize,
    pub search_radius: i32,
    known_hunters: BTreeMap<u32, KnownHunter>,
    trophy_dir: (f64, f64),
    trophy_magnitude: f64,
    heuristic: HeuristicAgent,
    pub step_count: u64,
}

impl SwarmCore {
    pub fn new(pop_size: usize, search_radius: i32, seed: u64) -> SwarmCore {
        SwarmCore {
            rng: ChaCha8Rng::seed_from_u64(seed),
            pop_size,
            search_radius,
            known_hunters: BTreeMap::new(),
            trophy_dir: (0.0, 0.0),
            trophy_magnitude: 1.0,
            heuristic: HeuristicAgent::new(),
            step_count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.known_hunters.clear();
        self.trophy_dir = (0.0, 0.0);
        self.trophy_magnitude = 1.0;
        self.step_count = 0;
    }

    /// Track visible hunters and forget stale sightings.
    pub fn update_hunter_memory(&mut self, obs: &Observation) {
        for h in &obs.visible_hunters {
            self.known_hunters.insert(
                h.id,
                KnownHunter {
                    pos: h.pos,
                    is_chasing: h.is_chasing,
                    last_seen: self.step_count,
                },
            );
        }
        let cutoff = self.step_count.saturating_sub(HUNTER_MEMORY_STEPS);
        self.known_hunters.retain(|_, info| info.last_seen >= cutoff);
    }

    /// Refine the trophy direction estimate from this tick's hints.
    pub fn update_trophy_estimate(&mut self, obs: &Observation) {
        let Some(trophy) = &obs.trophy else {
            return;
        };

        if let Some(dir) = trophy.direction {
            let (dx, dy) = match dir {
                Cardinal::N => (0.0, -1.0),
                Cardinal::S => (0.0, 1.0),
                Cardinal::E => (1.0, 0.0),
                Cardinal::W => (-1.0, 0.0),
            };
            // Blend: trust the fresh hint more than the old estimate
            let bx = 0.3 * self.trophy_dir.0 + 0.7 * dx;
            let by = 0.3 * self.trophy_dir.1 + 0.7 * dy;
            let norm = (bx * bx + by * by).sqrt();
            if norm > 0.0 {
                self.trophy_dir = (bx / norm, by / norm);
            }
        }

        match trophy.temperature {
            Some(Warmth::Warmer) => {
                self.trophy_magnitude = (self.trophy_magnitude * 1.2).min(3.0);
            }
            Some(Warmth::Colder) => {
                self.trophy_magnitude = (self.trophy_magnitude * 0.7).max(0.3);
            }
            _ => {}
        }

        self.trophy_magnitude = match trophy.distance_approx {
            DistanceBand::VeryClose => 3.0,
            DistanceBand::Close => 2.0,
            DistanceBand::Moderate => self.trophy_magnitude,
            DistanceBand::Far => self.trophy_magnitude.min(1.0),
        };
    }

    /// Score a candidate position. Higher is better.
    pub fn fitness(&self, x: f64, y: f64, obs: &Observation) -> f64 {
        let org = obs.agent.pos;
        let dx = x - org.x as f64;
        let dy = y - org.y as f64;
        let mut score = 0.0;

        // Trophy attraction along the estimated direction
        let dir_norm = (self.trophy_dir.0.powi(2) + self.trophy_dir.1.powi(2)).sqrt();
        if dir_norm > 0.01 {
            score += (dx * self.trophy_dir.0 + dy * self.trophy_dir.1) * self.trophy_magnitude * 2.0;
        }

        // Avoid remembered hunters; chasing ones are doubly dangerous
        for info in self.known_hunters.values() {
            let hx = info.pos.x as f64;
            let hy = info.pos.y as f64;
            let dist = ((x - hx).powi(2) + (y - hy).powi(2)).sqrt();
            if dist < ESTIMATED_DETECTION_RADIUS {
                let mut penalty = (ESTIMATED_DETECTION_RADIUS - dist).powi(2);
                if info.is_chasing {
                    penalty *= 2.0;
                }
                score -= penalty * 1.5;
            }
        }

        // Pull toward the observed water direction when thirsty
        if let Some(dir) = obs.nearby.nearest_water.direction {
            let urgency = ((60.0 - obs.agent.hydration) / 60.0).max(0.0);
            let (wx, wy) = match dir {
                Cardinal::N => (0.0, -1.0),
                Cardinal::S => (0.0, 1.0),
                Cardinal::E => (1.0, 0.0),
                Cardinal::W => (-1.0, 0.0),
            };
            score += (dx * wx + dy * wy) * urgency * 5.0;
        }

        // Pull toward the best known shelter under temperature stress
        let temp_stress = obs.local.air_temp_c > 35.0 || obs.local.air_temp_c < 5.0;
        if temp_stress && obs.nearby.best_shelter.shelter_quality > 0.2 {
            if let Some(dir) = obs.nearby.best_shelter.direction {
                let (sx, sy) = match dir {
                    Cardinal::N => (0.0, -1.0),
                    Cardinal::S => (0.0, 1.0),
                    Cardinal::E => (1.0, 0.0),
                    Cardinal::W => (-1.0, 0.0),
                };
                score += (dx * sx + dy * sy) * 3.0;
            }
        }

        // Mild penalty for wandering beyond the search horizon
        let range = (dx * dx + dy * dy).sqrt();
        if range > self.search_radius as f64 {
            score -= (range - self.search_radius as f64) * 2.0;
        }

        score
    }

    /// Delegate to the survival heuristic when vitals are critical or a
    /// hunter is breathing down our neck.
    pub fn survival_override(&mut self, obs: &Observation) -> Option<Decision> {
        let agent = &obs.agent;
        if agent.hydration < 20.0 || agent.energy < 20.0 || agent.fatigue > 85.0 || agent.injury > 70.0
        {
            return Some(self.heuristic.decide(obs));
        }
        if let Some(nearest) = obs.visible_hunters.iter().min_by_key(|h| h.distance) {
            if nearest.distance <= 3 {
                return Some(self.heuristic.decide(obs));
            }
        }
        None
    }

    /// Initialize a population within the search radius of the organism.
    pub fn init_population(&mut self, org: GridPos) -> Vec<(f64, f64)> {
        let r = self.search_radius;
        (0..self.pop_size)
            .map(|_| {
                let dx = self.rng.gen_range(-r..=r);
                let dy = self.rng.gen_range(-r..=r);
                ((org.x + dx) as f64, (org.y + dy) as f64)
            })
            .collect()
    }

    /// Translate a target position into a single masked MOVE action.
    pub fn position_to_action(&self, best: (f64, f64), org: GridPos, obs: &Observation) -> Decision {
        let dx = best.0 - org.x as f64;
        let dy = best.1 - org.y as f64;

        let mut candidates: Vec<Action> = Vec::new();
        let horizontal = if dx > 0.0 {
            Some(Action::MoveE)
        } else if dx < 0.0 {
            Some(Action::MoveW)
        } else {
            None
        };
        let vertical = if dy > 0.0 {
            Some(Action::MoveS)
        } else if dy < 0.0 {
            Some(Action::MoveN)
        } else {
            None
        };
        if dx.abs() >= dy.abs() {
            candidates.extend(horizontal);
            candidates.extend(vertical);
        } else {
            candidates.extend(vertical);
            candidates.extend(horizontal);
        }

        for action in candidates {
            if obs.action_mask.contains(&action) {
                return Decision::new(action, "Moving toward swarm target", 0.7);
            }
        }

        for action in [Action::MoveE, Action::MoveS, Action::MoveN, Action::MoveW] {
            if obs.action_mask.contains(&action) {
                return Decision::new(action, "Exploring (no direct path to swarm target)", 0.4);
            }
        }

        Decision::new(Action::Rest, "Resting (blocked)", 0.3)
    }
}
