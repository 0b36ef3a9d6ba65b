//! Uniform-random baseline agent

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::agents::{Agent, Decision};
use crate::core::types::Action;
use crate::sim::observation::Observation;

pub struct RandomAgent {
    rng: ChaCha8Rng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> RandomAgent {
        RandomAgent {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn decide(&mut self, obs: &Observation) -> Decision {
        let action = if obs.action_mask.is_empty() {
            Action::Rest
        } else {
            obs.action_mask[self.rng.gen_range(0..obs.action_mask.len())]
        };
        Decision::new(action, "Random choice", 0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::sim::engine::Engine;

    #[test]
    fn test_choice_is_masked_and_deterministic() {
        let mut engine = Engine::new(Config::default(), 42);
        let obs = engine.observe();

        let mut a = RandomAgent::new(7);
        let mut b = RandomAgent::new(7);
        for _ in 0..20 {
            let da = a.decide(&obs);
            let db = b.decide(&obs);
            assert_eq!(da.action, db.action);
            assert!(obs.action_mask.contains(&da.action));
        }
    }
}
