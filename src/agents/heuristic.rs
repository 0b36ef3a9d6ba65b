//! Rule-based survival agent
//!
//! A fixed priority ladder over the observation: critical vitals first,
//! then temperature management, hunter avoidance, resource top-ups, and
//! finally exploration. Deterministic given the same observation.

use crate::agents::{Agent, Decision};
use crate::core::types::{Action, Cardinal};
use crate::sim::observation::Observation;

pub struct HeuristicAgent;

impl HeuristicAgent {
    pub fn new() -> HeuristicAgent {
        HeuristicAgent
    }
}

impl Default for HeuristicAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn masked(obs: &Observation, action: Action) -> bool {
    obs.action_mask.contains(&action)
}

fn masked_move(obs: &Observation, dir: Option<Cardinal>) -> Option<Action> {
    let action = dir?.to_move();
    masked(obs, action).then_some(action)
}

impl Agent for HeuristicAgent {
    fn decide(&mut self, obs: &Observation) -> Decision {
        let agent = &obs.agent;
        let local = &obs.local;
        let nearby = &obs.nearby;

        // Critical dehydration: drink if possible
        if agent.hydration < 25.0 && local.water_availability > 0.1 && masked(obs, Action::Drink) {
            return Decision::new(
                Action::Drink,
                "Critical dehydration, drinking available water",
                0.95,
            );
        }

        // Critical energy: forage if possible
        if agent.energy < 25.0 && local.vegetation_biomass > 0.1 && masked(obs, Action::Forage) {
            return Decision::new(
                Action::Forage,
                "Critical energy, foraging available vegetation",
                0.90,
            );
        }

        // Temperature management
        let temp_dangerous = local.air_temp_c > 35.0 || local.air_temp_c < 5.0;
        let core_drifting = agent.core_temp_c < 35.5 || agent.core_temp_c > 38.5;
        if (temp_dangerous || core_drifting) && !agent.has_shelter {
            if local.shelter_quality > 0.3 {
                return Decision::new(
                    Action::Rest,
                    format!(
                        "Temperature stress (air={:.0}C, core={:.1}C), using natural shelter",
                        local.air_temp_c, agent.core_temp_c
                    ),
                    0.90,
                );
            }
            if masked(obs, Action::BuildShelter) && agent.fatigue < 80.0 {
                return Decision::new(Action::BuildShelter, "Temperature stress, building shelter", 0.85);
            }
            if nearby.best_shelter.shelter_quality > 0.2 {
                if let Some(action) = masked_move(obs, nearby.best_shelter.direction) {
                    return Decision::new(action, "Seeking shelter nearby", 0.80);
                }
            }
            if core_drifting {
                return Decision::new(Action::Rest, "Resting to conserve body heat", 0.75);
            }
        }

        // High fatigue
        if agent.fatigue > 75.0 {
            return Decision::new(Action::Rest, "High fatigue, resting", 0.85);
        }

        // Hunter avoidance
        if let Some(nearest) = obs.visible_hunters.iter().min_by_key(|h| h.distance) {
            if nearest.distance <= 6 {
                // Danger zone: flee in the opposite direction
                let dx = agent.pos.x - nearest.pos.x;
                let dy = agent.pos.y - nearest.pos.y;
                let flee = Cardinal::from_delta(dx, dy);
                if let Some(action) = masked_move(obs, Some(flee)) {
                    return Decision::new(
                        action,
                        format!("Fleeing hunter at distance {}", nearest.distance),
                        0.95,
                    );
                }
                // Primary direction blocked: try perpendicular
                let perpendicular = match flee {
                    Cardinal::E | Cardinal::W => [Cardinal::N, Cardinal::S],
                    Cardinal::N | Cardinal::S => [Cardinal::E, Cardinal::W],
                };
                for dir in perpendicular {
                    if let Some(action) = masked_move(obs, Some(dir)) {
                        return Decision::new(action, "Evading hunter sideways", 0.85);
                    }
                }
            } else if nearest.distance <= 10 && masked(obs, Action::Hide) {
                return Decision::new(
                    Action::Hide,
                    format!("Hunter spotted at distance {}, hiding", nearest.distance),
                    0.80,
                );
            }
        }

        // Wildlife danger
        if local.wildlife_risk > 0.3 && masked(obs, Action::Hide) {
            return Decision::new(Action::Hide, "High wildlife risk, hiding", 0.75);
        }

        // Low hydration: head for water
        if agent.hydration < 50.0 {
            if let Some(action) = masked_move(obs, nearby.nearest_water.direction) {
                return Decision::new(action, "Low hydration, moving toward water", 0.70);
            }
        }

        // Low energy: forage
        if agent.energy < 50.0 && local.vegetation_biomass > 0.1 && masked(obs, Action::Forage) {
            return Decision::new(Action::Forage, "Low energy, foraging", 0.70);
        }

        // Opportunistic top-ups
        if agent.hydration < 70.0 && local.water_availability > 0.2 && masked(obs, Action::Drink) {
            return Decision::new(Action::Drink, "Topping up hydration", 0.60);
        }
        if agent.energy < 70.0 && local.vegetation_biomass > 0.2 && masked(obs, Action::Forage) {
            return Decision::new(Action::Forage, "Topping up energy", 0.55);
        }

        // Moderate fatigue
        if agent.fatigue > 50.0 {
            return Decision::new(Action::Rest, "Moderate fatigue, resting", 0.50);
        }

        // Trophy pursuit when a directional hint is fresh
        if let Some(trophy) = &obs.trophy {
            if let Some(action) = masked_move(obs, trophy.direction) {
                return Decision::new(action, "Moving toward trophy hint", 0.50);
            }
        }

        // Default: water supply first, then explore
        if agent.hydration < 60.0 {
            if let Some(action) = masked_move(obs, nearby.nearest_water.direction) {
                return Decision::new(action, "Moving toward water supply", 0.45);
            }
        }

        for action in [Action::MoveE, Action::MoveS, Action::MoveN, Action::MoveW] {
            if masked(obs, action) {
                return Decision::new(action, "Exploring", 0.30);
            }
        }

        Decision::new(Action::Rest, "No better option, resting", 0.20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::sim::engine::Engine;

    fn observation() -> Observation {
        let mut engine = Engine::new(Config::default(), 42);
        engine.observe()
    }

    #[test]
    fn test_decision_is_always_masked() {
        let mut agent = HeuristicAgent::new();
        let obs = observation();
        let decision = agent.decide(&obs);
        assert!(obs.action_mask.contains(&decision.action));
    }

    #[test]
    fn test_critical_thirst_drinks() {
        let mut agent = HeuristicAgent::new();
        let mut obs = observation();
        obs.agent.hydration = 10.0;
        obs.local.water_availability = 0.8;
        if !obs.action_mask.contains(&Action::Drink) {
            obs.action_mask.push(Action::Drink);
        }
        let decision = agent.decide(&obs);
        assert_eq!(decision.action, Action::Drink);
        assert!(decision.confidence > 0.9);
    }

    #[test]
    fn test_flees_close_hunter() {
        let mut agent = HeuristicAgent::new();
        let mut obs = observation();
        // Healthy vitals so avoidance is the top concern
        obs.agent.hydration = 90.0;
        obs.agent.energy = 90.0;
        obs.agent.fatigue = 10.0;
        obs.agent.core_temp_c = 37.0;
        obs.local.air_temp_c = 20.0;
        obs.local.wildlife_risk = 0.0;
        obs.visible_hunters = vec![crate::sim::hunters::HunterSighting {
            id: 0,
            pos: crate::core::types::GridPos::new(obs.agent.pos.x - 3, obs.agent.pos.y),
            distance: 3,
            is_chasing: true,
        }];
        let decision = agent.decide(&obs);
        assert!(
            decision.action.is_move() || decision.action == Action::Hide,
            "expected evasion, got {:?}",
            decision.action
        );
    }
}
