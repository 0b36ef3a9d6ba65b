//! Organism physiology: state, resource drain, recovery, death checks

use std::collections::BTreeMap;

use crate::core::config::PhysiologyConfig;
use crate::core::types::{Action, CauseOfDeath, GridPos};

/// The single player entity
#[derive(Debug, Clone)]
pub struct Organism {
    pub pos: GridPos,
    pub hydration: f64,
    pub energy: f64,
    pub core_temp_c: f64,
    pub fatigue: f64,
    pub injury: f64,
    pub infection: f64,
    pub alive: bool,
    pub cause_of_death: CauseOfDeath,
    pub age_steps: u64,
    pub has_shelter: bool,
    pub shelter_durability: i32,
}

impl Organism {
    pub fn from_config(cfg: &PhysiologyConfig, pos: GridPos) -> Organism {
        Organism {
            pos,
            hydration: cfg.initial_hydration,
            energy: cfg.initial_energy,
            core_temp_c: cfg.initial_core_temp,
            fatigue: cfg.initial_fatigue,
            injury: cfg.initial_injury,
            infection: cfg.initial_infection,
            alive: true,
            cause_of_death: CauseOfDeath::Alive,
            age_steps: 0,
            has_shelter: false,
            shelter_durability: 0,
        }
    }

    /// Clamp every bounded vital to [0, 100]. Core temperature is
    /// deliberately left unclamped; death gating handles it.
    pub fn clamp_vitals(&mut self) {
        self.hydration = self.hydration.clamp(0.0, 100.0);
        self.energy = self.energy.clamp(0.0, 100.0);
        self.fatigue = self.fatigue.clamp(0.0, 100.0);
        self.injury = self.injury.clamp(0.0, 100.0);
        self.infection = self.infection.clamp(0.0, 100.0);
    }
}

/// Apply resource drain, recovery, and thermal drift for one tick.
///
/// Returns the per-vital deltas for the replay log. No-op once dead.
#[allow(clippy::too_many_arguments)]
pub fn apply_physiology(
    state: &mut Organism,
    action: Action,
    air_temp: f64,
    shelter_active: bool,
    movement_cost: f64,
    dt: f64,
    cfg: &PhysiologyConfig,
    difficulty_mult: f64,
) -> BTreeMap<String, f64> {
    let mut deltas = BTreeMap::new();
    if !state.alive {
        return deltas;
    }

    let mut act_mult = action.activity_mult();
    if action.is_move() {
        act_mult *= movement_cost;
    }

    // Extra hydration loss above 30°C ambient
    let heat_mult = ((air_temp - 30.0) / 10.0).max(0.0) * 0.8;

    let h_drain = (cfg.hydration_base_drain * act_mult + heat_mult) * dt * difficulty_mult;
    state.hydration -= h_drain;
    deltas.insert("hydration".into(), -h_drain);

    let e_drain = cfg.energy_base_drain * act_mult * dt * difficulty_mult;
    state.energy -= e_drain;
    deltas.insert("energy".into(), -e_drain);

    let f_change = if action == Action::Rest {
        -cfg.rest_fatigue_recovery * dt
    } else {
        cfg.fatigue_base_gain * act_mult * dt * difficulty_mult
    };
    state.fatigue += f_change;
    deltas.insert("fatigue".into(), f_change);

    // Core temperature drifts toward ambient; shelter cuts the rate to 30%
    let shelter_k = cfg.thermal_drift_k * if shelter_active { 0.3 } else { 1.0 };
    let temp_drift = (air_temp - state.core_temp_c) * shelter_k * dt;
    state.core_temp_c += temp_drift;
    deltas.insert("core_temp".into(), temp_drift);

    // Injuries heal only while resting and not exhausted
    if action == Action::Rest && state.fatigue < 40.0 {
        let heal = cfg.injury_recovery_rate * dt;
        state.injury -= heal;
        deltas.insert("injury".into(), -heal);
    }

    // Infection grows when injured and the ambient temperature is extreme
    if state.injury > 20.0 && !(5.0..=38.0).contains(&air_temp) {
        let grow = 0.3 * (state.injury / 100.0) * dt;
        state.infection += grow;
        deltas.insert("infection".into(), grow);
    }

    state.clamp_vitals();
    deltas
}

/// Evaluate death conditions in fixed priority order.
///
/// The first threshold crossed sets the cause. Returns whether a
/// transition to dead occurred on this call; already-dead organisms are
/// left untouched so an earlier cause is never overwritten.
pub fn check_death(state: &mut Organism, cfg: &PhysiologyConfig) -> bool {
    if !state.alive {
        return false;
    }

    let cause = if state.hydration <= cfg.death_hydration {
        Some(CauseOfDeath::Dehydration)
    } else if state.energy <= cfg.death_energy {
        Some(CauseOfDeath::Starvation)
    } else if state.core_temp_c <= cfg.death_core_temp_low {
        Some(CauseOfDeath::Hypothermia)
    } else if state.core_temp_c >= cfg.death_core_temp_high {
        Some(CauseOfDeath::Hyperthermia)
    } else if state.injury >= cfg.death_injury {
        Some(CauseOfDeath::Trauma)
    } else if state.infection >= cfg.death_infection {
        Some(CauseOfDeath::Infection)
    } else {
        None
    };

    if let Some(cause) = cause {
        state.alive = false;
        state.cause_of_death = cause;
        tracing::info!(?cause, age = state.age_steps, "organism died");
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> Organism {
        let mut s = Organism::from_config(&PhysiologyConfig::default(), GridPos::new(0, 0));
        s.hydration = 50.0;
        s.energy = 50.0;
        s.fatigue = 20.0;
        s.injury = 10.0;
        s.infection = 5.0;
        s
    }

    #[test]
    fn test_death_dehydration() {
        let cfg = PhysiologyConfig::default();
        let mut s = state();
        s.hydration = 0.0;
        assert!(check_death(&mut s, &cfg));
        assert!(!s.alive);
        assert_eq!(s.cause_of_death, CauseOfDeath::Dehydration);
    }

    #[test]
    fn test_death_priority_order() {
        // All thresholds crossed at once: dehydration wins
        let cfg = PhysiologyConfig::default();
        let mut s = state();
        s.hydration = 0.0;
        s.energy = 0.0;
        s.core_temp_c = 20.0;
        s.injury = 100.0;
        s.infection = 100.0;
        assert!(check_death(&mut s, &cfg));
        assert_eq!(s.cause_of_death, CauseOfDeath::Dehydration);

        // Without dehydration, starvation is next
        let mut s = state();
        s.energy = 0.0;
        s.core_temp_c = 20.0;
        s.injury = 100.0;
        check_death(&mut s, &cfg);
        assert_eq!(s.cause_of_death, CauseOfDeath::Starvation);

        // Then hypothermia ahead of trauma
        let mut s = state();
        s.core_temp_c = 20.0;
        s.injury = 100.0;
        check_death(&mut s, &cfg);
        assert_eq!(s.cause_of_death, CauseOfDeath::Hypothermia);

        let mut s = state();
        s.core_temp_c = 43.0;
        s.injury = 100.0;
        check_death(&mut s, &cfg);
        assert_eq!(s.cause_of_death, CauseOfDeath::Hyperthermia);

        let mut s = state();
        s.injury = 100.0;
        s.infection = 100.0;
        check_death(&mut s, &cfg);
        assert_eq!(s.cause_of_death, CauseOfDeath::Trauma);

        let mut s = state();
        s.infection = 100.0;
        check_death(&mut s, &cfg);
        assert_eq!(s.cause_of_death, CauseOfDeath::Infection);
    }

    #[test]
    fn test_death_is_terminal() {
        let cfg = PhysiologyConfig::default();
        let mut s = state();
        s.alive = false;
        s.cause_of_death = CauseOfDeath::Hunted;
        s.hydration = 0.0;
        // A later check must not relabel the cause
        assert!(!check_death(&mut s, &cfg));
        assert_eq!(s.cause_of_death, CauseOfDeath::Hunted);
    }

    #[test]
    fn test_rest_recovers_fatigue_and_injury() {
        let cfg = PhysiologyConfig::default();
        let mut s = state();
        s.fatigue = 30.0;
        s.injury = 10.0;
        apply_physiology(&mut s, Action::Rest, 20.0, false, 1.0, 1.0, &cfg, 1.0);
        assert!(s.fatigue < 30.0);
        assert!(s.injury < 10.0);
    }

    #[test]
    fn test_no_heal_when_exhausted() {
        let cfg = PhysiologyConfig::default();
        let mut s = state();
        s.fatigue = 80.0;
        s.injury = 10.0;
        let deltas = apply_physiology(&mut s, Action::Rest, 20.0, false, 1.0, 1.0, &cfg, 1.0);
        assert!(!deltas.contains_key("injury"));
        assert_eq!(s.injury, 10.0);
    }

    #[test]
    fn test_movement_scales_with_terrain_cost() {
        let cfg = PhysiologyConfig::default();
        let mut cheap = state();
        let mut steep = state();
        apply_physiology(&mut cheap, Action::MoveN, 20.0, false, 1.0, 1.0, &cfg, 1.0);
        apply_physiology(&mut steep, Action::MoveN, 20.0, false, 2.0, 1.0, &cfg, 1.0);
        assert!(steep.energy < cheap.energy);
    }

    #[test]
    fn test_shelter_slows_thermal_drift() {
        let cfg = PhysiologyConfig::default();
        let mut open = state();
        let mut sheltered = state();
        apply_physiology(&mut open, Action::Rest, -20.0, false, 1.0, 1.0, &cfg, 1.0);
        apply_physiology(&mut sheltered, Action::Rest, -20.0, true, 1.0, 1.0, &cfg, 1.0);
        assert!(sheltered.core_temp_c > open.core_temp_c);
    }

    #[test]
    fn test_infection_needs_injury_and_extreme_temp() {
        let cfg = PhysiologyConfig::default();
        let mut s = state();
        s.injury = 50.0;
        let before = s.infection;
        apply_physiology(&mut s, Action::Rest, 20.0, false, 1.0, 1.0, &cfg, 1.0);
        assert_eq!(s.infection, before, "mild temperature should not infect");
        apply_physiology(&mut s, Action::Rest, 2.0, false, 1.0, 1.0, &cfg, 1.0);
        assert!(s.infection > before, "cold with open injury should infect");
    }

    proptest! {
        #[test]
        fn prop_vitals_stay_bounded(
            hydration in 0.0f64..100.0,
            energy in 0.0f64..100.0,
            fatigue in 0.0f64..100.0,
            injury in 0.0f64..100.0,
            infection in 0.0f64..100.0,
            air_temp in -40.0f64..50.0,
            move_cost in 1.0f64..3.0,
            action_idx in 0usize..Action::ALL.len(),
        ) {
            let cfg = PhysiologyConfig::default();
            let mut s = state();
            s.hydration = hydration;
            s.energy = energy;
            s.fatigue = fatigue;
            s.injury = injury;
            s.infection = infection;
            apply_physiology(
                &mut s, Action::ALL[action_idx], air_temp, false, move_cost, 1.0, &cfg, 1.5,
            );
            prop_assert!((0.0..=100.0).contains(&s.hydration));
            prop_assert!((0.0..=100.0).contains(&s.energy));
            prop_assert!((0.0..=100.0).contains(&s.fatigue));
            prop_assert!((0.0..=100.0).contains(&s.injury));
            prop_assert!((0.0..=100.0).contains(&s.infection));
        }
    }
}
