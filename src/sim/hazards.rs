//! Wildlife encounters and environmental stress events

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::types::{Action, Terrain};
use crate::sim::organism::Organism;

/// Wildlife is more active at dawn/dusk and at night.
fn time_multiplier(hour: u32) -> f64 {
    if (5..=7).contains(&hour) || (18..=20).contains(&hour) {
        1.5
    } else if hour >= 22 || hour <= 4 {
        1.8
    } else {
        1.0
    }
}

/// Outcome of a wildlife encounter roll
#[derive(Debug, Clone, Default)]
pub struct EncounterResult {
    pub encounter: bool,
    pub injury_delta: f64,
    pub energy_delta: f64,
    pub infection_delta: f64,
}

/// Roll a single Bernoulli wildlife encounter for this tick.
pub fn check_wildlife_encounter(
    state: &mut Organism,
    wildlife_risk: f64,
    hour: u32,
    action: Action,
    rng: &mut ChaCha8Rng,
    wildlife_multiplier: f64,
) -> EncounterResult {
    let mut result = EncounterResult::default();
    if !state.alive {
        return result;
    }

    // 0.3 scales raw risk down so encounters stay occasional
    let p = (wildlife_risk
        * time_multiplier(hour)
        * (1.0 - action.stealth_modifier())
        * 0.3
        * wildlife_multiplier)
        .clamp(0.0, 1.0);

    result.encounter = rng.gen::<f64>() < p;
    if result.encounter {
        result.injury_delta = rng.gen_range(3.0..15.0);
        result.energy_delta = -rng.gen_range(2.0..6.0);
        result.infection_delta = rng.gen_range(0.0..3.0);

        state.injury += result.injury_delta;
        state.energy += result.energy_delta;
        state.infection += result.infection_delta;
        state.clamp_vitals();
    }

    result
}

/// Check heat stress, hypothermia acceleration, and swamp disease.
///
/// All three are independent and may fire on the same tick. Each
/// appends a human-readable event string for the log and replay.
pub fn check_environmental_hazards(
    state: &mut Organism,
    air_temp: f64,
    shelter_active: bool,
    terrain: Terrain,
    humidity: f64,
    hazard_multiplier: f64,
) -> Vec<String> {
    let mut events = Vec::new();
    if !state.alive {
        return events;
    }

    // Heat stress: threshold lowers as difficulty rises
    let heat_threshold = 38.0 / hazard_multiplier.max(0.1);
    if air_temp > heat_threshold && !shelter_active {
        let extra_drain = (air_temp - heat_threshold) * 0.5 * hazard_multiplier;
        state.hydration = (state.hydration - extra_drain).max(0.0);
        events.push(format!("Heat stress: extra hydration drain {:.1}", extra_drain));
    }

    // Hypothermia accelerates when exhausted in the cold without cover
    if air_temp < 0.0 && !shelter_active && state.fatigue > 60.0 {
        let temp_drop = air_temp.abs() * 0.01;
        state.core_temp_c -= temp_drop;
        events.push(format!(
            "Hypothermia risk: core temp dropping extra {:.2}",
            temp_drop
        ));
    }

    // Stagnant swamp water carries disease
    if terrain == Terrain::Swamp && humidity > 0.7 {
        let disease_risk = 0.02 * humidity;
        state.infection = (state.infection + disease_risk).min(100.0);
        events.push(format!("Swamp exposure: infection +{:.2}", disease_risk));
    }

    events
}
