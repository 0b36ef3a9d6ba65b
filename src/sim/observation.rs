//! Partial observations surfaced to decision agents
//!
//! The observation is rebuilt fresh every tick and is the only view a
//! policy ever gets. Hidden engine parameters (hunter detection radii,
//! exact trophy position) must never appear here.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::config::Config;
use crate::core::types::{Action, Cardinal, GridPos, Terrain};
use crate::sim::hunters::HunterSighting;
use crate::sim::organism::Organism;
use crate::sim::trophy::TrophyHint;
use crate::world::climate::time_info;
use crate::world::{World, DIST_TO_WATER_FAR};

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeOfDay {
    pub day_of_year: u32,
    pub hour: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub pos: GridPos,
    pub hydration: f64,
    pub energy: f64,
    pub core_temp_c: f64,
    pub fatigue: f64,
    pub injury: f64,
    pub infection: f64,
    pub has_shelter: bool,
}

/// Summary of the cell the organism is standing on
#[derive(Debug, Clone, Serialize)]
pub struct LocalCell {
    pub terrain: Terrain,
    pub air_temp_c: f64,
    pub humidity: f64,
    pub water_availability: f64,
    pub vegetation_biomass: f64,
    pub wildlife_risk: f64,
    pub shelter_quality: f64,
    pub movement_cost: f64,
    pub elevation_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearestWater {
    pub distance: i32,
    pub direction: Option<Cardinal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestShelter {
    /// -1 when no shelter of any quality was seen
    pub distance: i32,
    pub direction: Option<Cardinal>,
    pub shelter_quality: f64,
}

/// Aggregate view of the scanned neighborhood
#[derive(Debug, Clone, Serialize)]
pub struct Neighborhood {
    pub nearest_water: NearestWater,
    pub best_shelter: BestShelter,
    pub avg_temp_c: f64,
    pub avg_vegetation: f64,
    pub max_wildlife_risk: f64,
}

/// One historical sighting of a hunter
#[derive(Debug, Clone, Serialize)]
pub struct TrackedSighting {
    /// Negative: this many steps before the current tick
    pub step_offset: i64,
    pub pos: GridPos,
    pub distance: i32,
    pub is_chasing: bool,
}

/// All recorded sightings of one hunter
#[derive(Debug, Clone, Serialize)]
pub struct HunterTrack {
    pub hunter_id: u32,
    pub sightings: Vec<TrackedSighting>,
}

/// The full per-tick observation handed to a policy
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub timestep: u64,
    pub time: TimeOfDay,
    pub agent: AgentView,
    pub local: LocalCell,
    pub nearby: Neighborhood,
    pub recent_memory: Vec<String>,
    pub action_mask: Vec<Action>,
    pub visible_hunters: Vec<HunterSighting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunter_sighting_history: Option<Vec<HunterTrack>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trophy: Option<TrophyHint>,
}

/// Build the observation for the current tick.
#[allow(clippy::too_many_arguments)]
pub fn build_observation(
    world: &World,
    organism: &Organism,
    step: u64,
    config: &Config,
    recent_events: &[String],
    visible_hunters: Vec<HunterSighting>,
    sighting_history: &[Vec<HunterSighting>],
    trophy_hint: Option<TrophyHint>,
) -> Observation {
    let time = time_info(step, config);
    let radius = if config.fog_of_war.enabled {
        config.fog_of_war.visibility_radius
    } else {
        config.sim.observation_radius
    };

    let pos = organism.pos;
    let i = world.idx(pos.x, pos.y);

    let local = LocalCell {
        terrain: world.terrain[i],
        air_temp_c: round1(world.air_temp_c[i]),
        humidity: round2(world.humidity[i]),
        water_availability: round2(world.water_availability[i]),
        vegetation_biomass: round2(world.vegetation_biomass[i]),
        wildlife_risk: round2(world.wildlife_risk[i]),
        shelter_quality: round2(world.shelter_quality[i]),
        movement_cost: round1(world.movement_cost[i]),
        elevation_m: world.elevation[i].round(),
    };

    let history = (!sighting_history.is_empty()).then(|| compile_tracks(sighting_history));

    Observation {
        timestep: step,
        time: TimeOfDay {
            day_of_year: time.day_of_year,
            hour: time.hour,
        },
        agent: AgentView {
            pos,
            hydration: round1(organism.hydration),
            energy: round1(organism.energy),
            core_temp_c: round1(organism.core_temp_c),
            fatigue: round1(organism.fatigue),
            injury: round1(organism.injury),
            infection: round1(organism.infection),
            has_shelter: organism.has_shelter,
        },
        local,
        nearby: scan_neighborhood(world, pos, radius),
        recent_memory: recent_events
            .iter()
            .rev()
            .take(5)
            .rev()
            .cloned()
            .collect(),
        action_mask: action_mask(world, pos),
        visible_hunters,
        hunter_sighting_history: history,
        trophy: trophy_hint,
    }
}

/// Single O(radius²) scan of the visible neighborhood.
fn scan_neighborhood(world: &World, center: GridPos, radius: i32) -> Neighborhood {
    let mut temp_sum = 0.0;
    let mut veg_sum = 0.0;
    let mut count = 0usize;
    let mut max_wildlife = 0.0f64;

    let mut water_dist = i32::MAX;
    let mut water_dir = None;
    let mut shelter_dist = i32::MAX;
    let mut shelter_dir = None;
    let mut shelter_q = 0.0f64;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (nx, ny) = (center.x + dx, center.y + dy);
            if !world.in_bounds(nx, ny) || (dx == 0 && dy == 0) {
                continue;
            }
            let i = world.idx(nx, ny);

            temp_sum += world.air_temp_c[i];
            veg_sum += world.vegetation_biomass[i];
            count += 1;
            max_wildlife = max_wildlife.max(world.wildlife_risk[i]);

            let dist = dx.abs() + dy.abs();

            if world.water_mask[i] && dist < water_dist {
                water_dist = dist;
                water_dir = Some(Cardinal::from_delta(dx, dy));
            }

            let sq = world.shelter_quality[i];
            if sq > shelter_q || (sq == shelter_q && dist < shelter_dist) {
                shelter_q = sq;
                shelter_dist = dist;
                shelter_dir = Some(Cardinal::from_delta(dx, dy));
            }
        }
    }

    // Nothing visible: fall back to the precomputed distance field and
    // point down its gradient.
    if water_dist == i32::MAX {
        let d = world.dist_to_water[world.idx(center.x, center.y)];
        water_dist = d.min(DIST_TO_WATER_FAR) as i32;
        let mut best = u32::MAX;
        for (dy, dx, dir) in [
            (-1, 0, Cardinal::N),
            (1, 0, Cardinal::S),
            (0, 1, Cardinal::E),
            (0, -1, Cardinal::W),
        ] {
            let (nx, ny) = (center.x + dx, center.y + dy);
            if world.in_bounds(nx, ny) {
                let dd = world.dist_to_water[world.idx(nx, ny)];
                if dd < best {
                    best = dd;
                    water_dir = Some(dir);
                }
            }
        }
    }

    Neighborhood {
        nearest_water: NearestWater {
            distance: water_dist,
            direction: water_dir,
        },
        best_shelter: BestShelter {
            distance: if shelter_dist == i32::MAX { -1 } else { shelter_dist },
            direction: shelter_dir,
            shelter_quality: round2(shelter_q),
        },
        avg_temp_c: if count > 0 { round1(temp_sum / count as f64) } else { 0.0 },
        avg_vegetation: if count > 0 { round2(veg_sum / count as f64) } else { 0.0 },
        max_wildlife_risk: round2(max_wildlife),
    }
}

/// Actions legal in the current cell and state.
pub fn action_mask(world: &World, pos: GridPos) -> Vec<Action> {
    let mut actions = vec![Action::Rest, Action::Hide, Action::Signal];

    for action in [Action::MoveN, Action::MoveS, Action::MoveE, Action::MoveW] {
        let (dx, dy) = action.direction().unwrap_or((0, 0));
        if world.in_bounds(pos.x + dx, pos.y + dy) {
            actions.push(action);
        }
    }

    let i = world.idx(pos.x, pos.y);
    if world.water_availability[i] > 0.1 {
        actions.push(Action::Drink);
    }
    if world.vegetation_biomass[i] > 0.1 {
        actions.push(Action::Forage);
    }
    if world.terrain[i] != Terrain::Water {
        actions.push(Action::BuildShelter);
    }

    actions
}

/// Group the rolling sighting log by hunter id so a policy can estimate
/// detection radii from when each hunter started chasing.
fn compile_tracks(history: &[Vec<HunterSighting>]) -> Vec<HunterTrack> {
    let len = history.len() as i64;
    let mut by_id: BTreeMap<u32, Vec<TrackedSighting>> = BTreeMap::new();
    for (step_idx, sightings) in history.iter().enumerate() {
        for s in sightings {
            by_id.entry(s.id).or_default().push(TrackedSighting {
                step_offset: step_idx as i64 - len,
                pos: s.pos,
                distance: s.distance,
                is_chasing: s.is_chasing,
            });
        }
    }
    by_id
        .into_iter()
        .map(|(hunter_id, sightings)| HunterTrack {
            hunter_id,
            sightings,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::climate;

    fn setup() -> (World, Organism, Config) {
        let config = Config::default();
        let mut world = World::generate(&config, 42);
        climate::advance(&mut world, 0, &config);
        let spawn = world.find_spawn_point();
        let organism = Organism::from_config(&config.physiology, spawn);
        (world, organism, config)
    }

    #[test]
    fn test_mask_always_has_stationary_actions() {
        let (world, organism, _) = setup();
        let mask = action_mask(&world, organism.pos);
        assert!(mask.contains(&Action::Rest));
        assert!(mask.contains(&Action::Hide));
        assert!(mask.contains(&Action::Signal));
    }

    #[test]
    fn test_mask_blocks_moves_at_edge() {
        let (world, _, _) = setup();
        let mask = action_mask(&world, GridPos::new(0, 0));
        assert!(!mask.contains(&Action::MoveN));
        assert!(!mask.contains(&Action::MoveW));
        assert!(mask.contains(&Action::MoveS));
        assert!(mask.contains(&Action::MoveE));
    }

    #[test]
    fn test_mask_build_shelter_not_on_water() {
        let (world, _, _) = setup();
        for y in 0..world.height as i32 {
            for x in 0..world.width as i32 {
                if world.terrain[world.idx(x, y)] == Terrain::Water {
                    let mask = action_mask(&world, GridPos::new(x, y));
                    assert!(!mask.contains(&Action::BuildShelter));
                    return;
                }
            }
        }
    }

    #[test]
    fn test_observation_never_contains_radius() {
        let (world, organism, config) = setup();
        let sightings = vec![HunterSighting {
            id: 0,
            pos: GridPos::new(5, 5),
            distance: 7,
            is_chasing: true,
        }];
        let history = vec![sightings.clone()];
        let obs = build_observation(
            &world, &organism, 3, &config, &[], sightings, &history, None,
        );
        let json = serde_json::to_string(&obs).unwrap();
        assert!(
            !json.contains("radius"),
            "observation leaked a radius field"
        );
    }

    #[test]
    fn test_neighborhood_scan_respects_radius() {
        let (world, organism, config) = setup();
        let near = scan_neighborhood(&world, organism.pos, config.sim.observation_radius);
        // Average over at most (2r+1)^2 - 1 cells; both bounded [0,1]
        assert!((0.0..=1.0).contains(&near.avg_vegetation));
        assert!((0.0..=1.0).contains(&near.max_wildlife_risk));
        assert!(near.best_shelter.distance >= -1);
    }

    #[test]
    fn test_water_fallback_uses_distance_field() {
        let mut config = Config::default();
        config.map.num_lakes = 0;
        config.map.num_rivers = 0;
        config.map.terrain_weights.water = 0.0;
        let mut world = World::generate(&config, 3);
        climate::advance(&mut world, 0, &config);
        if world.water_mask.iter().any(|&w| w) {
            return;
        }
        let near = scan_neighborhood(&world, GridPos::new(10, 10), 3);
        assert_eq!(near.nearest_water.distance, DIST_TO_WATER_FAR as i32);
    }

    #[test]
    fn test_recent_memory_keeps_last_five() {
        let (world, organism, config) = setup();
        let events: Vec<String> = (0..8).map(|i| format!("event {}", i)).collect();
        let obs = build_observation(
            &world, &organism, 0, &config, &events, vec![], &[], None,
        );
        assert_eq!(obs.recent_memory.len(), 5);
        assert_eq!(obs.recent_memory[0], "event 3");
        assert_eq!(obs.recent_memory[4], "event 7");
    }

    #[test]
    fn test_sighting_history_grouped_by_hunter() {
        let s = |id, d, chasing| HunterSighting {
            id,
            pos: GridPos::new(0, 0),
            distance: d,
            is_chasing: chasing,
        };
        let history = vec![
            vec![s(1, 9, false), s(0, 5, false)],
            vec![s(0, 4, true)],
        ];
        let tracks = compile_tracks(&history);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].hunter_id, 0);
        assert_eq!(tracks[0].sightings.len(), 2);
        assert_eq!(tracks[0].sightings[0].step_offset, -2);
        assert_eq!(tracks[0].sightings[1].step_offset, -1);
        assert!(tracks[0].sightings[1].is_chasing);
    }
}
