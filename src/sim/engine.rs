//! Simulation orchestrator
//!
//! Owns per-tick sequencing: apply action, physiology, hazards, hunter
//! update, trophy check, death check, then advance the environment for
//! the next tick. The engine is the sole mutator of world and organism
//! state; subsystems run in a fixed order, single-threaded.

use rand::Rng;

use crate::core::config::Config;
use crate::core::types::{Action, CauseOfDeath, EpisodeOutcome, GridPos};
use crate::sim::hazards::{check_environmental_hazards, check_wildlife_encounter};
use crate::sim::hunters::{HunterForce, HunterSighting};
use crate::sim::observation::{build_observation, Observation};
use crate::sim::organism::{apply_physiology, check_death, Organism};
use crate::sim::replay::{
    ActionRecord, AgentSnapshot, EventRecord, LocalState, Replay, StepRecord, Summary, TimeStamp,
};
use crate::sim::trophy::Trophy;
use crate::world::climate::{self, time_info};
use crate::world::World;

/// How many ticks of hunter sightings the observation can look back on
const SIGHTING_HISTORY_LEN: usize = 20;

/// Result of a single engine step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step: u64,
    pub alive: bool,
    pub events: Vec<String>,
    pub died: bool,
    pub trophy_won: bool,
}

/// Full simulation environment for one episode
pub struct Engine {
    pub config: Config,
    pub seed: u64,
    pub world: World,
    pub organism: Organism,
    pub hunters: HunterForce,
    pub trophy: Trophy,
    pub step_count: u64,
    pub recent_events: Vec<String>,
    sighting_history: Vec<Vec<HunterSighting>>,
    trophy_won: bool,
    pub replay: Replay,
}

impl Engine {
    pub fn new(config: Config, seed: u64) -> Engine {
        let mut world = World::generate(&config, seed);
        let spawn = world.find_spawn_point();
        let organism = Organism::from_config(&config.physiology, spawn);
        let hunters = HunterForce::spawn(&config.hunters, &mut world, spawn);
        let trophy = Trophy::place(&config.trophy, &mut world, spawn);
        let replay = Replay::new(seed, config.clone());

        // Environmental fields for tick 0
        climate::advance(&mut world, 0, &config);

        tracing::info!(seed, spawn = ?spawn, hunters = hunters.hunters.len(), "episode started");

        Engine {
            config,
            seed,
            world,
            organism,
            hunters,
            trophy,
            step_count: 0,
            recent_events: Vec::new(),
            sighting_history: Vec::new(),
            trophy_won: false,
            replay,
        }
    }

    /// Episode is over once the organism is dead or the trophy is found.
    pub fn done(&self) -> bool {
        !self.organism.alive || self.trophy_won
    }

    pub fn trophy_won(&self) -> bool {
        self.trophy_won
    }

    fn visibility_radius(&self) -> i32 {
        if self.config.fog_of_war.enabled {
            self.config.fog_of_war.visibility_radius
        } else {
            self.config.sim.observation_radius
        }
    }

    /// Build the observation for the current tick.
    pub fn observe(&mut self) -> Observation {
        let visible = self
            .hunters
            .visible_from(self.organism.pos, self.visibility_radius());
        let hint = self.trophy.hint(self.organism.pos, self.step_count);
        build_observation(
            &self.world,
            &self.organism,
            self.step_count,
            &self.config,
            &self.recent_events,
            visible,
            &self.sighting_history,
            hint,
        )
    }

    /// Advance one tick with the given action.
    pub fn step(&mut self, action: Action, reason: Option<String>) -> StepResult {
        if self.done() {
            return StepResult {
                step: self.step_count,
                alive: self.organism.alive,
                events: Vec::new(),
                died: false,
                trophy_won: self.trophy_won,
            };
        }

        let dt = self.config.sim.dt_hours;
        let time = time_info(self.step_count, &self.config);
        let mut messages: Vec<String> = Vec::new();
        let mut events = EventRecord {
            encounter: false,
            rain: false,
            hazard_events: Vec::new(),
            delta: Default::default(),
            hunters: None,
            trophy_found: false,
        };

        // Movement cost is paid for the cell being left
        let movement_cost =
            self.world.movement_cost[self.world.idx(self.organism.pos.x, self.organism.pos.y)];

        self.apply_action(action, dt, &mut events, &mut messages);

        // Shelter wears out whether or not it is used
        if self.organism.has_shelter {
            self.organism.shelter_durability -= 1;
            if self.organism.shelter_durability <= 0 {
                self.organism.has_shelter = false;
                messages.push("Shelter collapsed".into());
            }
        }

        let cell = self.world.idx(self.organism.pos.x, self.organism.pos.y);
        let shelter_active =
            self.organism.has_shelter || self.world.shelter_quality[cell] > 0.3;
        let air_temp = self.world.air_temp_c[cell];

        let deltas = apply_physiology(
            &mut self.organism,
            action,
            air_temp,
            shelter_active,
            movement_cost,
            dt,
            &self.config.physiology,
            self.config.difficulty.drain_multiplier,
        );
        events.delta.extend(deltas);

        let encounter = check_wildlife_encounter(
            &mut self.organism,
            self.world.wildlife_risk[cell],
            time.hour,
            action,
            &mut self.world.rng,
            self.config.difficulty.wildlife_multiplier,
        );
        events.encounter = encounter.encounter;
        if encounter.encounter {
            messages.push(format!(
                "Wildlife encounter! Injury +{:.1}",
                encounter.injury_delta
            ));
        }

        let terrain = self.world.terrain[cell];
        let hazard_events = check_environmental_hazards(
            &mut self.organism,
            air_temp,
            shelter_active,
            terrain,
            self.world.humidity[cell],
            self.config.difficulty.hazard_multiplier,
        );
        messages.extend(hazard_events.iter().cloned());
        events.hazard_events = hazard_events;

        // Hunters move after the organism; a kill overrides any
        // physiological cause this tick
        if let Some(killer_id) = self.hunters.update(&mut self.world, self.organism.pos) {
            self.organism.alive = false;
            self.organism.cause_of_death = CauseOfDeath::Hunted;
            messages.push(format!("Killed by hunter #{}!", killer_id));
        }

        let visible = self
            .hunters
            .visible_from(self.organism.pos, self.visibility_radius());
        self.sighting_history.push(visible);
        if self.sighting_history.len() > SIGHTING_HISTORY_LEN {
            let excess = self.sighting_history.len() - SIGHTING_HISTORY_LEN;
            self.sighting_history.drain(..excess);
        }

        if self.trophy.check_found(self.organism.pos) {
            self.trophy_won = true;
            messages.push("TROPHY FOUND! You win!".into());
        }

        if self.world.rng.gen::<f64>() < self.world.precip_prob[cell] {
            events.rain = true;
            messages.push("Rain".into());
        }

        let died = check_death(&mut self.organism, &self.config.physiology);

        self.organism.age_steps = self.step_count + 1;

        if self.config.hunters.enabled {
            events.hunters = Some(self.hunters.snapshots());
        }
        events.trophy_found = self.trophy_won;

        self.replay.log_step(StepRecord {
            t: self.step_count,
            time: TimeStamp {
                day: time.day_of_year,
                hour: time.hour,
            },
            agent: AgentSnapshot::from(&self.organism),
            local: LocalState {
                terrain,
                air_temp_c: crate::sim::observation::round1(air_temp),
                water_availability: crate::sim::observation::round2(
                    self.world.water_availability[cell],
                ),
                vegetation_biomass: crate::sim::observation::round2(
                    self.world.vegetation_biomass[cell],
                ),
            },
            action: ActionRecord { action, reason },
            events,
        });

        self.recent_events = messages.clone();

        // Advance the environment for the next tick
        self.step_count += 1;
        climate::advance(&mut self.world, self.step_count, &self.config);

        StepResult {
            step: self.step_count,
            alive: self.organism.alive,
            events: messages,
            died,
            trophy_won: self.trophy_won,
        }
    }

    fn apply_action(
        &mut self,
        action: Action,
        dt: f64,
        events: &mut EventRecord,
        messages: &mut Vec<String>,
    ) {
        let org = &mut self.organism;
        match action {
            Action::MoveN | Action::MoveS | Action::MoveE | Action::MoveW => {
                let (dx, dy) = action.direction().unwrap_or((0, 0));
                let (nx, ny) = (org.pos.x + dx, org.pos.y + dy);
                if self.world.in_bounds(nx, ny) {
                    org.pos = GridPos::new(nx, ny);
                    let dir = match action {
                        Action::MoveN => "N",
                        Action::MoveS => "S",
                        Action::MoveE => "E",
                        _ => "W",
                    };
                    messages.push(format!("Moved {}", dir));
                } else {
                    messages.push("Move blocked: out of bounds".into());
                }
            }
            Action::Drink => {
                let cell = self.world.idx(org.pos.x, org.pos.y);
                let wa = self.world.water_availability[cell];
                if wa > 0.1 {
                    let gain = (wa * 25.0).min(20.0) * dt;
                    org.hydration = (org.hydration + gain).clamp(0.0, 100.0);
                    events.delta.insert("hydration_gain".into(), gain);
                    messages.push(format!("Drank water: +{:.1} hydration", gain));
                } else {
                    messages.push("Tried to drink but no water available".into());
                }
            }
            Action::Forage => {
                let cell = self.world.idx(org.pos.x, org.pos.y);
                let bm = self.world.vegetation_biomass[cell];
                if bm > 0.1 {
                    let gain = (bm * 20.0).min(15.0) * dt;
                    org.energy = (org.energy + gain).clamp(0.0, 100.0);
                    self.world.vegetation_biomass[cell] = (bm - 0.1).max(0.0);
                    events.delta.insert("energy_gain".into(), gain);
                    messages.push(format!("Foraged: +{:.1} energy", gain));
                } else {
                    messages.push("Foraged but insufficient vegetation".into());
                }
            }
            Action::BuildShelter => {
                org.has_shelter = true;
                org.shelter_durability = 12;
                messages.push("Built shelter".into());
            }
            Action::Rest => messages.push("Resting".into()),
            Action::Hide => messages.push("Hiding".into()),
            Action::Signal => messages.push("Signaled (no effect)".into()),
        }
    }

    /// Terminal episode summary.
    pub fn summary(&self) -> Summary {
        let dt = self.config.sim.dt_hours;
        let steps = self.organism.age_steps;
        let hours = steps as f64 * dt;

        let outcome = if self.trophy_won {
            EpisodeOutcome::TrophyFound
        } else if !self.organism.alive {
            EpisodeOutcome::Died
        } else {
            EpisodeOutcome::Running
        };

        Summary {
            survived_steps: steps,
            survived_hours: crate::sim::replay::round_hours(hours),
            survived_days: crate::sim::replay::round_days(hours / 24.0),
            cause_of_death: self.organism.cause_of_death,
            final_pos: self.organism.pos,
            trophy_found: self.trophy_won,
            outcome,
        }
    }

    /// Attach the terminal summary to the replay record.
    pub fn finalize_replay(&mut self) {
        let summary = self.summary();
        self.replay.set_summary(summary);
    }
}
