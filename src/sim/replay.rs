//! Replay logging: record and serialize episode data
//!
//! The replay is the interface to the rendering and metrics tooling.
//! A save/load round trip must be lossless: re-serializing a loaded
//! replay yields the identical JSON string. Struct field order is fixed
//! and the delta map is a BTreeMap, so serialization is canonical.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::types::{Action, CauseOfDeath, EpisodeOutcome, GridPos, Terrain};
use crate::sim::hunters::HunterSnapshot;
use crate::sim::observation::{round1, round2};
use crate::sim::organism::Organism;

const REPLAY_VERSION: &str = "0.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayMeta {
    pub version: String,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeStamp {
    pub day: u32,
    pub hour: u32,
}

/// Full organism state at the end of a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
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
}

impl From<&Organism> for AgentSnapshot {
    fn from(o: &Organism) -> Self {
        AgentSnapshot {
            pos: o.pos,
            hydration: round1(o.hydration),
            energy: round1(o.energy),
            core_temp_c: round1(o.core_temp_c),
            fatigue: round1(o.fatigue),
            injury: round1(o.injury),
            infection: round1(o.infection),
            alive: o.alive,
            cause_of_death: o.cause_of_death,
            age_steps: o.age_steps,
            has_shelter: o.has_shelter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalState {
    pub terrain: Terrain,
    pub air_temp_c: f64,
    pub water_availability: f64,
    pub vegetation_biomass: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

/// Everything that happened during one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub encounter: bool,
    pub rain: bool,
    pub hazard_events: Vec<String>,
    pub delta: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hunters: Option<Vec<HunterSnapshot>>,
    pub trophy_found: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub t: u64,
    pub time: TimeStamp,
    pub agent: AgentSnapshot,
    pub local: LocalState,
    pub action: ActionRecord,
    pub events: EventRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub survived_steps: u64,
    pub survived_hours: f64,
    pub survived_days: f64,
    pub cause_of_death: CauseOfDeath,
    pub final_pos: GridPos,
    pub trophy_found: bool,
    pub outcome: EpisodeOutcome,
}

/// Accumulates step data and produces the replay JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    pub meta: ReplayMeta,
    pub config: Config,
    pub steps: Vec<StepRecord>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<Summary>,
}

impl Replay {
    pub fn new(seed: u64, config: Config) -> Replay {
        Replay {
            meta: ReplayMeta {
                version: REPLAY_VERSION.into(),
                seed,
            },
            config,
            steps: Vec::new(),
            summary: None,
        }
    }

    pub fn log_step(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    pub fn set_summary(&mut self, summary: Summary) {
        self.summary = Some(summary);
    }

    /// Canonical JSON representation; stable across save/load cycles.
    pub fn to_json(&self) -> crate::core::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn save(&self, path: &Path) -> crate::core::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), steps = self.steps.len(), "replay saved");
        Ok(())
    }

    pub fn load(path: &Path) -> crate::core::error::Result<Replay> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

pub fn round_hours(hours: f64) -> f64 {
    round1(hours)
}

pub fn round_days(days: f64) -> f64 {
    round2(days)
}
