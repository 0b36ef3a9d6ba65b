//! Episode configuration
//!
//! All tunables are collected here. A `Config` is constructed once per
//! episode (from defaults or a TOML file) and passed by reference into
//! every component. There is no global configuration state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, VeldtError};
use crate::core::types::Terrain;

/// Relative likelihood of each terrain during generation.
///
/// Weights are normalized before use, so they need not sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainWeights {
    pub plains: f64,
    pub forest: f64,
    pub desert: f64,
    pub tundra: f64,
    pub mountain: f64,
    pub water: f64,
    pub swamp: f64,
}

impl Default for TerrainWeights {
    fn default() -> Self {
        Self {
            plains: 0.30,
            forest: 0.25,
            desert: 0.10,
            tundra: 0.05,
            mountain: 0.10,
            water: 0.10,
            swamp: 0.10,
        }
    }
}

impl TerrainWeights {
    pub fn weight(&self, terrain: Terrain) -> f64 {
        match terrain {
            Terrain::Plains => self.plains,
            Terrain::Forest => self.forest,
            Terrain::Desert => self.desert,
            Terrain::Tundra => self.tundra,
            Terrain::Mountain => self.mountain,
            Terrain::Water => self.water,
            Terrain::Swamp => self.swamp,
        }
    }

    /// Cumulative normalized weights in `Terrain::ALL` order.
    ///
    /// Iteration order is fixed so the sum is bit-stable across runs.
    pub fn cumulative(&self) -> [f64; 7] {
        let total: f64 = Terrain::ALL.iter().map(|&t| self.weight(t)).sum();
        let mut cum = [0.0; 7];
        let mut acc = 0.0;
        for (i, &t) in Terrain::ALL.iter().enumerate() {
            acc += self.weight(t) / total;
            cum[i] = acc;
        }
        cum
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    pub num_lakes: usize,
    pub num_rivers: usize,
    pub elevation_octaves: u32,
    pub elevation_scale: f64,
    // Table-typed field kept last so TOML serialization stays valid
    pub terrain_weights: TerrainWeights,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 60,
            num_lakes: 3,
            num_rivers: 2,
            elevation_octaves: 4,
            elevation_scale: 0.05,
            terrain_weights: TerrainWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Hours of simulated time per tick
    pub dt_hours: f64,
    pub max_steps: u64,
    pub observation_radius: i32,
    pub start_hour: f64,
    /// Day of year at episode start (80 = late March)
    pub start_day: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt_hours: 1.0,
            max_steps: 500,
            observation_radius: 3,
            start_hour: 6.0,
            start_day: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateConfig {
    /// Temperature drop per 1000 m of elevation (°C)
    pub lapse_rate: f64,
    /// Standard deviation of per-cell temperature noise (°C)
    pub temp_noise_sigma: f64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            lapse_rate: 6.5,
            temp_noise_sigma: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologyConfig {
    pub initial_hydration: f64,
    pub initial_energy: f64,
    pub initial_core_temp: f64,
    pub initial_fatigue: f64,
    pub initial_injury: f64,
    pub initial_infection: f64,
    pub hydration_base_drain: f64,
    pub energy_base_drain: f64,
    pub fatigue_base_gain: f64,
    pub rest_fatigue_recovery: f64,
    pub injury_recovery_rate: f64,
    /// Core temperature drift rate toward ambient, per hour
    pub thermal_drift_k: f64,
    pub death_hydration: f64,
    pub death_energy: f64,
    pub death_core_temp_low: f64,
    pub death_core_temp_high: f64,
    pub death_injury: f64,
    pub death_infection: f64,
}

impl Default for PhysiologyConfig {
    fn default() -> Self {
        Self {
            initial_hydration: 80.0,
            initial_energy: 80.0,
            initial_core_temp: 37.0,
            initial_fatigue: 10.0,
            initial_injury: 0.0,
            initial_infection: 0.0,
            hydration_base_drain: 0.8,
            energy_base_drain: 0.6,
            fatigue_base_gain: 0.7,
            rest_fatigue_recovery: 4.0,
            injury_recovery_rate: 0.2,
            thermal_drift_k: 0.008,
            death_hydration: 0.0,
            death_energy: 0.0,
            death_core_temp_low: 30.0,
            death_core_temp_high: 42.0,
            death_injury: 100.0,
            death_infection: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// One of: heuristic, random, pso, llm
    pub kind: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_max_retries: u32,
    pub llm_temperature: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            kind: "heuristic".into(),
            llm_provider: "anthropic".into(),
            llm_model: "claude-3-haiku-20240307".into(),
            llm_max_retries: 2,
            llm_temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HunterConfig {
    pub enabled: bool,
    pub count: usize,
    pub min_detection_radius: i32,
    pub max_detection_radius: i32,
    pub chase_speed: u32,
    pub patrol_speed: u32,
    /// Minimum Manhattan distance from the player spawn
    pub spawn_margin: i32,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            count: 5,
            min_detection_radius: 3,
            max_detection_radius: 8,
            chase_speed: 2,
            patrol_speed: 1,
            spawn_margin: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrophyConfig {
    pub enabled: bool,
    pub min_distance_from_spawn: i32,
    /// Directional hint is emitted only every this many ticks
    pub hint_interval: u64,
    pub warm_cold_enabled: bool,
}

impl Default for TrophyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_distance_from_spawn: 25,
            hint_interval: 10,
            warm_cold_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub drain_multiplier: f64,
    pub hazard_multiplier: f64,
    pub wildlife_multiplier: f64,
    pub temperature_extremity: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            drain_multiplier: 1.0,
            hazard_multiplier: 1.0,
            wildlife_multiplier: 1.0,
            temperature_extremity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FogOfWarConfig {
    pub enabled: bool,
    pub visibility_radius: i32,
}

impl Default for FogOfWarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            visibility_radius: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub population_size: usize,
    pub search_radius: i32,
    pub inner_iterations: u32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            search_radius: 30,
            inner_iterations: 3,
        }
    }
}

/// Top-level episode configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map: MapConfig,
    pub sim: SimConfig,
    pub climate: ClimateConfig,
    pub physiology: PhysiologyConfig,
    pub agent: AgentConfig,
    pub hunters: HunterConfig,
    pub trophy: TrophyConfig,
    pub difficulty: DifficultyConfig,
    pub fog_of_war: FogOfWarConfig,
    pub swarm: SwarmConfig,
}

impl Config {
    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.map.width < 16 || self.map.height < 16 {
            return Err(VeldtError::ConfigError(format!(
                "map {}x{} is too small (minimum 16x16)",
                self.map.width, self.map.height
            )));
        }
        if self.sim.dt_hours <= 0.0 {
            return Err(VeldtError::ConfigError(format!(
                "dt_hours must be positive, got {}",
                self.sim.dt_hours
            )));
        }
        if self.hunters.min_detection_radius > self.hunters.max_detection_radius {
            return Err(VeldtError::ConfigError(format!(
                "min_detection_radius ({}) exceeds max_detection_radius ({})",
                self.hunters.min_detection_radius, self.hunters.max_detection_radius
            )));
        }
        if self.physiology.death_core_temp_low >= self.physiology.death_core_temp_high {
            return Err(VeldtError::ConfigError(
                "death_core_temp_low must be below death_core_temp_high".into(),
            ));
        }
        if self.trophy.hint_interval == 0 {
            return Err(VeldtError::ConfigError(
                "trophy hint_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            toml::from_str(&raw)?
        }
        None => Config::default(),
    };
    config.validate()?;
    Ok(config)
}
