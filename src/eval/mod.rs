//! Headless episode running and metrics aggregation

use std::collections::{BTreeMap, BTreeSet};

use crate::agents::Agent;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::types::CauseOfDeath;
use crate::sim::engine::Engine;
use crate::sim::replay::Replay;

/// Per-episode metrics computed from a replay
#[derive(Debug, Clone, serde::Serialize)]
pub struct EpisodeMetrics {
    pub survived_steps: u64,
    pub survived_hours: f64,
    pub survived_days: f64,
    pub cause_of_death: CauseOfDeath,
    pub unique_cells_visited: usize,
    pub exploration_rate: f64,
    pub encounter_count: usize,
    pub near_death_ticks: usize,
    pub trophy_found: bool,
}

/// Run one full episode with the given agent, returning the replay.
pub fn run_episode(config: &Config, seed: u64, agent: &mut dyn Agent) -> Result<Replay> {
    agent.reset();
    let mut engine = Engine::new(config.clone(), seed);

    for _ in 0..config.sim.max_steps {
        if engine.done() {
            break;
        }
        let observation = engine.observe();
        let decision = agent.decide(&observation);
        let reason = (!decision.reason.is_empty()).then(|| decision.reason.clone());
        engine.step(decision.action, reason);
    }

    engine.finalize_replay();
    Ok(engine.replay)
}

/// Compute metrics from a finished replay.
pub fn compute_metrics(replay: &Replay) -> EpisodeMetrics {
    let dt = replay.config.sim.dt_hours;
    let steps = replay.steps.len();

    let mut visited: BTreeSet<(i32, i32)> = BTreeSet::new();
    let mut encounter_count = 0;
    let mut near_death_ticks = 0;

    for step in &replay.steps {
        visited.insert((step.agent.pos.x, step.agent.pos.y));
        if step.events.encounter {
            encounter_count += 1;
        }
        if step.agent.hydration < 10.0 || step.agent.energy < 10.0 {
            near_death_ticks += 1;
        }
    }

    let (cause, trophy_found) = replay
        .summary
        .as_ref()
        .map(|s| (s.cause_of_death, s.trophy_found))
        .unwrap_or((CauseOfDeath::Alive, false));

    let hours = steps as f64 * dt;
    EpisodeMetrics {
        survived_steps: steps as u64,
        survived_hours: hours,
        survived_days: hours / 24.0,
        cause_of_death: cause,
        unique_cells_visited: visited.len(),
        exploration_rate: visited.len() as f64 / steps.max(1) as f64,
        encounter_count,
        near_death_ticks,
        trophy_found,
    }
}

/// Aggregate results over a batch of seeds
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchReport {
    pub episodes: usize,
    pub mean_survived_steps: f64,
    pub mean_survived_days: f64,
    pub trophy_rate: f64,
    pub mean_exploration_rate: f64,
    pub death_causes: BTreeMap<String, usize>,
}

/// Run `episodes` episodes on consecutive seeds and aggregate.
pub fn run_batch(
    config: &Config,
    agent: &mut dyn Agent,
    episodes: usize,
    base_seed: u64,
) -> Result<BatchReport> {
    let mut total_steps = 0u64;
    let mut total_days = 0.0;
    let mut total_exploration = 0.0;
    let mut trophies = 0usize;
    let mut death_causes: BTreeMap<String, usize> = BTreeMap::new();

    for i in 0..episodes {
        let seed = base_seed + i as u64;
        let replay = run_episode(config, seed, agent)?;
        let metrics = compute_metrics(&replay);

        tracing::info!(
            seed,
            steps = metrics.survived_steps,
            cause = ?metrics.cause_of_death,
            trophy = metrics.trophy_found,
            "episode finished"
        );

        total_steps += metrics.survived_steps;
        total_days += metrics.survived_days;
        total_exploration += metrics.exploration_rate;
        if metrics.trophy_found {
            trophies += 1;
        }
        let cause = serde_json::to_value(metrics.cause_of_death)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "UNKNOWN".into());
        *death_causes.entry(cause).or_insert(0) += 1;
    }

    let n = episodes.max(1) as f64;
    Ok(BatchReport {
        episodes,
        mean_survived_steps: total_steps as f64 / n,
        mean_survived_days: total_days / n,
        trophy_rate: trophies as f64 / n,
        mean_exploration_rate: total_exploration / n,
        death_causes,
    })
}
