//! Decision agents
//!
//! Every strategy sits behind the single `Agent` trait: observation in,
//! action out. The engine never reaches into agent internals; swarm
//! particle positions are an optional side channel for visualization
//! tooling only.

pub mod heuristic;
pub mod llm;
pub mod pso;
pub mod random;
pub mod swarm;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::error::{Result, VeldtError};
use crate::core::types::{Action, GridPos};
use crate::sim::observation::Observation;

/// An agent's chosen action with optional justification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

impl Decision {
    pub fn new(action: Action, reason: impl Into<String>, confidence: f64) -> Decision {
        Decision {
            action,
            reason: reason.into(),
            confidence,
        }
    }
}

/// The one contract every decision-maker must satisfy
pub trait Agent {
    fn decide(&mut self, observation: &Observation) -> Decision;

    /// Reset internal state between episodes.
    fn reset(&mut self) {}

    /// Current particle positions, for rendering tooling. Not part of
    /// the engine contract.
    fn swarm_positions(&self) -> Option<&[GridPos]> {
        None
    }
}

/// Factory for agent creation by kind name.
pub fn build_agent(kind: &str, seed: u64, config: &Config) -> Result<Box<dyn Agent>> {
    match kind {
        "heuristic" => Ok(Box::new(heuristic::HeuristicAgent::new())),
        "random" => Ok(Box::new(random::RandomAgent::new(seed))),
        "pso" => Ok(Box::new(pso::PsoAgent::new(seed, &config.swarm))),
        "llm" => Ok(Box::new(llm::LlmAgent::new(&config.agent)?)),
        other => Err(VeldtError::AgentError(format!(
            "unknown agent kind '{}'",
            other
        ))),
    }
}
