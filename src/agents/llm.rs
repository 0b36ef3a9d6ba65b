//! Remote-model agent with provider fallback
//!
//! Backends are tried in order; a backend that reports quota exhaustion
//! is disabled for the rest of the episode. When every backend fails,
//! the scripted heuristic takes over, so a decision is always produced.
//! All of this is policy-side: the engine never waits on anything but
//! `decide`.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agents::heuristic::HeuristicAgent;
use crate::agents::{Agent, Decision};
use crate::core::config::AgentConfig;
use crate::core::error::{Result, VeldtError};
use crate::sim::observation::Observation;

const SYSTEM_PROMPT: &str = "\
You are controlling an organism trying to survive in a 2D Earth-like environment.

PRIMARY OBJECTIVE: Find and reach the TROPHY item on the map.
SURVIVAL OBJECTIVE: Stay alive by managing hydration, energy, body temperature, \
fatigue, injury, and infection.
THREAT: Hunter organisms patrol the map. If you enter their detection radius, they \
will chase and kill you. Each hunter has a DIFFERENT detection radius you must estimate.

HUNTER RADIUS ESTIMATION:
- See hunter at distance D, NOT chasing -> radius is likely < D
- Hunter STARTS chasing at distance D -> radius is approximately D
- Give hunters a safety margin of +2 cells beyond your estimate

RULES:
- Output ONLY valid JSON matching the schema below. No other text.
- Keep \"reason\" concise (under 30 words).

ACTION SCHEMA:
{schema}

VALID ACTIONS: {actions}

Output ONLY the JSON object. No explanation, no markdown, no extra text.";

/// API wire format of a backend
#[derive(Debug, Clone, Copy, PartialEq)]
enum ApiFormat {
    Anthropic,
    OpenAi,
}

/// One provider in the fallback chain
#[derive(Debug, Clone)]
struct Backend {
    name: String,
    model: String,
    url: String,
    env_key: String,
    format: ApiFormat,
}

fn known_backends() -> Vec<Backend> {
    vec![
        Backend {
            name: "anthropic".into(),
            model: "claude-3-haiku-20240307".into(),
            url: "https://api.anthropic.com/v1/messages".into(),
            env_key: "ANTHROPIC_API_KEY".into(),
            format: ApiFormat::Anthropic,
        },
        Backend {
            name: "openai".into(),
            model: "gpt-4o-mini".into(),
            url: "https://api.openai.com/v1/chat/completions".into(),
            env_key: "OPENAI_API_KEY".into(),
            format: ApiFormat::OpenAi,
        },
    ]
}

pub struct LlmAgent {
    client: reqwest::blocking::Client,
    backends: Vec<Backend>,
    exhausted: HashSet<String>,
    heuristic: HeuristicAgent,
    max_retries: u32,
    temperature: f64,
    pub call_count: u64,
    pub fallback_count: u64,
    pub provider_switches: u64,
}

impl LlmAgent {
    pub fn new(config: &AgentConfig) -> Result<LlmAgent> {
        let mut catalog = known_backends();
        let requested = catalog
            .iter()
            .position(|b| b.name == config.llm_provider)
            .ok_or_else(|| {
                VeldtError::AgentError(format!("unknown LLM provider '{}'", config.llm_provider))
            })?;

        // Requested provider first (with the configured model), the rest
        // of the catalog as fallbacks when their keys are present.
        let mut first = catalog.remove(requested);
        first.model = config.llm_model.clone();
        let mut backends = vec![first];
        for backend in catalog {
            if std::env::var(&backend.env_key).is_ok() {
                backends.push(backend);
            }
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VeldtError::LlmError(e.to_string()))?;

        Ok(LlmAgent {
            client,
            backends,
            exhausted: HashSet::new(),
            heuristic: HeuristicAgent::new(),
            max_retries: config.llm_max_retries,
            temperature: config.llm_temperature,
            call_count: 0,
            fallback_count: 0,
            provider_switches: 0,
        })
    }

    fn action_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": crate::core::types::Action::ALL,
                },
                "reason": {"type": "string"},
                "confidence": {"type": "number", "minimum": 0, "maximum": 1},
            },
            "required": ["action"],
            "additionalProperties": false,
        })
    }

    fn complete(&self, backend: &Backend, system: &str, user: &str) -> Result<String> {
        let api_key = std::env::var(&backend.env_key)
            .map_err(|_| VeldtError::LlmError(format!("{} not set", backend.env_key)))?;

        let response = match backend.format {
            ApiFormat::Anthropic => {
                let request = AnthropicRequest {
                    model: backend.model.clone(),
                    max_tokens: 1024,
                    temperature: self.temperature,
                    system: system.into(),
                    messages: vec![Message {
                        role: "user".into(),
                        content: user.into(),
                    }],
                };
                self.client
                    .post(&backend.url)
                    .header("x-api-key", &api_key)
                    .header("anthropic-version", "2023-06-01")
                    .header("content-type", "application/json")
                    .json(&request)
                    .send()
            }
            ApiFormat::OpenAi => {
                let request = OpenAiRequest {
                    model: backend.model.clone(),
                    max_tokens: 1024,
                    temperature: self.temperature,
                    messages: vec![
                        Message {
                            role: "system".into(),
                            content: system.into(),
                        },
                        Message {
                            role: "user".into(),
                            content: user.into(),
                        },
                    ],
                };
                self.client
                    .post(&backend.url)
                    .header("Authorization", format!("Bearer {}", api_key))
                    .header("content-type", "application/json")
                    .json(&request)
                    .send()
            }
        }
        .map_err(|e| VeldtError::LlmError(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(VeldtError::LlmError("quota exhausted".into()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(VeldtError::LlmError(format!("API error {}: {}", status, body)));
        }

        match backend.format {
            ApiFormat::Anthropic => {
                let parsed: AnthropicResponse = response
                    .json()
                    .map_err(|e| VeldtError::LlmError(e.to_string()))?;
                parsed
                    .content
                    .first()
                    .map(|c| c.text.clone())
                    .ok_or_else(|| VeldtError::LlmError("empty response".into()))
            }
            ApiFormat::OpenAi => {
                let parsed: OpenAiResponse = response
                    .json()
                    .map_err(|e| VeldtError::LlmError(e.to_string()))?;
                parsed
                    .choices
                    .first()
                    .map(|c| c.message.content.clone())
                    .ok_or_else(|| VeldtError::LlmError("empty response".into()))
            }
        }
    }

    /// Parse a model reply into a decision, tolerating markdown fences.
    fn parse_decision(raw: &str, obs: &Observation) -> Result<Decision> {
        let trimmed = raw
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        let start = trimmed
            .find('{')
            .ok_or_else(|| VeldtError::LlmError("no JSON object in reply".into()))?;
        let end = trimmed
            .rfind('}')
            .ok_or_else(|| VeldtError::LlmError("no JSON object in reply".into()))?;
        let decision: Decision = serde_json::from_str(&trimmed[start..=end])?;

        if !obs.action_mask.contains(&decision.action) {
            return Err(VeldtError::LlmError(format!(
                "action {:?} not in mask",
                decision.action
            )));
        }
        Ok(decision)
    }
}

impl Agent for LlmAgent {
    fn decide(&mut self, obs: &Observation) -> Decision {
        self.call_count += 1;

        let mask: Vec<String> = obs
            .action_mask
            .iter()
            .map(|a| serde_json::to_value(a).map(|v| v.as_str().unwrap_or_default().to_string()))
            .collect::<std::result::Result<_, _>>()
            .unwrap_or_default();
        let system = SYSTEM_PROMPT
            .replace(
                "{schema}",
                &serde_json::to_string_pretty(&Self::action_schema()).unwrap_or_default(),
            )
            .replace("{actions}", &mask.join(", "));
        let user = match serde_json::to_string_pretty(obs) {
            Ok(s) => s,
            Err(_) => {
                self.fallback_count += 1;
                return self.heuristic.decide(obs);
            }
        };

        let backends = self.backends.clone();
        for (i, backend) in backends.iter().enumerate() {
            if self.exhausted.contains(&backend.name) {
                continue;
            }
            if i > 0 {
                self.provider_switches += 1;
            }

            for attempt in 0..=self.max_retries {
                match self.complete(backend, &system, &user) {
                    Ok(raw) => match Self::parse_decision(&raw, obs) {
                        Ok(decision) => return decision,
                        Err(e) => {
                            tracing::warn!(
                                backend = %backend.name,
                                attempt,
                                error = %e,
                                "unusable LLM reply"
                            );
                        }
                    },
                    Err(e) => {
                        let msg = e.to_string();
                        tracing::warn!(backend = %backend.name, attempt, error = %msg, "LLM call failed");
                        if msg.contains("quota exhausted") {
                            self.exhausted.insert(backend.name.clone());
                            break;
                        }
                    }
                }
            }
        }

        // Guaranteed terminal fallback
        self.fallback_count += 1;
        self.heuristic.decide(obs)
    }

    fn reset(&mut self) {
        self.exhausted.clear();
    }
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}
