use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeldtError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Agent error: {0}")]
    AgentError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Replay error: {0}")]
    ReplayError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, VeldtError>;
