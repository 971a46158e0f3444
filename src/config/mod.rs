use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

/// Candidate models in preference order, most preferred first. The later
/// entries are broadly available fallbacks for projects where the newer
/// identifiers are not enabled.
const DEFAULT_MODELS: [&str; 6] = [
    "gpt-5-mini-2025-08-07",
    "gpt-5-mini",
    "gpt-4.1-2025-04-14",
    "o4-mini-2025-04-16",
    "gpt-4o-mini",
    "gpt-4o",
];

/// Identifier prefixes whose models take `max_completion_tokens` instead of
/// `max_tokens` and accept no temperature field.
const DEFAULT_NEWER_PARAM_PREFIXES: [&str; 4] = ["gpt-5", "o3", "o4", "gpt-4.1"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: String,
    pub upstream: UpstreamConfig,
    pub assistant: AssistantConfig,
}

/// Everything the relay needs to talk to the completions API. The model
/// list and the dialect prefix table are configuration so deployments can
/// reorder or shorten them without touching the relay logic.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub models: Vec<String>,
    pub newer_param_prefixes: Vec<String>,
    pub max_output_tokens: u32,
    pub attempt_timeout_secs: u64,
}

/// Optional overrides for the fixed system turns the relay prepends.
#[derive(Debug, Clone, Default)]
pub struct AssistantConfig {
    pub instructions: Option<String>,
    pub cited_instructions: Option<String>,
    pub references: Option<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    bind: Option<String>,
    #[serde(default)]
    upstream: RawUpstream,
    #[serde(default)]
    assistant: RawAssistant,
}

#[derive(Debug, Deserialize, Default)]
struct RawUpstream {
    endpoint: Option<String>,
    models: Option<Vec<String>>,
    newer_param_prefixes: Option<Vec<String>>,
    max_output_tokens: Option<u32>,
    attempt_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAssistant {
    instructions: Option<String>,
    cited_instructions: Option<String>,
    references: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        RawConfig::default().into()
    }
}

impl UpstreamConfig {
    pub fn default() -> Self {
        RawUpstream::default().into()
    }
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            bind: raw.bind.unwrap_or_else(|| DEFAULT_BIND.to_string()),
            upstream: raw.upstream.into(),
            assistant: AssistantConfig {
                instructions: raw.assistant.instructions,
                cited_instructions: raw.assistant.cited_instructions,
                references: raw.assistant.references,
            },
        }
    }
}

impl From<RawUpstream> for UpstreamConfig {
    fn from(raw: RawUpstream) -> Self {
        Self {
            endpoint: raw.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            models: raw
                .models
                .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()),
            newer_param_prefixes: raw.newer_param_prefixes.unwrap_or_else(|| {
                DEFAULT_NEWER_PARAM_PREFIXES
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            }),
            max_output_tokens: raw.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            attempt_timeout_secs: raw
                .attempt_timeout_secs
                .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading relay configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parsed.into())
}
