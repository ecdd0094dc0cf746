use std::env;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config value '{0}' (set it in config.yml, secrets.yaml, or the environment)")]
    MissingKey(&'static str),
    #[error("invalid config at '{path}': {reason}")]
    Invalid { path: &'static str, reason: String },
}

/// Typed view over the merged configuration document. Every field has a
/// default; only credentials and the index host are required, enforced by
/// [`Settings::load`] before the process starts serving.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub index: IndexSettings,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub completion_model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            completion_model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub api_key: String,
    /// Data-plane host of the index, e.g. "jupiter-moons-abc123.svc.example.pinecone.io".
    pub host: String,
    pub name: String,
    pub namespace: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: String::new(),
            name: "jupiter-moons".to_string(),
            namespace: None,
            dimension: 1536,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub synthesis_mode: SynthesisMode,
    pub aggregation: AggregationPolicy,
    pub temperature: f64,
    pub snippet_max_tokens: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            synthesis_mode: SynthesisMode::Snippet,
            aggregation: AggregationPolicy::AppendAll,
            temperature: 0.7,
            snippet_max_tokens: 150,
        }
    }
}

/// How retrieved context becomes the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// One enhancement call per subject group, falling back to the raw
    /// snippet when the model fails.
    Snippet,
    /// One grounded completion over the full retrieved context.
    Grounded,
    /// Bullet rendering of the raw matches, no model call.
    Verbatim,
}

/// Dedup behavior when several matches share a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// Keep every match as its own entry under the subject.
    AppendAll,
    /// Keep only the most recently seen entry per subject.
    LastWins,
}

impl Settings {
    /// Deserializes the merged config document, applies environment
    /// fallbacks for the credentials, and validates. Any failure here is
    /// fatal at startup.
    pub fn load(config: &Value) -> Result<Self, ConfigError> {
        let mut settings: Settings =
            serde_json::from_value(config.clone()).map_err(|err| ConfigError::Invalid {
                path: "root",
                reason: err.to_string(),
            })?;

        if settings.provider.api_key.trim().is_empty() {
            if let Ok(key) = env::var("OPENAI_API_KEY") {
                settings.provider.api_key = key;
            }
        }
        if settings.index.api_key.trim().is_empty() {
            if let Ok(key) = env::var("PINECONE_API_KEY") {
                settings.index.api_key = key;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("provider.api_key"));
        }
        if self.index.api_key.trim().is_empty() {
            return Err(ConfigError::MissingKey("index.api_key"));
        }
        if self.index.host.trim().is_empty() {
            return Err(ConfigError::MissingKey("index.host"));
        }

        require_range(
            "pipeline.top_k",
            self.pipeline.top_k as u64,
            1,
            1_000,
        )?;
        require_range("index.dimension", self.index.dimension as u64, 1, 65_536)?;
        require_range(
            "pipeline.snippet_max_tokens",
            self.pipeline.snippet_max_tokens as u64,
            1,
            100_000,
        )?;
        require_range("provider.timeout_secs", self.provider.timeout_secs, 1, 3_600)?;
        require_range("index.timeout_secs", self.index.timeout_secs, 1, 3_600)?;
        if !(0.0..=2.0).contains(&self.pipeline.temperature) {
            return Err(ConfigError::Invalid {
                path: "pipeline.temperature",
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }

        Ok(())
    }
}

fn require_range(path: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            path,
            reason: format!("must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_doc() -> Value {
        json!({
            "provider": { "api_key": "sk-test" },
            "index": { "api_key": "pc-test", "host": "idx.example.invalid" }
        })
    }

    #[test]
    fn defaults_fill_unset_sections() {
        let settings = Settings::load(&valid_doc()).unwrap();
        assert_eq!(settings.pipeline.top_k, 3);
        assert_eq!(settings.index.name, "jupiter-moons");
        assert_eq!(settings.index.dimension, 1536);
        assert_eq!(settings.pipeline.synthesis_mode, SynthesisMode::Snippet);
        assert_eq!(settings.pipeline.aggregation, AggregationPolicy::AppendAll);
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn missing_index_host_is_fatal() {
        let doc = json!({
            "provider": { "api_key": "sk-test" },
            "index": { "api_key": "pc-test" }
        });
        let err = Settings::load(&doc).unwrap_err();
        assert!(err.to_string().contains("index.host"));
    }

    #[test]
    fn out_of_range_top_k_is_rejected() {
        let mut settings = Settings::load(&valid_doc()).unwrap();
        settings.pipeline.top_k = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("pipeline.top_k"));
    }

    #[test]
    fn mode_and_policy_parse_from_snake_case() {
        let doc = json!({
            "provider": { "api_key": "sk-test" },
            "index": { "api_key": "pc-test", "host": "idx.example.invalid" },
            "pipeline": { "synthesis_mode": "grounded", "aggregation": "last_wins" }
        });
        let settings = Settings::load(&doc).unwrap();
        assert_eq!(settings.pipeline.synthesis_mode, SynthesisMode::Grounded);
        assert_eq!(settings.pipeline.aggregation, AggregationPolicy::LastWins);
    }
}
