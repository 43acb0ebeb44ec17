//! Service settings read from the process environment.
//!
//! Every setting has a default except the API keys, which stay unset unless
//! provided. Load a `.env` file (e.g. with `dotenvy`) before calling
//! [`Settings::from_env`].

use std::fmt;
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be at least 1")]
    Zero { key: &'static str },
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI chat and embedding models.
#[derive(Clone)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub embedding_model: String,
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

/// Qdrant collection holding the internal documents.
#[derive(Clone)]
pub struct VectorStoreSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    /// Hits requested from the scored search.
    pub top_k: usize,
    /// Hits requested when the scored search fails.
    pub fallback_k: usize,
}

impl fmt::Debug for VectorStoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStoreSettings")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("collection", &self.collection)
            .field("top_k", &self.top_k)
            .field("fallback_k", &self.fallback_k)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Normalized to a leading slash and no trailing slash; may be empty.
    pub api_prefix: String,
    /// `["*"]` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Model turns allowed per query before the run is abandoned.
    pub max_iterations: usize,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub model: ModelSettings,
    pub vector_store: VectorStoreSettings,
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub log_level: String,
}

impl Settings {
    /// Reads settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let model = ModelSettings {
            api_key: get("OPENAI_API_KEY"),
            api_base: get("OPENAI_API_BASE"),
            model: text("OPENAI_MODEL_BASIC", "gpt-5-mini"),
            temperature: get("OPENAI_TEMPERATURE")
                .map(|v| parse("OPENAI_TEMPERATURE", v))
                .transpose()?,
            embedding_model: text("EMBEDDING_MODEL", "text-embedding-3-small"),
        };

        let vector_store = VectorStoreSettings {
            url: text("QDRANT_URL", "http://localhost:6333").trim_end_matches('/').to_string(),
            api_key: get("QDRANT_API_KEY"),
            collection: text("QDRANT_COLLECTION_NAME", "test"),
            top_k: positive("RETRIEVAL_TOP_K", get("RETRIEVAL_TOP_K"), 5)?,
            fallback_k: positive("RETRIEVAL_FALLBACK_K", get("RETRIEVAL_FALLBACK_K"), 3)?,
        };

        let server = ServerSettings {
            host: text("SERVER_HOST", "0.0.0.0"),
            port: get("SERVER_PORT").map(|v| parse("SERVER_PORT", v)).transpose()?.unwrap_or(3000),
            api_prefix: normalize_prefix(&text("API_PREFIX", "/api")),
            allowed_origins: text("ALLOWED_HOSTS", "*")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        };

        let agent = AgentSettings {
            max_iterations: positive("AGENT_MAX_ITERATIONS", get("AGENT_MAX_ITERATIONS"), 10)?,
        };

        Ok(Self {
            model,
            vector_store,
            server,
            agent,
            log_level: text("LOG_LEVEL", "info").to_ascii_lowercase(),
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid { key, value })
}

fn positive(key: &'static str, value: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let n = value.map(|v| parse(key, v)).transpose()?.unwrap_or(default);
    match n {
        0 => Err(ConfigError::Zero { key }),
        n => Ok(n),
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    match trimmed.is_empty() {
        true => String::new(),
        false => format!("/{trimmed}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_with(&[]).unwrap();
        assert_eq!(settings.model.model, "gpt-5-mini");
        assert_eq!(settings.model.embedding_model, "text-embedding-3-small");
        assert!(settings.model.api_key.is_none());
        assert!(settings.model.temperature.is_none());
        assert_eq!(settings.vector_store.url, "http://localhost:6333");
        assert_eq!(settings.vector_store.collection, "test");
        assert_eq!(settings.vector_store.top_k, 5);
        assert_eq!(settings.vector_store.fallback_k, 3);
        assert_eq!(settings.server.bind_addr(), "0.0.0.0:3000");
        assert_eq!(settings.server.api_prefix, "/api");
        assert!(settings.server.allows_any_origin());
        assert_eq!(settings.agent.max_iterations, 10);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let settings = settings_with(&[
            ("OPENAI_MODEL_BASIC", "gpt-4o-mini"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("QDRANT_URL", "https://qdrant.internal:6333/"),
            ("RETRIEVAL_TOP_K", "8"),
            ("SERVER_PORT", "8080"),
            ("API_PREFIX", "internal/"),
            ("ALLOWED_HOSTS", "https://a.example, https://b.example"),
            ("LOG_LEVEL", "DEBUG"),
        ])
        .unwrap();

        assert_eq!(settings.model.model, "gpt-4o-mini");
        assert_eq!(settings.model.temperature, Some(0.2));
        assert_eq!(settings.vector_store.url, "https://qdrant.internal:6333");
        assert_eq!(settings.vector_store.top_k, 8);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.api_prefix, "/internal");
        assert_eq!(settings.server.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!settings.server.allows_any_origin());
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let settings = settings_with(&[("OPENAI_API_KEY", "  "), ("API_PREFIX", "/")]).unwrap();
        assert!(settings.model.api_key.is_none());
        assert_eq!(settings.server.api_prefix, "");
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = settings_with(&[("SERVER_PORT", "eighty")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "SERVER_PORT", value: "eighty".into() });

        let err = settings_with(&[("AGENT_MAX_ITERATIONS", "0")]).unwrap_err();
        assert_eq!(err, ConfigError::Zero { key: "AGENT_MAX_ITERATIONS" });
    }

    #[test]
    fn test_debug_redacts_keys() {
        let settings = settings_with(&[("OPENAI_API_KEY", "sk-secret"), ("QDRANT_API_KEY", "q-secret")]).unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("q-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
