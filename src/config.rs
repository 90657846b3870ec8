use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TensorifyResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub backend: BackendConfig,
    pub search: SearchConfig,
    /// Extra built-in categories, loaded from a TOML file
    #[serde(default)]
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub environment: Environment,
    pub development_url: String,
    pub production_url: String,
}

impl RegistryConfig {
    /// Base URL of the plugin registry for the active environment.
    pub fn base_url(&self) -> &str {
        let url = match self.environment {
            Environment::Development => &self.development_url,
            Environment::Production => &self.production_url,
        };
        url.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub indicator_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub min_query_length: usize,
    pub max_external_results: usize,
    pub max_parent_matches: usize,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn indicator_delay(&self) -> Duration {
        Duration::from_millis(self.indicator_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            development_url: "http://localhost:3004".to_string(),
            production_url: "https://plugins.tensorify.io".to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "https://backend.tensorify.io/api/v1".to_string(),
            token: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            indicator_delay_ms: 200,
            request_timeout_secs: 10,
            min_query_length: 2,
            max_external_results: 10,
            max_parent_matches: 10,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("tensorify")
            .join("config.toml")
    }

    /// Load config from the default location, falling back to defaults.
    ///
    /// Environment overrides are applied on top of whatever was loaded.
    pub fn load() -> Self {
        let path = Self::config_path();

        let mut config = if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Failed to load config: {}", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate();
        config
    }

    /// Parse a config file without touching the environment.
    pub fn load_from(path: &Path) -> TensorifyResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate();
        Ok(config)
    }

    /// Apply `TENSORIFY_*` overrides using the given variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(env) = lookup("TENSORIFY_ENV") {
            match env.to_lowercase().as_str() {
                "development" | "dev" => self.registry.environment = Environment::Development,
                "production" | "prod" => self.registry.environment = Environment::Production,
                other => tracing::warn!("Ignoring unknown TENSORIFY_ENV '{}'", other),
            }
        }

        if let Some(url) = lookup("TENSORIFY_REGISTRY_URL") {
            match self.registry.environment {
                Environment::Development => self.registry.development_url = url,
                Environment::Production => self.registry.production_url = url,
            }
        }

        if let Some(url) = lookup("TENSORIFY_BACKEND_URL") {
            self.backend.url = url;
        }

        if let Some(token) = lookup("TENSORIFY_TOKEN") {
            self.backend.token = Some(token);
        }
    }

    /// Clamp config values to acceptable ranges
    fn validate(&mut self) {
        self.search.debounce_ms = self.search.debounce_ms.clamp(50, 5_000);
        self.search.indicator_delay_ms = self.search.indicator_delay_ms.min(5_000);
        self.search.request_timeout_secs = self.search.request_timeout_secs.clamp(1, 120);
        self.search.min_query_length = self.search.min_query_length.clamp(1, 16);
        self.search.max_external_results = self.search.max_external_results.clamp(1, 100);
        self.search.max_parent_matches = self.search.max_parent_matches.clamp(1, 100);
    }

    /// Resolved path of the extra catalog file, if configured
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }
}
