//! Configuration loader for Praxis.
//!
//! Reads `config.toml` from the config directory (`~/.openpraxis/` unless
//! `PRAXIS_HOME` is set) and deserializes it into [`PraxisConfig`]. Falls
//! back to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use praxis_types::config::{LlmConfig, PraxisConfig, ProviderKind};

use crate::generation::GenerationSettings;

/// Environment variable overriding the config directory.
pub const HOME_ENV: &str = "PRAXIS_HOME";

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("unknown provider '{0}' (expected one of: openai, doubao, kimi, deepseek)")]
    UnknownProvider(String),

    #[error("no API key for provider '{provider}': set {env} or [llm].api_key in config.toml")]
    MissingApiKey {
        provider: ProviderKind,
        env: &'static str,
    },
}

/// Config directory: `$PRAXIS_HOME`, else `~/.openpraxis`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".openpraxis")
}

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE)
}

/// Load configuration from `{config_dir}/config.toml`.
///
/// - If the file does not exist, returns [`PraxisConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(config_dir: &Path) -> PraxisConfig {
    let path = config_path(config_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return PraxisConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return PraxisConfig::default();
        }
    };

    match toml::from_str::<PraxisConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            PraxisConfig::default()
        }
    }
}

/// Data directory: `[storage].data_dir` (with `~` expanded), else `{config_dir}/data`.
pub fn data_dir(config: &PraxisConfig, config_dir: &Path) -> PathBuf {
    match &config.storage.data_dir {
        Some(dir) => expand_home(dir),
        None => config_dir.join("data"),
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

pub fn parse_provider(name: &str) -> Result<ProviderKind, ConfigError> {
    name.parse::<ProviderKind>()
        .map_err(|_| ConfigError::UnknownProvider(name.to_string()))
}

/// Resolve connection settings, reading the API key from the process environment.
pub fn resolve_generation(llm: &LlmConfig) -> Result<GenerationSettings, ConfigError> {
    resolve_generation_with(llm, |key| std::env::var(key).ok())
}

/// Resolve connection settings with an injectable environment lookup.
///
/// The provider's environment variable wins over `[llm].api_key`; the
/// configured base URL wins over the provider preset.
pub fn resolve_generation_with(
    llm: &LlmConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<GenerationSettings, ConfigError> {
    let provider = llm.provider;
    let env_key = provider.api_key_env();

    let api_key = match env(env_key).filter(|k| !k.trim().is_empty()) {
        Some(key) => SecretString::from(key),
        None => llm
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or(ConfigError::MissingApiKey {
                provider,
                env: env_key,
            })?,
    };

    let base_url = llm
        .base_url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| provider.default_base_url().to_string());

    Ok(GenerationSettings {
        provider,
        api_key,
        base_url,
        model: llm.model.clone(),
        temperature: llm.temperature,
        timeout: Duration::from_secs(llm.timeout_secs),
    })
}

// ---------------------------------------------------------------------------
// Persisting [llm] changes
// ---------------------------------------------------------------------------

/// Changes to apply to the `[llm]` section. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct LlmUpdate {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
}

impl LlmUpdate {
    pub fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.model.is_none()
            && self.api_key.is_none()
            && self.base_url.is_none()
            && self.temperature.is_none()
    }
}

/// Apply `update` to the `[llm]` table of the file at `path`.
///
/// Other sections and unknown keys are preserved. Switching provider
/// without a new base URL drops the stored one so the new preset applies.
pub async fn persist_llm_config(path: &Path, update: &LlmUpdate) -> Result<(), ConfigError> {
    let mut doc: toml::Table = match tokio::fs::read_to_string(path).await {
        Ok(content) => content.parse::<toml::Table>().map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let llm = doc
        .entry("llm")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(llm) = llm else {
        return Err(ConfigError::Parse {
            path: path.to_path_buf(),
            reason: "`llm` is not a table".to_string(),
        });
    };

    if let Some(provider) = update.provider {
        llm.insert("provider".into(), toml::Value::String(provider.to_string()));
        if update.base_url.is_none() {
            llm.remove("base_url");
        }
    }
    if let Some(model) = &update.model {
        llm.insert("model".into(), toml::Value::String(model.clone()));
    }
    if let Some(api_key) = &update.api_key {
        llm.insert("api_key".into(), toml::Value::String(api_key.clone()));
    }
    if let Some(base_url) = &update.base_url {
        llm.insert("base_url".into(), toml::Value::String(base_url.clone()));
    }
    if let Some(temperature) = update.temperature {
        llm.insert("temperature".into(), toml::Value::Float(temperature));
    }

    let write_err = |reason: String| ConfigError::Write {
        path: path.to_path_buf(),
        reason,
    };
    let rendered = toml::to_string_pretty(&doc).map_err(|e| write_err(e.to_string()))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_err(e.to_string()))?;
    }
    tokio::fs::write(path, rendered)
        .await
        .map_err(|e| write_err(e.to_string()))?;

    tracing::info!(path = %path.display(), "llm config updated");
    Ok(())
}
