//! Configuration types for Praxis.
//!
//! `PraxisConfig` mirrors `config.toml`. All fields have defaults, so an
//! empty or missing file yields a working configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Supported generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Doubao,
    Kimi,
    DeepSeek,
}

/// Request shape a provider expects for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStrategy {
    /// Chat completions with a strict `json_schema` response format.
    NativeStructured,
    /// Chat completions in JSON mode, schema injected as a system message.
    JsonMode,
    /// Responses API with a typed input envelope.
    Responses,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Doubao,
        ProviderKind::Kimi,
        ProviderKind::DeepSeek,
    ];

    /// Environment variable consulted for the API key before the config file.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Doubao => "ARK_API_KEY",
            ProviderKind::Kimi => "MOONSHOT_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Doubao => "https://ark.cn-beijing.volces.com/api/v3",
            ProviderKind::Kimi => "https://api.moonshot.ai/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com",
        }
    }

    pub fn strategy(&self) -> BackendStrategy {
        match self {
            ProviderKind::OpenAi => BackendStrategy::NativeStructured,
            ProviderKind::Doubao => BackendStrategy::Responses,
            ProviderKind::Kimi | ProviderKind::DeepSeek => BackendStrategy::JsonMode,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Doubao => write!(f, "doubao"),
            ProviderKind::Kimi => write!(f, "kimi"),
            ProviderKind::DeepSeek => write!(f, "deepseek"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "doubao" => Ok(ProviderKind::Doubao),
            "kimi" => Ok(ProviderKind::Kimi),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            other => Err(format!("unknown provider: '{other}'")),
        }
    }
}

/// Top-level configuration, loaded from `<config_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PraxisConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    /// Fallback key when the provider's environment variable is unset.
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[storage]` section. `data_dir` defaults to `<config_dir>/data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_color() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

/// `[engine]` section: round caps for the coaching loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Cap for threads started with forced practice. Falls back to `max_rounds`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_max_rounds: Option<u32>,
}

fn default_max_rounds() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            forced_max_rounds: None,
        }
    }
}

impl EngineConfig {
    /// Round cap for a thread, depending on whether it was forced.
    pub fn round_cap(&self, forced: bool) -> u32 {
        if forced {
            self.forced_max_rounds.unwrap_or(self.max_rounds)
        } else {
            self.max_rounds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize_empty_uses_defaults() {
        let config: PraxisConfig = toml::from_str("").unwrap();
        assert_eq!(config.llm.provider, ProviderKind::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o");
        assert!((config.llm.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.llm.timeout_secs, 120);
        assert!(config.display.color);
        assert_eq!(config.engine.max_rounds, 3);
        assert!(config.engine.forced_max_rounds.is_none());
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[llm]
provider = "deepseek"
model = "deepseek-chat"
temperature = 0.2

[storage]
data_dir = "/tmp/praxis"

[display]
color = false

[engine]
max_rounds = 4
forced_max_rounds = 2
"#;
        let config: PraxisConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.provider, ProviderKind::DeepSeek);
        assert_eq!(config.llm.model, "deepseek-chat");
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/praxis")));
        assert!(!config.display.color);
        assert_eq!(config.engine.round_cap(false), 4);
        assert_eq!(config.engine.round_cap(true), 2);
    }

    #[test]
    fn test_api_key_is_redacted_in_debug_and_serialization() {
        use secrecy::ExposeSecret;

        let config: PraxisConfig = toml::from_str("[llm]\napi_key = \"sk-live-123456\"\n").unwrap();
        let key = config.llm.api_key.as_ref().unwrap();
        assert_eq!(key.expose_secret(), "sk-live-123456");

        assert!(!format!("{config:?}").contains("sk-live-123456"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-live-123456"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_round_cap_forced_falls_back_to_max_rounds() {
        let engine = EngineConfig::default();
        assert_eq!(engine.round_cap(true), 3);
    }

    #[test]
    fn test_provider_presets() {
        assert_eq!(ProviderKind::Doubao.api_key_env(), "ARK_API_KEY");
        assert_eq!(ProviderKind::Kimi.default_base_url(), "https://api.moonshot.ai/v1");
        assert_eq!(ProviderKind::Doubao.strategy(), BackendStrategy::Responses);
        assert_eq!(ProviderKind::DeepSeek.strategy(), BackendStrategy::JsonMode);
        assert_eq!(ProviderKind::OpenAi.strategy(), BackendStrategy::NativeStructured);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!(" Kimi ".parse::<ProviderKind>().unwrap(), ProviderKind::Kimi);
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }
}
