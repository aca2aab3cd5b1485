//! `praxis config` subcommands.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Subcommand;
use console::style;
use secrecy::ExposeSecret;

use praxis_infra::config::{self, LlmUpdate};
use praxis_types::config::PraxisConfig;

use super::display;
use super::practice::OutputMode;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Update the [llm] section of config.toml
    SetLlm {
        /// Provider: openai, doubao, kimi, deepseek
        #[arg(long)]
        provider: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// API key stored in the config file (the provider's env var takes precedence)
        #[arg(long)]
        api_key: Option<String>,

        /// Override the provider's base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f64>,
    },
}

pub async fn handle(
    command: ConfigCommand,
    config: &PraxisConfig,
    config_dir: &Path,
    out: OutputMode,
) -> Result<()> {
    match command {
        ConfigCommand::Show => show(config, config_dir, out),
        ConfigCommand::SetLlm {
            provider,
            model,
            api_key,
            base_url,
            temperature,
        } => {
            let update = LlmUpdate {
                provider: provider.as_deref().map(config::parse_provider).transpose()?,
                model,
                api_key,
                base_url,
                temperature,
            };
            set_llm(config_dir, &update, out).await
        }
    }
}

fn show(config: &PraxisConfig, config_dir: &Path, out: OutputMode) -> Result<()> {
    let llm = &config.llm;
    let env_name = llm.provider.api_key_env();
    let env_set = std::env::var(env_name).is_ok_and(|v| !v.trim().is_empty());
    let base_url = llm
        .base_url
        .clone()
        .unwrap_or_else(|| llm.provider.default_base_url().to_string());
    let data_dir = config::data_dir(config, config_dir);

    if out.json {
        let body = serde_json::json!({
            "config_path": config::config_path(config_dir).display().to_string(),
            "data_dir": data_dir.display().to_string(),
            "llm": {
                "provider": llm.provider.to_string(),
                "model": llm.model,
                "base_url": base_url,
                "temperature": llm.temperature,
                "timeout_secs": llm.timeout_secs,
                "api_key": llm.api_key.as_ref().map(|k| mask_key(k.expose_secret())),
                "api_key_env": env_name,
                "api_key_env_set": env_set,
            },
            "engine": {
                "max_rounds": config.engine.max_rounds,
                "forced_max_rounds": config.engine.forced_max_rounds,
            },
            "display": { "color": config.display.color },
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!();
    display::field("Config", config::config_path(config_dir).display());
    display::field("Data", data_dir.display());

    display::section("LLM");
    display::field("Provider", style(llm.provider).cyan());
    display::field("Model", &llm.model);
    display::field("Base URL", &base_url);
    display::field("Temperature", llm.temperature);
    display::field("Timeout", format!("{}s", llm.timeout_secs));
    let key_source = match (env_set, &llm.api_key) {
        (true, _) => style(format!("from {env_name}")).green().to_string(),
        (false, Some(key)) => format!("{} (config file)", mask_key(key.expose_secret())),
        (false, None) => style(format!("not set; export {env_name}")).red().to_string(),
    };
    display::field("API key", key_source);

    display::section("Engine");
    display::field("Max rounds", config.engine.max_rounds);
    display::field("Forced rounds", config.engine.round_cap(true));
    println!();
    Ok(())
}

async fn set_llm(config_dir: &Path, update: &LlmUpdate, out: OutputMode) -> Result<()> {
    if update.is_empty() {
        bail!("nothing to update; pass at least one of --provider, --model, --api-key, --base-url, --temperature");
    }
    let path = config::config_path(config_dir);
    config::persist_llm_config(&path, update).await?;

    if out.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "updated": path.display().to_string() }))?
        );
    } else if !out.quiet {
        display::success(&format!("Updated {}", style(path.display()).cyan()));
        println!();
    }
    Ok(())
}

/// Keep the first and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
