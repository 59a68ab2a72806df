use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::Cli;
use crate::crew::pipeline::DEFAULT_TOPIC;
use crate::provider::{DEFAULT_API_BASE, DEFAULT_MODEL, validate_model_name};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub profile: String,
    pub config_path: String,
    pub model: String,
    pub api_base: String,
    pub request_timeout_secs: Option<u64>,
    pub app_name: String,
    pub default_topic: String,
    pub default_verbose: bool,
    pub show_sensitive_config: bool,
    pub telemetry_enabled: bool,
    pub telemetry_path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub app_name: Option<String>,
    pub default_topic: Option<String>,
    pub default_verbose: Option<bool>,
    pub telemetry_enabled: Option<bool>,
    pub telemetry_path: Option<String>,
}

pub fn load_profiles(config_path: &str) -> Result<ProfilesFile> {
    let path = Path::new(config_path);
    if !path.exists() {
        return Ok(ProfilesFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile config file at '{}'", path.display()))?;
    toml::from_str::<ProfilesFile>(&content).with_context(|| {
        format!(
            "invalid profile configuration in '{}'. Check model/telemetry values and field names.",
            path.display()
        )
    })
}

pub fn resolve_runtime_config(cli: &Cli, profiles: &ProfilesFile) -> Result<RuntimeConfig> {
    let selected = cli.profile.trim();
    if selected.is_empty() {
        return Err(anyhow::anyhow!(
            "profile name cannot be empty. Set --profile <name>."
        ));
    }

    let profile = if selected == "default" && !profiles.profiles.contains_key("default") {
        ProfileConfig::default()
    } else {
        profiles.profiles.get(selected).cloned().ok_or_else(|| {
            let mut names = profiles.profiles.keys().cloned().collect::<Vec<String>>();
            names.sort();
            if names.is_empty() {
                anyhow::anyhow!(
                    "profile '{}' not found in '{}'. No profiles are defined yet.",
                    selected,
                    cli.config_path
                )
            } else {
                anyhow::anyhow!(
                    "profile '{}' not found in '{}'. Available profiles: {}",
                    selected,
                    cli.config_path,
                    names.join(", ")
                )
            }
        })?
    };

    let model = cli
        .model
        .clone()
        .or(profile.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    validate_model_name(&model)?;

    let default_topic = profile
        .default_topic
        .map(|topic| topic.trim().to_string())
        .filter(|topic| !topic.is_empty())
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

    Ok(RuntimeConfig {
        profile: selected.to_string(),
        config_path: cli.config_path.clone(),
        model,
        api_base: cli
            .api_base
            .clone()
            .or(profile.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string(),
        request_timeout_secs: cli
            .request_timeout_secs
            .or(profile.request_timeout_secs)
            .map(|secs| secs.max(1)),
        app_name: cli
            .app_name
            .clone()
            .or(profile.app_name)
            .unwrap_or_else(|| "Interactive Content Crew".to_string()),
        default_topic,
        default_verbose: profile.default_verbose.unwrap_or(true),
        show_sensitive_config: cli.show_sensitive_config,
        telemetry_enabled: cli
            .telemetry_enabled
            .or(profile.telemetry_enabled)
            .unwrap_or(true),
        telemetry_path: cli
            .telemetry_path
            .clone()
            .or(profile.telemetry_path)
            .unwrap_or_else(|| ".content-crew/telemetry/events.jsonl".to_string()),
    })
}

/// Credential passed on the command line or via `OPENAI_API_KEY`, if any.
pub fn cli_api_key(cli: &Cli) -> Option<String> {
    cli.api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

pub fn display_api_key(cfg: &RuntimeConfig, api_key: Option<&str>) -> String {
    match api_key {
        None => "<not set>".to_string(),
        Some(key) if cfg.show_sensitive_config => key.to_string(),
        Some(key) => format!(
            "{} (set --show-sensitive-config to reveal)",
            mask_secret(key)
        ),
    }
}

pub fn mask_secret(value: &str) -> String {
    let visible = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<char>>()
        .into_iter()
        .rev()
        .collect::<String>();
    if value.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{visible}")
    }
}
