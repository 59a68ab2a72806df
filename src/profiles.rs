use anyhow::Result;

use crate::config::{ProfilesFile, RuntimeConfig};

/// Profile names with their source; `default` is always listed even when the
/// config file does not define it.
pub fn profile_entries(profiles: &ProfilesFile) -> Vec<(String, &'static str)> {
    let mut entries = profiles
        .profiles
        .keys()
        .map(|name| (name.clone(), "configured"))
        .collect::<Vec<_>>();
    if !profiles.profiles.contains_key("default") {
        entries.push(("default".to_string(), "implicit"));
    }
    entries.sort();
    entries
}

pub fn run_profiles_list(profiles: &ProfilesFile, cfg: &RuntimeConfig) -> Result<()> {
    println!("Profiles in {} (active='{}'):", cfg.config_path, cfg.profile);
    for (name, source) in profile_entries(profiles) {
        let marker = if name == cfg.profile { "*" } else { " " };
        println!("{marker} {name} ({source})");
    }
    Ok(())
}

pub fn format_profile_summary(cfg: &RuntimeConfig) -> String {
    let timeout = cfg
        .request_timeout_secs
        .map(|secs| format!("{secs}s"))
        .unwrap_or_else(|| "none".to_string());
    [
        ("Profile", cfg.profile.clone()),
        ("Config path", cfg.config_path.clone()),
        ("App", cfg.app_name.clone()),
        ("Model", cfg.model.clone()),
        ("API base", cfg.api_base.clone()),
        ("Request timeout", timeout),
        ("Default topic", cfg.default_topic.clone()),
        ("Debug logs by default", cfg.default_verbose.to_string()),
        ("Telemetry", format!("{} ({})", cfg.telemetry_enabled, cfg.telemetry_path)),
    ]
    .iter()
    .map(|(label, value)| format!("{label}: {value}\n"))
    .collect()
}

pub fn run_profiles_show(cfg: &RuntimeConfig) -> Result<()> {
    print!("{}", format_profile_summary(cfg));
    Ok(())
}
