use anyhow::Result;

use crate::config::{RuntimeConfig, display_api_key};
use crate::provider::{env_present, validate_model_name};

pub fn run_doctor(cfg: &RuntimeConfig, api_key: Option<&str>) -> Result<()> {
    println!(
        "Active profile: '{}' (config: {})",
        cfg.profile, cfg.config_path
    );

    println!("Credential check:");
    println!(
        "- OPENAI_API_KEY: {}",
        if env_present("OPENAI_API_KEY") {
            "set"
        } else {
            "missing"
        }
    );
    println!("- Resolved API key: {}", display_api_key(cfg, api_key));
    if api_key.is_none() {
        println!("Tip: export OPENAI_API_KEY, pass --api-key, or enter the key in the form/session");
    }

    match validate_model_name(&cfg.model) {
        Ok(()) => println!("Model: {} (ok)", cfg.model),
        Err(err) => println!("Model: {} (invalid: {err})", cfg.model),
    }
    println!("API base: {}", cfg.api_base);
    println!(
        "Request timeout: {}",
        cfg.request_timeout_secs
            .map(|secs| format!("{secs}s"))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "Form defaults: topic='{}' debug_logs={}",
        cfg.default_topic, cfg.default_verbose
    );
    println!(
        "Telemetry: enabled={} path={}",
        cfg.telemetry_enabled, cfg.telemetry_path
    );

    Ok(())
}
