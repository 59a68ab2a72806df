use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::level_filters::LevelFilter;

use content_crew::chat::run_session;
use content_crew::cli::{Cli, Commands, PipelineCommands, ProfileCommands, TelemetryCommands, command_label};
use content_crew::config::{cli_api_key, load_profiles, resolve_runtime_config};
use content_crew::doctor::run_doctor;
use content_crew::error::{categorize_error, format_cli_error};
use content_crew::generate::{run_generate, run_pipeline_show};
use content_crew::profiles::{run_profiles_list, run_profiles_show};
use content_crew::server::run_server;
use content_crew::session::{ContentStudio, openai_engine_factory};
use content_crew::telemetry::{TelemetrySink, run_telemetry_report};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let show_sensitive_config = cli.show_sensitive_config;
    if let Err(err) = run_cli(cli).await {
        eprintln!("{}", format_cli_error(&err, show_sensitive_config));
        tracing::error!(category = %categorize_error(&err).code(), "command failed");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_cli(cli: Cli) -> Result<()> {
    init_tracing(&cli.log_filter)?;
    let profiles = load_profiles(&cli.config_path)?;
    let cfg = resolve_runtime_config(&cli, &profiles)?;
    let api_key = cli_api_key(&cli);
    let telemetry = TelemetrySink::new(&cfg, command_label(&cli.command));
    let studio = ContentStudio::new(cfg.clone(), telemetry.clone(), openai_engine_factory());

    telemetry.emit("command.started", json!({ "model": cfg.model.clone() }));

    match cli.command {
        Commands::Generate { topic, quiet } => {
            run_generate(&studio, api_key, &topic, !quiet).await?;
        }
        Commands::Session => {
            run_session(studio, api_key).await?;
        }
        Commands::Serve { host, port } => {
            run_server(studio, host, port, &telemetry).await?;
        }
        Commands::Pipeline { command } => match command {
            PipelineCommands::Show { topic, quiet } => run_pipeline_show(&topic, !quiet)?,
        },
        Commands::Doctor => run_doctor(&cfg, api_key.as_deref())?,
        Commands::Profiles { command } => match command {
            ProfileCommands::List => run_profiles_list(&profiles, &cfg)?,
            ProfileCommands::Show => run_profiles_show(&cfg)?,
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { path, limit } => {
                run_telemetry_report(&cfg, path, limit)?
            }
        },
    }

    telemetry.emit("command.completed", json!({}));
    Ok(())
}

fn init_tracing(log_filter: &str) -> Result<()> {
    let level = log_filter
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(log_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))
}
