use clap::{Parser, Subcommand};

use crate::crew::pipeline::DEFAULT_TOPIC;

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    #[command(about = "List configured profiles and highlight the active profile")]
    List,
    #[command(about = "Show the active profile's resolved runtime settings")]
    Show,
}

#[derive(Debug, Subcommand)]
pub enum PipelineCommands {
    #[command(about = "Print the plan/write/edit pipeline built for a topic as JSON")]
    Show {
        #[arg(long, default_value = DEFAULT_TOPIC)]
        topic: String,
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum TelemetryCommands {
    #[command(about = "Summarize telemetry events from a JSONL stream")]
    Report {
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value_t = 5000)]
        limit: usize,
    },
}

const CLI_EXAMPLES: &str = "Examples:\n\
  content-crew generate --topic \"Renewable Energy\"\n\
  content-crew generate --topic \"Rust async\" --quiet\n\
  content-crew session\n\
  content-crew serve --host 127.0.0.1 --port 8501\n\
  content-crew pipeline show --topic \"Quantum Computing\"\n\
  content-crew --profile dev profiles show\n\
  content-crew telemetry report --limit 2000\n\
\n\
Credentials:\n\
  - CLI commands read --api-key or OPENAI_API_KEY.\n\
  - The form server and the interactive session ask for the key instead.";

#[derive(Debug, Parser)]
#[command(name = "content-crew")]
#[command(about = "Plan, write and edit blog content with a three-agent crew")]
#[command(after_long_help = CLI_EXAMPLES)]
pub struct Cli {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "CONTENT_CREW_MODEL")]
    pub model: Option<String>,

    #[arg(long, env = "CONTENT_CREW_API_BASE")]
    pub api_base: Option<String>,

    #[arg(long, env = "CONTENT_CREW_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, env = "CONTENT_CREW_PROFILE", default_value = "default")]
    pub profile: String,

    #[arg(long, env = "CONTENT_CREW_CONFIG", default_value = ".content-crew/config.toml")]
    pub config_path: String,

    #[arg(long, env = "CONTENT_CREW_APP_NAME")]
    pub app_name: Option<String>,

    #[arg(long, env = "CONTENT_CREW_SHOW_SENSITIVE_CONFIG", default_value_t = false)]
    pub show_sensitive_config: bool,

    #[arg(long, env = "CONTENT_CREW_TELEMETRY_ENABLED", action = clap::ArgAction::Set)]
    pub telemetry_enabled: Option<bool>,

    #[arg(long, env = "CONTENT_CREW_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run the crew once for a topic and print every stage's output")]
    Generate {
        #[arg(long, default_value = DEFAULT_TOPIC)]
        topic: String,
        #[arg(long, default_value_t = false, help = "Hide the debug log section")]
        quiet: bool,
    },
    #[command(about = "Run an interactive terminal session (key, topic, verbosity, generate)")]
    Session,
    #[command(about = "Serve the content form over HTTP")]
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8501)]
        port: u16,
    },
    #[command(about = "Inspect the pipeline built for a topic")]
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    #[command(about = "Validate credentials, model and telemetry configuration")]
    Doctor,
    #[command(about = "Inspect profile configuration and active resolved profile state")]
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    #[command(about = "Telemetry utilities and reporting")]
    Telemetry {
        #[command(subcommand)]
        command: TelemetryCommands,
    },
}

pub fn command_label(command: &Commands) -> String {
    match command {
        Commands::Generate { .. } => "generate".to_string(),
        Commands::Session => "session".to_string(),
        Commands::Serve { .. } => "serve".to_string(),
        Commands::Pipeline { command } => match command {
            PipelineCommands::Show { .. } => "pipeline.show".to_string(),
        },
        Commands::Doctor => "doctor".to_string(),
        Commands::Profiles { command } => match command {
            ProfileCommands::List => "profiles.list".to_string(),
            ProfileCommands::Show => "profiles.show".to_string(),
        },
        Commands::Telemetry { command } => match command {
            TelemetryCommands::Report { .. } => "telemetry.report".to_string(),
        },
    }
}
