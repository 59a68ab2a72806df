use std::future::Future;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::mask_secret;
use crate::error::RunError;
use crate::present::{PROCESSING_NOTICE, WORKING_NOTICE, present_error, render_terminal};
use crate::session::{ContentSession, ContentStudio};
use crate::theme::{format_command_palette, print_startup_banner, session_prompt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Exit,
    Status,
    Help,
    Generate,
    Key(String),
    Topic(String),
    Verbose(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSessionCommand {
    Empty,
    Command(SessionCommand),
    MissingArgument { usage: &'static str },
    InvalidArgument { usage: &'static str },
    UnknownCommand(String),
}

pub fn parse_session_command(input: &str) -> ParsedSessionCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ParsedSessionCommand::Empty;
    }

    if trimmed.eq_ignore_ascii_case("exit") {
        return ParsedSessionCommand::Command(SessionCommand::Exit);
    }
    if trimmed.eq_ignore_ascii_case("generate") {
        return ParsedSessionCommand::Command(SessionCommand::Generate);
    }

    let Some(slashless) = trimmed.strip_prefix('/') else {
        return ParsedSessionCommand::UnknownCommand(trimmed.to_string());
    };

    let mut parts = slashless.splitn(2, char::is_whitespace);
    let command = parts
        .next()
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match command.as_str() {
        "exit" | "quit" => ParsedSessionCommand::Command(SessionCommand::Exit),
        "status" => ParsedSessionCommand::Command(SessionCommand::Status),
        "help" => ParsedSessionCommand::Command(SessionCommand::Help),
        "generate" | "run" => ParsedSessionCommand::Command(SessionCommand::Generate),
        "key" => {
            if arg.is_empty() {
                ParsedSessionCommand::MissingArgument {
                    usage: "/key <openai-api-key>",
                }
            } else {
                ParsedSessionCommand::Command(SessionCommand::Key(arg.to_string()))
            }
        }
        "topic" => {
            if arg.is_empty() {
                ParsedSessionCommand::MissingArgument {
                    usage: "/topic <text>",
                }
            } else {
                ParsedSessionCommand::Command(SessionCommand::Topic(arg.to_string()))
            }
        }
        "verbose" => match arg.to_ascii_lowercase().as_str() {
            "" => ParsedSessionCommand::MissingArgument {
                usage: "/verbose on|off",
            },
            "on" | "true" | "yes" => ParsedSessionCommand::Command(SessionCommand::Verbose(true)),
            "off" | "false" | "no" => {
                ParsedSessionCommand::Command(SessionCommand::Verbose(false))
            }
            _ => ParsedSessionCommand::InvalidArgument {
                usage: "/verbose on|off",
            },
        },
        _ => ParsedSessionCommand::UnknownCommand(format!("/{command}")),
    }
}

pub fn format_session_status(studio: &ContentStudio, session: &ContentSession) -> String {
    let cfg = studio.config();
    format!(
        "State: {}\nTopic: {}\nDebug logs: {}\nAPI key: {}\nModel: {}",
        session.state().label(),
        if session.topic().is_empty() {
            "<empty>"
        } else {
            session.topic()
        },
        if session.verbose() { "on" } else { "off" },
        session
            .api_key()
            .map(mask_secret)
            .unwrap_or_else(|| "<not set>".to_string()),
        cfg.model
    )
}

/// Resolves on Ctrl+C. Once the first handler is installed the default
/// SIGINT behaviour is gone for the process, so every wait in the session
/// races against a fresh one of these.
async fn interrupt_on_ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Line-oriented counterpart of the content form.
pub async fn run_session(studio: ContentStudio, initial_api_key: Option<String>) -> Result<()> {
    let mut session = studio.new_session();
    if let Some(api_key) = initial_api_key {
        session.set_api_key(&api_key);
    }

    print_startup_banner(&studio.config().app_name, &studio.config().model);
    if session.api_key().is_none() {
        print!(
            "{}",
            render_terminal(&[present_error(&RunError::MissingCredential)])
        );
    }

    drive_session(
        &studio,
        &mut session,
        BufReader::new(tokio::io::stdin()),
        interrupt_on_ctrl_c,
    )
    .await
}

/// Reads commands from `input` until `/exit`, end of input, or `interrupt`
/// fires at the prompt. While a run is in flight `interrupt` cancels the run
/// instead and the session continues.
pub async fn drive_session<R, I, F>(
    studio: &ContentStudio,
    session: &mut ContentSession,
    input: R,
    interrupt: I,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    I: Fn() -> F,
    F: Future<Output = ()>,
{
    let mut lines = input.lines();
    loop {
        print!("{}", session_prompt(session.api_key().is_some()));
        io::stdout().flush().context("failed to flush stdout")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read input line")?,
            _ = interrupt() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_session_command(&line) {
            ParsedSessionCommand::Empty => continue,
            ParsedSessionCommand::MissingArgument { usage }
            | ParsedSessionCommand::InvalidArgument { usage } => {
                println!("Usage: {usage}");
            }
            ParsedSessionCommand::UnknownCommand(command) => {
                println!("Unknown command '{command}'.");
                print!("{}", format_command_palette());
            }
            ParsedSessionCommand::Command(command) => match command {
                SessionCommand::Exit => break,
                SessionCommand::Help => print!("{}", format_command_palette()),
                SessionCommand::Status => {
                    println!("{}", format_session_status(studio, session))
                }
                SessionCommand::Key(api_key) => {
                    session.set_api_key(&api_key);
                    println!("API key set ({}).", mask_secret(&api_key));
                }
                SessionCommand::Topic(topic) => {
                    session.set_topic(&topic);
                    println!("Topic set to '{}'.", session.topic());
                }
                SessionCommand::Verbose(verbose) => {
                    session.set_verbose(verbose);
                    println!("Debug logs {}.", if verbose { "on" } else { "off" });
                }
                SessionCommand::Generate => {
                    if session.api_key().is_some() {
                        println!("{PROCESSING_NOTICE}");
                        println!("{WORKING_NOTICE}");
                    }
                    let sections = studio.generate_until(session, interrupt()).await;
                    print!("{}", render_terminal(&sections));
                }
            },
        }
    }

    Ok(())
}
