use thiserror::Error;

/// Failures a single run can end in. None of these end the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("Please provide your OpenAI API key to proceed.")]
    MissingCredential,
    #[error("Please provide a topic for content creation.")]
    EmptyTopic,
    #[error("a content run is already in progress")]
    Busy,
    #[error("{0}")]
    Engine(String),
    #[error("engine returned an unexpected response: {0}")]
    MalformedResponse(String),
    #[error("content run was cancelled")]
    Cancelled,
}

impl RunError {
    /// Input problems are shown as warnings rather than errors.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RunError::MissingCredential | RunError::EmptyTopic | RunError::Busy
        )
    }

    pub fn engine(err: &anyhow::Error) -> Self {
        RunError::Engine(redact_sensitive_text(&format!("{err:#}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Provider,
    Pipeline,
    Input,
    Internal,
}

impl ErrorCategory {
    pub fn code(self) -> &'static str {
        match self {
            ErrorCategory::Provider => "PROVIDER",
            ErrorCategory::Pipeline => "PIPELINE",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Internal => "INTERNAL",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ErrorCategory::Provider => {
                "Set OPENAI_API_KEY (or pass --api-key) and check --model/--api-base."
            }
            ErrorCategory::Pipeline => {
                "Retry with --log-filter info to see per-stage progress of the crew."
            }
            ErrorCategory::Input => "Run content-crew --help and correct command arguments.",
            ErrorCategory::Internal => {
                "Retry with RUST_LOG=debug. If it persists, capture logs and open an issue."
            }
        }
    }
}

pub fn categorize_error(err: &anyhow::Error) -> ErrorCategory {
    let msg = format!("{err:#}").to_ascii_lowercase();

    if msg.contains("api_key")
        || msg.contains("api key")
        || msg.contains("model provider")
        || msg.contains("model request")
        || msg.contains("model name")
    {
        return ErrorCategory::Provider;
    }

    if msg.contains("invalid value")
        || msg.contains("unknown argument")
        || msg.contains("profile")
        || msg.contains("topic")
        || msg.contains("bind address")
    {
        return ErrorCategory::Input;
    }

    if msg.contains("stage") || msg.contains("pipeline") || msg.contains("engine") {
        return ErrorCategory::Pipeline;
    }

    ErrorCategory::Internal
}

pub fn format_cli_error(err: &anyhow::Error, show_sensitive_config: bool) -> String {
    let category = categorize_error(err);
    let rendered_error = render_error_message(err, show_sensitive_config);
    format!(
        "[{}] {}\nHint: {}",
        category.code(),
        rendered_error,
        category.hint()
    )
}

pub fn render_error_message(err: &anyhow::Error, show_sensitive_config: bool) -> String {
    if show_sensitive_config {
        format!("{err:#}")
    } else {
        redact_sensitive_text(&format!("{err:#}"))
    }
}

pub fn redact_sensitive_text(text: &str) -> String {
    redact_api_keys(text)
}

/// Shortest key body (after `sk-`) treated as a credential.
const MIN_KEY_BODY_LEN: usize = 6;

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Masks `sk-...` style credentials in `text`. The prefix must start a token,
/// so words such as `disk-full` or `task-list` pass through unchanged.
pub fn redact_api_keys(text: &str) -> String {
    const KEY_PREFIX: &str = "sk-";
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    while let Some(offset) = text[cursor..].find(KEY_PREFIX) {
        let start = cursor + offset;
        let body_start = start + KEY_PREFIX.len();
        let starts_token = !text[..start].chars().next_back().is_some_and(is_key_char);

        let body_len = text[body_start..]
            .find(|ch: char| !is_key_char(ch))
            .unwrap_or(text.len() - body_start);
        let end = body_start + body_len;

        out.push_str(&text[cursor..start]);
        if starts_token && body_len >= MIN_KEY_BODY_LEN {
            out.push_str(&redact_api_key_value(&text[start..end]));
            cursor = end;
        } else {
            out.push_str(KEY_PREFIX);
            cursor = body_start;
        }
    }

    out.push_str(&text[cursor..]);
    out
}

pub fn redact_api_key_value(value: &str) -> String {
    if value.starts_with("sk-") {
        "sk-[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}
