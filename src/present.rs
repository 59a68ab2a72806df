use crate::crew::runner::RunOutcome;
use crate::crew::task::StageId;
use crate::error::RunError;
use crate::theme::{BOLD_CYAN, BOLD_GREEN, BOLD_RED, BOLD_YELLOW, DIM, RESET};

pub const PROCESSING_NOTICE: &str = "Processing... This may take a few moments.";
pub const WORKING_NOTICE: &str = "The agents are working on your content...";
pub const SUCCESS_STATUS: &str = "Content generation completed!";
pub const DEBUG_HEADING: &str = "Debug Logs";

/// One rendered block of a run's result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Status(String),
    Output { stage: StageId, body: String },
    Debug(String),
    Warning(String),
    Error(String),
}

impl Section {
    pub fn heading(&self) -> Option<&'static str> {
        match self {
            Section::Output { stage, .. } => Some(stage.heading()),
            Section::Debug(_) => Some(DEBUG_HEADING),
            _ => None,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Section::Status(text)
            | Section::Debug(text)
            | Section::Warning(text)
            | Section::Error(text) => text,
            Section::Output { body, .. } => body,
        }
    }
}

/// Turns a run outcome into ordered sections.
///
/// Success yields the status line, the three stage outputs in pipeline order
/// and, when `verbose`, the raw engine response. Failure yields exactly one
/// warning or error section.
pub fn present(outcome: &RunOutcome, verbose: bool) -> Vec<Section> {
    match outcome {
        Ok(result) => {
            let mut sections = Vec::with_capacity(5);
            sections.push(Section::Status(SUCCESS_STATUS.to_string()));
            for stage in StageId::ORDER {
                sections.push(Section::Output {
                    stage,
                    body: result.output(stage).to_string(),
                });
            }
            if verbose {
                let raw = result
                    .raw
                    .as_ref()
                    .map(|raw| serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string()))
                    .unwrap_or_default();
                sections.push(Section::Debug(raw));
            }
            sections
        }
        Err(err) => vec![present_error(err)],
    }
}

pub fn present_error(err: &RunError) -> Section {
    if err.is_warning() {
        Section::Warning(err.to_string())
    } else {
        Section::Error(format!("An error occurred: {err}"))
    }
}

pub fn render_terminal(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        match section {
            Section::Status(text) => out.push_str(&format!("{BOLD_GREEN}✔ {text}{RESET}\n")),
            Section::Warning(text) => out.push_str(&format!("{BOLD_YELLOW}⚠ {text}{RESET}\n")),
            Section::Error(text) => out.push_str(&format!("{BOLD_RED}✖ {text}{RESET}\n")),
            Section::Output { .. } | Section::Debug(_) => {
                let heading = section.heading().unwrap_or_default();
                out.push_str(&format!("\n{BOLD_CYAN}{heading}{RESET}\n"));
                out.push_str(&format!("{DIM}{}{RESET}\n", "─".repeat(heading.len())));
                out.push_str(section.body().trim_end());
                out.push('\n');
            }
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_html(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        let body = escape_html(section.body());
        match section {
            Section::Status(_) => {
                out.push_str(&format!("<div class=\"alert success\">{body}</div>\n"))
            }
            Section::Warning(_) => {
                out.push_str(&format!("<div class=\"alert warning\">{body}</div>\n"))
            }
            Section::Error(_) => out.push_str(&format!("<div class=\"alert error\">{body}</div>\n")),
            Section::Output { .. } | Section::Debug(_) => {
                let heading = section.heading().unwrap_or_default();
                out.push_str(&format!(
                    "<section>\n<h3>{heading}</h3>\n<pre>{body}</pre>\n</section>\n"
                ));
            }
        }
    }
    out
}
