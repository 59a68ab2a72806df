//! Terminal styling and the interactive session's banner and command palette.

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const CYAN: &str = "\x1b[36m";
pub const GREEN: &str = "\x1b[32m";
pub const BOLD_CYAN: &str = "\x1b[1;36m";
pub const BOLD_GREEN: &str = "\x1b[1;32m";
pub const BOLD_YELLOW: &str = "\x1b[1;33m";
pub const BOLD_RED: &str = "\x1b[1;31m";

/// Session slash commands with descriptions.
pub const COMMAND_PALETTE: &[(&str, &str)] = &[
    ("key", "set the OpenAI API key for this session"),
    ("topic", "set the topic for content creation"),
    ("verbose", "show or hide the debug log section (on|off)"),
    ("generate", "run the planner, writer and editor"),
    ("status", "show session state, topic and model"),
    ("help", "show command quick reference"),
    ("exit", "end the session"),
];

pub fn session_prompt(ready: bool) -> String {
    if ready {
        format!("{BOLD_CYAN}crew>{RESET} ")
    } else {
        format!("{BOLD_CYAN}crew{RESET} {DIM}[setup]{RESET}{BOLD_CYAN}>{RESET} ")
    }
}

pub fn print_startup_banner(app_name: &str, model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "  {BOLD_CYAN}{app_name}{RESET} {DIM}v{version}{RESET}  {DIM}·{RESET}  {GREEN}{model}{RESET}"
    );
    println!(
        "  {CYAN}/key{RESET} {DIM}credential{RESET}  {DIM}·{RESET}  {CYAN}/topic{RESET} {DIM}subject{RESET}  {DIM}·{RESET}  {CYAN}/generate{RESET} {DIM}run{RESET}  {DIM}·{RESET}  {CYAN}/exit{RESET} {DIM}quit{RESET}  {DIM}·{RESET}  {CYAN}Ctrl+C{RESET} {DIM}cancel run or quit{RESET}"
    );
    println!("  {DIM}{}{RESET}", "━".repeat(68));
    println!();
}

pub fn format_command_palette() -> String {
    let mut out = format!("{BOLD}Commands:{RESET}\n");
    for (name, desc) in COMMAND_PALETTE {
        out.push_str(&format!("  {CYAN}/{name:<10}{RESET} {DIM}{desc}{RESET}\n"));
    }
    out
}
