//! Output formatting utilities for the CLI

use ciaa_core::config::SessionConfig;
use ciaa_protocol::CommandOutput;

/// Prefix marking lines of a command that exited non-zero
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Render classified output as terminal lines.
///
/// Standard lines are printed as-is, error lines carry [`ERROR_PREFIX`].
pub fn format_output(output: &CommandOutput) -> Vec<String> {
    let stdout = output.stdout.iter().map(|l| l.trim_end().to_string());
    let stderr = output
        .stderr
        .iter()
        .map(|l| format!("{}{}", ERROR_PREFIX, l.trim_end()));
    stdout.chain(stderr).collect()
}

/// Render a config as TOML with the password masked
pub fn format_config(config: &SessionConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.password.is_some() {
        shown.password = Some("********".to_string());
    }
    toml::to_string_pretty(&shown)
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
