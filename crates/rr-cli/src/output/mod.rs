//! Output formatting utilities for the CLI
//!
//! Colored status lines for the operator. Progress goes to stdout, problems
//! to stderr.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
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

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
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

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
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

/// One-line summary of a host list, e.g. `3 hosts (a, b, c)`
pub fn format_hosts(hosts: &[rr_core::Host]) -> String {
    let names: Vec<&str> = hosts.iter().map(|h| h.as_str()).collect();
    let noun = if hosts.len() == 1 { "host" } else { "hosts" };
    format!("{} {} ({})", hosts.len(), noun, names.join(", "))
}
