//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output. Styling is applied only
//! when the target stream supports it, so `owo_colors::set_override(false)`
//! turns it off everywhere.

use owo_colors::{OwoColorize, Stream};

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!(
            "{} {}",
            "✓".if_supports_color(Stream::Stdout, |t| t.green()),
            message
        );
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!(
            "{} {}",
            "✗".if_supports_color(Stream::Stderr, |t| t.red()),
            message
        );
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.if_supports_color(Stream::Stdout, |t| t.bold()));
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `label: value` line
    pub fn field(label: &str, value: &str) {
        let label = format_label(label);
        println!(
            "  {} {}",
            label.if_supports_color(Stream::Stdout, |t| t.dimmed()),
            value
        );
    }
}

/// Pad a label so values line up in a column
pub fn format_label(label: &str) -> String {
    format!("{:<18}", format!("{}:", label))
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else {
        format!("{:.1}s", secs)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Format an on/off flag
pub fn format_flag(enabled: bool) -> &'static str {
    if enabled { "yes" } else { "no" }
}
