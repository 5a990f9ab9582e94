//! Terminal styling helpers

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Success marker
pub fn check() -> String {
    "✓".green().to_string()
}

/// Failure marker
pub fn cross() -> String {
    "✗".red().to_string()
}

/// Highlight a branch name, PR number or similar
pub fn emphasis(text: &str) -> String {
    text.bold().to_string()
}

/// De-emphasised text
pub fn muted(text: &str) -> String {
    text.dimmed().to_string()
}

/// Spinner shown while the remote is being rewritten
pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
