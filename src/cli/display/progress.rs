//! Progress bar utilities using indicatif for multi-bot/multi-campaign
//! operations that fan out into several sequential service calls.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a progress bar for a known-size batch of operations (e.g.
/// materializing a bot swarm, one create_bot call per wallet).
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .expect("static template is valid")
            .progress_chars(PROGRESS_CHARS),
    );
    pb
}

/// Create a spinner for an operation whose sub-steps aren't individually
/// observable from the CLI (a single service call that does the fan-out
/// internally, e.g. `create_bot_swarm`).
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .expect("static template is valid")
            .tick_chars(SPINNER_CHARS),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Extension trait for terminating a progress bar with a colored summary.
pub trait ProgressBarExt {
    fn finish_success(&self, message: impl Into<String>);
    fn finish_error(&self, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("\u{2713} {}", message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.finish_with_message(format!("\u{2717} {}", message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_tracks_position() {
        let pb = create_progress_bar(10);
        pb.inc(4);
        assert_eq!(pb.position(), 4);
        pb.finish_success("done");
    }

    #[test]
    fn progress_bar_error_finish() {
        let pb = create_progress_bar(3);
        pb.finish_error("failed partway");
        assert!(pb.is_finished());
    }

    #[test]
    fn spinner_sets_message() {
        let pb = create_spinner("working");
        pb.finish_success("done");
        assert!(pb.is_finished());
    }
}
