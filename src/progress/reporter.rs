//! Progress reporter implementation
//!
//! Driven from the observer thread with the absolute values carried by
//! each progress event, so it keeps no counters of its own.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::time::Duration;

const STATUS_TEMPLATE: &str = "{spinner:.cyan} {msg}";
const FILES_TEMPLATE: &str = "{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)";
const BYTES_TEMPLATE: &str =
    "{prefix:.bold.dim} [{bar:40.green/white}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA {eta})";

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Truncate a path for the status line, keeping its tail
fn display_path(path: &Path, max: usize) -> String {
    let text = path.display().to_string();
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    let tail: String = text.chars().skip(count - (max - 3)).collect();
    format!("...{tail}")
}

/// Progress bars for one copy run
pub struct ProgressReporter {
    /// Byte transfer bar
    bytes_bar: ProgressBar,
    /// File count bar
    files_bar: ProgressBar,
    /// Current file / status line
    status: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter drawing to stderr
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr(), true)
    }

    /// Create a reporter that draws nothing (quiet or non-TTY)
    pub fn disabled() -> Self {
        Self::with_target(ProgressDrawTarget::hidden(), false)
    }

    fn with_target(target: ProgressDrawTarget, tick: bool) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let status = multi.add(ProgressBar::new_spinner());
        status.set_style(
            ProgressStyle::default_spinner()
                .template(STATUS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status.set_message("Planning...");
        if tick {
            status.enable_steady_tick(Duration::from_millis(120));
        }

        let files_bar = multi.add(ProgressBar::new(0));
        files_bar.set_style(bar_style(FILES_TEMPLATE));
        files_bar.set_prefix("Files");

        let bytes_bar = multi.add(ProgressBar::new(0));
        bytes_bar.set_style(bar_style(BYTES_TEMPLATE));
        bytes_bar.set_prefix("Data ");

        Self {
            bytes_bar,
            files_bar,
            status,
        }
    }

    /// Plan accepted: size the bars
    pub fn begin(&self, files_total: usize, bytes_total: u64) {
        self.files_bar.set_length(files_total as u64);
        self.bytes_bar.set_length(bytes_total);
        self.status.set_message("Copying...");
    }

    /// Show the state carried by one progress event
    pub fn update(&self, current_file: &Path, bytes_done: u64, files_done: usize) {
        self.files_bar.set_position(files_done as u64);
        self.bytes_bar.set_position(bytes_done);
        self.status.set_message(display_path(current_file, 60));
    }

    /// Finish progress with success message
    pub fn finish_success(&self, message: &str) {
        self.status.finish_with_message(format!("✓ {}", message));
        self.files_bar.finish();
        self.bytes_bar.finish();
    }

    /// Finish progress with error message
    pub fn finish_error(&self, message: &str) {
        self.status.finish_with_message(format!("✗ {}", message));
        self.files_bar.abandon();
        self.bytes_bar.abandon();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
