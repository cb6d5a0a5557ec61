//! Fetch bars and logger setup.
//!
//! Each fetch gets one line in a shared [`MultiProgress`]: a spinner while
//! the record count is unknown, a bar once it is. Log output is routed
//! through the same [`MultiProgress`] so it prints above the bars.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use nyc311_source::progress::FetchProgress;

/// One fetch's line on the terminal.
pub struct FetchBar {
    bar: ProgressBar,
}

impl FetchBar {
    /// Adds a spinner named `name` (e.g. `current`, `bronx prior`) to
    /// `multi`.
    #[must_use]
    pub fn spawn(multi: &MultiProgress, name: &str) -> Arc<dyn FetchProgress> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:>14} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(name.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        Arc::new(Self { bar })
    }

    fn counted_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "  {prefix:>14} [{bar:40.green/white}] {human_pos}/{human_len} ({eta} left)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
    }
}

impl FetchProgress for FetchBar {
    fn begin(&self, label: &str, expected: Option<u64>) {
        self.bar.set_message(label.to_string());
        if let Some(expected) = expected {
            self.bar.set_length(expected);
            self.bar.set_style(Self::counted_style());
        }
    }

    fn page(&self, records: u64) {
        self.bar.inc(records);
    }

    fn end(&self, outcome: String) {
        self.bar.finish_with_message(outcome);
    }
}

/// Installs `pretty_env_logger` (filtered by `RUST_LOG`) behind
/// `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
