//! Reference progress observer.
//!
//! Polls a handle until the transfer reaches a terminal status, drawing a
//! terminal progress bar and logging throttled progress events.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use llamahub_core::download::{DownloadHandle, DownloadStatus};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::throttle::ProgressThrottle;

/// How [`observe_progress`] polls and reports.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Delay between progress reads.
    pub poll_interval: Duration,
    /// Minimum delay between `tracing` progress events.
    pub log_interval: Duration,
    /// Draw an `indicatif` bar on stderr.
    pub show_bar: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            log_interval: Duration::from_secs(1),
            show_bar: io::stderr().is_terminal(),
        }
    }
}

/// Watch `handle` until it completes or fails, returning the final status.
///
/// Termination is driven by status, not by percentage, so downloads without
/// a `Content-Length` end the observation as well.
pub async fn observe_progress(handle: Arc<DownloadHandle>, config: ObserverConfig) -> DownloadStatus {
    let artifact = handle.artifact().to_string();
    let bar = if config.show_bar {
        ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(spinner_style());
    bar.set_message(artifact.clone());

    let mut throttle = ProgressThrottle::new(config.log_interval);
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut saw_length = false;

    loop {
        ticker.tick().await;
        let progress = handle.progress();

        if progress.content_length > 0 && !saw_length {
            bar.set_style(bar_style());
            bar.set_length(progress.content_length);
            saw_length = true;
        }
        bar.set_position(progress.written);

        match &progress.status {
            DownloadStatus::Completed => {
                bar.finish_with_message(format!("{artifact} downloaded"));
                info!(
                    artifact = %artifact,
                    bytes = progress.written,
                    "Download completed"
                );
                return progress.status;
            }
            DownloadStatus::Failed { error } => {
                bar.abandon_with_message(format!("{artifact} failed"));
                warn!(
                    artifact = %artifact,
                    bytes = progress.written,
                    error = %error,
                    "Download failed"
                );
                return progress.status;
            }
            DownloadStatus::Pending | DownloadStatus::Downloading => {
                if throttle.should_emit() {
                    debug!(
                        artifact = %artifact,
                        written = progress.written,
                        content_length = progress.content_length,
                        percent = progress.percent(),
                        "Download progress"
                    );
                }
            }
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
    )
    .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("█▓░"))
}

// Used until a length is known; unknown-length transfers keep it throughout.
fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg} {spinner} {bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
