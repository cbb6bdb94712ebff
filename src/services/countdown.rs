use std::io::{Write, stderr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::interval::format_interval;

const BAR_WIDTH: usize = 20;

/// Pacing seam between the scheduler and the terminal. The scheduler only
/// ever asks "wait this many seconds"; rendering stays on this side.
#[async_trait]
pub trait Countdown: Send + Sync {
    async fn wait(&self, seconds: u64);
}

/// Invokes `on_tick(fraction_elapsed, formatted_remaining)` once per second,
/// sleeping one wall-clock second between ticks. Returns immediately for a
/// zero duration.
pub async fn run_ticks<F>(seconds: u64, mut on_tick: F)
where
    F: FnMut(f64, &str) + Send,
{
    for elapsed in 0..seconds {
        on_tick(
            elapsed as f64 / seconds as f64,
            &format_interval(seconds - elapsed),
        );
        sleep(Duration::from_secs(1)).await;
    }
}

/// Redraws a `[####    ] MM:SS` line on stderr while waiting. The line is
/// cleared again on every exit path, including cancellation, via the guard's
/// `Drop`.
pub struct ConsoleCountdown;

#[async_trait]
impl Countdown for ConsoleCountdown {
    async fn wait(&self, seconds: u64) {
        if seconds == 0 {
            return;
        }
        let mut line = ProgressLine::new();
        run_ticks(seconds, |fraction, remaining| line.render(fraction, remaining)).await;
    }
}

struct ProgressLine;

impl ProgressLine {
    fn new() -> Self {
        ProgressLine
    }

    fn render(&mut self, fraction: f64, remaining: &str) {
        let filled = (fraction * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let mut out = stderr();
        let _ = write!(
            out,
            "\r[{}{}] {remaining} ",
            "#".repeat(filled),
            " ".repeat(BAR_WIDTH - filled)
        );
        let _ = out.flush();
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        let mut out = stderr();
        let _ = write!(out, "\r{}\r", " ".repeat(BAR_WIDTH + 16));
        let _ = out.flush();
    }
}
