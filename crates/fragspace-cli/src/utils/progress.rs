use fragspace::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Renders engine progress events as an `indicatif` spinner/bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state but draws nothing, for `--quiet` runs.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target)
            .with_style(spinner_style())
            .with_message("Starting...");
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    pb.reset();
                    pb.set_length(0);
                    pb.set_style(spinner_style());
                    pb.set_message(name);
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::PhaseFinish => {
                    pb.disable_steady_tick();
                    let done = format!("✓ {}", pb.message());
                    pb.finish_with_message(done);
                }
                Progress::TaskStart { total_steps } => {
                    pb.disable_steady_tick();
                    pb.set_length(total_steps);
                    pb.set_position(0);
                    pb.set_style(bar_style());
                }
                Progress::TaskIncrement => pb.inc(1),
                Progress::TaskFinish => {
                    if let Some(len) = pb.length() {
                        pb.set_position(len);
                    }
                }
                Progress::Message(msg) => pb.println(format!("  {}", msg)),
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    match ProgressStyle::with_template("{msg:<22} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        Ok(style) => style
            .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            })
            .progress_chars("##-"),
        Err(_) => ProgressStyle::default_bar(),
    }
}
