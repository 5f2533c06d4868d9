use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;
use volcano::engine::progress::{Progress, ProgressCallback, ProgressReporter};

const SPINNER_TICK_MS: u64 = 80;
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const BAR_TEMPLATE: &str = "{msg:<28} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})";

struct PhaseBar {
    bar: ProgressBar,
    phase: &'static str,
}

/// Renders workflow progress events on stderr.
///
/// Each phase shows a spinner; a task inside the phase turns it into a bar labelled with
/// the phase name (one tick per fitted adsorbate or evaluated reaction).
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<PhaseBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.finish_and_clear();
        Self {
            state: Arc::new(Mutex::new(PhaseBar { bar, phase: "" })),
        }
    }

    pub fn reporter(&self) -> ProgressReporter<'static> {
        ProgressReporter::with_callback(self.callback())
    }

    fn callback(&self) -> ProgressCallback<'static> {
        let state = Arc::clone(&self.state);

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    state.phase = name;
                    let bar = &state.bar;
                    bar.reset();
                    bar.set_length(0);
                    bar.set_style(spinner_style());
                    bar.set_message(name);
                    bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                }
                Progress::PhaseFinish => {
                    let message = format!("✓ {}", state.phase);
                    state.bar.disable_steady_tick();
                    state.bar.finish_with_message(message);
                }
                Progress::TaskStart { total_steps } => {
                    let bar = &state.bar;
                    bar.disable_steady_tick();
                    bar.reset();
                    bar.set_length(total_steps);
                    bar.set_style(bar_style());
                    bar.set_message(state.phase);
                }
                Progress::TaskIncrement => state.bar.inc(1),
                Progress::TaskFinish => {
                    let bar = &state.bar;
                    if let Some(length) = bar.length() {
                        bar.set_position(length);
                    }
                }
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
    ProgressStyle::with_template(SPINNER_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
