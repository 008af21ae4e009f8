use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use boing_core::{RequestOutcome, ScenarioKind};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::format::{status_label, truncate};

pub(crate) struct HumanProgress {
    inner: Mutex<Inner>,
}

impl HumanProgress {
    pub(crate) fn new() -> Self {
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));

        Self {
            inner: Mutex::new(Inner {
                multi,
                bars: HashMap::new(),
            }),
        }
    }

    /// Adds one bar per campaign, sized to its request count.
    pub(crate) fn add(&self, kind: ScenarioKind, requests: usize) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if inner.bars.contains_key(&kind) {
            return;
        }
        let pb = inner.multi.add(ProgressBar::new(requests as u64));
        pb.set_style(bar_style());
        pb.set_prefix(kind.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        inner.bars.insert(kind, pb);
    }

    pub(crate) fn record(&self, kind: ScenarioKind, outcome: &RequestOutcome) {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(pb) = inner.bars.get(&kind) {
            pb.inc(1);
            pb.set_message(format!(
                "{} {}",
                status_label(outcome),
                truncate(&outcome.endpoint, 48)
            ));
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for (_, pb) in inner.bars.drain() {
            pb.finish_and_clear();
        }

        let _ = inner.multi.clear();
    }
}

struct Inner {
    multi: MultiProgress,
    bars: HashMap<ScenarioKind, ProgressBar>,
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:>15} [ {bar:20.cyan/blue} ] {pos:>3}/{len:3} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}
