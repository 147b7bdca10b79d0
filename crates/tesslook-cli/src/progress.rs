use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tesslook_core::pipeline::{PipelineStage, ProgressReporter};

/// Spinner that shows the current pipeline stage.
pub struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    pub fn new() -> anyhow::Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg:24} {pos} done")?);
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerReporter {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.bar.inc(items_done as u64);
    }
}
