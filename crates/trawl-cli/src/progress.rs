use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::ui;

/// One spinner line per followed task, drawn on stderr.
///
/// Every method is a no-op when progress is disabled, so callers never need
/// to check [`ui::prefs`] themselves.
pub struct TaskProgress {
    bars: HashMap<String, ProgressBar>,
}

impl TaskProgress {
    #[must_use]
    pub fn new(task_ids: &[String]) -> Self {
        if !ui::prefs().progress {
            return Self {
                bars: HashMap::new(),
            };
        }

        let multi = MultiProgress::new();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bars = task_ids
            .iter()
            .map(|id| {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(style.clone());
                bar.set_prefix(id.clone());
                bar.set_message("waiting for first poll");
                bar.enable_steady_tick(Duration::from_millis(100));
                (id.clone(), bar)
            })
            .collect();
        Self { bars }
    }

    pub fn set_message(&self, task_id: &str, message: &str) {
        if let Some(bar) = self.bars.get(task_id) {
            bar.set_message(message.to_string());
        }
    }

    pub fn finish_ok(&self, task_id: &str, message: &str) {
        if let Some(bar) = self.bars.get(task_id) {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn finish_err(&self, task_id: &str, message: &str) {
        if let Some(bar) = self.bars.get(task_id) {
            bar.abandon_with_message(message.to_string());
        }
    }

    /// Stop any spinner still ticking, leaving its last message on screen.
    pub fn finish_all(&self) {
        for bar in self.bars.values().filter(|bar| !bar.is_finished()) {
            bar.abandon();
        }
    }
}
