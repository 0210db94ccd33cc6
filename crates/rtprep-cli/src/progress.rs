use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rtprep_core::enums::Stage;

use crate::ui;

/// Per-stage progress bar on stderr. Inert when progress is disabled.
pub struct Progress {
    bar: Option<ProgressBar>,
}

fn bar_template() -> &'static str {
    match ui::prefs().term_width {
        Some(cols) if cols >= 100 => "{prefix:>14} {bar:40.cyan/blue} {pos}/{len} {msg}",
        Some(cols) if cols >= 70 => "{prefix:>14} {wide_bar:.cyan/blue} {pos}/{len}",
        _ => "{prefix} {wide_bar:.cyan/blue} {percent}%",
    }
}

impl Progress {
    #[must_use]
    pub fn stage(stage: Stage, total: usize) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
        bar.set_style(
            ProgressStyle::with_template(bar_template())
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix(stage.as_str());
        bar.enable_steady_tick(Duration::from_millis(200));
        Self { bar: Some(bar) }
    }

    /// Advance by one unit and show which patient or entry it was.
    pub fn tick(&self, unit: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(unit.to_string());
            bar.inc(1);
        }
    }

    pub fn finish(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn abandon(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_inert_without_terminal_preferences() {
        let progress = Progress::stage(Stage::Cleanup, 3);
        assert!(progress.bar.is_none());
        progress.tick("S1");
        progress.finish("done");
    }
}
