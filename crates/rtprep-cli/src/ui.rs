use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{GlobalFlags, OutputFormat};

/// Terminal preferences resolved once from the global flags.
#[derive(Clone, Copy, Debug)]
pub struct UiPrefs {
    pub table_color: bool,
    pub progress: bool,
    pub term_width: Option<usize>,
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

pub fn init(flags: &GlobalFlags) {
    let table_color = flags.format == OutputFormat::Table
        && !flags.quiet
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    // Bars draw on stderr, so they are independent of where the summary goes.
    let progress = !flags.quiet && std::io::stderr().is_terminal();

    let term_width = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 40);

    let _ = UI_PREFS.set(UiPrefs {
        table_color,
        progress,
        term_width,
    });
}

/// Preferences set by [`init`]; plain output when it never ran.
#[must_use]
pub fn prefs() -> UiPrefs {
    UI_PREFS.get().copied().unwrap_or(UiPrefs {
        table_color: false,
        progress: false,
        term_width: None,
    })
}
