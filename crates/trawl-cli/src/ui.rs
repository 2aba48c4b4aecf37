use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{GlobalFlags, OutputFormat};

/// Terminal-dependent rendering choices, fixed once at startup.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiPrefs {
    pub table_color: bool,
    /// Spinners go to stderr, so they are only shown on an interactive
    /// terminal and never alongside machine-readable output.
    pub progress: bool,
    pub term_width: Option<usize>,
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

pub fn init(flags: &GlobalFlags) {
    let _ = UI_PREFS.set(detect(
        flags,
        std::io::stdout().is_terminal(),
        std::io::stderr().is_terminal(),
    ));
}

fn detect(flags: &GlobalFlags, stdout_tty: bool, stderr_tty: bool) -> UiPrefs {
    let table = flags.format == OutputFormat::Table;
    UiPrefs {
        table_color: stdout_tty && table && std::env::var_os("NO_COLOR").is_none(),
        progress: stderr_tty && !flags.quiet && flags.format != OutputFormat::Raw,
        term_width: std::env::var("COLUMNS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|width| *width >= 40),
    }
}

#[must_use]
pub fn prefs() -> UiPrefs {
    UI_PREFS.get().copied().unwrap_or_default()
}
