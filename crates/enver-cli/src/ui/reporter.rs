//! Console implementation of the core `Reporter`.
//!
//! Writes to stderr so stdout stays clean for piping.

use crossterm::style::Stylize;
use enver_core::Reporter;
use std::io::Write;

use super::theme::Theme;

#[derive(Debug, Default)]
pub struct ConsoleReporter {
    theme: Theme,
}

impl ConsoleReporter {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl Reporter for ConsoleReporter {
    fn live_phase(&self, title: &str) {
        let mut err = std::io::stderr().lock();
        let _ = write!(
            err,
            "{} {}",
            self.theme.icons.active.with(self.theme.colors.secondary),
            title.dark_grey()
        );
        let _ = err.flush();
    }

    fn live_phase_update(&self, status: &str, success: bool) {
        let (icon, color) = if success {
            (self.theme.icons.success, self.theme.colors.success)
        } else {
            (self.theme.icons.error, self.theme.colors.warning)
        };
        eprintln!("  {} {}", icon.with(color), status.with(color));
    }

    fn info(&self, msg: &str) {
        eprintln!("{} {msg}", self.theme.icons.info.with(self.theme.colors.secondary));
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }
}
