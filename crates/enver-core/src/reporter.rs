//! Reporter trait for dependency injection
//!
//! Catalog resolution reports its phases through this trait so the core
//! stays independent of any terminal rendering.

pub trait Reporter: Send + Sync {
    /// Start a live-updated phase (e.g. "Probing streams").
    fn live_phase(&self, title: &str);

    /// Finish the current live phase with a status (e.g. "12 streams").
    fn live_phase_update(&self, status: &str, success: bool);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn live_phase(&self, title: &str) {
        (**self).live_phase(title)
    }

    fn live_phase_update(&self, status: &str, success: bool) {
        (**self).live_phase_update(status, success)
    }

    fn info(&self, msg: &str) {
        (**self).info(msg)
    }

    fn warning(&self, msg: &str) {
        (**self).warning(msg)
    }
}

/// A no-op reporter for silent resolution (scripts, `--json`, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn live_phase(&self, _: &str) {}
    fn live_phase_update(&self, _: &str, _: bool) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}
