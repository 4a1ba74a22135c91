//! Reporter trait for dependency injection
//!
//! Provisioning stages report progress through this trait instead of
//! printing, so the console front-end and silent test runs share the
//! same core logic.

pub trait Reporter: Send + Sync {
    /// Indicates a new stage has started (e.g. "Locating runtime").
    fn section(&self, title: &str);

    /// Updates the progress of an installer download.
    fn downloading(&self, file_name: &str, current: u64, total: Option<u64>);

    /// A resolver candidate was skipped (download failed or came back empty).
    fn candidate_missed(&self, file_name: &str, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title)
    }
    fn downloading(&self, file_name: &str, current: u64, total: Option<u64>) {
        (**self).downloading(file_name, current, total)
    }
    fn candidate_missed(&self, file_name: &str, reason: &str) {
        (**self).candidate_missed(file_name, reason)
    }
    fn info(&self, msg: &str) {
        (**self).info(msg)
    }
    fn success(&self, msg: &str) {
        (**self).success(msg)
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg)
    }
    fn error(&self, msg: &str) {
        (**self).error(msg)
    }
}

/// A no-op reporter for silent operations (e.g., dry runs, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &str, _: u64, _: Option<u64>) {}
    fn candidate_missed(&self, _: &str, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
}
