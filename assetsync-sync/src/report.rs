//! Reporting seam between the planner/executor and whoever is watching.
//!
//! The pipeline never logs directly; it hands findings to a [`Reporter`]
//! supplied by the caller. [`LogReporter`] forwards to the `log` facade,
//! [`RecordingReporter`] keeps lines in memory for assertions.

use std::sync::Mutex;

use assetsync_core::{Drift, ObjectKey};

/// Receives progress and findings from a deploy run.
pub trait Reporter {
    /// A run phase started or finished.
    fn phase(&self, message: &str);
    /// One metadata discrepancy on `key`.
    fn drift(&self, key: &ObjectKey, drift: &Drift);
    /// Per-key progress detail.
    fn detail(&self, key: &ObjectKey, message: &str);
    /// A per-key failure that did not abort the run.
    fn failure(&self, key: &ObjectKey, message: &str);
}

/// Production reporter backed by the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn phase(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn drift(&self, key: &ObjectKey, drift: &Drift) {
        match drift {
            Drift::ReleaseRefresh { .. } => tracing::debug!("{key}: {drift}"),
            _ => tracing::warn!("{key}: {drift}"),
        }
    }

    fn detail(&self, key: &ObjectKey, message: &str) {
        tracing::debug!("{key}: {message}");
    }

    fn failure(&self, key: &ObjectKey, message: &str) {
        tracing::error!("{key}: {message}");
    }
}

/// In-memory reporter. Every call becomes one `"<kind> <key>: <text>"` line.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl Reporter for RecordingReporter {
    fn phase(&self, message: &str) {
        self.push(format!("phase {message}"));
    }

    fn drift(&self, key: &ObjectKey, drift: &Drift) {
        self.push(format!("drift {key}: {drift}"));
    }

    fn detail(&self, key: &ObjectKey, message: &str) {
        self.push(format!("detail {key}: {message}"));
    }

    fn failure(&self, key: &ObjectKey, message: &str) {
        self.push(format!("failure {key}: {message}"));
    }
}
