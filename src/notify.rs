// User notifications
//
// Actions report outcomes through a NotificationSink instead of touching the
// terminal directly, so the same flows can drive a CLI, a test, or a GUI.

use std::io::Write;
use std::sync::Mutex;

/// How prominently a notification should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn color(&self) -> &'static str {
        match self {
            Severity::Info => "\x1b[36m",
            Severity::Success => "\x1b[1;32m",
            Severity::Warning => "\x1b[1;33m",
            Severity::Error => "\x1b[1;31m",
        }
    }
}

/// Capability for showing a short message to the user
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Writes notifications to the terminal (stdout, errors on stderr)
#[derive(Debug, Clone)]
pub struct TerminalSink {
    color: bool,
}

impl TerminalSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn render(&self, message: &str, severity: Severity) -> String {
        if self.color {
            format!("{}{}\x1b[0m", severity.color(), message)
        } else {
            message.to_string()
        }
    }
}

impl NotificationSink for TerminalSink {
    fn notify(&self, message: &str, severity: Severity) {
        let line = self.render(message, severity);
        match severity {
            Severity::Warning | Severity::Error => {
                let _ = writeln!(std::io::stderr(), "{}", line);
            }
            Severity::Info | Severity::Success => {
                let _ = writeln!(std::io::stdout(), "{}", line);
            }
        }
    }
}

/// Routes notifications into the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => tracing::info!(notification = %message),
            Severity::Warning => tracing::warn!(notification = %message),
            Severity::Error => tracing::error!(notification = %message),
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(String, Severity)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Severity)> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<(String, Severity)> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, severity: Severity) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((message.to_string(), severity));
    }
}
