//! User notification channel.
//!
//! The queue never renders anything itself; it asks a [`Notifier`] to show a
//! short toast with a severity.

use colored::Colorize;
use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Something finished successfully.
    Success,
    /// Something the user needs to know failed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A surface that can show short messages to the user.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show `message` with the given severity.
    fn notify(&self, severity: Severity, message: &str);
}

/// Prints toasts to stderr so they never mix with command output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Render a toast line.
    #[must_use]
    pub fn render(severity: Severity, message: &str) -> String {
        match severity {
            Severity::Info => format!("{} {}", "ℹ".blue(), message),
            Severity::Success => format!("{} {}", "✓".green(), message.green()),
            Severity::Error => format!("{} {}", "✗".red(), message.red()),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        eprintln!("{}", Self::render(severity, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_message() {
        colored::control::set_override(false);

        assert_eq!(ConsoleNotifier::render(Severity::Info, "Offline Mode"), "ℹ Offline Mode");
        assert_eq!(ConsoleNotifier::render(Severity::Success, "Connected"), "✓ Connected");
        assert_eq!(ConsoleNotifier::render(Severity::Error, "boom"), "✗ boom");
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Success.to_string(), "success");
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
    }
}
