//! Collaborators provided by the host page: user messages and navigation.

use std::time::Duration;

/// Color cue for a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    Blue,
    Green,
    Orange,
    Red,
}

impl Indicator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Blue => "blue",
            Indicator::Green => "green",
            Indicator::Orange => "orange",
            Indicator::Red => "red",
        }
    }
}

/// Shows messages to the user.
pub trait Notifier {
    /// Show an informational message.
    fn message(&self, title: &str, message: &str, indicator: Indicator);

    /// Show an error. Every failed user action ends here.
    fn error(&self, message: &str);
}

/// Moves the browser to another page.
pub trait Navigator {
    /// Navigate to `url` once `delay` has elapsed.
    fn navigate_after(&self, url: &str, delay: Duration);
}

/// Notifier that only writes to the log, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn message(&self, title: &str, message: &str, indicator: Indicator) {
        log::info!("[{}] {}: {}", indicator.as_str(), title, message);
    }

    fn error(&self, message: &str) {
        log::error!("❌ {}", message);
    }
}

/// Navigator that only logs the target, for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate_after(&self, url: &str, delay: Duration) {
        log::info!("➡️ Navigate to {} in {:?}", url, delay);
    }
}
