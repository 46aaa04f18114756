//! User-facing notices raised while acquiring a position.

use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Location access was denied or failed; the fallback coordinate is in use.
    LocationFallbackUsed,
    /// No geolocation capability; weather will not be shown.
    LocationUnavailable,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::LocationFallbackUsed => {
                "You have disabled location service. Allow this app to access your location. \
                 A default location is being used for real-time weather until then."
            }
            Self::LocationUnavailable => "Geolocation not available",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Where notices go. The presentation layer decides how to show them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(?notice, "{}", notice.message());
    }
}

impl Notifier for UnboundedSender<Notice> {
    fn notify(&self, notice: Notice) {
        if self.send(notice).is_err() {
            tracing::debug!(?notice, "notice receiver dropped");
        }
    }
}
