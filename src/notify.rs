//! User Notifications

use std::fmt::{Display, Formatter, Result as FmtResult};

use mockall::automock;
use tracing::{info, warn};

/// Notification tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Something was applied.
    Success,
    /// Something was queued or is informational.
    Info,
    /// Something went wrong.
    Alert,
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Alert => "alert",
        })
    }
}

/// Feedback to the acting user. Nothing it returns is consumed.
#[automock]
pub trait Notifier: Send + Sync {
    /// Show `message` to the acting user.
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Emits notifications as tracing events under the `stockgate::notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Alert => warn!(target: "stockgate::notify", %kind, "{message}"),
            NotificationKind::Success | NotificationKind::Info => {
                info!(target: "stockgate::notify", %kind, "{message}");
            }
        }
    }
}
