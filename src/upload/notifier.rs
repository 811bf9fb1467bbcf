use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expiry: Instant,
}

/// Holds at most one transient message. A new emission replaces the current
/// one; a message disappears once its expiry passes.
#[derive(Debug)]
pub struct Notifier {
    timeout: Duration,
    current: Option<Notification>,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            current: None,
        }
    }

    pub fn emit(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.current = Some(Notification {
            message: message.into(),
            kind,
            expiry: Instant::now() + self.timeout,
        });
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current
            .as_ref()
            .filter(|n| Instant::now() < n.expiry)
    }

    /// Forget an expired message. Returns true when something was removed.
    pub fn prune(&mut self) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|n| Instant::now() >= n.expiry);
        if expired {
            self.current = None;
        }
        expired
    }
}
