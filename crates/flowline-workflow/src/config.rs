//! Notification configuration.

/// Configuration for the notification dispatcher.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Sender address stamped on every outgoing email.
    pub from_address: String,
    /// Prefix prepended to every subject line.
    pub subject_prefix: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from_address: "no-reply@flowline.dev".into(),
            subject_prefix: "[Flowline]".into(),
        }
    }
}
