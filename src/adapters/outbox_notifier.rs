//! Notifier that drops each message into an outbox directory as a text file
//! for an external mail relay to pick up.

use std::fs;
use std::path::PathBuf;

use crate::domain::error::ScreenerError;
use crate::ports::notifier_port::{Notification, NotifierPort};

pub struct OutboxNotifier {
    dir: PathBuf,
    sender: String,
}

impl OutboxNotifier {
    pub fn new(dir: PathBuf, sender: impl Into<String>) -> Self {
        Self {
            dir,
            sender: sender.into(),
        }
    }

    fn file_name(subject: &str) -> String {
        let slug: String = subject
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{slug}.txt")
    }

    fn render(&self, notification: &Notification) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {}\n\n{}\n",
            self.sender,
            notification.recipients.join(", "),
            notification.subject,
            notification.body
        )
    }
}

impl NotifierPort for OutboxNotifier {
    fn send(&self, notification: &Notification) -> Result<(), ScreenerError> {
        if notification.recipients.is_empty() {
            return Err(ScreenerError::Delivery {
                reason: "no recipients".into(),
            });
        }
        let path = self.dir.join(Self::file_name(&notification.subject));
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, self.render(notification)))
            .map_err(|e| ScreenerError::Delivery {
                reason: format!("failed to write {}: {}", path.display(), e),
            })?;
        tracing::info!(
            path = %path.display(),
            recipients = notification.recipients.len(),
            "notification queued"
        );
        Ok(())
    }
}
