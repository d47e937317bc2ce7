//! Tag-change notifications.
//!
//! After a record is inserted or its tags change, the pipeline works out which
//! of the owner's subscribed tags were affected and, if any were, hands a
//! [`TagNotification`] to a [`NotificationSink`]. Delivery (mail, queues,
//! webhooks) belongs to the sink.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Inserted => f.write_str("inserted"),
            ChangeKind::Updated => f.write_str("updated"),
        }
    }
}

/// One notification for one user about one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNotification {
    pub user_id: String,
    pub kind: ChangeKind,
    /// Subscribed tag names that changed, sorted.
    pub changed_tags: Vec<String>,
    pub thumbnail_url: String,
    pub image_url: String,
}

impl TagNotification {
    /// Short human-readable subject line.
    ///
    /// ```
    /// use snaptag::{ChangeKind, TagNotification};
    ///
    /// let n = TagNotification {
    ///     user_id: "u".into(),
    ///     kind: ChangeKind::Inserted,
    ///     changed_tags: vec!["cat".into(), "dog".into()],
    ///     thumbnail_url: "s3://b/thumbnails/u/a.jpg".into(),
    ///     image_url: "s3://b/images/u/a.jpg".into(),
    /// };
    /// assert_eq!(n.subject(), "New image added for cat, dog tags");
    /// ```
    pub fn subject(&self) -> String {
        let tags = self.changed_tags.join(", ");
        match self.kind {
            ChangeKind::Inserted => format!("New image added for {tags} tags"),
            ChangeKind::Updated => format!("Image updated for {tags} tags"),
        }
    }

    /// Message body pointing at the original image.
    pub fn message(&self) -> String {
        let tags = self.changed_tags.join(", ");
        match self.kind {
            ChangeKind::Inserted => format!(
                "A new image has been uploaded for the tags: {tags}. Image URL is: {}",
                self.image_url
            ),
            ChangeKind::Updated => format!(
                "An image has been updated for the tags: {tags}. Image URL is: {}",
                self.image_url
            ),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Where notifications go.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: &TagNotification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, notification: &TagNotification) -> Result<(), NotifyError> {
        info!(
            user_id = %notification.user_id,
            kind = %notification.kind,
            tags = ?notification.changed_tags,
            image_url = %notification.image_url,
            subject = %notification.subject(),
            "tag_notification"
        );
        Ok(())
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    sent: Mutex<Vec<TagNotification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first.
    pub fn notifications(&self) -> Vec<TagNotification> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl NotificationSink for MemorySink {
    fn publish(&self, notification: &TagNotification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError("memory sink poisoned".into()))?
            .push(notification.clone());
        Ok(())
    }
}
