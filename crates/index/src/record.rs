use serde::{Deserialize, Serialize};
use tags::{SubscriptionSet, TagSet};

/// Bump this value whenever the on-disk record layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// Separates key segments. Not valid in user ids or blob references.
pub(crate) const KEY_SEPARATOR: char = '\u{1f}';

const IMAGE_NAMESPACE: &str = "img";
const SUBSCRIPTION_NAMESPACE: &str = "sub";

/// One uploaded image: identified by `(user_id, thumbnail_url)`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
    /// Schema version for backward compatibility when deserializing.
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub user_id: String,
    /// Reference to the thumbnail blob; unique per user.
    pub thumbnail_url: String,
    /// Reference to the original image blob.
    pub image_url: String,
    pub tags: TagSet,
}

impl ImageRecord {
    pub fn new(
        user_id: impl Into<String>,
        thumbnail_url: impl Into<String>,
        image_url: impl Into<String>,
        tags: TagSet,
    ) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION,
            user_id: user_id.into(),
            thumbnail_url: thumbnail_url.into(),
            image_url: image_url.into(),
            tags,
        }
    }

    /// Same record with its tag set replaced.
    pub fn with_tags(&self, tags: TagSet) -> Self {
        Self {
            tags,
            ..self.clone()
        }
    }

    pub(crate) fn key(&self) -> String {
        image_key(&self.user_id, &self.thumbnail_url)
    }
}

/// A user's standing tag subscriptions.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub user_id: String,
    pub tags: SubscriptionSet,
}

const fn default_schema_version() -> u16 {
    INDEX_SCHEMA_VERSION
}

pub(crate) fn image_key(user_id: &str, thumbnail_url: &str) -> String {
    format!("{IMAGE_NAMESPACE}{KEY_SEPARATOR}{user_id}{KEY_SEPARATOR}{thumbnail_url}")
}

pub(crate) fn user_images_prefix(user_id: &str) -> String {
    format!("{IMAGE_NAMESPACE}{KEY_SEPARATOR}{user_id}{KEY_SEPARATOR}")
}

pub(crate) fn all_images_prefix() -> String {
    format!("{IMAGE_NAMESPACE}{KEY_SEPARATOR}")
}

pub(crate) fn subscription_key(user_id: &str) -> String {
    format!("{SUBSCRIPTION_NAMESPACE}{KEY_SEPARATOR}{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_keys_nest_under_user_prefix() {
        let key = image_key("alice", "s3://b/thumbnails/alice/a.jpg");
        assert!(key.starts_with(&user_images_prefix("alice")));
        assert!(!key.starts_with(&user_images_prefix("ali")));
        assert!(key.starts_with(&all_images_prefix()));
        assert!(!subscription_key("alice").starts_with(&all_images_prefix()));
    }

    #[test]
    fn with_tags_keeps_identity() {
        let rec = ImageRecord::new("alice", "t", "i", TagSet::new());
        let tags = TagSet::from_labels(["cat"]).unwrap();
        let updated = rec.with_tags(tags.clone());
        assert_eq!(updated.key(), rec.key());
        assert_eq!(updated.tags, tags);
    }
}
