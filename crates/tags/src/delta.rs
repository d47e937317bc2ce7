//! Change detection between two versions of a record's tags.

use serde::{Deserialize, Serialize};

use crate::{SubscriptionSet, TagSet};

/// Names that differ between an old and a new [`TagSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub recounted: Vec<String>,
}

impl TagDelta {
    /// Diff two tag sets. With no `old`, every tag in `new` counts as added.
    pub fn between(old: Option<&TagSet>, new: &TagSet) -> Self {
        let mut delta = TagDelta::default();
        let Some(old) = old else {
            delta.added = new.names().map(str::to_string).collect();
            return delta;
        };

        for (name, count) in new.iter() {
            match old.get(name) {
                None => delta.added.push(name.to_string()),
                Some(previous) if previous != count => delta.recounted.push(name.to_string()),
                Some(_) => {}
            }
        }
        delta.removed = old
            .names()
            .filter(|name| !new.contains(name))
            .map(str::to_string)
            .collect();
        delta
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.recounted.is_empty()
    }

    /// Every changed name, sorted and unique.
    pub fn changed(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .added
            .iter()
            .chain(&self.removed)
            .chain(&self.recounted)
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Changed names the user subscribed to.
    pub fn subscribed(&self, subscriptions: &SubscriptionSet) -> Vec<String> {
        self.changed()
            .into_iter()
            .filter(|name| subscriptions.contains(name))
            .collect()
    }
}

/// Subscribed tag names that changed between `old` and `new`.
///
/// An empty result means no notification is due.
pub fn changed_subscribed(
    old: Option<&TagSet>,
    new: &TagSet,
    subscriptions: &SubscriptionSet,
) -> Vec<String> {
    if subscriptions.is_empty() {
        return Vec::new();
    }
    TagDelta::between(old, new).subscribed(subscriptions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> TagSet {
        TagSet::from_tokens(tokens).unwrap()
    }

    #[test]
    fn insert_reports_subscribed_new_tags() {
        let subs = SubscriptionSet::from_names(["dog", "bird"]);
        let changed = changed_subscribed(None, &set(&["cat, 1", "dog, 1"]), &subs);
        assert_eq!(changed, vec!["dog"]);
    }

    #[test]
    fn update_ignores_unsubscribed_recounts() {
        let subs = SubscriptionSet::from_names(["dog"]);
        let changed = changed_subscribed(
            Some(&set(&["cat, 1"])),
            &set(&["cat, 2", "dog, 1"]),
            &subs,
        );
        assert_eq!(changed, vec!["dog"]);
    }

    #[test]
    fn update_reports_recounts_and_removals() {
        let subs = SubscriptionSet::from_names(["cat", "dog"]);
        let changed = changed_subscribed(
            Some(&set(&["cat, 1", "dog, 1"])),
            &set(&["cat, 2"]),
            &subs,
        );
        assert_eq!(changed, vec!["cat", "dog"]);
    }

    #[test]
    fn unchanged_sets_produce_nothing() {
        let subs = SubscriptionSet::from_names(["cat"]);
        let tags = set(&["cat, 3"]);
        assert!(changed_subscribed(Some(&tags), &tags, &subs).is_empty());
        assert!(TagDelta::between(Some(&tags), &tags).is_empty());
    }

    #[test]
    fn no_subscriptions_means_no_changes() {
        let changed = changed_subscribed(None, &set(&["cat, 1"]), &SubscriptionSet::new());
        assert!(changed.is_empty());
    }

    #[test]
    fn delta_splits_change_kinds() {
        let delta = TagDelta::between(
            Some(&set(&["cat, 1", "dog, 2"])),
            &set(&["dog, 3", "bird, 1"]),
        );
        assert_eq!(delta.added, vec!["bird"]);
        assert_eq!(delta.removed, vec!["cat"]);
        assert_eq!(delta.recounted, vec!["dog"]);
        assert_eq!(delta.changed(), vec!["bird", "cat", "dog"]);
    }
}
