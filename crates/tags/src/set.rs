use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::codec::{self, normalize_name, TagToken};
use crate::TagError;

/// The counted tags attached to one image record, unique by name.
///
/// Persisted in token form (`["cat, 2", "dog, 1"]`) so stored data stays
/// readable by anything that speaks the textual encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    counts: BTreeMap<String, u32>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial set for a freshly detected image: every label at count 1.
    ///
    /// Repeated labels collapse to a single entry.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = BTreeMap::new();
        for label in labels {
            let token = TagToken::new(label.as_ref(), 1)?;
            counts.insert(token.name().to_string(), 1);
        }
        Ok(Self { counts })
    }

    /// Decode a stored token list.
    ///
    /// Two tokens naming the same tag keep the larger count.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for token in tokens {
            let (name, count) = codec::decode(token.as_ref())?;
            let entry = counts.entry(name).or_insert(count);
            *entry = (*entry).max(count);
        }
        Ok(Self { counts })
    }

    /// Encode back to tokens, ordered by name.
    pub fn to_tokens(&self) -> Vec<String> {
        self.counts
            .iter()
            .map(|(name, count)| codec::encode(name, *count))
            .collect()
    }

    pub fn tokens(&self) -> Vec<TagToken> {
        self.counts
            .iter()
            .filter_map(|(name, count)| TagToken::new(name, *count).ok())
            .collect()
    }

    /// Count for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.counts.get(&normalize_name(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Names are expected to be normalized already.
    pub(crate) fn increment(&mut self, name: &str) {
        let entry = self.counts.entry(name.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<u32> {
        self.counts.remove(name)
    }
}

impl TryFrom<Vec<String>> for TagSet {
    type Error = TagError;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_tokens(tokens)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.to_tokens()
    }
}

/// Bare tag names a user wants to hear about. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct SubscriptionSet {
    names: BTreeSet<String>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and collect names, dropping blanks.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.extend(names);
        set
    }

    /// Union `names` into the set, returning how many were new.
    pub fn extend<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.names.len();
        self.names.extend(
            names
                .into_iter()
                .map(|name| normalize_name(name.as_ref()))
                .filter(|name| !name.is_empty()),
        );
        self.names.len() - before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize_name(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for SubscriptionSet {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<SubscriptionSet> for Vec<String> {
    fn from(set: SubscriptionSet) -> Self {
        set.names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_labels_starts_every_tag_at_one() {
        let set = TagSet::from_labels(["person", "Dog", "person"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("person"), Some(1));
        assert_eq!(set.get("dog"), Some(1));
        assert_eq!(set.to_tokens(), vec!["dog, 1", "person, 1"]);
    }

    #[test]
    fn from_tokens_reads_legacy_and_counted_forms() {
        let set = TagSet::from_tokens(["cat, 3", "dog"]).unwrap();
        assert_eq!(set.get("cat"), Some(3));
        assert_eq!(set.get("dog"), Some(1));
    }

    #[test]
    fn duplicate_names_keep_the_larger_count() {
        let set = TagSet::from_tokens(["cat, 1", "Cat, 4", "cat, 2"]).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("cat"), Some(4));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let set = TagSet::from_tokens(["cat, 2"]).unwrap();
        assert!(set.contains("CAT"));
        assert_eq!(set.get(" Cat "), Some(2));
    }

    #[test]
    fn malformed_token_fails_the_whole_set() {
        assert!(TagSet::from_tokens(["cat, 1", "dog, lots"]).is_err());
    }

    #[test]
    fn serde_round_trips_token_list() {
        let set = TagSet::from_tokens(["dog, 2", "cat, 1"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["cat, 1","dog, 2"]"#);
        let back: TagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn subscriptions_are_additive_and_normalized() {
        let mut subs = SubscriptionSet::from_names(["Dog", "  ", "cat"]);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs.extend(["DOG", "bird"]), 1);
        assert_eq!(subs.iter().collect::<Vec<_>>(), vec!["bird", "cat", "dog"]);
        assert!(subs.contains("Bird"));
    }
}
