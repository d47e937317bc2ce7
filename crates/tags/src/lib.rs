//! Snaptag tag model.
//!
//! Images carry counted tags: a label plus how many times it has been
//! assigned. This crate owns that model and the algorithms that touch it.
//!
//! - [`encode`] / [`decode`] convert between `(name, count)` and the stored
//!   `"name, count"` token. Names are always lowercased, so every comparison
//!   in the crate is case-insensitive.
//! - [`TagSet`] is the unique-by-name collection attached to one record.
//! - [`merge`] applies add/remove requests without ever emptying a record.
//! - [`changed_subscribed`] finds which subscribed names changed between two
//!   versions of a record.
//!
//! Everything here is pure: no I/O, no clocks, no shared state.

mod codec;
mod delta;
mod error;
mod merge;
mod set;

pub use crate::codec::{decode, encode, normalize_name, TagToken, TOKEN_DELIMITER};
pub use crate::delta::{changed_subscribed, TagDelta};
pub use crate::error::TagError;
pub use crate::merge::{merge, TagOp, TagQuery};
pub use crate::set::{SubscriptionSet, TagSet};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_labels_then_user_edits() {
        let detected = TagSet::from_labels(["person", "dog"]).unwrap();
        let edited = merge(&detected, TagOp::Add, &["dog", "frisbee"], "thumb").unwrap();
        let edited = merge(&edited, TagOp::Remove, &["person"], "thumb").unwrap();

        assert_eq!(edited.to_tokens(), vec!["dog, 2", "frisbee, 1"]);

        let subs = SubscriptionSet::from_names(["frisbee"]);
        assert_eq!(
            changed_subscribed(Some(&detected), &edited, &subs),
            vec!["frisbee"]
        );
    }
}
