//! Prefix-partitioned keys for the flat state namespace.
//!
//! Every record type occupies its own key space. A key is the space prefix
//! followed by the record identifier, e.g. `user:u1`, `bank:B1`,
//! `txidx:h1`. No prefix is a prefix of another, so identifiers chosen by
//! callers can never make two spaces collide, and a prefix range scan over
//! one space never yields a record of another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// The disjoint key spaces of the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeySpace {
    User,
    Bank,
    TransactionIndex,
}

impl KeySpace {
    /// The fixed key prefix for this space.
    pub const fn prefix(self) -> &'static str {
        match self {
            KeySpace::User => "user:",
            KeySpace::Bank => "bank:",
            KeySpace::TransactionIndex => "txidx:",
        }
    }

    /// Human-readable entity name, used in error messages.
    pub const fn entity(self) -> &'static str {
        match self {
            KeySpace::User => "user",
            KeySpace::Bank => "bank",
            KeySpace::TransactionIndex => "transaction index entry",
        }
    }

    /// Build the key for `id` in this space.
    pub fn key(self, id: &str) -> TypeResult<RecordKey> {
        RecordKey::new(self, id)
    }

    /// Half-open range `[start, end)` covering exactly this space.
    ///
    /// The end bound is the prefix with its final byte incremented. All
    /// prefixes end in `:`, so the increment stays within ASCII.
    pub fn range(self) -> (String, String) {
        let start = self.prefix().to_string();
        let mut end = start.clone().into_bytes();
        if let Some(last) = end.last_mut() {
            *last += 1;
        }
        // Incrementing ':' yields ';', still valid UTF-8.
        let end = String::from_utf8(end).unwrap_or_default();
        (start, end)
    }
}

impl fmt::Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity())
    }
}

/// A fully-qualified state key: key space prefix plus record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    encoded: String,
}

impl RecordKey {
    /// Build a key. Empty identifiers are rejected.
    pub fn new(space: KeySpace, id: &str) -> TypeResult<Self> {
        if id.is_empty() {
            return Err(TypeError::EmptyIdentifier {
                space: space.entity(),
            });
        }
        Ok(Self {
            encoded: format!("{}{id}", space.prefix()),
        })
    }

    /// The encoded key as stored in the state store.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [KeySpace; 3] = [KeySpace::Bank, KeySpace::TransactionIndex, KeySpace::User];

    #[test]
    fn keys_carry_space_prefix() {
        assert_eq!(KeySpace::User.key("u1").unwrap().as_str(), "user:u1");
        assert_eq!(KeySpace::Bank.key("B1").unwrap().as_str(), "bank:B1");
        assert_eq!(
            KeySpace::TransactionIndex.key("h1").unwrap().as_str(),
            "txidx:h1"
        );
    }

    #[test]
    fn empty_identifier_rejected() {
        let err = KeySpace::User.key("").unwrap_err();
        assert_eq!(err, TypeError::EmptyIdentifier { space: "user" });
    }

    #[test]
    fn same_identifier_in_two_spaces_does_not_collide() {
        let user = KeySpace::User.key("abc").unwrap();
        let hash = KeySpace::TransactionIndex.key("abc").unwrap();
        assert_ne!(user, hash);
        assert_ne!(user.as_str(), hash.as_str());
    }

    #[test]
    fn range_bounds() {
        assert_eq!(
            KeySpace::User.range(),
            ("user:".to_string(), "user;".to_string())
        );
        assert_eq!(
            KeySpace::Bank.range(),
            ("bank:".to_string(), "bank;".to_string())
        );
    }

    #[test]
    fn identifiers_may_contain_separators() {
        let key = KeySpace::TransactionIndex.key("h:with:colons").unwrap();
        assert_eq!(key.as_str(), "txidx:h:with:colons");
    }

    #[test]
    fn no_prefix_is_prefix_of_another() {
        for a in ALL {
            for b in ALL {
                if a != b {
                    assert!(!a.prefix().starts_with(b.prefix()));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn key_falls_in_own_range_only(id in "\\PC{1,24}") {
            for space in ALL {
                let key = space.key(&id).unwrap();
                for other in ALL {
                    let (start, end) = other.range();
                    let inside = key.as_str() >= start.as_str() && key.as_str() < end.as_str();
                    prop_assert_eq!(inside, space == other);
                }
            }
        }

        #[test]
        fn distinct_spaces_never_collide(a in "\\PC{1,16}", b in "\\PC{1,16}") {
            let user = KeySpace::User.key(&a).unwrap();
            let index = KeySpace::TransactionIndex.key(&b).unwrap();
            let bank = KeySpace::Bank.key(&b).unwrap();
            prop_assert_ne!(user.as_str(), index.as_str());
            prop_assert_ne!(user.as_str(), bank.as_str());
        }
    }
}
