//! Set Container
//!
//! Unique members stored in a `BTreeSet`, so `SMEMBERS` always enumerates in
//! lexicographic byte order regardless of insertion history.

use bytes::Bytes;
use std::collections::BTreeSet;

/// A set of unique binary-safe members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSet {
    members: BTreeSet<Bytes>,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member. Returns `true` if it was not already present.
    pub fn add(&mut self, member: Bytes) -> bool {
        self.members.insert(member)
    }

    /// Removes a member. Returns `true` if it was present.
    pub fn remove(&mut self, member: &[u8]) -> bool {
        self.members.remove(member)
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.members.contains(member)
    }

    /// Iterates members in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut set = MemberSet::new();

        assert!(set.add(Bytes::from("m1")));
        assert!(!set.add(Bytes::from("m1")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut set = MemberSet::new();
        set.add(Bytes::from("m1"));

        assert!(set.contains(b"m1"));
        assert!(set.remove(b"m1"));
        assert!(!set.contains(b"m1"));
        assert!(!set.remove(b"m1"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_iteration_order_is_deterministic() {
        let mut set = MemberSet::new();
        for m in ["pear", "apple", "fig"] {
            set.add(Bytes::from(m));
        }

        let members: Vec<&Bytes> = set.iter().collect();
        assert_eq!(members, vec!["apple", "fig", "pear"]);
    }
}
