//! Sorted Set Container
//!
//! Members are kept in two indexes:
//!
//! ```text
//! by_member: HashMap<member, score>              O(1) score lookup
//! by_score:  BTreeSet<(score, member)>           ordered iteration / rank
//! ```
//!
//! Ordering is by ascending score, then by member bytes. Scores are wrapped
//! in `OrderedFloat` so they have a total order; NaN is rejected before a
//! score ever reaches this type.

use bytes::Bytes;
use ordered_float::OrderedFloat;
use std::collections::{BTreeSet, HashMap};

/// A set of unique members, each with a floating-point score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedSet {
    by_member: HashMap<Bytes, f64>,
    by_score: BTreeSet<(OrderedFloat<f64>, Bytes)>,
}

impl SortedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member or updates its score.
    ///
    /// Returns `true` if the member was newly added.
    pub fn add(&mut self, member: Bytes, score: f64) -> bool {
        match self.by_member.insert(member.clone(), score) {
            Some(old) => {
                if OrderedFloat(old) != OrderedFloat(score) {
                    self.by_score.remove(&(OrderedFloat(old), member.clone()));
                    self.by_score.insert((OrderedFloat(score), member));
                }
                false
            }
            None => {
                self.by_score.insert((OrderedFloat(score), member));
                true
            }
        }
    }

    /// Removes a member. Returns `true` if it was present.
    pub fn remove(&mut self, member: &Bytes) -> bool {
        match self.by_member.remove(member) {
            Some(score) => {
                self.by_score.remove(&(OrderedFloat(score), member.clone()));
                true
            }
            None => false,
        }
    }

    /// Returns the score of a member.
    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.by_member.get(member).copied()
    }

    /// Returns the 0-based rank of a member in ascending (score, member) order.
    pub fn rank(&self, member: &Bytes) -> Option<usize> {
        let score = self.score(member)?;
        Some(
            self.by_score
                .range(..(OrderedFloat(score), member.clone()))
                .count(),
        )
    }

    pub fn len(&self) -> usize {
        self.by_member.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_member.is_empty()
    }
}
