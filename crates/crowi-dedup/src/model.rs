use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A page as seen by the deduplication pipeline.
///
/// Every field here must have a merge rule in [`crate::planner`]; the planner
/// destructures this struct exhaustively so a new field fails to compile
/// until it is handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: Uuid,
    pub path: String,
    #[serde(flatten)]
    pub sets: IdentifierSets,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(path: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            sets: IdentifierSets::default(),
            comment_count: 0,
            created_at,
        }
    }

    /// Retained-state signal: how many user ids hang off this page.
    /// Zero means deleting the page loses nothing.
    pub fn retained_state(&self) -> usize {
        self.sets.len()
    }
}

/// The set-valued user fields of a page. Merged by union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSets {
    #[serde(default)]
    pub seen_users: BTreeSet<Uuid>,
    #[serde(default)]
    pub granted_users: BTreeSet<Uuid>,
    #[serde(default)]
    pub liker: BTreeSet<Uuid>,
}

impl IdentifierSets {
    pub fn len(&self) -> usize {
        let Self {
            seen_users,
            granted_users,
            liker,
        } = self;
        seen_users.len() + granted_users.len() + liker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Union `other` into `self`, field by field.
    pub fn absorb(&mut self, other: &IdentifierSets) {
        let IdentifierSets {
            seen_users,
            granted_users,
            liker,
        } = other;
        self.seen_users.extend(seen_users.iter().copied());
        self.granted_users.extend(granted_users.iter().copied());
        self.liker.extend(liker.iter().copied());
    }

    /// True when every id in `other` is also present here.
    pub fn contains_all(&self, other: &IdentifierSets) -> bool {
        other.seen_users.is_subset(&self.seen_users)
            && other.granted_users.is_subset(&self.granted_users)
            && other.liker.is_subset(&self.liker)
    }
}
