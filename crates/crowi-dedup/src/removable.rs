//! Picks the members of a group that can be deleted without losing state.

use uuid::Uuid;

use crate::scanner::DuplicateGroup;

/// Which members of a group may be deleted outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalDecision {
    pub key: String,
    pub removable: Vec<Uuid>,
    /// Never empty.
    pub retained: Vec<Uuid>,
}

impl RemovalDecision {
    /// True when deletions alone leave a single page for the path.
    pub fn resolves_group(&self) -> bool {
        self.retained.len() == 1
    }
}

/// A member is removable when none of its user sets has an entry.
///
/// When every member is removable the oldest one is kept so the path
/// still exists afterwards.
pub fn decide(group: &DuplicateGroup) -> RemovalDecision {
    let (mut removable, mut retained): (Vec<Uuid>, Vec<Uuid>) = (Vec::new(), Vec::new());
    for member in &group.members {
        if member.retained_state == 0 {
            removable.push(member.page.id);
        } else {
            retained.push(member.page.id);
        }
    }

    if retained.is_empty() && !removable.is_empty() {
        // Members are ordered oldest first.
        retained.push(removable.remove(0));
    }

    RemovalDecision {
        key: group.key.clone(),
        removable,
        retained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageRecord;
    use crate::scanner::group_pages;
    use chrono::{Duration, TimeZone, Utc};

    fn page(path: &str, minutes: i64, id: u128, seen: &[u128]) -> PageRecord {
        let base = Utc.with_ymd_and_hms(2018, 12, 20, 0, 0, 0).unwrap();
        let mut page = PageRecord::new(path, base + Duration::minutes(minutes));
        page.id = Uuid::from_u128(id);
        page.sets
            .seen_users
            .extend(seen.iter().map(|n| Uuid::from_u128(*n)));
        page
    }

    #[test]
    fn test_zero_signal_members_are_removable() {
        let groups = group_pages(vec![
            page("/a", 0, 1, &[]),
            page("/a", 1, 2, &[10]),
            page("/a", 2, 3, &[]),
        ]);
        let decision = decide(&groups[0]);

        assert_eq!(decision.removable, vec![Uuid::from_u128(1), Uuid::from_u128(3)]);
        assert_eq!(decision.retained, vec![Uuid::from_u128(2)]);
        assert!(decision.resolves_group());
    }

    #[test]
    fn test_all_removable_keeps_the_oldest() {
        let groups = group_pages(vec![
            page("/x", 2, 1, &[]),
            page("/x", 0, 2, &[]),
            page("/x", 1, 3, &[]),
        ]);
        let decision = decide(&groups[0]);

        assert_eq!(decision.retained, vec![Uuid::from_u128(2)]);
        assert_eq!(decision.removable, vec![Uuid::from_u128(3), Uuid::from_u128(1)]);
    }

    #[test]
    fn test_several_watched_members_need_a_merge() {
        let groups = group_pages(vec![page("/y", 0, 1, &[1]), page("/y", 1, 2, &[2])]);
        let decision = decide(&groups[0]);

        assert!(decision.removable.is_empty());
        assert_eq!(decision.retained.len(), 2);
        assert!(!decision.resolves_group());
    }
}
