//! Index specifications and the check for an already-installed index.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    pub field: String,
    pub order: KeyOrder,
}

impl IndexKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: KeyOrder::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: KeyOrder::Descending,
        }
    }
}

/// Index options. `None` means "not specified" on a desired spec and
/// "not reported" on a live index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub unique: Option<bool>,
    /// Build without blocking writers.
    pub background: Option<bool>,
}

/// The index a migration wants to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub options: IndexOptions,
}

/// Index metadata as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveIndex {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub options: IndexOptions,
}

/// The unique index on `pages.path`.
///
/// Postgres keeps no record of how an index was built, so only uniqueness
/// is part of the comparison.
pub fn page_path_index() -> IndexSpec {
    IndexSpec {
        name: "uq_pages_path".to_string(),
        keys: vec![IndexKey::ascending("path")],
        options: IndexOptions {
            unique: Some(true),
            background: None,
        },
    }
}

/// Whether any live index already matches `desired`.
pub fn is_satisfied(live: &[LiveIndex], desired: &IndexSpec) -> bool {
    live.iter().any(|index| matches_spec(index, desired))
}

fn matches_spec(live: &LiveIndex, desired: &IndexSpec) -> bool {
    live.keys == desired.keys && options_match(&live.options, &desired.options)
}

/// Every option named in `desired` must be reported with the same value.
fn options_match(live: &IndexOptions, desired: &IndexOptions) -> bool {
    let IndexOptions { unique, background } = desired;
    option_matches(live.unique, *unique) && option_matches(live.background, *background)
}

fn option_matches(live: Option<bool>, desired: Option<bool>) -> bool {
    match desired {
        None => true,
        Some(want) => live == Some(want),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired() -> IndexSpec {
        IndexSpec {
            name: "uq_pages_path".into(),
            keys: vec![IndexKey::ascending("path")],
            options: IndexOptions {
                unique: Some(true),
                background: Some(true),
            },
        }
    }

    fn live(keys: Vec<IndexKey>, unique: Option<bool>, background: Option<bool>) -> LiveIndex {
        LiveIndex {
            name: "whatever".into(),
            keys,
            options: IndexOptions { unique, background },
        }
    }

    #[test]
    fn test_exact_match_is_satisfied() {
        let indexes = vec![
            live(vec![IndexKey::ascending("id")], Some(true), None),
            live(vec![IndexKey::ascending("path")], Some(true), Some(true)),
        ];
        assert!(is_satisfied(&indexes, &desired()));
    }

    #[test]
    fn test_name_is_not_compared() {
        let mut index = live(vec![IndexKey::ascending("path")], Some(true), Some(true));
        index.name = "path_1".into();
        assert!(is_satisfied(&[index], &desired()));
    }

    #[test]
    fn test_no_indexes_is_unsatisfied() {
        assert!(!is_satisfied(&[], &desired()));
    }

    #[test]
    fn test_key_direction_mismatch() {
        let indexes = vec![live(
            vec![IndexKey::descending("path")],
            Some(true),
            Some(true),
        )];
        assert!(!is_satisfied(&indexes, &desired()));
    }

    #[test]
    fn test_compound_key_does_not_match_prefix() {
        let indexes = vec![live(
            vec![IndexKey::ascending("path"), IndexKey::ascending("id")],
            Some(true),
            Some(true),
        )];
        assert!(!is_satisfied(&indexes, &desired()));
    }

    #[test]
    fn test_non_unique_index_is_unsatisfied() {
        let indexes = vec![live(vec![IndexKey::ascending("path")], Some(false), Some(true))];
        assert!(!is_satisfied(&indexes, &desired()));
    }

    #[test]
    fn test_missing_live_option_is_a_mismatch_not_an_error() {
        let indexes = vec![live(vec![IndexKey::ascending("path")], Some(true), None)];
        assert!(!is_satisfied(&indexes, &desired()));
    }

    #[test]
    fn test_unnamed_desired_option_is_ignored() {
        let indexes = vec![live(vec![IndexKey::ascending("path")], Some(true), Some(false))];
        assert!(is_satisfied(&indexes, &page_path_index()));
    }
}
