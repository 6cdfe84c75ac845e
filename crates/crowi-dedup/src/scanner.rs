//! Finds groups of pages sharing a path.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::model::PageRecord;
use crate::store::PageStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub page: PageRecord,
    pub retained_state: usize,
}

/// Pages sharing one path, oldest first (`created_at`, then `id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: String,
    pub members: Vec<GroupMember>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Load every colliding page and group them.
pub async fn scan<S: PageStore + ?Sized>(store: &S) -> Result<Vec<DuplicateGroup>, StoreError> {
    let pages = store.colliding_pages().await?;
    let page_count = pages.len();
    let groups = group_pages(pages);

    tracing::debug!(
        pages = page_count,
        groups = groups.len(),
        "scanned colliding pages"
    );
    Ok(groups)
}

/// Group pages by path, dropping singletons. Largest groups come first,
/// then by path.
pub fn group_pages(pages: impl IntoIterator<Item = PageRecord>) -> Vec<DuplicateGroup> {
    let mut by_key: BTreeMap<String, Vec<PageRecord>> = BTreeMap::new();
    for page in pages {
        by_key.entry(page.path.clone()).or_default().push(page);
    }

    let mut groups: Vec<DuplicateGroup> = by_key
        .into_iter()
        .filter(|(_, pages)| pages.len() > 1)
        .map(|(key, mut pages)| {
            pages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            let members = pages
                .into_iter()
                .map(|page| GroupMember {
                    retained_state: page.retained_state(),
                    page,
                })
                .collect();
            DuplicateGroup { key, members }
        })
        .collect();

    // Stable sort keeps the path order from the BTreeMap within equal sizes.
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups
}
