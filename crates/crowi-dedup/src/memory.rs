//! In-memory page store.
//!
//! Pages are typed; the referencing collections are schemaless JSON
//! documents. Unique indexes are enforced on insert and on creation, so a
//! pipeline that leaves duplicates behind fails the same way it would
//! against a real database.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::dependents::DependentCollection;
use crate::error::StoreError;
use crate::index_state::{IndexKey, IndexSpec, LiveIndex};
use crate::model::PageRecord;
use crate::store::{PageStore, SurvivorUpdate};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    pages: Vec<PageRecord>,
    indexes: Vec<LiveIndex>,
    collections: BTreeMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a page, enforcing any unique index already created.
    pub async fn insert_page(&self, page: PageRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        for index in state.indexes.iter().filter(|i| i.options.unique == Some(true)) {
            let key = index_key(&page, &index.keys)?;
            for existing in &state.pages {
                if index_key(existing, &index.keys)? == key {
                    return Err(StoreError::DuplicateKey {
                        index: index.name.clone(),
                        key,
                    });
                }
            }
        }
        state.pages.push(page);
        Ok(())
    }

    /// Register index metadata without validating existing pages.
    pub async fn insert_index(&self, index: LiveIndex) {
        self.state.lock().await.indexes.push(index);
    }

    pub async fn insert_document(&self, collection: &str, document: Value) {
        self.state
            .lock()
            .await
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    /// Pages in insertion order.
    pub async fn pages(&self) -> Vec<PageRecord> {
        self.state.lock().await.pages.clone()
    }

    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn indexes(&self) -> Vec<LiveIndex> {
        self.state.lock().await.indexes.clone()
    }
}

/// The JSON rendering of the page's values for `keys`.
fn index_key(page: &PageRecord, keys: &[IndexKey]) -> Result<String, StoreError> {
    let document = serde_json::to_value(page)?;
    let values: Vec<Value> = keys
        .iter()
        .map(|k| document.get(&k.field).cloned().unwrap_or(Value::Null))
        .collect();
    Ok(Value::Array(values).to_string())
}

fn references(document: &Value, dependent: &DependentCollection, from: &BTreeSet<Uuid>) -> bool {
    if let Some(d) = dependent.discriminator {
        if document.get(d.field).and_then(Value::as_str) != Some(d.value) {
            return false;
        }
    }
    document
        .get(dependent.field)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .is_some_and(|id| from.contains(&id))
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn index_information(&self) -> Result<Vec<LiveIndex>, StoreError> {
        Ok(self.indexes().await)
    }

    async fn colliding_pages(&self) -> Result<Vec<PageRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for page in &state.pages {
            *counts.entry(page.path.as_str()).or_default() += 1;
        }
        Ok(state
            .pages
            .iter()
            .filter(|p| counts.get(p.path.as_str()).copied().unwrap_or(0) > 1)
            .cloned()
            .collect())
    }

    async fn rewrite_references(
        &self,
        dependent: &DependentCollection,
        from: &[Uuid],
        to: Uuid,
    ) -> Result<u64, StoreError> {
        let from: BTreeSet<Uuid> = from.iter().copied().collect();
        let mut state = self.state.lock().await;
        let Some(documents) = state.collections.get_mut(dependent.collection) else {
            return Ok(0);
        };

        let mut rewritten = 0;
        for document in documents.iter_mut() {
            if !references(document, dependent, &from) {
                continue;
            }
            if let Some(object) = document.as_object_mut() {
                object.insert(dependent.field.to_string(), Value::String(to.to_string()));
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }

    async fn collapse_group(
        &self,
        survivor: Uuid,
        update: &SurvivorUpdate,
        remove_ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let page = state
            .pages
            .iter_mut()
            .find(|p| p.id == survivor)
            .ok_or(StoreError::PageNotFound(survivor))?;
        page.comment_count = update.comment_count;
        if let Some(sets) = &update.sets {
            page.sets = sets.clone();
        }

        let before = state.pages.len();
        state
            .pages
            .retain(|p| p.id == survivor || !remove_ids.contains(&p.id));
        Ok((before - state.pages.len()) as u64)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.indexes.iter().find(|i| i.name == spec.name) {
            if existing.keys == spec.keys && existing.options == spec.options {
                return Ok(());
            }
            return Err(StoreError::IndexConflict(spec.name.clone()));
        }

        if spec.options.unique == Some(true) {
            let mut seen = BTreeSet::new();
            for page in &state.pages {
                let key = index_key(page, &spec.keys)?;
                if !seen.insert(key.clone()) {
                    return Err(StoreError::DuplicateKey {
                        index: spec.name.clone(),
                        key,
                    });
                }
            }
        }

        state.indexes.push(LiveIndex {
            name: spec.name.clone(),
            keys: spec.keys.clone(),
            options: spec.options,
        });
        Ok(())
    }
}
