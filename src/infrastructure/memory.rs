//! In-memory document store.
//!
//! Implements the [`DocumentStore`] port on a `BTreeMap` keyed by full
//! document path, with the same write semantics the pipeline assumes from
//! a real backend: shallow merge-sets, array unions, dotted-path atomic
//! increments and create-only writes. Used by the integration tests and by
//! local dry runs.

use crate::domain::store::{DocRef, DocumentStore, Fields, StoreError, WriteOp};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Range-scan sentinel: one past any id character, mirroring the
/// `[prefix, prefix + '\u{f8ff}']` query shape of document databases.
const RANGE_SENTINEL: char = '\u{f8ff}';

/// BTreeMap-backed [`DocumentStore`] implementation.
///
/// Thread-safe and cheap to construct; every test starts from an empty
/// store. [`MemoryStore::commit_count`] exposes how many batched commits
/// were applied, which the batch-ceiling tests assert against.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Fields>>,
    commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batched commits applied so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }

    /// Test convenience: reads a document without going through the trait.
    pub fn document(&self, doc: &DocRef) -> Option<Fields> {
        self.lock().get(doc.path()).cloned()
    }

    /// Test convenience: number of stored documents across all collections.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Fields>> {
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(docs: &mut BTreeMap<String, Fields>, op: WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::Set { doc, fields } => {
                docs.insert(doc.path().to_string(), fields);
            }
            WriteOp::SetMerge { doc, fields } => {
                merge_into(docs.entry(doc.path().to_string()).or_default(), fields);
            }
            WriteOp::Create { doc, fields } => {
                if docs.contains_key(doc.path()) {
                    return Err(StoreError::AlreadyExists(doc.id().to_string()));
                }
                docs.insert(doc.path().to_string(), fields);
            }
            WriteOp::ArrayUnion { doc, field, values } => {
                let fields = docs.entry(doc.path().to_string()).or_default();
                array_union(fields, &field, values);
            }
            WriteOp::Increment { doc, field, by } => {
                let fields = docs.entry(doc.path().to_string()).or_default();
                increment(fields, &field, by);
            }
            WriteOp::Delete { doc } => {
                docs.remove(doc.path());
            }
        }
        Ok(())
    }
}

/// Shallow field merge: incoming keys replace existing ones, others stay.
fn merge_into(existing: &mut Fields, incoming: Fields) {
    for (key, value) in incoming {
        existing.insert(key, value);
    }
}

/// Adds values missing from an array field, creating it when absent.
fn array_union(fields: &mut Fields, field: &str, values: Vec<Value>) {
    let entry = fields
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    if let Value::Array(items) = entry {
        for value in values {
            if !items.contains(&value) {
                items.push(value);
            }
        }
    }
}

/// Adds `by` to a numeric field addressed by a dotted path, creating
/// intermediate objects and treating an absent leaf as zero.
fn increment(fields: &mut Fields, path: &str, by: i64) {
    let mut current = fields;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let slot = current
                .entry(part.to_string())
                .or_insert_with(|| Value::from(0));
            let previous = slot.as_i64().unwrap_or(0);
            *slot = Value::from(previous + by);
            return;
        }
        let next = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Fields::new()));
        if !next.is_object() {
            *next = Value::Object(Fields::new());
        }
        match next {
            Value::Object(map) => current = map,
            _ => return,
        }
    }
}

/// Splits a full document path into `(collection, id)` when the id is a
/// direct child of `collection` (no nested sub-collections).
fn direct_child<'k>(key: &'k str, collection: &str) -> Option<&'k str> {
    key.strip_prefix(collection)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|id| !id.contains('/'))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocRef) -> Result<Option<Fields>, StoreError> {
        Ok(self.lock().get(doc.path()).cloned())
    }

    async fn create(&self, doc: &DocRef, fields: Fields) -> Result<(), StoreError> {
        let mut docs = self.lock();
        Self::apply(
            &mut docs,
            WriteOp::Create {
                doc: doc.clone(),
                fields,
            },
        )
    }

    async fn set_merge(&self, doc: &DocRef, fields: Fields) -> Result<(), StoreError> {
        let mut docs = self.lock();
        Self::apply(
            &mut docs,
            WriteOp::SetMerge {
                doc: doc.clone(),
                fields,
            },
        )
    }

    async fn delete(&self, doc: &DocRef) -> Result<(), StoreError> {
        self.lock().remove(doc.path());
        Ok(())
    }

    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut docs = self.lock();
        for op in ops {
            Self::apply(&mut docs, op)?;
        }
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list_ids_with_prefix(
        &self,
        collection: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        let start = format!("{collection}/{prefix}");
        let end = format!("{collection}/{prefix}{RANGE_SENTINEL}");
        let docs = self.lock();
        Ok(docs
            .range::<String, _>((Bound::Included(&start), Bound::Excluded(&end)))
            .filter_map(|(key, _)| direct_child(key, collection))
            .map(str::to_string)
            .collect())
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Fields)>, StoreError> {
        let docs = self.lock();
        Ok(docs
            .iter()
            .filter_map(|(key, fields)| {
                let id = direct_child(key, collection)?;
                (fields.get(field) == Some(value)).then(|| (id.to_string(), fields.clone()))
            })
            .collect())
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<(String, Fields)>, StoreError> {
        let docs = self.lock();
        Ok(docs
            .iter()
            .filter_map(|(key, fields)| {
                direct_child(key, collection).map(|id| (id.to_string(), fields.clone()))
            })
            .collect())
    }

    async fn existing_ids(&self, refs: &[DocRef]) -> Result<HashSet<String>, StoreError> {
        let docs = self.lock();
        Ok(refs
            .iter()
            .filter(|doc| docs.contains_key(doc.path()))
            .map(|doc| doc.id().to_string())
            .collect())
    }
}
