//! Document store port used by the import pipeline.
//!
//! The pipeline never talks to a concrete database. All persistence goes
//! through the [`DocumentStore`] trait, whose operation set mirrors the
//! primitives the import actually needs: point reads, merge writes,
//! create-only writes, batched commits, ids-only prefix range queries,
//! field-equality queries and bulk existence checks.
//!
//! # Implementations
//!
//! - [`crate::infrastructure::MemoryStore`] - In-memory implementation used
//!   by tests and local runs
//! - Test mocks available with `cfg(test)`

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// A document's field map.
pub type Fields = serde_json::Map<String, Value>;

/// Serializes an entity into a [`Fields`] map.
///
/// Entities in this crate are plain structs that always serialize to JSON
/// objects; any other shape collapses to an empty map.
pub fn fields_of<T: Serialize>(value: &T) -> Fields {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Fields::new(),
    }
}

/// Reference to a document as a `collection/id` path.
///
/// Collections may nest: `campaigns/{id}/targets/{target_id}`. The id is
/// always the last path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DocRef {
    path: String,
}

impl DocRef {
    pub fn new(collection: &str, id: &str) -> Self {
        Self {
            path: format!("{collection}/{id}"),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last path segment.
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Everything before the last path segment.
    pub fn collection(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) => &self.path[..pos],
            None => "",
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Errors surfaced by document store implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A create-only write hit an existing document. Carries the document id.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Any other backend failure (connectivity, serialization, quota).
    #[error("document store error: {0}")]
    Backend(String),
}

/// A single mutation inside a batched commit.
///
/// Mirrors the write modes the pipeline relies on: blind set for fresh
/// documents, merge-set for idempotent upserts, create-only for uniqueness
/// enforcement, array-union for monotonically growing sets and atomic
/// increments for counters. `Increment` accepts dotted field paths
/// (`totals.targets`).
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set {
        doc: DocRef,
        fields: Fields,
    },
    SetMerge {
        doc: DocRef,
        fields: Fields,
    },
    Create {
        doc: DocRef,
        fields: Fields,
    },
    ArrayUnion {
        doc: DocRef,
        field: String,
        values: Vec<Value>,
    },
    Increment {
        doc: DocRef,
        field: String,
        by: i64,
    },
    Delete {
        doc: DocRef,
    },
}

/// Port for the document database backing businesses, campaigns, targets
/// and links.
///
/// All mutation paths used by the importer are either merge-semantics
/// writes, atomic increments or create-only writes — implementations must
/// never blindly overwrite an existing document through these operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a single document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] on backend failures.
    async fn get(&self, doc: &DocRef) -> Result<Option<Fields>, StoreError>;

    /// Creates a document, failing when it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when the id is taken.
    async fn create(&self, doc: &DocRef, fields: Fields) -> Result<(), StoreError>;

    /// Merges fields into a document, creating it when absent. Fields not
    /// present in `fields` are left untouched.
    async fn set_merge(&self, doc: &DocRef, fields: Fields) -> Result<(), StoreError>;

    /// Deletes a document. Deleting an absent document is not an error.
    async fn delete(&self, doc: &DocRef) -> Result<(), StoreError>;

    /// Atomically applies a batch of write operations.
    ///
    /// # Errors
    ///
    /// Returns the first operation failure; callers treat a failed commit
    /// as a failed batch.
    async fn commit(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// Lists document ids in `collection` starting with `prefix`, without
    /// loading field payloads. Backs the suffix-allocation range scan.
    async fn list_ids_with_prefix(
        &self,
        collection: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Lists `(id, fields)` pairs in `collection` where `field == value`.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Fields)>, StoreError>;

    /// Lists every `(id, fields)` pair in a collection.
    async fn list_all(&self, collection: &str) -> Result<Vec<(String, Fields)>, StoreError>;

    /// Bulk existence check: returns the ids among `refs` that exist.
    async fn existing_ids(&self, refs: &[DocRef]) -> Result<HashSet<String>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_ref_path_parts() {
        let doc = DocRef::new("links", "acme-53177");
        assert_eq!(doc.path(), "links/acme-53177");
        assert_eq!(doc.id(), "acme-53177");
        assert_eq!(doc.collection(), "links");
    }

    #[test]
    fn test_doc_ref_nested_collection() {
        let doc = DocRef::new("campaigns/camp-1/targets", "t-9");
        assert_eq!(doc.id(), "t-9");
        assert_eq!(doc.collection(), "campaigns/camp-1/targets");
    }

    #[test]
    fn test_doc_ref_serializes_as_path_string() {
        let doc = DocRef::new("businesses", "acme");
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::json!("businesses/acme")
        );
    }

    #[test]
    fn test_fields_of_struct() {
        #[derive(Serialize)]
        struct Probe {
            a: u32,
        }
        let fields = fields_of(&Probe { a: 7 });
        assert_eq!(fields.get("a"), Some(&serde_json::json!(7)));
    }
}
