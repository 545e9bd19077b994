use crate::model::SpellFilter;
use thiserror::Error;

/// Raw stored representation of a spell. The store trades in untyped JSON
/// documents; decoding into the Spell model is the catalog layer's job.
pub type Document = serde_json::Value;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The write collided with the unique (normalized name, system) index.
    /// This is the authoritative duplicate signal; the catalog's pre-flight
    /// existence check is only a fast path.
    #[error("document violates the unique (name, system) constraint")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// The document-store collaborator. The catalog owns all matching and
/// consistency semantics; implementations only have to answer filters
/// faithfully (see `SpellFilter::matches` for the reference semantics) and
/// enforce the duplicate rule on insert.
#[async_trait::async_trait]
pub trait SpellStore: Send + Sync {
    /// Return every stored document matching the filter.
    async fn query(&self, filter: &SpellFilter) -> Result<Vec<Document>, StoreError>;
    /// Insert one document, rejecting identity duplicates.
    async fn insert(&self, doc: Document) -> Result<(), StoreError>;
    /// Delete every document matching the filter.
    async fn delete(&self, filter: &SpellFilter) -> Result<(), StoreError>;
    /// Distinct values stored under a field path; list-valued fields
    /// contribute each element.
    async fn distinct_values(&self, field_path: &str) -> Result<Vec<Document>, StoreError>;
    /// Attribute field names present across all stored documents.
    async fn field_names(&self) -> Result<Vec<String>, StoreError>;
}
