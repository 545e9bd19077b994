use crate::model::{lookup_path, normalize_name, value_text, SpellFilter, NAME_FIELD, SYSTEM_FIELD};
use crate::store::traits::{Document, SpellStore, StoreError};
use parking_lot::RwLock;
use serde_json::Value;

/// In-process store backed by a plain vector. Used as the test double for
/// the catalog layer; matching delegates to `SpellFilter::matches` so both
/// backends share one set of semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn identity(doc: &Document) -> (String, String) {
        let name = lookup_path(doc, NAME_FIELD).map(value_text).unwrap_or_default();
        let system = lookup_path(doc, SYSTEM_FIELD)
            .map(value_text)
            .unwrap_or_default();
        (normalize_name(&name), system)
    }
}

#[async_trait::async_trait]
impl SpellStore for MemoryStore {
    async fn query(&self, filter: &SpellFilter) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read();
        Ok(docs.iter().filter(|d| filter.matches(d)).cloned().collect())
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let mut docs = self.docs.write();
        let identity = Self::identity(&doc);
        if docs.iter().any(|d| Self::identity(d) == identity) {
            return Err(StoreError::Duplicate);
        }
        docs.push(doc);
        Ok(())
    }

    async fn delete(&self, filter: &SpellFilter) -> Result<(), StoreError> {
        self.docs.write().retain(|d| !filter.matches(d));
        Ok(())
    }

    async fn distinct_values(&self, field_path: &str) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read();
        let mut values: Vec<Value> = Vec::new();
        for doc in docs.iter() {
            let Some(stored) = lookup_path(doc, field_path) else {
                continue;
            };
            let elements = match stored {
                Value::Array(items) => items.clone(),
                scalar => vec![scalar.clone()],
            };
            for v in elements {
                if !values.contains(&v) {
                    values.push(v);
                }
            }
        }
        Ok(values)
    }

    async fn field_names(&self) -> Result<Vec<String>, StoreError> {
        let docs = self.docs.read();
        let mut names: Vec<String> = Vec::new();
        for doc in docs.iter() {
            if let Some(Value::Object(attributes)) = lookup_path(doc, "attributes") {
                for key in attributes.keys() {
                    if !names.contains(key) {
                        names.push(key.clone());
                    }
                }
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(name: &str, system: &str) -> Document {
        json!({
            "name": name,
            "description": "a spell",
            "attributes": {},
            "metadata": {"system": system},
        })
    }

    #[tokio::test]
    async fn insert_rejects_identity_duplicates() {
        let store = MemoryStore::new();
        store.insert(doc("fireball", "D&D")).await.unwrap();

        let err = store.insert(doc("fireball", "D&D")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        // Same name under another system is a different identity.
        store.insert(doc("fireball", "Pathfinder")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_only_matching_documents() {
        let store = MemoryStore::new();
        store.insert(doc("fireball", "D&D")).await.unwrap();
        store.insert(doc("fireball", "Pathfinder")).await.unwrap();

        let exact = SpellFilter::new()
            .equals(NAME_FIELD, json!("fireball"))
            .equals(SYSTEM_FIELD, json!("D&D"));
        store.delete(&exact).await.unwrap();

        let rest = store.query(&SpellFilter::new()).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["metadata"]["system"], "Pathfinder");
    }

    #[tokio::test]
    async fn distinct_values_flatten_lists_and_dedupe() {
        let store = MemoryStore::new();
        let mut a = doc("fireball", "D&D");
        a["attributes"] = json!({"class": ["wizard", "sorcerer"]});
        let mut b = doc("heal", "D&D");
        b["attributes"] = json!({"class": "cleric", "level": 1});
        store.insert(a).await.unwrap();
        store.insert(b).await.unwrap();

        let classes = store.distinct_values("attributes.class").await.unwrap();
        assert_eq!(classes, vec![json!("wizard"), json!("sorcerer"), json!("cleric")]);

        let names = store.field_names().await.unwrap();
        assert!(names.contains(&"class".to_string()));
        assert!(names.contains(&"level".to_string()));
    }
}
