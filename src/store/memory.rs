// In-memory backend
// Documents are kept as JSON values, ordered by id

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{Filter, Record, StoreError, StoreResult};

type Collection = BTreeMap<String, Value>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<&'static str, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert<T: Record>(&self, record: &T) -> StoreResult<()> {
        let value = encode(record)?;
        let mut collections = self.collections.write().await;
        let collection = collections.entry(T::COLLECTION).or_default();

        if collection.contains_key(record.id()) {
            return Err(StoreError::Duplicate {
                field: "_id".to_string(),
            });
        }
        check_unique::<T>(collection, record.id(), &value)?;

        collection.insert(record.id().to_string(), value);
        Ok(())
    }

    pub async fn find<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        let collections = self.collections.read().await;
        collections
            .get(T::COLLECTION)
            .and_then(|c| c.get(id))
            .map(decode)
            .transpose()
    }

    pub async fn find_one_by<T: Record>(&self, field: &str, value: &str) -> StoreResult<Option<T>> {
        let collections = self.collections.read().await;
        collections
            .get(T::COLLECTION)
            .and_then(|c| c.values().find(|doc| field_equals(doc, field, value)))
            .map(decode)
            .transpose()
    }

    pub async fn find_many<T: Record>(&self, filter: Filter<'_>) -> StoreResult<Vec<T>> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(T::COLLECTION) else {
            return Ok(Vec::new());
        };

        collection
            .values()
            .rev()
            .filter(|doc| match filter {
                Filter::All => true,
                Filter::Eq(field, value) => field_equals(doc, field, value),
            })
            .map(decode)
            .collect()
    }

    pub async fn replace<T: Record>(&self, record: &T) -> StoreResult<bool> {
        let value = encode(record)?;
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(T::COLLECTION) else {
            return Ok(false);
        };
        if !collection.contains_key(record.id()) {
            return Ok(false);
        }
        check_unique::<T>(collection, record.id(), &value)?;

        collection.insert(record.id().to_string(), value);
        Ok(true)
    }

    pub async fn delete<T: Record>(&self, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(T::COLLECTION)
            .and_then(|c| c.remove(id))
            .is_some())
    }
}

fn encode<T: Record>(record: &T) -> StoreResult<Value> {
    serde_json::to_value(record).map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<T: Record>(value: &Value) -> StoreResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| StoreError::Codec(e.to_string()))
}

fn field_equals(doc: &Value, field: &str, expected: &str) -> bool {
    doc.get(field).and_then(Value::as_str) == Some(expected)
}

/// Reject `value` if another document already holds one of its unique fields.
fn check_unique<T: Record>(collection: &Collection, id: &str, value: &Value) -> StoreResult<()> {
    for field in T::UNIQUE {
        let Some(candidate) = value.get(*field) else {
            continue;
        };
        let taken = collection
            .iter()
            .any(|(other_id, doc)| other_id != id && doc.get(*field) == Some(candidate));
        if taken {
            return Err(StoreError::Duplicate {
                field: (*field).to_string(),
            });
        }
    }
    Ok(())
}
