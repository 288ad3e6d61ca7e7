//! Document store module
//!
//! Every MealEase resource is a flat document persisted in one collection.
//! Handlers talk to [`Store`], which dispatches to MongoDB in production or to
//! an in-process map for tests and local development.

mod memory;
mod mongo;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by either backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field already holds this value.
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: String },

    /// The backend failed (connection, command, ...).
    #[error("store backend error: {0}")]
    Backend(String),

    /// A document could not be converted to or from its stored form.
    #[error("document codec error: {0}")]
    Codec(String),
}

/// A document type stored in its own collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Collection name, shared by both backends.
    const COLLECTION: &'static str;

    /// Fields whose values must be unique across the collection.
    const UNIQUE: &'static [&'static str] = &[];

    fn id(&self) -> &str;
}

/// Selection for [`Store::find_many`].
#[derive(Debug, Clone, Copy)]
pub enum Filter<'a> {
    All,
    /// Top-level string field equality.
    Eq(&'a str, &'a str),
}

/// Generate a new document id.
///
/// Ids are ObjectId hex strings: they sort by creation time, which both
/// backends rely on for newest-first listings.
pub fn new_id() -> String {
    mongodb::bson::oid::ObjectId::new().to_hex()
}

/// Check that a path segment looks like a document id.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

pub enum Store {
    Mongo(MongoStore),
    Memory(MemoryStore),
}

impl Store {
    /// Open the configured backend.
    pub async fn open(config: &StorageConfig) -> StoreResult<Self> {
        match config.backend {
            StorageBackend::Mongodb => {
                let store = MongoStore::connect(&config.mongo_uri, &config.database).await?;
                store.ensure_indexes().await?;
                Ok(Self::Mongo(store))
            }
            StorageBackend::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }

    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Mongo(_) => "mongodb",
            Self::Memory(_) => "memory",
        }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        match self {
            Self::Mongo(s) => s.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    pub async fn insert<T: Record>(&self, record: &T) -> StoreResult<()> {
        match self {
            Self::Mongo(s) => s.insert(record).await,
            Self::Memory(s) => s.insert(record).await,
        }
    }

    pub async fn find<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        match self {
            Self::Mongo(s) => s.find(id).await,
            Self::Memory(s) => s.find(id).await,
        }
    }

    pub async fn find_one_by<T: Record>(&self, field: &str, value: &str) -> StoreResult<Option<T>> {
        match self {
            Self::Mongo(s) => s.find_one_by(field, value).await,
            Self::Memory(s) => s.find_one_by(field, value).await,
        }
    }

    /// Matching documents, newest first.
    pub async fn find_many<T: Record>(&self, filter: Filter<'_>) -> StoreResult<Vec<T>> {
        match self {
            Self::Mongo(s) => s.find_many(filter).await,
            Self::Memory(s) => s.find_many(filter).await,
        }
    }

    /// Overwrite an existing document. Returns false if it no longer exists.
    pub async fn replace<T: Record>(&self, record: &T) -> StoreResult<bool> {
        match self {
            Self::Mongo(s) => s.replace(record).await,
            Self::Memory(s) => s.replace(record).await,
        }
    }

    /// Remove a document. Returns false if nothing was deleted.
    pub async fn delete<T: Record>(&self, id: &str) -> StoreResult<bool> {
        if !is_valid_id(id) {
            return Ok(false);
        }
        match self {
            Self::Mongo(s) => s.delete::<T>(id).await,
            Self::Memory(s) => s.delete::<T>(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_valid_and_ordered() {
        let first = new_id();
        let second = new_id();
        assert!(is_valid_id(&first));
        assert!(is_valid_id(&second));
        assert!(second > first);
    }

    #[test]
    fn test_invalid_ids() {
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("123"));
        assert!(!is_valid_id("zzzzzzzzzzzzzzzzzzzzzzzz"));
        assert!(is_valid_id("65f0c0ffee0000000000abcd"));
    }
}
