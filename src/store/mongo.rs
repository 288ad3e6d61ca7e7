// MongoDB backend
// One collection per record type, `_id` holds the ObjectId hex string

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};

use super::{Filter, Record, StoreError, StoreResult};
use crate::logger;
use crate::model::User;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await.map_err(backend)?;
        let db = client.database(database);
        let store = Self { db };
        store.ping().await?;
        logger::log_info(&format!("Connected to MongoDB database '{database}'"));
        Ok(store)
    }

    /// Create the indexes the handlers depend on (unique user emails).
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection::<User>()
            .create_index(index)
            .await
            .map_err(backend)?;
        Ok(())
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(backend)
    }

    fn collection<T: Record>(&self) -> Collection<T> {
        self.db.collection::<T>(T::COLLECTION)
    }

    pub async fn insert<T: Record>(&self, record: &T) -> StoreResult<()> {
        self.collection::<T>()
            .insert_one(record)
            .await
            .map(|_| ())
            .map_err(write_error::<T>)
    }

    pub async fn find<T: Record>(&self, id: &str) -> StoreResult<Option<T>> {
        self.collection::<T>()
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend)
    }

    pub async fn find_one_by<T: Record>(&self, field: &str, value: &str) -> StoreResult<Option<T>> {
        self.collection::<T>()
            .find_one(doc! { field: value })
            .await
            .map_err(backend)
    }

    pub async fn find_many<T: Record>(&self, filter: Filter<'_>) -> StoreResult<Vec<T>> {
        let cursor = self
            .collection::<T>()
            .find(filter_document(filter))
            .sort(doc! { "_id": -1 })
            .await
            .map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    pub async fn replace<T: Record>(&self, record: &T) -> StoreResult<bool> {
        let result = self
            .collection::<T>()
            .replace_one(doc! { "_id": record.id() }, record)
            .await
            .map_err(write_error::<T>)?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete<T: Record>(&self, id: &str) -> StoreResult<bool> {
        let result = self
            .collection::<T>()
            .delete_one(doc! { "_id": id })
            .await
            .map_err(backend)?;
        Ok(result.deleted_count > 0)
    }
}

fn filter_document(filter: Filter<'_>) -> Document {
    match filter {
        Filter::All => Document::new(),
        Filter::Eq(field, value) => doc! { field: value },
    }
}

fn backend(err: MongoError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Map unique index violations to [`StoreError::Duplicate`].
fn write_error<T: Record>(err: MongoError) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(ref write)) = *err.kind {
        if write.code == DUPLICATE_KEY {
            let field = T::UNIQUE
                .iter()
                .copied()
                .find(|f| write.message.contains(f))
                .unwrap_or("_id");
            return StoreError::Duplicate {
                field: field.to_string(),
            };
        }
    }
    backend(err)
}
