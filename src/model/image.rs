use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::now;
use crate::store::{new_id, Record};

/// Uploaded picture, stored as a binary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Image {
    const COLLECTION: &'static str = "Images";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Image {
    pub fn new(data: Vec<u8>, content_type: String) -> Self {
        let ts = now();
        Self {
            id: new_id(),
            data,
            content_type,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// Public URL the client stores in `imageUrl` fields.
    pub fn url(&self) -> String {
        format!("/api/images/{}", self.id)
    }
}
