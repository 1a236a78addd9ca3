use crate::document::base::error::StoreError;
use async_trait::async_trait;
use mongodb::bson::Document;

/// Storage statistics reported by the target database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub database: String,
    pub collections: u64,
    pub documents: u64,
    pub data_size: u64,
}

/// Write access to a document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Removes every document from the collection, keeping its indexes.
    /// Returns the number of deleted documents.
    async fn clear(&self, collection: &str) -> Result<u64, StoreError>;

    /// Inserts the documents in a single round trip and returns how many the
    /// server acknowledged.
    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError>;

    /// Deletes documents whose `RowID` is greater than `ordinal`, undoing
    /// any insert that landed without being confirmed.
    async fn remove_after(&self, collection: &str, ordinal: u64) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}
