use crate::document::base::{
    error::StoreError,
    store::{DocumentStore, StoreStats},
};
use async_trait::async_trait;
use model::records::row::ROW_ID;
use mongodb::{
    Client, Database,
    bson::{Bson, Document, doc},
    options::ClientOptions,
};
use tracing::debug;

#[derive(Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connects lazily: the driver opens sockets on the first operation.
    /// The database is the one named in the URI path.
    pub async fn connect(conn_str: &str) -> Result<Self, StoreError> {
        let options = ClientOptions::parse(conn_str).await?;
        let name = options
            .default_database
            .clone()
            .ok_or(StoreError::MissingDatabase)?;
        let client = Client::with_options(options)?;
        let database = client.database(&name);
        debug!(database = %name, "MongoDB client created");
        Ok(MongoStore { database })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn clear(&self, collection: &str) -> Result<u64, StoreError> {
        let result = self
            .database
            .collection::<Document>(collection)
            .delete_many(doc! {})
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_batch(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }
        let result = self
            .database
            .collection::<Document>(collection)
            .insert_many(documents)
            .await
            .map_err(|e| StoreError::from_write(collection, e))?;
        Ok(result.inserted_ids.len())
    }

    async fn remove_after(&self, collection: &str, ordinal: u64) -> Result<u64, StoreError> {
        let bound = i64::try_from(ordinal).unwrap_or(i64::MAX);
        let mut filter = Document::new();
        filter.insert(ROW_ID, doc! { "$gt": bound });
        let result = self
            .database
            .collection::<Document>(collection)
            .delete_many(filter)
            .await?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let reply = self.database.run_command(doc! { "dbStats": 1 }).await?;
        Ok(StoreStats {
            database: self.database.name().to_string(),
            collections: read_count(&reply, "collections")?,
            documents: read_count(&reply, "objects")?,
            data_size: read_count(&reply, "dataSize")?,
        })
    }
}

/// `dbStats` reports counters as int32, int64 or double depending on size.
fn read_count(reply: &Document, key: &str) -> Result<u64, StoreError> {
    match reply.get(key) {
        Some(Bson::Int32(v)) => Ok(u64::try_from(*v).unwrap_or(0)),
        Some(Bson::Int64(v)) => Ok(u64::try_from(*v).unwrap_or(0)),
        Some(Bson::Double(v)) if *v >= 0.0 => Ok(*v as u64),
        None => Ok(0),
        Some(other) => Err(StoreError::UnexpectedReply(format!(
            "dbStats field '{key}' has unexpected value {other}"
        ))),
    }
}
