use crate::{
    document::base::error::StoreError,
    sql::base::error::{ConnectorError, DbError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Failed to open the source connection.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Database-related error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Document store error.
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// Missing required property error.
    #[error("Missing required property: {0}")]
    MissingProperty(String),
}

impl AdapterError {
    pub fn is_transient(&self) -> bool {
        match self {
            AdapterError::Connector(e) => e.is_transient(),
            AdapterError::Database(e) => e.is_transient(),
            AdapterError::Store(e) => e.is_transient(),
            AdapterError::MissingProperty(_) => false,
        }
    }
}
