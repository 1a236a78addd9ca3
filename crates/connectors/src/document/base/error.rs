use mongodb::error::{ErrorKind, RETRYABLE_WRITE_ERROR, WriteFailure};
use thiserror::Error;

/// Server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Any error raised by the MongoDB driver.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// An insert hit a unique index, usually `_id`.
    #[error("Duplicate key in collection '{collection}': {message}")]
    DuplicateKey { collection: String, message: String },

    /// The connection string does not name a database.
    #[error("No database name found in MongoDB connection string")]
    MissingDatabase,

    /// A server reply did not have the expected shape.
    #[error("Unexpected reply from MongoDB: {0}")]
    UnexpectedReply(String),
}

impl StoreError {
    /// Wraps a failed write, singling out unique index violations.
    pub fn from_write(collection: &str, err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            StoreError::DuplicateKey {
                collection: collection.to_string(),
                message: err.to_string(),
            }
        } else {
            StoreError::Mongo(err)
        }
    }

    /// True for failures that may succeed when the same operation is retried.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Mongo(err) => {
                err.contains_label(RETRYABLE_WRITE_ERROR)
                    || matches!(
                        *err.kind,
                        ErrorKind::Io(_)
                            | ErrorKind::ServerSelection { .. }
                            | ErrorKind::ConnectionPoolCleared { .. }
                    )
            }
            _ => false,
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::InsertMany(failure) => failure
            .write_errors
            .iter()
            .flatten()
            .any(|e| e.code == DUPLICATE_KEY_CODE),
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_socket_errors_are_transient() {
        let err = StoreError::Mongo(io::Error::new(io::ErrorKind::BrokenPipe, "closed").into());
        assert!(err.is_transient());
    }

    #[test]
    fn test_duplicate_key_is_not_transient() {
        let err = StoreError::DuplicateKey {
            collection: "orders".into(),
            message: "E11000 duplicate key error".into(),
        };
        assert!(!err.is_transient());
        assert!(!StoreError::MissingDatabase.is_transient());
    }

    #[test]
    fn test_from_write_keeps_other_failures() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
        assert!(matches!(
            StoreError::from_write("orders", err),
            StoreError::Mongo(_)
        ));
    }
}
