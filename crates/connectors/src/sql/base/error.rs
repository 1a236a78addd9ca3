use thiserror::Error;

/// SQL Server error numbers worth another attempt: deadlock victim and the
/// Azure SQL throttling/failover family.
const TRANSIENT_SERVER_CODES: &[u32] = &[1205, 10928, 10929, 40197, 40501, 40613, 49918, 49919, 49920];

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Low‐level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any error reported by the TDS driver or the server.
    #[error("SQL error: {0}")]
    Sql(#[from] tiberius::error::Error),

    /// No pooled connection could be opened.
    #[error("Connection error: {0}")]
    Connect(#[from] ConnectorError),

    /// A returned value could not be turned into a model value.
    #[error("Decode error in column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A catalog query returned something unexpected.
    #[error("Unexpected metadata: {0}")]
    Metadata(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl DbError {
    /// True for failures that may succeed when the same statement is retried.
    pub fn is_transient(&self) -> bool {
        match self {
            DbError::Io(_) => true,
            DbError::Sql(err) => is_transient_driver_error(err),
            DbError::Connect(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Errors happening during adapter or connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The TDS handshake, login or connection string parsing failed.
    #[error("SQL Server connection failed: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    /// The TCP connection could not be established.
    #[error("SQL Server socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection pool could not be built or handed out no connection.
    #[error("SQL Server pool error: {0}")]
    Pool(String),
}

impl ConnectorError {
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::Io(_) => true,
            ConnectorError::Tiberius(err) => is_transient_driver_error(err),
            ConnectorError::Pool(_) => false,
        }
    }
}

fn is_transient_driver_error(err: &tiberius::error::Error) -> bool {
    match err {
        tiberius::error::Error::Io { .. } => true,
        tiberius::error::Error::Server(token) => TRANSIENT_SERVER_CODES.contains(&token.code()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_are_transient() {
        let err = DbError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        assert!(err.is_transient());
    }

    #[test]
    fn test_decode_errors_are_not_transient() {
        let err = DbError::Decode {
            column: "Total".into(),
            message: "bad numeric".into(),
        };
        assert!(!err.is_transient());
        assert!(!DbError::Metadata("no rows".into()).is_transient());
    }
}
