use crate::error::CliError;
use async_trait::async_trait;
use engine_runtime::execution::probe;
use tracing::{error, info};

/// Trait for checking that an endpoint is reachable and usable.
#[async_trait]
pub trait ConnectionPinger {
    /// Returns a one-line description of the endpoint on success.
    async fn ping(&self) -> Result<String, CliError>;
}

/// SQL Server pinger: connects and checks the version banner.
pub struct SqlServerPinger {
    pub conn_str: String,
}

/// MongoDB pinger: pings the database and reads its size.
pub struct MongoPinger {
    pub uri: String,
}

#[async_trait]
impl ConnectionPinger for SqlServerPinger {
    async fn ping(&self) -> Result<String, CliError> {
        info!("Pinging SQL Server");
        let version = probe::probe_source(&self.conn_str).await.map_err(|e| {
            error!(error = %e, "SQL Server connection test failed");
            CliError::Sync(e)
        })?;
        Ok(format!("Connected to {version}"))
    }
}

#[async_trait]
impl ConnectionPinger for MongoPinger {
    async fn ping(&self) -> Result<String, CliError> {
        info!("Pinging MongoDB");
        let stats = probe::probe_target(&self.uri).await.map_err(|e| {
            error!(error = %e, "MongoDB connection test failed");
            CliError::Sync(e)
        })?;
        Ok(format!(
            "Connected to database '{}' ({} collections, {} bytes of data)",
            stats.database, stats.collections, stats.data_size
        ))
    }
}
