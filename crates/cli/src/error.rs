use engine_config::error::ConfigError;
use engine_core::error::SyncError;
use model::mapping::SettingsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read or write a file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    Argument(#[from] SettingsError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("{failed} of {total} mappings failed")]
    MappingsFailed { failed: usize, total: usize },

    #[error("Shutdown requested")]
    ShutdownRequested,
}
