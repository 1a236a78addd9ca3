use model::mapping::SettingsError;
use std::{io, path::PathBuf, string::FromUtf8Error};
use thiserror::Error;

/// Errors raised while reading or writing the settings document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed settings XML: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Cannot read settings XML: {0}")]
    Reader(#[from] quick_xml::Error),

    #[error("Cannot write settings XML: {0}")]
    Serialize(String),

    #[error("Unexpected root element '{0}', expected 'SQLToMongo'")]
    InvalidRoot(String),

    #[error("Element '{element}' is missing attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Invalid LastSyncIdentity '{value}' for table '{table}'")]
    InvalidCursor { table: String, value: String },

    #[error("Invalid PageSize '{value}' for table '{table}'")]
    InvalidPageSize { table: String, value: String },

    #[error("Invalid IsSelected '{value}' for table '{table}'")]
    InvalidFlag { table: String, value: String },

    #[error("Settings are not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Decoded settings are not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl ConfigError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
