pub mod document;
pub mod encoding;
pub mod validated;
pub mod writeback;

use crate::error::ConfigError;
use document::SettingsDocument;
use model::mapping::SyncSettings;
use std::{fs, path::Path};
use tracing::info;

/// Parses a settings document, plain or base64 encoded.
pub fn parse_settings(content: &str, encoded: bool) -> Result<SyncSettings, ConfigError> {
    let xml = if encoded {
        encoding::decode(content)?
    } else {
        content.to_string()
    };
    SettingsDocument::from_xml(&xml)?.try_into()
}

pub fn render_settings(settings: &SyncSettings, encoded: bool) -> Result<String, ConfigError> {
    let xml = SettingsDocument::from(settings).to_xml()?;
    Ok(if encoded { encoding::encode(&xml) } else { xml })
}

pub fn load_settings(path: &Path, encoded: bool) -> Result<SyncSettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let settings = parse_settings(&content, encoded)?;
    info!(
        path = %path.display(),
        mappings = settings.mappings.len(),
        "Settings loaded"
    );
    Ok(settings)
}

/// Writes the settings in the same form they were read in.
pub fn save_settings(path: &Path, settings: &SyncSettings, encoded: bool) -> Result<(), ConfigError> {
    let content = render_settings(settings, encoded)?;
    fs::write(path, content).map_err(|e| ConfigError::io(path, e))?;
    info!(path = %path.display(), "Settings saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        mapping::{TableMapping, TableName},
        pagination::cursor::Cursor,
    };
    use tempfile::tempdir;

    fn sample() -> SyncSettings {
        SyncSettings::new(
            "server=tcp:localhost,1433;database=shop;user=sa;password=Secret!1",
            "mongodb://localhost:27017/shop",
        )
        .with_mapping(
            TableMapping::new(TableName::new(None, "Orders"), "orders")
                .with_primary_key("OrderID")
                .with_cursor(Cursor::Ordinal(1200)),
        )
        .with_mapping(
            TableMapping::new(TableName::new(Some("sales"), "Customers"), "customers")
                .with_selected(false),
        )
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.xml");

        save_settings(&path, &sample(), false).unwrap();
        assert_eq!(load_settings(&path, false).unwrap(), sample());
    }

    #[test]
    fn test_encoded_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.b64");

        save_settings(&path, &sample(), true).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("SQLToMongo"));
        assert_eq!(load_settings(&path, true).unwrap(), sample());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.xml");
        match load_settings(&path, false) {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
