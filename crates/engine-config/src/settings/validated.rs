use crate::{
    error::ConfigError,
    settings::document::{MappingElement, SettingsDocument, TableElement},
};
use model::{
    mapping::{SyncSettings, TableMapping, TableName},
    pagination::{cursor::Cursor, page_size::PageSize},
};
use tracing::warn;

impl TryFrom<SettingsDocument> for SyncSettings {
    type Error = ConfigError;

    /// Connection strings may be empty here; the engine rejects them when a
    /// run starts. Everything about the mappings is checked now.
    fn try_from(doc: SettingsDocument) -> Result<Self, Self::Error> {
        let Some(mapping) = doc.mapping else {
            return Ok(SyncSettings::default());
        };

        let mut settings = SyncSettings::new(
            mapping.sql_connection.as_deref().unwrap_or_default(),
            mapping.mongo_connection.as_deref().unwrap_or_default(),
        );
        for table in mapping.tables {
            settings.mappings.push(table_mapping(table)?);
        }

        settings.check_mappings()?;
        Ok(settings)
    }
}

impl From<&SyncSettings> for SettingsDocument {
    fn from(settings: &SyncSettings) -> Self {
        SettingsDocument {
            mapping: Some(MappingElement {
                sql_connection: Some(settings.source_connection.clone()),
                mongo_connection: Some(settings.target_connection.clone()),
                tables: settings.mappings.iter().map(table_element).collect(),
            }),
        }
    }
}

fn table_mapping(table: TableElement) -> Result<TableMapping, ConfigError> {
    let name = required(table.sql_table, "SQLTable")?;
    let collection = required(table.mongo_collection, "MongoCollection")?;
    let source_table: TableName = name.parse()?;

    let page_size = match non_blank(table.page_size) {
        None => PageSize::default(),
        Some(value) => {
            let requested: i64 = value.parse().map_err(|_| ConfigError::InvalidPageSize {
                table: name.clone(),
                value: value.clone(),
            })?;
            if requested <= 0 {
                warn!(table = %name, requested, "Non-positive PageSize, using {}", PageSize::DEFAULT);
            }
            PageSize::new(requested)
        }
    };

    let cursor = match &table.last_sync_identity {
        Some(value) => value.parse::<Cursor>().map_err(|_| ConfigError::InvalidCursor {
            table: name.clone(),
            value: value.clone(),
        })?,
        None => Cursor::None,
    };

    let selected = match non_blank(table.is_selected) {
        None => true,
        Some(value) if value.eq_ignore_ascii_case("true") => true,
        Some(value) if value.eq_ignore_ascii_case("false") => false,
        Some(value) => return Err(ConfigError::InvalidFlag { table: name, value }),
    };

    let mut mapping = TableMapping::new(source_table, &collection)
        .with_page_size(page_size)
        .with_cursor(cursor)
        .with_selected(selected);
    if let Some(pk) = non_blank(table.primary_key_column) {
        mapping = mapping.with_primary_key(&pk);
    }
    Ok(mapping)
}

fn table_element(mapping: &TableMapping) -> TableElement {
    TableElement {
        sql_table: Some(mapping.source_table.to_string()),
        mongo_collection: Some(mapping.target_collection.clone()),
        primary_key_column: Some(mapping.primary_key_column.clone().unwrap_or_default()),
        page_size: Some(mapping.page_size.to_string()),
        last_sync_identity: Some(mapping.last_sync_cursor.to_string()),
        is_selected: Some(if mapping.selected { "True" } else { "False" }.to_string()),
    }
}

fn required(value: Option<String>, attribute: &'static str) -> Result<String, ConfigError> {
    non_blank(value).ok_or(ConfigError::MissingAttribute {
        element: "Table",
        attribute,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
