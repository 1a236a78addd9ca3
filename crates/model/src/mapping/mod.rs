use crate::pagination::{cursor::Cursor, page_size::PageSize};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};
use thiserror::Error;

pub const DEFAULT_SCHEMA: &str = "dbo";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("SQL Server connection string is not configured")]
    MissingSourceConnection,

    #[error("MongoDB connection string is not configured")]
    MissingTargetConnection,

    #[error("Invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("Collection '{0}' is the target of more than one mapping")]
    DuplicateCollection(String),

    #[error("Mapping for table '{0}' has no target collection")]
    MissingCollection(String),
}

/// Source table reference, optionally schema-qualified (`sales.Orders`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(schema: Option<&str>, name: &str) -> Self {
        TableName {
            schema: schema.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn schema_or_default(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    /// True when `other` names this table, ignoring case and an implicit `dbo`.
    pub fn matches(&self, other: &str) -> bool {
        match other.parse::<TableName>() {
            Ok(parsed) => {
                parsed.name.eq_ignore_ascii_case(&self.name)
                    && (parsed.schema.is_none()
                        || parsed
                            .schema_or_default()
                            .eq_ignore_ascii_case(self.schema_or_default()))
            }
            Err(_) => false,
        }
    }
}

impl FromStr for TableName {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unbracket = |part: &str| {
            part.trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .to_string()
        };

        let parts: Vec<&str> = s.split('.').collect();
        let table = match parts.as_slice() {
            [name] => TableName {
                schema: None,
                name: unbracket(name),
            },
            [schema, name] => TableName {
                schema: Some(unbracket(schema)),
                name: unbracket(name),
            },
            _ => return Err(SettingsError::InvalidTableName(s.to_string())),
        };

        if table.name.is_empty() || table.schema.as_deref() == Some("") {
            return Err(SettingsError::InvalidTableName(s.to_string()));
        }
        Ok(table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One table-to-collection copy job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    pub source_table: TableName,
    pub target_collection: String,
    /// Column written to the document identity field. When unset, documents
    /// get a generated identity and paging orders by the first column.
    pub primary_key_column: Option<String>,
    pub page_size: PageSize,
    pub last_sync_cursor: Cursor,
    pub selected: bool,
}

impl TableMapping {
    pub fn new(source_table: TableName, target_collection: &str) -> Self {
        TableMapping {
            source_table,
            target_collection: target_collection.to_string(),
            primary_key_column: None,
            page_size: PageSize::default(),
            last_sync_cursor: Cursor::None,
            selected: true,
        }
    }

    pub fn with_primary_key(mut self, column: &str) -> Self {
        self.primary_key_column = Some(column.to_string());
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.last_sync_cursor = cursor;
        self
    }

    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// Validated configuration consumed by the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub source_connection: String,
    pub target_connection: String,
    pub mappings: Vec<TableMapping>,
}

impl SyncSettings {
    pub fn new(source_connection: &str, target_connection: &str) -> Self {
        SyncSettings {
            source_connection: source_connection.to_string(),
            target_connection: target_connection.to_string(),
            mappings: Vec::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: TableMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn check_connections(&self) -> Result<(), SettingsError> {
        if self.source_connection.trim().is_empty() {
            return Err(SettingsError::MissingSourceConnection);
        }
        if self.target_connection.trim().is_empty() {
            return Err(SettingsError::MissingTargetConnection);
        }
        Ok(())
    }

    pub fn check_mappings(&self) -> Result<(), SettingsError> {
        let mut seen = HashSet::new();
        for mapping in &self.mappings {
            if mapping.target_collection.trim().is_empty() {
                return Err(SettingsError::MissingCollection(
                    mapping.source_table.to_string(),
                ));
            }
            if !seen.insert(mapping.target_collection.to_ascii_lowercase()) {
                return Err(SettingsError::DuplicateCollection(
                    mapping.target_collection.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Mappings to run, in configured order. An explicit table list replaces
    /// the `selected` flags.
    pub fn mappings_to_run(&self, tables: Option<&[String]>) -> Vec<&TableMapping> {
        match tables {
            Some(names) => self
                .mappings
                .iter()
                .filter(|m| names.iter().any(|n| m.source_table.matches(n)))
                .collect(),
            None => self.mappings.iter().filter(|m| m.selected).collect(),
        }
    }

    pub fn mapping_mut(&mut self, table: &TableName, collection: &str) -> Option<&mut TableMapping> {
        self.mappings
            .iter_mut()
            .find(|m| &m.source_table == table && m.target_collection == collection)
    }
}
