//! Raw shape of the settings document as stored on disk.
//!
//! ```xml
//! <SQLToMongo>
//!   <Mapping SQLConnection="..." MongoConnection="mongodb://host/db">
//!     <Table SQLTable="Orders" MongoCollection="orders" PrimaryKeyColumn="OrderID"
//!            PageSize="500" LastSyncIdentity="" IsSelected="True"/>
//!   </Mapping>
//! </SQLToMongo>
//! ```
//!
//! Every attribute is kept as text here; [`super::validated`] turns the
//! document into checked model types.

use crate::error::ConfigError;
use quick_xml::{Reader, events::Event};
use serde::{Deserialize, Serialize};

pub const ROOT_ELEMENT: &str = "SQLToMongo";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(rename = "Mapping", default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingElement {
    #[serde(rename = "@SQLConnection", default)]
    pub sql_connection: Option<String>,
    #[serde(rename = "@MongoConnection", default)]
    pub mongo_connection: Option<String>,
    #[serde(rename = "Table", default)]
    pub tables: Vec<TableElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableElement {
    #[serde(rename = "@SQLTable", default)]
    pub sql_table: Option<String>,
    #[serde(rename = "@MongoCollection", default)]
    pub mongo_collection: Option<String>,
    #[serde(rename = "@PrimaryKeyColumn", default)]
    pub primary_key_column: Option<String>,
    #[serde(rename = "@PageSize", default)]
    pub page_size: Option<String>,
    #[serde(rename = "@LastSyncIdentity", default)]
    pub last_sync_identity: Option<String>,
    #[serde(rename = "@IsSelected", default)]
    pub is_selected: Option<String>,
}

impl SettingsDocument {
    pub fn from_xml(xml: &str) -> Result<Self, ConfigError> {
        let root = root_element(xml)?;
        if root != ROOT_ELEMENT {
            return Err(ConfigError::InvalidRoot(root));
        }
        Ok(quick_xml::de::from_str(xml)?)
    }

    pub fn to_xml(&self) -> Result<String, ConfigError> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some(ROOT_ELEMENT))
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(format!("{XML_DECLARATION}\n{body}\n"))
    }
}

/// Name of the first element, skipping the declaration and comments.
fn root_element(xml: &str) -> Result<String, ConfigError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err(ConfigError::InvalidRoot(String::new())),
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<SQLToMongo>
  <Mapping SQLConnection="server=tcp:localhost,1433;database=shop" MongoConnection="mongodb://localhost:27017/shop">
    <Table SQLTable="Orders" MongoCollection="orders" PrimaryKeyColumn="OrderID" PageSize="500" LastSyncIdentity="1200" IsSelected="True" />
    <Table SQLTable="sales.Customers" MongoCollection="customers" PrimaryKeyColumn="" PageSize="0" LastSyncIdentity="" IsSelected="False" />
  </Mapping>
</SQLToMongo>"#;

    #[test]
    fn test_parse_attributes() {
        let doc = SettingsDocument::from_xml(SAMPLE).unwrap();
        let mapping = doc.mapping.unwrap();

        assert_eq!(
            mapping.mongo_connection.as_deref(),
            Some("mongodb://localhost:27017/shop")
        );
        assert_eq!(mapping.tables.len(), 2);
        assert_eq!(mapping.tables[0].last_sync_identity.as_deref(), Some("1200"));
        assert_eq!(mapping.tables[1].sql_table.as_deref(), Some("sales.Customers"));
        assert_eq!(mapping.tables[1].is_selected.as_deref(), Some("False"));
    }

    #[test]
    fn test_empty_root_has_no_mapping() {
        let doc = SettingsDocument::from_xml("<SQLToMongo></SQLToMongo>").unwrap();
        assert!(doc.mapping.is_none());
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = SettingsDocument::from_xml("<Settings><Mapping/></Settings>").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot(root) if root == "Settings"));
    }

    #[test]
    fn test_written_document_reads_back() {
        let doc = SettingsDocument::from_xml(SAMPLE).unwrap();
        let xml = doc.to_xml().unwrap();

        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("<SQLToMongo>"));
        assert!(xml.contains(r#"LastSyncIdentity="1200""#));
        assert_eq!(SettingsDocument::from_xml(&xml).unwrap(), doc);
    }
}
