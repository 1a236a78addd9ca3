//! Common AST nodes shared by the query types.

use model::mapping::TableName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl From<&TableName> for TableRef {
    fn from(table: &TableName) -> Self {
        TableRef {
            schema: Some(table.schema_or_default().to_string()),
            name: table.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
