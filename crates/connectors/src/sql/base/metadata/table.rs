use model::mapping::TableName;

/// A user table that has a primary key, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedTable {
    pub table: TableName,
    /// Leading column of the primary key.
    pub key_column: String,
    pub row_count: u64,
}
