use crate::core::data_type::DataType;
use serde::{Deserialize, Serialize};

/// One catalog column of a source table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    /// Type name exactly as the catalog reported it.
    pub declared_type: String,
    pub ordinal: usize,
}

impl ColumnDef {
    pub fn new(name: &str, declared_type: &str, ordinal: usize) -> Self {
        ColumnDef {
            name: name.to_string(),
            data_type: DataType::from_mssql_type(declared_type),
            declared_type: declared_type.to_string(),
            ordinal,
        }
    }
}

/// Ordered column list of a source table, discovered fresh on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnSchema {
    pub table: String,
    columns: Vec<ColumnDef>,
}

impl ColumnSchema {
    pub fn new(table: &str, mut columns: Vec<ColumnDef>) -> Self {
        columns.sort_by_key(|c| c.ordinal);
        ColumnSchema {
            table: table.to_string(),
            columns,
        }
    }

    /// Builds a schema from `(name, type)` pairs, keeping the given order.
    pub fn from_pairs(table: &str, pairs: &[(&str, &str)]) -> Self {
        let columns = pairs
            .iter()
            .enumerate()
            .map(|(idx, (name, ty))| ColumnDef::new(name, ty, idx + 1))
            .collect();
        ColumnSchema::new(table, columns)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn first(&self) -> Option<&ColumnDef> {
        self.columns.first()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Case-insensitive lookup, matching the default SQL Server collation.
    pub fn get(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_follow_catalog_ordinal() {
        let schema = ColumnSchema::new(
            "Orders",
            vec![
                ColumnDef::new("Total", "money", 3),
                ColumnDef::new("OrderID", "int", 1),
                ColumnDef::new("Customer", "nvarchar", 2),
            ],
        );
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["OrderID", "Customer", "Total"]);
        assert_eq!(schema.first().map(|c| c.name.as_str()), Some("OrderID"));
    }

    #[test]
    fn test_lookup_ignores_case() {
        let schema = ColumnSchema::from_pairs("Orders", &[("OrderID", "int")]);
        assert_eq!(schema.get("orderid").map(|c| &c.data_type), Some(&DataType::Int));
        assert!(!schema.contains("missing"));
    }
}
