use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// Name of the surrogate ordinal column added by the windowed page query.
pub const ROW_ID: &str = "RowID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    /// The surrogate ordinal assigned by the page query, if present and numeric.
    pub fn ordinal(&self) -> Option<u64> {
        self.get(ROW_ID)
            .and_then(|f| f.value.as_ref())
            .and_then(Value::as_i64)
            .and_then(|v| u64::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_type::DataType;

    #[test]
    fn test_ordinal_reads_row_id() {
        let row = RowData::new(
            "Orders",
            vec![
                FieldValue::new("OrderID", Some(Value::Int(10)), DataType::Int),
                FieldValue::new("rowid", Some(Value::Int(3)), DataType::BigInt),
            ],
        );
        assert_eq!(row.ordinal(), Some(3));
        assert_eq!(row.get_value("ORDERID"), Value::Int(10));
        assert_eq!(row.get_value("missing"), Value::Null);
    }

    #[test]
    fn test_ordinal_missing_or_negative() {
        let row = RowData::new("Orders", vec![]);
        assert_eq!(row.ordinal(), None);

        let row = RowData::new(
            "Orders",
            vec![FieldValue::new(ROW_ID, Some(Value::Int(-1)), DataType::BigInt)],
        );
        assert_eq!(row.ordinal(), None);
    }
}
