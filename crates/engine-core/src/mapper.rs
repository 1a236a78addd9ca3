//! Stateless conversion of source rows into target documents.

use crate::error::SyncError;
use connectors::document::bson::{
    self, Binary, Bson, Document,
    spec::BinarySubtype,
};
use chrono::{NaiveTime, Utc, DateTime};
use model::{
    core::{data_type::DataType, schema::ColumnSchema, value::Value},
    records::row::{ROW_ID, RowData},
};

/// Field that holds the document identity in the target.
pub const IDENTITY_FIELD: &str = "_id";

/// Builds the document for one row.
///
/// Every schema column is copied under its own name, except the primary key
/// column (matched case-insensitively) which is written to `_id`. The row
/// ordinal is always appended as an `Int64` `RowID` field.
pub fn map_row(
    schema: &ColumnSchema,
    row: &RowData,
    primary_key: Option<&str>,
) -> Result<Document, SyncError> {
    let mut document = Document::new();

    for column in schema.columns() {
        let field = row.get(&column.name).ok_or_else(|| {
            SyncError::mapping(
                &schema.table,
                format!("row is missing column '{}'", column.name),
            )
        })?;

        let value = field.value.as_ref().unwrap_or(&Value::Null);
        let key = match primary_key {
            Some(pk) if pk.eq_ignore_ascii_case(&column.name) => IDENTITY_FIELD,
            _ => column.name.as_str(),
        };
        document.insert(key, to_bson(value, &column.data_type));
    }

    let ordinal = row.ordinal().ok_or_else(|| {
        SyncError::mapping(&schema.table, format!("row has no readable '{ROW_ID}' value"))
    })?;
    let ordinal = i64::try_from(ordinal).map_err(|_| {
        SyncError::mapping(&schema.table, format!("ordinal {ordinal} exceeds Int64"))
    })?;
    document.insert(ROW_ID, Bson::Int64(ordinal));

    Ok(document)
}

pub fn map_page(
    schema: &ColumnSchema,
    rows: &[RowData],
    primary_key: Option<&str>,
) -> Result<Vec<Document>, SyncError> {
    rows.iter()
        .map(|row| map_row(schema, row, primary_key))
        .collect()
}

/// Converts one value using the declared column type to pick the BSON type.
/// Values without a lossless BSON counterpart are written as strings.
pub fn to_bson(value: &Value, declared: &DataType) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Int(v) if declared.is_narrow_integer() => match i32::try_from(*v) {
            Ok(narrow) => Bson::Int32(narrow),
            Err(_) => Bson::Int64(*v),
        },
        Value::Int(v) => match declared {
            DataType::Bit => Bson::Boolean(*v != 0),
            DataType::Float | DataType::Real => Bson::Double(*v as f64),
            DataType::Money | DataType::SmallMoney | DataType::Decimal | DataType::Numeric => {
                Bson::String(v.to_string())
            }
            _ => Bson::Int64(*v),
        },
        Value::Float(v) => match declared {
            DataType::Money | DataType::SmallMoney | DataType::Decimal | DataType::Numeric => {
                Bson::String(v.to_string())
            }
            _ => Bson::Double(*v),
        },
        Value::Decimal(v) => Bson::String(v.normalized().to_string()),
        Value::Boolean(v) => Bson::Boolean(*v),
        Value::String(v) => Bson::String(v.clone()),
        Value::Uuid(v) => Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: v.as_bytes().to_vec(),
        }),
        Value::Bytes(v) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: v.clone(),
        }),
        Value::Date(v) => date_time(v.and_time(NaiveTime::MIN).and_utc()),
        Value::Timestamp(v) => date_time(*v),
        Value::Time(v) => Bson::String(v.to_string()),
    }
}

fn date_time(value: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(value.timestamp_millis()))
}
