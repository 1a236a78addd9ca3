use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use model::{
    core::{
        data_type::DataType,
        value::{FieldValue, Value},
    },
    records::row::RowData,
};
use std::str::FromStr;
use tiberius::{ColumnData, FromSql, Row};
use tracing::warn;

use crate::sql::base::error::DbError;

/// A TDS result row on its way into the model.
pub struct DbRow(Row);

impl DbRow {
    pub fn new(row: Row) -> Self {
        DbRow(row)
    }

    pub fn into_row_data(self, entity: &str) -> Result<RowData, DbError> {
        let names: Vec<String> = self
            .0
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let field_values = names
            .into_iter()
            .zip(self.0)
            .map(|(name, data)| {
                let value = decode_column(&name, data)?;
                let data_type = value
                    .as_ref()
                    .map(Value::data_type)
                    .unwrap_or(DataType::Null);
                Ok(FieldValue {
                    name,
                    value,
                    data_type,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(RowData::new(entity, field_values))
    }
}

/// Converts one TDS cell. SQL `NULL` becomes `Some(Value::Null)` so that a
/// present-but-null column stays distinguishable from a missing one.
pub fn decode_column(name: &str, data: ColumnData<'static>) -> Result<Option<Value>, DbError> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(Value::Int),
        ColumnData::F32(v) => v.map(|v| Value::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(Value::Float),
        ColumnData::Bit(v) => v.map(Value::Boolean),
        ColumnData::String(v) => v.map(|s| Value::String(s.into_owned())),
        ColumnData::Guid(v) => v.map(Value::Uuid),
        ColumnData::Binary(v) => v.map(|b| Value::Bytes(b.into_owned())),
        ColumnData::Xml(v) => v.map(|x| Value::String(x.into_owned().into_string())),
        ColumnData::Numeric(v) => match v {
            Some(n) => {
                let text = format!("{}E-{}", n.value(), n.scale());
                let decimal = BigDecimal::from_str(&text).map_err(|e| DbError::Decode {
                    column: name.to_string(),
                    message: e.to_string(),
                })?;
                Some(Value::Decimal(decimal))
            }
            None => None,
        },
        ColumnData::DateTimeOffset(_) => {
            from_sql::<DateTime<Utc>>(name, &data)?.map(Value::Timestamp)
        }
        ColumnData::Date(_) => from_sql::<NaiveDate>(name, &data)?.map(Value::Date),
        ColumnData::Time(_) => from_sql::<NaiveTime>(name, &data)?.map(Value::Time),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            // Zone-less SQL Server timestamps are taken as UTC.
            from_sql::<NaiveDateTime>(name, &data)?.map(|dt| Value::Timestamp(dt.and_utc()))
        }
        #[allow(unreachable_patterns)]
        other => {
            return Err(DbError::Decode {
                column: name.to_string(),
                message: format!("unsupported TDS value {other:?}"),
            });
        }
    };

    Ok(Some(value.unwrap_or(Value::Null)))
}

fn from_sql<T>(name: &str, data: &ColumnData<'static>) -> Result<Option<T>, DbError>
where
    T: for<'a> FromSql<'a>,
{
    T::from_sql(data).map_err(|e| {
        warn!(column = name, error = %e, "Failed to decode temporal value");
        DbError::Decode {
            column: name.to_string(),
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use tiberius::numeric::Numeric;

    #[test]
    fn test_decode_integers_widen_to_i64() {
        assert_eq!(
            decode_column("a", ColumnData::I16(Some(-3))).unwrap(),
            Some(Value::Int(-3))
        );
        assert_eq!(
            decode_column("b", ColumnData::U8(Some(200))).unwrap(),
            Some(Value::Int(200))
        );
    }

    #[test]
    fn test_decode_null_is_explicit() {
        assert_eq!(
            decode_column("a", ColumnData::I32(None)).unwrap(),
            Some(Value::Null)
        );
        assert_eq!(
            decode_column("b", ColumnData::String(None)).unwrap(),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_decode_numeric_keeps_scale() {
        let value = decode_column(
            "Total",
            ColumnData::Numeric(Some(Numeric::new_with_scale(12345, 2))),
        )
        .unwrap();
        assert_eq!(
            value,
            Some(Value::Decimal(BigDecimal::from_str("123.45").unwrap()))
        );
    }

    #[test]
    fn test_decode_strings_and_binary() {
        assert_eq!(
            decode_column("Name", ColumnData::String(Some(Cow::Borrowed("Ada")))).unwrap(),
            Some(Value::String("Ada".into()))
        );
        assert_eq!(
            decode_column("Blob", ColumnData::Binary(Some(Cow::Owned(vec![1, 2])))).unwrap(),
            Some(Value::Bytes(vec![1, 2]))
        );
    }
}
