use model::core::value::Value;
use tiberius::Query;

/// Binds model values to `@P1..@Pn` in order.
pub fn bind_values<'a>(query: &mut Query<'a>, params: &[Value]) {
    for param in params {
        match param {
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Boolean(v) => query.bind(*v),
            Value::String(v) => query.bind(v.clone()),
            Value::Uuid(v) => query.bind(*v),
            Value::Bytes(v) => query.bind(v.clone()),
            Value::Date(v) => query.bind(*v),
            Value::Time(v) => query.bind(*v),
            Value::Timestamp(v) => query.bind(v.naive_utc()),
            Value::Decimal(v) => query.bind(v.to_string()),
            Value::Null => query.bind(Option::<i64>::None),
        }
    }
}
