use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

/// Column type tags as reported by the SQL Server catalog
/// (`INFORMATION_SCHEMA.COLUMNS.DATA_TYPE`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DataType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Bit,
    Decimal,
    Numeric,
    Money,
    SmallMoney,
    Float,
    Real,
    Date,
    Time,
    DateTime,
    DateTime2,
    SmallDateTime,
    DateTimeOffset,
    Char,
    VarChar,
    Text,
    NChar,
    NVarChar,
    NText,
    Binary,
    VarBinary,
    Image,
    UniqueIdentifier,
    Xml,
    Null,
    Custom(String),
}

lazy_static! {
    static ref MSSQL_TYPE_MAP: HashMap<&'static str, DataType> = build_mssql_type_map();
}

impl DataType {
    /// Resolves a catalog type name. Unknown names (user-defined types,
    /// `geography`, `sql_variant`, ...) are kept as [`DataType::Custom`].
    pub fn from_mssql_type(type_name: &str) -> Self {
        let normalized = Self::normalize_type_name(type_name);
        MSSQL_TYPE_MAP
            .get(normalized.as_str())
            .cloned()
            .unwrap_or_else(|| DataType::Custom(normalized))
    }

    pub fn mssql_name(&self) -> Cow<'_, str> {
        match self {
            DataType::TinyInt => Cow::Borrowed("tinyint"),
            DataType::SmallInt => Cow::Borrowed("smallint"),
            DataType::Int => Cow::Borrowed("int"),
            DataType::BigInt => Cow::Borrowed("bigint"),
            DataType::Bit => Cow::Borrowed("bit"),
            DataType::Decimal => Cow::Borrowed("decimal"),
            DataType::Numeric => Cow::Borrowed("numeric"),
            DataType::Money => Cow::Borrowed("money"),
            DataType::SmallMoney => Cow::Borrowed("smallmoney"),
            DataType::Float => Cow::Borrowed("float"),
            DataType::Real => Cow::Borrowed("real"),
            DataType::Date => Cow::Borrowed("date"),
            DataType::Time => Cow::Borrowed("time"),
            DataType::DateTime => Cow::Borrowed("datetime"),
            DataType::DateTime2 => Cow::Borrowed("datetime2"),
            DataType::SmallDateTime => Cow::Borrowed("smalldatetime"),
            DataType::DateTimeOffset => Cow::Borrowed("datetimeoffset"),
            DataType::Char => Cow::Borrowed("char"),
            DataType::VarChar => Cow::Borrowed("varchar"),
            DataType::Text => Cow::Borrowed("text"),
            DataType::NChar => Cow::Borrowed("nchar"),
            DataType::NVarChar => Cow::Borrowed("nvarchar"),
            DataType::NText => Cow::Borrowed("ntext"),
            DataType::Binary => Cow::Borrowed("binary"),
            DataType::VarBinary => Cow::Borrowed("varbinary"),
            DataType::Image => Cow::Borrowed("image"),
            DataType::UniqueIdentifier => Cow::Borrowed("uniqueidentifier"),
            DataType::Xml => Cow::Borrowed("xml"),
            DataType::Null => Cow::Borrowed("null"),
            DataType::Custom(name) => Cow::Borrowed(name),
        }
    }

    /// Integer types that fit a 32-bit signed value.
    pub fn is_narrow_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt | DataType::SmallInt | DataType::Int
        )
    }

    pub fn is_integer(&self) -> bool {
        self.is_narrow_integer() || matches!(self, DataType::BigInt)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Date
                | DataType::Time
                | DataType::DateTime
                | DataType::DateTime2
                | DataType::SmallDateTime
                | DataType::DateTimeOffset
        )
    }

    /// Whether SQL Server accepts the type in an `ORDER BY` clause.
    /// Legacy LOB types and `xml` are rejected by the engine.
    pub fn is_orderable(&self) -> bool {
        !matches!(
            self,
            DataType::Text | DataType::NText | DataType::Image | DataType::Xml
        ) && !matches!(self, DataType::Custom(name) if name == "geography" || name == "geometry" || name == "hierarchyid")
    }

    fn normalize_type_name(type_name: &str) -> String {
        // Catalog names never carry a length, but user input such as
        // `nvarchar(50)` or `NVARCHAR(MAX)` is accepted as well.
        let base = type_name.split('(').next().unwrap_or(type_name);
        base.trim().to_ascii_lowercase()
    }
}

impl From<&str> for DataType {
    fn from(type_name: &str) -> Self {
        DataType::from_mssql_type(type_name)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mssql_name())
    }
}

fn build_mssql_type_map() -> HashMap<&'static str, DataType> {
    [
        ("tinyint", DataType::TinyInt),
        ("smallint", DataType::SmallInt),
        ("int", DataType::Int),
        ("integer", DataType::Int),
        ("bigint", DataType::BigInt),
        ("bit", DataType::Bit),
        ("decimal", DataType::Decimal),
        ("dec", DataType::Decimal),
        ("numeric", DataType::Numeric),
        ("money", DataType::Money),
        ("smallmoney", DataType::SmallMoney),
        ("float", DataType::Float),
        ("real", DataType::Real),
        ("date", DataType::Date),
        ("time", DataType::Time),
        ("datetime", DataType::DateTime),
        ("datetime2", DataType::DateTime2),
        ("smalldatetime", DataType::SmallDateTime),
        ("datetimeoffset", DataType::DateTimeOffset),
        ("char", DataType::Char),
        ("varchar", DataType::VarChar),
        ("text", DataType::Text),
        ("nchar", DataType::NChar),
        ("nvarchar", DataType::NVarChar),
        ("sysname", DataType::NVarChar),
        ("ntext", DataType::NText),
        ("binary", DataType::Binary),
        ("varbinary", DataType::VarBinary),
        ("timestamp", DataType::Binary),
        ("rowversion", DataType::Binary),
        ("image", DataType::Image),
        ("uniqueidentifier", DataType::UniqueIdentifier),
        ("xml", DataType::Xml),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mssql_type_normalizes_names() {
        assert_eq!(DataType::from_mssql_type("INT"), DataType::Int);
        assert_eq!(DataType::from_mssql_type("nvarchar(max)"), DataType::NVarChar);
        assert_eq!(DataType::from_mssql_type(" datetime2 "), DataType::DateTime2);
        assert_eq!(
            DataType::from_mssql_type("geography"),
            DataType::Custom("geography".into())
        );
    }

    #[test]
    fn test_rowversion_is_binary() {
        assert_eq!(DataType::from_mssql_type("timestamp"), DataType::Binary);
    }

    #[test]
    fn test_orderable_types() {
        assert!(DataType::Int.is_orderable());
        assert!(DataType::NVarChar.is_orderable());
        assert!(!DataType::NText.is_orderable());
        assert!(!DataType::Xml.is_orderable());
        assert!(!DataType::Custom("geography".into()).is_orderable());
    }
}
