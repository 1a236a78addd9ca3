//! Defines the `Dialect` trait for database-specific SQL syntax.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for the parameter at `index` (zero-based).
    fn get_placeholder(&self, index: usize) -> String;

    /// Returns the name of the dialect.
    fn name(&self) -> String;
}

/// Transact-SQL as understood by SQL Server 2005 and later.
#[derive(Debug, Clone)]
pub struct MsSql;

impl Dialect for MsSql {
    fn quote_identifier(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    fn get_placeholder(&self, index: usize) -> String {
        // TDS RPC parameters are named @P1, @P2, ...
        format!("@P{}", index + 1)
    }

    fn name(&self) -> String {
        "SQL Server".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier_escapes_closing_bracket() {
        assert_eq!(MsSql.quote_identifier("Order Lines"), "[Order Lines]");
        assert_eq!(MsSql.quote_identifier("odd]name"), "[odd]]name]");
    }

    #[test]
    fn test_placeholders_are_one_based() {
        assert_eq!(MsSql.get_placeholder(0), "@P1");
        assert_eq!(MsSql.get_placeholder(4), "@P5");
    }
}
