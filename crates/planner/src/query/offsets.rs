use crate::query::{
    ast::{
        common::OrderDir,
        expr::{BinaryOperator, Expr},
    },
    builder::select::{FromState, SelectBuilder},
    ident, qualified, value,
};
use model::{
    core::value::Value,
    pagination::cursor::Cursor,
    records::row::ROW_ID,
};

pub trait OffsetStrategy: Send + Sync {
    /// Applies the pagination logic (WHERE, ORDER BY and the row cap) to a SelectBuilder.
    fn apply_to_builder(
        &self,
        builder: SelectBuilder<FromState>,
        cursor: &Cursor,
        limit: usize,
    ) -> SelectBuilder<FromState>;
}

/// Keyset pagination over the `ROW_NUMBER()` ordinal of a derived table.
///
/// The ordinal is recomputed by the engine on every query, so it stays
/// dense and stable as long as the ordering key is unique and rows are
/// only appended.
#[derive(Debug, Clone)]
pub struct RowNumberOffset {
    /// Alias of the derived table that exposes the ordinal column.
    pub alias: String,
}

impl OffsetStrategy for RowNumberOffset {
    fn apply_to_builder(
        &self,
        mut builder: SelectBuilder<FromState>,
        cursor: &Cursor,
        limit: usize,
    ) -> SelectBuilder<FromState> {
        // Cursor::None is the first page of a full resync: no lower bound.
        if let Cursor::Ordinal(last) = cursor {
            let bound = i64::try_from(*last).unwrap_or(i64::MAX);
            builder = builder.where_clause(Expr::binary(
                qualified(&self.alias, ROW_ID),
                BinaryOperator::Gt,
                value(Value::Int(bound)),
            ));
        }

        let cap = i64::try_from(limit).unwrap_or(i64::MAX);
        builder
            .order_by(ident(ROW_ID), Some(OrderDir::Asc))
            .top(value(Value::Int(cap)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::expr::BinaryOp;
    use crate::table_ref;

    fn builder() -> SelectBuilder<FromState> {
        SelectBuilder::new()
            .select(vec![ident("OrderID")])
            .from(table_ref!("dbo", "Orders"), Some("S"))
    }

    fn strategy() -> RowNumberOffset {
        RowNumberOffset {
            alias: "S".to_string(),
        }
    }

    #[test]
    fn test_first_page_has_no_lower_bound() {
        let ast = strategy()
            .apply_to_builder(builder(), &Cursor::None, 25)
            .build();
        assert!(ast.where_clause.is_none());
        assert_eq!(ast.top, Some(value(Value::Int(25))));
        assert_eq!(ast.order_by[0].expr, ident(ROW_ID));
    }

    #[test]
    fn test_continuation_filters_on_ordinal() {
        let ast = strategy()
            .apply_to_builder(builder(), &Cursor::Ordinal(7), 10)
            .build();
        assert_eq!(
            ast.where_clause,
            Some(Expr::BinaryOp(Box::new(BinaryOp {
                left: qualified("S", ROW_ID),
                op: BinaryOperator::Gt,
                right: value(Value::Int(7)),
            })))
        );
    }
}
