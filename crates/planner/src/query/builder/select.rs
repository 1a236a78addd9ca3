//! Provides a type-safe, fluent builder for constructing `Select` ASTs.

// Zero-sized markers that enforce clause order at compile time.

use crate::query::ast::{
    common::{OrderDir, TableRef},
    expr::{BinaryOperator, Expr},
    select::{FromClause, FromSource, OrderByExpr, Select},
};

/// The initial state of the builder before any clauses have been added.
#[derive(Debug, Default, Clone)]
pub struct InitialState;

/// The state after the `SELECT` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct SelectState;

/// The state after the `FROM` clause has been added.
#[derive(Debug, Default, Clone)]
pub struct FromState;

#[derive(Debug, Clone)]
pub struct SelectBuilder<State> {
    pub ast: Select,
    state: State,
}

impl Default for SelectBuilder<InitialState> {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectBuilder<InitialState> {
    pub fn new() -> Self {
        Self {
            ast: Select::default(),
            state: InitialState,
        }
    }

    /// Adds a `SELECT` clause with a list of columns.
    pub fn select(mut self, columns: Vec<Expr>) -> SelectBuilder<SelectState> {
        self.ast.columns = columns;
        SelectBuilder {
            ast: self.ast,
            state: SelectState,
        }
    }
}

impl SelectBuilder<SelectState> {
    /// Reads from a base table.
    pub fn from(self, table: TableRef, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.with_source(FromSource::Table(table), alias)
    }

    /// Reads from a derived table. SQL Server requires the alias.
    pub fn from_subquery(self, subquery: Select, alias: &str) -> SelectBuilder<FromState> {
        self.with_source(FromSource::Subquery(Box::new(subquery)), Some(alias))
    }

    fn with_source(mut self, source: FromSource, alias: Option<&str>) -> SelectBuilder<FromState> {
        self.ast.from = Some(FromClause {
            source,
            alias: alias.map(String::from),
        });
        SelectBuilder {
            ast: self.ast,
            state: FromState,
        }
    }
}

impl SelectBuilder<FromState> {
    /// Caps the number of returned rows (`TOP (n)`).
    pub fn top(mut self, count: Expr) -> Self {
        self.ast.top = Some(count);
        self
    }

    /// Sets the `WHERE` clause, combining with an existing one through `AND`.
    pub fn where_clause(mut self, condition: Expr) -> Self {
        self.ast.where_clause = Some(match self.ast.where_clause.take() {
            Some(existing) => Expr::binary(existing, BinaryOperator::And, condition),
            None => condition,
        });
        self
    }

    /// Adds an `ORDER BY` clause to the query.
    pub fn order_by(mut self, expr: Expr, direction: Option<OrderDir>) -> Self {
        self.ast.order_by.push(OrderByExpr { expr, direction });
        self
    }

    /// Finalizes and returns the constructed `Select` AST.
    pub fn build(self) -> Select {
        self.ast
    }
}
