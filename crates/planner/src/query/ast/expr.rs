//! Defines the AST for SQL expressions.

use crate::query::ast::select::OrderByExpr;
use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `Orders` or `S.RowID`.
    Identifier(Ident),

    /// A literal value. Always rendered as a bound parameter.
    Value(Value),

    /// A binary operation, e.g., `column = @P1`.
    BinaryOp(Box<BinaryOp>),

    /// A function call, e.g., `COUNT(*)`.
    FunctionCall(FunctionCall),

    /// A ranking function evaluated over an ordered window,
    /// e.g. `ROW_NUMBER() OVER (ORDER BY [OrderID] ASC)`.
    Window(WindowFunction),

    /// An aliased expression, e.g. `ROW_NUMBER() OVER (...) AS RowID`.
    Alias { expr: Box<Expr>, alias: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFunction {
    pub function: FunctionCall,
    pub order_by: Vec<OrderByExpr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl Expr {
    pub fn alias(self, alias: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.to_string(),
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }
}
