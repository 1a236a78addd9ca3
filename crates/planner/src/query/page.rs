//! Windowed page queries: every row of the source table is ranked with
//! `ROW_NUMBER()` over a deterministic ordering, and each page selects the
//! next `TOP (n)` rows whose ordinal exceeds the cursor.

use crate::query::{
    ast::{
        common::{OrderDir, TableRef},
        expr::{Expr, FunctionCall, WindowFunction},
        select::{OrderByExpr, Select},
    },
    builder::select::SelectBuilder,
    dialect::MsSql,
    error::QueryError,
    ident,
    offsets::{OffsetStrategy, RowNumberOffset},
    renderer::{Render, Renderer},
};
use model::{
    core::{schema::ColumnSchema, value::Value},
    mapping::TableName,
    pagination::{cursor::Cursor, page_size::PageSize},
    records::row::ROW_ID,
};

/// Alias of the derived table that carries the ordinal.
pub const WINDOW_ALIAS: &str = "windowed";

/// A rendered page query together with the logical description it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub table: TableName,
    pub columns: Vec<String>,
    pub order_by: Vec<String>,
    pub page_size: PageSize,
    pub cursor: Cursor,
    pub sql: String,
    pub params: Vec<Value>,
}

/// Resolves the ranking key.
///
/// A configured column is used alone. Without one, the first orderable column
/// leads and every other orderable column follows as a tie-breaker, so the
/// ranking stays deterministic as long as rows are distinct.
pub fn ordering_columns(
    schema: &ColumnSchema,
    ordering_column: Option<&str>,
) -> Result<Vec<String>, QueryError> {
    if schema.is_empty() {
        return Err(QueryError::EmptySchema(schema.table.clone()));
    }

    if let Some(column) = ordering_column {
        return match schema.get(column) {
            Some(def) => Ok(vec![def.name.clone()]),
            None => Err(QueryError::UnknownColumn {
                table: schema.table.clone(),
                column: column.to_string(),
            }),
        };
    }

    let orderable: Vec<String> = schema
        .columns()
        .iter()
        .filter(|c| c.data_type.is_orderable())
        .map(|c| c.name.clone())
        .collect();

    if orderable.is_empty() {
        return Err(QueryError::NoOrderableColumn(schema.table.clone()));
    }
    Ok(orderable)
}

pub fn build_page_query(
    schema: &ColumnSchema,
    ordering_column: Option<&str>,
    page_size: impl Into<PageSize>,
    table: &TableName,
    cursor: &Cursor,
) -> Result<PageQuery, QueryError> {
    let page_size = page_size.into();
    let order_by = ordering_columns(schema, ordering_column)?;
    let columns: Vec<String> = schema.names().map(str::to_string).collect();

    let row_number = Expr::Window(WindowFunction {
        function: FunctionCall {
            name: "ROW_NUMBER".to_string(),
            args: Vec::new(),
            wildcard: false,
        },
        order_by: order_by
            .iter()
            .map(|c| OrderByExpr {
                expr: ident(c),
                direction: Some(OrderDir::Asc),
            })
            .collect(),
    })
    .alias(ROW_ID);

    let mut inner_columns: Vec<Expr> = columns.iter().map(|c| ident(c)).collect();
    inner_columns.push(row_number);

    let ranked = SelectBuilder::new()
        .select(inner_columns)
        .from(TableRef::from(table), None)
        .build();

    let mut outer_columns: Vec<Expr> = columns.iter().map(|c| ident(c)).collect();
    outer_columns.push(ident(ROW_ID));

    let strategy = RowNumberOffset {
        alias: WINDOW_ALIAS.to_string(),
    };
    let builder = SelectBuilder::new()
        .select(outer_columns)
        .from_subquery(ranked, WINDOW_ALIAS);
    let select = strategy
        .apply_to_builder(builder, cursor, page_size.get())
        .build();

    let (sql, params) = render(&select);

    Ok(PageQuery {
        table: table.clone(),
        columns,
        order_by,
        page_size,
        cursor: *cursor,
        sql,
        params,
    })
}

fn render(select: &Select) -> (String, Vec<Value>) {
    let mut renderer = Renderer::new(&MsSql);
    select.render(&mut renderer);
    renderer.finish()
}
