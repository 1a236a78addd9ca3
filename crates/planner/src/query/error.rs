use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Ordering column '{column}' does not exist in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Cannot page over table '{0}': it has no columns")]
    EmptySchema(String),

    #[error("Cannot page over table '{0}': no column can be used in ORDER BY")]
    NoOrderableColumn(String),
}
