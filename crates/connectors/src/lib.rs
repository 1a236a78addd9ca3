pub mod adapter;
pub mod document;
pub mod error;
pub mod sql;
