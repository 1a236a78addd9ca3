pub mod core;
pub mod mapping;
pub mod pagination;
pub mod records;
