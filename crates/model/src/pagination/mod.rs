pub mod cursor;
pub mod page_size;
