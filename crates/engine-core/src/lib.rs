pub mod cursor;
pub mod error;
pub mod listener;
pub mod loader;
pub mod mapper;
pub mod metrics;
pub mod report;
pub mod retry;
pub mod schema;
