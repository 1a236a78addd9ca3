//! End-to-end scenarios for the sync engine, run against in-memory
//! stand-ins for SQL Server and MongoDB.

pub mod utils;

mod engine;
