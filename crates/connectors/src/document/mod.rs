pub mod base;
pub mod mongo;

/// BSON types shared by every crate that builds or inspects target documents.
pub use mongodb::bson;
