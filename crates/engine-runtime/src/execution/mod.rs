pub mod executor;
pub mod factory;
pub mod options;
pub mod pipeline;
pub mod probe;
