pub mod errors;
pub mod memory_store;
pub mod queue;
pub mod sink;
pub mod worker;
