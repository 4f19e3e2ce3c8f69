mod collections;
pub mod connector;
mod constants;
