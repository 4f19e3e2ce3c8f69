pub mod errors;
pub mod normalizer;
pub mod strategies;
pub mod structures;
pub(crate) mod utils;
