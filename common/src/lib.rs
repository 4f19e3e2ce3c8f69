pub mod constants;
pub mod deserialize_disallow_empty_string;
pub mod entities;
pub mod modes;
pub mod record;
pub mod store;
