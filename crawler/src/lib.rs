pub mod errors;
pub mod protected;
pub mod request;
pub mod traits;
pub mod unprotected;
