pub mod config;
pub mod error;
pub mod identity;
pub mod rate_limit;
pub mod server;
pub mod stability;

pub use error::{Error, Result};
