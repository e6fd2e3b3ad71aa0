pub mod config;
pub mod error;

pub use config::BrainConfig;
pub use error::{BrainError, Result};
