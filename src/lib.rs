pub mod advice;
pub mod advisor;
pub mod config;
pub mod error;
pub mod http_client;
pub mod identity;
pub mod stats_client;

pub use error::{AdvisorError, ConfigError};
