//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// History API client.
pub mod http;

pub use config::{AppConfig, CliArgs, LogLevel};
pub use http::HttpHistoryClient;
