//! Voxtail - incremental message-list synchronization for chat channels.
//!
//! This crate maintains a sliding window over a channel's message history,
//! merges live gateway events into it, and projects the result into a
//! renderable entry list with dividers and grouping.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the window, cache, and projection services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "voxtail";
