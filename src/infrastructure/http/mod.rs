//! HTTP transport for the message history API.

pub mod client;
pub mod dto;

pub use client::HttpHistoryClient;
