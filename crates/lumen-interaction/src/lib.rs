//! HTTP implementation of the insight backend client.

mod client;
mod wire;

// Re-export public API
pub use client::HttpApiClient;
