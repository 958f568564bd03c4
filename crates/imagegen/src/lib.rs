//! Image generation provider client.
//!
//! Wraps the provider's text-to-image and image-edit HTTP endpoints, decodes
//! inline or URL image payloads, and caches artifacts on disk per job key.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod prompt;

pub use client::GenerationClient;
