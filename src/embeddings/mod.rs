//! Embedding client
//!
//! Converts text into fixed-length vectors through a remote model. The
//! `EmbeddingBackend` seam lets tests substitute a deterministic model.

mod client;
mod config;
mod error;
mod http;


pub use client::{EmbeddingBackend, EmbeddingClient};
pub use config::{EmbeddingConfig, EmbeddingFormat};
pub use error::{EmbeddingError, EmbeddingResult};
pub use http::HttpEmbeddingBackend;
