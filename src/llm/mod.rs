//! Language model module
//!
//! Defines the completion service boundary and the Ollama backend.

mod ollama;
mod traits;

pub use ollama::OllamaClient;
pub use traits::*;
