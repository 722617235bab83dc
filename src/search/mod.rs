//! Web search module
//!
//! Retrieves the provider's HTML results page, detects anti-bot
//! challenges and extracts a bounded list of hits for prompt assembly.

mod extractor;
mod models;
mod retriever;
mod traits;

pub use extractor::{extract, extract_limited, MAX_HITS};
pub use models::*;
pub use retriever::Retriever;
pub use traits::*;
