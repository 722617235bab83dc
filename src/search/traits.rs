//! Search capability traits

use super::models::{SearchError, SearchOutcome};
use async_trait::async_trait;
use std::time::Duration;

/// A search capability the assistant can invoke
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Short description of what the tool searches
    fn description(&self) -> &str;

    /// Run a search for `query`
    async fn invoke(&self, query: &str) -> Result<SearchOutcome, SearchError>;
}

/// Delay applied before each outbound search request
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait]
impl Pause for NoPause {
    async fn pause(&self, _duration: Duration) {}
}
