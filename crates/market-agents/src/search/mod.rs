//! Web Search Integration

mod duckduckgo;

pub use duckduckgo::DuckDuckGoClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SearchHit;

/// Web search backend
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Run a query and return at most `max_results` hits, best first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    fn name(&self) -> &str;
}
