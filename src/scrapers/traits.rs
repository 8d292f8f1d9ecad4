use crate::scrapers::types::{Page, ScrapeOutcome, SearchParams};
use anyhow::Result;
use async_trait::async_trait;

/// Fetches a single page from a listing site
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<Page>;

    /// Name of the backend, for logs
    fn backend_name(&self) -> &'static str;
}

/// Common trait for all market scrapers
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Scrape listings and quoted €/m² figures matching the search
    async fn scrape(&self, params: &SearchParams) -> Result<ScrapeOutcome>;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
