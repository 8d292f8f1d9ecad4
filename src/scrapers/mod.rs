pub mod browser;
pub mod extract;
pub mod firecrawl;
pub mod market;
pub mod sites;
pub mod traits;
pub mod types;

pub use browser::BrowserFetcher;
pub use firecrawl::FirecrawlFetcher;
pub use market::MarketScraper;
pub use sites::MarketSite;
pub use traits::{PageFetcher, ScraperTrait};
pub use types::{Page, ScrapeOutcome, SearchParams};
