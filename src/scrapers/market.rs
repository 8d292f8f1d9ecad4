use crate::scrapers::extract::{self, ExtractContext};
use crate::scrapers::sites::MarketSite;
use crate::scrapers::traits::{PageFetcher, ScraperTrait};
use crate::scrapers::types::{Page, ScrapeOutcome, SearchParams};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Queries each real-estate site in turn and pulls listings and €/m² figures
pub struct MarketScraper {
    fetcher: Arc<dyn PageFetcher>,
    sites: Vec<MarketSite>,
    listings_per_site: usize,
    area_tolerance: f64,
}

impl MarketScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            sites: MarketSite::ALL.to_vec(),
            listings_per_site: 5,
            area_tolerance: 20.0,
        }
    }

    pub fn with_sites(mut self, sites: Vec<MarketSite>) -> Self {
        self.sites = sites;
        self
    }

    pub fn with_listings_per_site(mut self, limit: usize) -> Self {
        self.listings_per_site = limit;
        self
    }

    pub fn with_area_tolerance(mut self, tolerance: f64) -> Self {
        self.area_tolerance = tolerance;
        self
    }

    fn extract(&self, site: MarketSite, page: &Page, params: &SearchParams) -> ScrapeOutcome {
        let ctx = ExtractContext {
            location: &params.location,
            property_type: params.property_type,
            source: site.source(),
        };

        let mut listings = page
            .html
            .as_deref()
            .map(|html| extract::listings_from_html(html, site.base_url(), &ctx))
            .unwrap_or_default();

        if listings.is_empty() {
            if let Some(markdown) = page.markdown.as_deref() {
                listings = extract::listings_from_markdown(markdown, &ctx);
            }
        }
        listings.truncate(self.listings_per_site);

        // markdown is cleaner text when we have it
        let quoted_prices_per_m2 = page
            .markdown
            .as_deref()
            .or(page.html.as_deref())
            .map(extract::price_per_m2_figures)
            .unwrap_or_default();

        ScrapeOutcome {
            listings,
            quoted_prices_per_m2,
        }
    }
}

#[async_trait]
impl ScraperTrait for MarketScraper {
    async fn scrape(&self, params: &SearchParams) -> Result<ScrapeOutcome> {
        info!(
            "Starting market scrape for {} {} around {} m² via {}",
            params.property_type,
            params.location,
            params.area,
            self.fetcher.backend_name()
        );

        let mut outcome = ScrapeOutcome::default();

        for site in &self.sites {
            let url = site.search_url(params);
            info!("Crawling URL: {}", url);

            // one broken site must not sink the others
            let page = match self.fetcher.fetch_page(&url).await {
                Ok(page) => page,
                Err(err) => {
                    warn!("Error crawling {}: {:#}", url, err);
                    continue;
                }
            };

            let found = self.extract(*site, &page, params);
            debug!(
                "{} gave {} listings and {} €/m² figures",
                url,
                found.listings.len(),
                found.quoted_prices_per_m2.len()
            );

            outcome.listings.extend(found.listings);
            outcome
                .quoted_prices_per_m2
                .extend(found.quoted_prices_per_m2);
        }

        let before = outcome.listings.len();
        outcome
            .listings
            .retain(|listing| (listing.area as f64 - params.area).abs() <= self.area_tolerance);

        info!(
            "Kept {} of {} listings within {} m² of the target, {} quoted €/m² figures",
            outcome.listings.len(),
            before,
            self.area_tolerance,
            outcome.quoted_prices_per_m2.len()
        );

        Ok(outcome)
    }

    fn source_name(&self) -> &'static str {
        "market"
    }
}
