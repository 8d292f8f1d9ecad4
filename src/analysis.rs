use crate::config::{ScrapeBackend, ScraperConfig};
use crate::market::MarketEstimator;
use crate::models::{FetchListingsResponse, MarketData, PriceQuery, PropertyType};
use crate::scrapers::{
    BrowserFetcher, FirecrawlFetcher, MarketScraper, PageFetcher, ScraperTrait, SearchParams,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Time given to client-side rendering before reading a page
const BROWSER_SETTLE_SECS: u64 = 8;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PriceQuery {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AnalysisError::InvalidInput(
                "price must be a non-negative number".to_string(),
            ));
        }
        if !self.area.is_finite() || self.area <= 0.0 {
            return Err(AnalysisError::InvalidInput(
                "area must be greater than zero".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(AnalysisError::InvalidInput(
                "location is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn search_params(&self) -> SearchParams {
        SearchParams::new(self.location.trim(), self.property_type, self.area)
    }
}

/// Outcome of comparing an asking price to the market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub user_price: f64,
    pub market_price: f64,
    /// user price minus market price
    pub difference: f64,
    /// difference as a share of the market price, one decimal
    pub percentage_diff: Option<f64>,
    pub is_overpriced: bool,
    pub location: String,
    pub property_type: PropertyType,
    pub area: f64,
    pub average_price_per_m2: f64,
    pub market_data: MarketData,
}

pub fn analyze(query: &PriceQuery, market: &MarketData) -> PriceAnalysis {
    let market_price = (query.area * market.average_price_per_m2).round();
    let difference = query.price - market_price;
    // `+ 0.0` folds a rounded -0.0 into 0.0
    let percentage_diff = (market_price != 0.0)
        .then(|| (difference / market_price * 1000.0).round() / 10.0 + 0.0);

    PriceAnalysis {
        user_price: query.price,
        market_price,
        difference,
        percentage_diff,
        is_overpriced: difference > 0.0,
        location: query.location.trim().to_string(),
        property_type: query.property_type,
        area: query.area,
        average_price_per_m2: market.average_price_per_m2,
        market_data: market.clone(),
    }
}

/// Scrape, estimate, compare
pub struct MarketService {
    scraper: Arc<dyn ScraperTrait>,
    estimator: MarketEstimator,
}

impl MarketService {
    pub fn new(scraper: Arc<dyn ScraperTrait>, estimator: MarketEstimator) -> Self {
        Self { scraper, estimator }
    }

    /// Wire up the configured page fetcher behind a [`MarketScraper`]
    pub fn from_config(config: &ScraperConfig) -> crate::error::Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = match config.backend {
            ScrapeBackend::Firecrawl => Arc::new(FirecrawlFetcher::from_config(config)?),
            ScrapeBackend::Browser => Arc::new(BrowserFetcher::new(Duration::from_secs(
                BROWSER_SETTLE_SECS,
            ))?),
        };

        let scraper = MarketScraper::new(fetcher)
            .with_listings_per_site(config.listings_per_site)
            .with_area_tolerance(config.area_tolerance);

        Ok(Self::new(
            Arc::new(scraper),
            MarketEstimator::new(config.min_samples),
        ))
    }

    pub async fn fetch_listings(&self, params: &SearchParams) -> anyhow::Result<FetchListingsResponse> {
        let outcome = self.scraper.scrape(params).await?;
        let market_data = self.estimator.estimate(params, &outcome);

        info!(
            "{} via {}: {} listings, {:.0} €/m² ({:?})",
            params.location,
            self.scraper.source_name(),
            outcome.listings.len(),
            market_data.average_price_per_m2,
            market_data.basis
        );

        Ok(FetchListingsResponse {
            listings: outcome.listings,
            market_data,
        })
    }

    pub async fn analyze(&self, query: &PriceQuery) -> crate::error::Result<PriceAnalysis> {
        query.validate()?;
        let response = self.fetch_listings(&query.search_params()).await?;
        Ok(analyze(query, &response.market_data))
    }
}
