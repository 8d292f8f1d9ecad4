use crate::models::{Listing, PropertyType};
use serde::{Deserialize, Serialize};

/// Search parameters for a market lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Town or area to search in
    pub location: String,
    #[serde(default)]
    pub property_type: PropertyType,
    /// Target surface in m², listings are matched around it
    pub area: f64,
    /// City used for reference prices, when it differs from `location`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl SearchParams {
    pub fn new(location: impl Into<String>, property_type: PropertyType, area: f64) -> Self {
        Self {
            location: location.into(),
            property_type,
            area,
            city: None,
        }
    }

    /// City name to use for reference-table lookups
    pub fn reference_city(&self) -> &str {
        self.city
            .as_deref()
            .filter(|city| !city.trim().is_empty())
            .unwrap_or(&self.location)
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new("Paris", PropertyType::Apartment, 50.0)
    }
}

/// A fetched page, in whichever formats the fetcher could provide
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub url: String,
    pub markdown: Option<String>,
    pub html: Option<String>,
}

/// Everything a scrape run produced
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutcome {
    pub listings: Vec<Listing>,
    /// €/m² figures quoted directly on market pages
    pub quoted_prices_per_m2: Vec<f64>,
}

impl ScrapeOutcome {
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty() && self.quoted_prices_per_m2.is_empty()
    }
}
