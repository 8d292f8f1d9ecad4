pub mod reference;

use crate::models::{EstimateBasis, MarketData};
use crate::scrapers::extract::PLAUSIBLE_PRICE_PER_M2;
use crate::scrapers::types::{ScrapeOutcome, SearchParams};
use tracing::debug;

pub use reference::reference_price_per_m2;

/// Turns scrape results into a single €/m² estimate
#[derive(Debug, Clone)]
pub struct MarketEstimator {
    min_samples: usize,
}

impl Default for MarketEstimator {
    fn default() -> Self {
        Self { min_samples: 3 }
    }
}

impl MarketEstimator {
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples: min_samples.max(1),
        }
    }

    pub fn estimate(&self, params: &SearchParams, outcome: &ScrapeOutcome) -> MarketData {
        let samples: Vec<f64> = outcome
            .listings
            .iter()
            .filter_map(|listing| listing.price_per_m2())
            .chain(outcome.quoted_prices_per_m2.iter().copied())
            .filter(|value| PLAUSIBLE_PRICE_PER_M2.contains(value))
            .collect();

        let reference = reference_price_per_m2(params.reference_city(), params.property_type);
        if !reference::is_known_city(params.reference_city()) {
            debug!(
                "{} has no reference entry, using the national average",
                params.reference_city()
            );
        }

        if samples.is_empty() {
            debug!(
                "No usable samples for {}, using reference {} €/m²",
                params.reference_city(),
                reference
            );
            return MarketData {
                average_price_per_m2: reference.round(),
                min_price_per_m2: None,
                max_price_per_m2: None,
                sample_size: 0,
                basis: EstimateBasis::Reference,
            };
        }

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let (average, basis) = if samples.len() >= self.min_samples {
            (mean, EstimateBasis::Listings)
        } else {
            ((mean + reference) / 2.0, EstimateBasis::Blended)
        };

        debug!(
            "{} samples for {}: mean {:.0}, reference {:.0}, basis {:?}",
            samples.len(),
            params.reference_city(),
            mean,
            reference,
            basis
        );

        MarketData {
            average_price_per_m2: average.round(),
            min_price_per_m2: Some(min.round()),
            max_price_per_m2: Some(max.round()),
            sample_size: samples.len(),
            basis,
        }
    }
}
