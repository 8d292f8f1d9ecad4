use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of property being priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum PropertyType {
    #[default]
    Apartment,
    House,
}

impl PropertyType {
    /// French label, as used by the listing sites
    pub fn label_fr(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "appartement",
            PropertyType::House => "maison",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Apartment => write!(f, "apartment"),
            PropertyType::House => write!(f, "house"),
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apartment" | "appartement" | "flat" => Ok(PropertyType::Apartment),
            "house" | "maison" => Ok(PropertyType::House),
            other => Err(format!("unknown property type '{other}' (expected apartment or house)")),
        }
    }
}

impl TryFrom<String> for PropertyType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Site a listing was scraped from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    SeLoger,
    Leboncoin,
    MeilleursAgents,
}

/// What the user wants checked against the market
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuery {
    pub price: f64,
    pub area: f64,
    pub location: String,
    #[serde(default)]
    pub property_type: PropertyType,
}

/// One scraped real-estate advertisement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub price: u64,
    pub area: u32,
    pub location: String,
    pub property_type: PropertyType,
    pub url: String,
    pub title: String,
    pub source: ListingSource,
    pub scraped_at: DateTime<Utc>,
}

impl Listing {
    pub fn price_per_m2(&self) -> Option<f64> {
        (self.area > 0).then(|| self.price as f64 / self.area as f64)
    }
}

/// Where a market estimate's average came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateBasis {
    Listings,
    Blended,
    Reference,
}

/// Estimated local price level for a location and property type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub average_price_per_m2: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price_per_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price_per_m2: Option<f64>,
    pub sample_size: usize,
    pub basis: EstimateBasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchListingsResponse {
    pub listings: Vec<Listing>,
    pub market_data: MarketData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_type_parses_french_and_english() {
        assert_eq!("Maison".parse::<PropertyType>(), Ok(PropertyType::House));
        assert_eq!(" apartment ".parse::<PropertyType>(), Ok(PropertyType::Apartment));
        assert!("castle".parse::<PropertyType>().is_err());
    }

    #[test]
    fn property_type_accepts_any_known_spelling_in_json() {
        let house: PropertyType = serde_json::from_str(r#""Maison""#).unwrap();
        assert_eq!(house, PropertyType::House);
        let flat: PropertyType = serde_json::from_str(r#""appartement""#).unwrap();
        assert_eq!(flat, PropertyType::Apartment);
        assert!(serde_json::from_str::<PropertyType>(r#""castle""#).is_err());
        assert_eq!(serde_json::to_value(PropertyType::House).unwrap(), "house");
    }

    #[test]
    fn price_query_uses_camel_case_fields() {
        let query: PriceQuery = serde_json::from_str(
            r#"{"price": 250000, "area": 45, "location": "Lyon", "propertyType": "house"}"#,
        )
        .unwrap();
        assert_eq!(query.property_type, PropertyType::House);
        assert_eq!(query.area, 45.0);
    }

    #[test]
    fn listing_price_per_m2_ignores_zero_area() {
        let mut listing = Listing {
            price: 300_000,
            area: 60,
            location: "Nantes".to_string(),
            property_type: PropertyType::Apartment,
            url: String::new(),
            title: String::new(),
            source: ListingSource::SeLoger,
            scraped_at: Utc::now(),
        };
        assert_eq!(listing.price_per_m2(), Some(5000.0));
        listing.area = 0;
        assert_eq!(listing.price_per_m2(), None);
    }

    #[test]
    fn market_data_omits_missing_range() {
        let data = MarketData {
            average_price_per_m2: 4200.0,
            min_price_per_m2: None,
            max_price_per_m2: None,
            sample_size: 0,
            basis: EstimateBasis::Reference,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["averagePricePerM2"], 4200.0);
        assert_eq!(json["basis"], "reference");
        assert!(json.get("minPricePerM2").is_none());
    }
}
