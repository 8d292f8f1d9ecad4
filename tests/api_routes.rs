use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use immo_price_scout::market::MarketEstimator;
use immo_price_scout::models::{Listing, ListingSource, PropertyType};
use immo_price_scout::scrapers::{ScrapeOutcome, ScraperTrait, SearchParams};
use immo_price_scout::server::router;
use immo_price_scout::MarketService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Serves a fixed set of listings for any search
struct StaticScraper {
    listings: Vec<(u64, u32)>,
}

#[async_trait]
impl ScraperTrait for StaticScraper {
    async fn scrape(&self, params: &SearchParams) -> Result<ScrapeOutcome> {
        let listings = self
            .listings
            .iter()
            .enumerate()
            .map(|(i, (price, area))| Listing {
                price: *price,
                area: *area,
                location: params.location.clone(),
                property_type: params.property_type,
                url: format!("https://www.seloger.com/annonces/{i}.htm"),
                title: format!("Annonce {i}"),
                source: ListingSource::SeLoger,
                scraped_at: Utc::now(),
            })
            .collect();

        Ok(ScrapeOutcome {
            listings,
            quoted_prices_per_m2: Vec::new(),
        })
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

struct BrokenScraper;

#[async_trait]
impl ScraperTrait for BrokenScraper {
    async fn scrape(&self, _params: &SearchParams) -> Result<ScrapeOutcome> {
        bail!("API key not configured")
    }

    fn source_name(&self) -> &'static str {
        "broken"
    }
}

fn app_with(scraper: impl ScraperTrait + 'static) -> Router {
    let service = MarketService::new(Arc::new(scraper), MarketEstimator::default());
    router(Arc::new(service))
}

fn app() -> Router {
    app_with(StaticScraper {
        listings: vec![(250_000, 50), (300_000, 60), (220_000, 55)],
    })
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn fetch_listings_returns_listings_and_market_data() {
    let (status, body) = post_json(
        app(),
        "/fetch-listings",
        json!({ "location": "Lyon", "propertyType": "apartment", "area": 55 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["listings"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["listings"][0]["propertyType"], "apartment");
    assert_eq!(body["marketData"]["basis"], "listings");
    assert_eq!(body["marketData"]["sampleSize"], 3);
    // (5 000 + 5 000 + 4 000) / 3
    assert_eq!(body["marketData"]["averagePricePerM2"], 4667.0);
    assert_eq!(body["marketData"]["minPricePerM2"], 4000.0);
}

#[tokio::test]
async fn fetch_listings_rejects_blank_location() {
    let (status, body) = post_json(
        app(),
        "/fetch-listings",
        json!({ "location": "  ", "propertyType": "house", "area": 80 }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid input: location is required");
}

#[tokio::test]
async fn analysis_compares_price_with_market() {
    let (status, body) = post_json(
        app(),
        "/api/v1/analysis",
        json!({ "price": 280000, "area": 60, "location": "Lyon", "propertyType": "apartment" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averagePricePerM2"], 4667.0);
    assert_eq!(body["marketPrice"], 280020.0);
    assert_eq!(body["difference"], -20.0);
    assert_eq!(body["percentageDiff"], 0.0);
    assert!(body["percentageDiff"].as_f64().unwrap().is_sign_positive());
    assert_eq!(body["isOverpriced"], false);
}

#[tokio::test]
async fn analysis_accepts_french_property_type() {
    let (status, body) = post_json(
        app(),
        "/api/v1/analysis",
        json!({ "price": 280000, "area": 60, "location": "Lyon", "propertyType": "appartement" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["propertyType"], "apartment");
}

#[tokio::test]
async fn malformed_bodies_get_json_bad_requests() {
    let (status, body) = post_json(
        app(),
        "/api/v1/analysis",
        json!({ "price": 280000, "location": "Lyon" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("invalid request body:"), "{message}");
    assert!(message.contains("area"), "{message}");

    let request = Request::builder()
        .method("POST")
        .uri("/fetch-listings")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn analysis_without_listings_uses_reference_prices() {
    let app = app_with(StaticScraper {
        listings: Vec::new(),
    });
    let (status, body) = post_json(
        app,
        "/api/v1/analysis",
        json!({ "price": 1200000, "area": 100, "location": "Paris", "propertyType": "apartment" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["marketData"]["basis"], "reference");
    assert_eq!(body["marketPrice"], 1045000.0);
    assert_eq!(body["isOverpriced"], true);
    assert_eq!(body["percentageDiff"], 14.8);
}

#[tokio::test]
async fn analysis_rejects_non_positive_area() {
    let (status, body) = post_json(
        app(),
        "/api/v1/analysis",
        json!({ "price": 200000, "area": 0, "location": "Lyon", "propertyType": "apartment" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid input: area must be greater than zero");
}

#[tokio::test]
async fn scrape_failure_is_a_server_error() {
    let (status, body) = post_json(
        app_with(BrokenScraper),
        "/fetch-listings",
        json!({ "location": "Lyon", "propertyType": "apartment", "area": 50 }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "scrape failed: API key not configured");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn preflight_allows_browser_clients() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/fetch-listings")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,apikey")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
    let allowed = response.headers()["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("apikey"));
    assert!(allowed.contains("x-client-info"));
}
