use crate::analysis::{AnalysisError, MarketService, PriceAnalysis};
use crate::cli::ServeArgs;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::{FetchListingsResponse, PriceQuery};
use crate::scrapers::SearchParams;
use crate::telemetry;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

/// All API routes, with CORS open to any origin for the browser front end
pub fn router(service: Arc<MarketService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/health", get(healthcheck))
        .route("/fetch-listings", post(fetch_listings_endpoint))
        .route("/api/v1/analysis", post(analysis_endpoint))
        .layer(Extension(service))
        .layer(cors)
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<()> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let service = Arc::new(MarketService::from_config(&config.scraper)?);
    let app = router(service);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(?config.environment, %addr, backend = ?config.scraper.backend, "price scout ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn fetch_listings_endpoint(
    Extension(service): Extension<Arc<MarketService>>,
    payload: std::result::Result<Json<SearchParams>, JsonRejection>,
) -> Result<Json<FetchListingsResponse>> {
    let Json(params) = payload?;
    debug!("Received request with params: {:?}", params);

    if params.location.trim().is_empty() {
        return Err(AnalysisError::InvalidInput("location is required".to_string()).into());
    }
    if !params.area.is_finite() || params.area <= 0.0 {
        return Err(AnalysisError::InvalidInput("area must be greater than zero".to_string()).into());
    }

    let response = service.fetch_listings(&params).await?;
    Ok(Json(response))
}

async fn analysis_endpoint(
    Extension(service): Extension<Arc<MarketService>>,
    payload: std::result::Result<Json<PriceQuery>, JsonRejection>,
) -> Result<Json<PriceAnalysis>, AppError> {
    let Json(query) = payload?;
    let analysis = service.analyze(&query).await?;
    Ok(Json(analysis))
}
