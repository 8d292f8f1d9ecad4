use crate::scrapers::firecrawl::DEFAULT_BASE_URL;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// How listing pages are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeBackend {
    Firecrawl,
    Browser,
}

impl FromStr for ScrapeBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "firecrawl" => Ok(Self::Firecrawl),
            "browser" | "chrome" => Ok(Self::Browser),
            _ => Err(ConfigError::Invalid {
                name: "SCRAPER_BACKEND",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    #[error("{name} is not set")]
    Missing { name: &'static str },
    #[error("invalid host address: {source}")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scraper: ScraperConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment =
            AppEnvironment::parse(&lookup("APP_ENV").unwrap_or_else(|| "development".to_string()));

        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_var(&lookup, "APP_PORT", 3000u16)?;
        let log_level = lookup("APP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let backend = match lookup("SCRAPER_BACKEND") {
            Some(value) => value.parse()?,
            None => ScrapeBackend::Firecrawl,
        };

        let scraper = ScraperConfig {
            backend,
            firecrawl_api_key: lookup("FIRECRAWL_API_KEY"),
            firecrawl_base_url: lookup("FIRECRAWL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: parse_var(&lookup, "SCRAPER_TIMEOUT_SECS", 30u64)?,
            listings_per_site: parse_var(&lookup, "SCRAPER_LISTINGS_PER_SITE", 5usize)?,
            area_tolerance: parse_var(&lookup, "SCRAPER_AREA_TOLERANCE", 20.0f64)?,
            min_samples: parse_var(&lookup, "MARKET_MIN_SAMPLES", 3usize)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scraper,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Listing fetch and market estimate settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub backend: ScrapeBackend,
    pub firecrawl_api_key: Option<String>,
    pub firecrawl_base_url: String,
    pub timeout_secs: u64,
    pub listings_per_site: usize,
    /// Listings further than this many m² from the target are dropped
    pub area_tolerance: f64,
    pub min_samples: usize,
}
