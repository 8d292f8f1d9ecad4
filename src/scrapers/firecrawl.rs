use crate::config::{ConfigError, ScraperConfig};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::Page;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Page fetcher backed by the Firecrawl scrape API
pub struct FirecrawlFetcher {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 2],
    only_main_content: bool,
    timeout: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeMetadata {
    #[serde(default, rename = "sourceURL")]
    source_url: Option<String>,
    #[serde(default)]
    status_code: Option<u16>,
}

impl FirecrawlFetcher {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            // firecrawl renders the page itself, leave it room on top of its own timeout
            .timeout(timeout + Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ScraperConfig) -> crate::error::Result<Self> {
        let api_key = config
            .firecrawl_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing {
                name: "FIRECRAWL_API_KEY",
            })?;

        Ok(Self::new(
            api_key,
            config.firecrawl_base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)
    }
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Page> {
        let endpoint = format!("{}/v1/scrape", self.base_url);
        debug!("Requesting {} through {}", url, endpoint);

        let request = ScrapeRequest {
            url,
            formats: ["markdown", "html"],
            only_main_content: true,
            timeout: self.timeout.as_millis() as u64,
        };

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach Firecrawl for {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Firecrawl returned status {} for {}", status, url);
            bail!("Firecrawl scrape of {url} failed with {status}: {body}");
        }

        let payload: ScrapeResponse = response
            .json()
            .await
            .context("Failed to decode Firecrawl response")?;

        if !payload.success {
            bail!(
                "Firecrawl could not scrape {url}: {}",
                payload.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }

        let data = payload
            .data
            .with_context(|| format!("Firecrawl returned no data for {url}"))?;

        if let Some(code) = data.metadata.as_ref().and_then(|meta| meta.status_code) {
            if code >= 400 {
                bail!("{url} answered {code} to Firecrawl");
            }
        }

        let page_url = data
            .metadata
            .and_then(|meta| meta.source_url)
            .unwrap_or_else(|| url.to_string());

        debug!(
            "Firecrawl returned {} bytes of markdown, {} bytes of HTML",
            data.markdown.as_ref().map_or(0, String::len),
            data.html.as_ref().map_or(0, String::len)
        );

        Ok(Page {
            url: page_url,
            markdown: data.markdown,
            html: data.html,
        })
    }

    fn backend_name(&self) -> &'static str {
        "firecrawl"
    }
}
