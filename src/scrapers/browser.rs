use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Renders listing pages in headless Chrome, for when no scraping API is available
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    settle: Duration,
}

impl BrowserFetcher {
    /// Launch a headless Chrome instance
    pub fn new(settle: Duration) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(true)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;

        Ok(Self {
            browser: Arc::new(browser),
            settle,
        })
    }

    fn render(browser: &Browser, url: &str, settle: Duration) -> Result<String> {
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        tab.navigate_to(url)
            .with_context(|| format!("Failed to navigate to {url}"))?;
        tab.wait_until_navigated()
            .with_context(|| format!("Navigation to {url} never completed"))?;

        // result lists are rendered client side
        thread::sleep(settle);

        // Accept cookies if present
        let accepted = tab.evaluate(
            r#"
            (() => {
                const button = document.querySelector(
                    '#didomi-notice-agree-button, button[id*="accept"], button[id*="accepter"]'
                );
                if (button) { button.click(); return true; }
                return false;
            })()
            "#,
            false,
        );
        if let Err(err) = accepted {
            debug!("Cookie banner handling failed on {}: {}", url, err);
        }

        let html = tab
            .evaluate("document.documentElement.outerHTML", false)
            .context("Failed to read page HTML")?
            .value
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();

        if let Err(err) = tab.close(true) {
            warn!("Failed to close tab for {}: {}", url, err);
        }

        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Page> {
        let browser = Arc::clone(&self.browser);
        let settle = self.settle;
        let target = url.to_string();

        let html = tokio::task::spawn_blocking(move || Self::render(&browser, &target, settle))
            .await
            .context("Browser task panicked")??;

        if html.is_empty() {
            warn!("HTML is empty for {}", url);
        } else {
            debug!("Rendered {} bytes of HTML from {}", html.len(), url);
        }

        Ok(Page {
            url: url.to_string(),
            markdown: None,
            html: Some(html),
        })
    }

    fn backend_name(&self) -> &'static str {
        "browser"
    }
}
