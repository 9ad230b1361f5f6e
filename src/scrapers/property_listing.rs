use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::parser::{extract_listing_details, parse_address_from_url};
use super::{IngestionError, PropertyIngestor, ScrapedProperty, ScraperConfig};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Scrapes property listing pages.
///
/// The URL alone always yields address fields. The page adds a title,
/// image and value estimate when it can be fetched; rate limiting or other
/// non-200 answers fall back to the URL data without a value.
pub struct ListingScraper {
    client: Client,
    config: ScraperConfig,
}

impl ListingScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, IngestionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(|e| IngestionError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<reqwest::Response, IngestionError> {
        let attempts = self.config.retry_max.max(1);
        let mut delay = Duration::from_millis(self.config.retry_delay_ms);

        for attempt in 0..attempts {
            match self.client.get(url).send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt == attempts - 1 {
                        return Err(if e.is_timeout() {
                            IngestionError::Timeout(url.to_string())
                        } else {
                            IngestionError::Network(e.to_string())
                        });
                    }
                    tracing::warn!(
                        "Retry {}/{} for {}: {}. Waiting {:?}",
                        attempt + 1,
                        attempts,
                        url,
                        e,
                        delay
                    );
                }
            }

            tokio::time::sleep(delay).await;
            delay *= 2; // Exponential backoff
        }

        Err(IngestionError::Network(format!("Max retries exceeded for {}", url)))
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-AU,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers
}

#[async_trait]
impl PropertyIngestor for ListingScraper {
    async fn ingest(&self, url: &str) -> Result<ScrapedProperty, IngestionError> {
        let from_url = parse_address_from_url(url);
        let mut data = ScrapedProperty {
            address: from_url.address,
            suburb: from_url.suburb,
            state: from_url.state,
            postcode: from_url.postcode,
            ..Default::default()
        };

        tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;

        let response = self.fetch_with_retry(url).await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Rate limited for {}", url);
                return Ok(data);
            }
            status => {
                tracing::warn!("Failed to fetch {}: Status {}", url, status);
                return Ok(data);
            }
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                IngestionError::Timeout(url.to_string())
            } else {
                IngestionError::Network(e.to_string())
            }
        })?;

        let details = extract_listing_details(&html);
        if details.title.is_some() {
            data.address = details.title;
        }
        if details.image_url.is_some() {
            data.image_url = details.image_url;
        }
        data.current_value = details.value;

        tracing::debug!(
            "Scraped {}: address={:?}, value={:?}",
            url,
            data.address,
            data.current_value
        );
        Ok(data)
    }
}
