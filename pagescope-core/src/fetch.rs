// Retrieval of the page under analysis

use crate::config::FetchSettings;
use crate::error::{AnalyzeError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; links are resolved against this.
    pub final_url: String,
    pub status: u16,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    settings: FetchSettings,
}

/// Only absolute http(s) URLs can be analyzed.
pub fn validate_page_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| AnalyzeError::InvalidUrl(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(AnalyzeError::InvalidUrl(format!(
            "{} must be an http:// or https:// URL",
            url
        ))),
    }
}

impl PageFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client, settings })
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = validate_page_url(url)?;
        info!("Fetching {}", parsed);

        let mut response = self
            .client
            .get(parsed.clone())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| self.fetch_error(parsed.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(AnalyzeError::FetchStatus {
                url: parsed.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.settings.max_page_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(AnalyzeError::PageTooLarge {
                url: final_url,
                limit,
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.fetch_error(&final_url, e))?
        {
            if body.len() + chunk.len() > limit {
                return Err(AnalyzeError::PageTooLarge {
                    url: final_url,
                    limit,
                });
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), final_url);
        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            html: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    fn fetch_error(&self, url: &str, error: reqwest::Error) -> AnalyzeError {
        if error.is_timeout() {
            AnalyzeError::FetchTimeout {
                url: url.to_string(),
                timeout_secs: self.settings.timeout_secs,
            }
        } else {
            AnalyzeError::Fetch {
                url: url.to_string(),
                source: error,
            }
        }
    }
}
