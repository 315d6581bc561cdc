use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::settings::Settings;

/// Source of rendered page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its markup once `ready_selector` is present.
    async fn fetch(&self, url: &str, ready_selector: &str) -> Result<String>;
}

/// Plain HTTP fetcher. Pages are taken as served, without running scripts.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    base_backoff: Duration,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

enum Attempt {
    Done(String),
    Retry(String),
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_retries: settings.max_retries,
            base_backoff: Duration::from_millis(settings.base_backoff_ms),
            min_interval: Duration::from_millis(settings.min_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    /// First try plus retries.
    fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Sleep until `min_interval` has passed since the previous request.
    async fn throttle(&self) {
        let wait = {
            let mut last = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let wait = last
                .map(|t| self.min_interval.saturating_sub(now.duration_since(t)))
                .unwrap_or_default();
            *last = Some(now + wait);
            wait
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    async fn attempt(&self, url: &str, ready_selector: &str) -> Result<Attempt> {
        self.throttle().await;
        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Ok(Attempt::Retry(e.to_string())),
        };
        let status = response.status();
        if is_retryable(status) {
            return Ok(Attempt::Retry(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            bail!("HTTP {} for {}", status, url);
        }

        let html = match response.text().await {
            Ok(t) => t,
            Err(e) => return Ok(Attempt::Retry(e.to_string())),
        };
        debug!(url, status = status.as_u16(), latency_ms = start.elapsed().as_millis() as u64, "fetched");

        if !is_ready(&html, ready_selector)? {
            return Ok(Attempt::Retry(format!("selector '{}' not found", ready_selector)));
        }
        Ok(Attempt::Done(html))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, ready_selector: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let reason = match self.attempt(url, ready_selector).await? {
                Attempt::Done(html) => return Ok(html),
                Attempt::Retry(reason) => reason,
            };

            if attempt + 1 == self.total_attempts() {
                bail!("{} failed after {} attempts: {}", url, attempt + 1, reason);
            }

            let backoff = backoff_for(self.base_backoff, attempt);
            warn!(
                "{} on {} (attempt {}/{}), backing off {:.1}s",
                reason,
                url,
                attempt + 1,
                self.total_attempts(),
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Fetcher for cache-only runs; every request fails.
pub struct OfflineFetcher;

#[async_trait]
impl PageFetcher for OfflineFetcher {
    async fn fetch(&self, url: &str, _ready_selector: &str) -> Result<String> {
        bail!("{} is not cached and the run is offline", url)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_for(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Whether `ready_selector` matches anything in `html`.
pub fn is_ready(html: &str, ready_selector: &str) -> Result<bool> {
    let selector = Selector::parse(ready_selector)
        .map_err(|e| anyhow!("invalid ready selector {}: {:?}", ready_selector, e))?;
    Ok(Html::parse_document(html).select(&selector).next().is_some())
}
