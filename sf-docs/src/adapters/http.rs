//! reqwest-backed page fetcher with retries, login-redirect and
//! bot-challenge detection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{StatusCode, Url};

use crate::config::FetchConfig;
use crate::error::{Result, SfDocsError};
use crate::ports::{FetchedPage, PageFetcher};

const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,application/pdf;q=0.9,*/*;q=0.8";
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const SNIFF_BYTES: usize = 64 * 1024;

/// Markers that only appear on interstitial challenge pages.
const CHALLENGE_MARKERS: &[(&str, &str)] = &[
    ("cf-chl-", "cloudflare challenge"),
    ("challenge-platform", "cloudflare challenge"),
    ("<title>just a moment...</title>", "cloudflare challenge"),
    ("_incapsula_resource", "incapsula challenge"),
    ("incapsula incident", "incapsula challenge"),
    ("pardon our interruption", "imperva challenge"),
    ("px-captcha", "perimeterx captcha"),
    ("captcha-delivery.com", "datadome captcha"),
    ("errors.edgesuite.net", "akamai block"),
];

/// Markers that suggest a block only when the status code already does.
const DENIAL_MARKERS: &[(&str, &str)] = &[
    ("access denied", "access denied"),
    ("captcha", "captcha"),
    ("unusual traffic", "unusual traffic"),
];

pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

struct AttemptError {
    error: SfDocsError,
    retry_after: Option<Duration>,
}

impl From<SfDocsError> for AttemptError {
    fn from(error: SfDocsError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(error: reqwest::Error) -> Self {
        SfDocsError::Http(error).into()
    }
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|e| SfDocsError::Config(format!("fetch.accept_language: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Exponential delay before retry number `attempt + 1`, capped.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    async fn attempt(&self, url: &str) -> std::result::Result<FetchedPage, AttemptError> {
        let response = self.client.get(url).send().await?;

        let final_url = response.url().clone();
        if is_login_url(&final_url) {
            return Err(SfDocsError::LoginRequired {
                url: url.to_string(),
            }
            .into());
        }

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        if let Some(reason) = detect_bot_block(status, &body) {
            return Err(AttemptError {
                error: SfDocsError::BotDetected {
                    url: url.to_string(),
                    reason,
                },
                retry_after,
            });
        }

        if !status.is_success() {
            return Err(AttemptError {
                error: SfDocsError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                },
                retry_after,
            });
        }

        Ok(FetchedPage {
            url: url.to_string(),
            final_url: final_url.to_string(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt = 0;
        loop {
            match self.attempt(url).await {
                Ok(page) => {
                    tracing::debug!(url, final_url = %page.final_url, bytes = page.body.len(), "fetched");
                    return Ok(page);
                }
                Err(AttemptError { error, retry_after }) => {
                    if attempt >= self.max_retries || !error.is_retryable() {
                        return Err(error);
                    }
                    let delay = retry_after.unwrap_or_else(|| self.backoff_delay(attempt));
                    attempt += 1;
                    tracing::warn!(
                        url,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "fetch failed, retrying: {error}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Delay-seconds form of `Retry-After`, capped. HTTP dates are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

/// True when a redirect chain ended on a Salesforce sign-in page.
pub fn is_login_url(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = url.path().to_ascii_lowercase();

    host == "login.salesforce.com"
        || path.contains("/s/login")
        || path.contains("/secur/login")
        || (path.ends_with("/login") && url.query().is_some_and(|q| q.contains("startURL")))
}

/// Classify a response as a bot-detection block, returning the reason.
pub fn detect_bot_block(status: StatusCode, body: &[u8]) -> Option<String> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Some("rate limited (429)".to_string());
    }

    let sniff = String::from_utf8_lossy(&body[..body.len().min(SNIFF_BYTES)]).to_ascii_lowercase();

    if let Some((_, reason)) = CHALLENGE_MARKERS.iter().find(|(m, _)| sniff.contains(m)) {
        return Some(format!("{reason} ({})", status.as_u16()));
    }

    if matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::SERVICE_UNAVAILABLE
    ) && let Some((_, reason)) = DENIAL_MARKERS.iter().find(|(m, _)| sniff.contains(m))
    {
        return Some(format!("{reason} ({})", status.as_u16()));
    }

    None
}
