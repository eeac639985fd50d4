//! Browser-session page fetching.
//!
//! The results site renders boxscores client-side, so a plain HTTP GET
//! returns an empty shell. Fetching therefore goes through a WebDriver
//! session: navigate, dismiss the consent overlay, then poll the page
//! source until the readiness probe matches or the timeout elapses.
//!
//! Each worker exclusively owns one session for its lifetime; sessions are
//! created through [`PageClientFactory`] so the pool can respawn them and
//! tests can inject doubles.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::ClientBuilder;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, direct::NotKeyed};
use governor::{Quota, RateLimiter};
use scraper::{Html, Selector};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::ErrorKind;

/// Shared limiter bounding navigations across the whole pool.
pub type NavLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A fetched page, settled as far as the readiness probe could tell.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

/// Fetch failures, split into retryable and terminal conditions.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Navigation or source retrieval failed in a recoverable way.
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// The page loaded but its dynamic content never appeared.
    #[error("page {url} did not render `{probe}` within {timeout:?}")]
    NotRendered {
        url: String,
        probe: String,
        timeout: Duration,
    },

    #[error("invalid url `{0}`")]
    InvalidUrl(String),

    /// The browser session is gone; the owning worker must respawn.
    #[error("browser session lost: {0}")]
    SessionLost(String),

    /// A new session could not be started.
    #[error("could not start browser session: {0}")]
    SessionUnavailable(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Navigation { .. } | FetchError::NotRendered { .. } => ErrorKind::Transient,
            FetchError::InvalidUrl(_)
            | FetchError::SessionLost(_)
            | FetchError::SessionUnavailable(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

/// CSS-selector check deciding whether a dynamically rendered page has
/// settled. Shared between the client (fetch completion) and the worker
/// (discriminating a parse failure from a loading race).
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    css: String,
    selector: Selector,
}

impl ReadinessProbe {
    pub fn css(selector: &str) -> anyhow::Result<Self> {
        let compiled = Selector::parse(selector)
            .map_err(|e| anyhow::anyhow!("bad readiness selector `{selector}`: {e}"))?;
        Ok(Self {
            css: selector.to_string(),
            selector: compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.css
    }

    /// Does the given page source contain the awaited element?
    pub fn is_ready(&self, html: &str) -> bool {
        let doc = Html::parse_document(html);
        doc.select(&self.selector).next().is_some()
    }
}

/// One page fetcher owning one browser session.
#[async_trait]
pub trait PageClient: Send {
    /// Navigate to `url` and return the page source once `probe` matches.
    async fn fetch(&mut self, url: &str, probe: &ReadinessProbe) -> Result<RawPage, FetchError>;

    /// Release the underlying session. Must be called on every exit path.
    async fn close(self: Box<Self>);
}

/// Creates page clients; lets the pool respawn sessions and tests inject
/// doubles.
#[async_trait]
pub trait PageClientFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PageClient>, FetchError>;
}

/// Best-effort dismissal of the site's consent banner. Clicking the accept
/// button is preferred; removing the wrapper covers the stubborn variants.
const CONSENT_JS: &str = r#"
    const texts = /CONSENTIR TODO|ACEPTAR TODO|ACEPTAR|Acepto/;
    const btn = Array.from(document.querySelectorAll('button'))
        .find(b => texts.test(b.textContent));
    if (btn) { btn.click(); }
    const overlay = document.querySelector('.stpd_cmp_wrapper');
    if (overlay) { overlay.remove(); }
"#;

/// Production [`PageClient`] backed by a fantoccini WebDriver session.
pub struct WebDriverClient {
    client: fantoccini::Client,
    fetch_timeout: Duration,
    poll_interval: Duration,
    limiter: Arc<NavLimiter>,
    consent_dismissed: bool,
}

impl WebDriverClient {
    fn classify(url: &str, err: &fantoccini::error::CmdError) -> FetchError {
        let message = err.to_string();
        if message.contains("invalid session id") || message.contains("session not created") {
            FetchError::SessionLost(message)
        } else {
            FetchError::Navigation {
                url: url.to_string(),
                message,
            }
        }
    }
}

#[async_trait]
impl PageClient for WebDriverClient {
    async fn fetch(&mut self, url: &str, probe: &ReadinessProbe) -> Result<RawPage, FetchError> {
        url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        self.limiter.until_ready().await;
        debug!(url, "navigating");

        self.client
            .goto(url)
            .await
            .map_err(|e| Self::classify(url, &e))?;

        if !self.consent_dismissed {
            if let Err(e) = self.client.execute(CONSENT_JS, vec![]).await {
                debug!(error = %e, "consent dismissal script failed, continuing");
            }
            self.consent_dismissed = true;
        }

        // Poll the source until the probe matches; the site fills the DOM
        // asynchronously after load.
        let deadline = Instant::now() + self.fetch_timeout;
        loop {
            let html = self
                .client
                .source()
                .await
                .map_err(|e| Self::classify(url, &e))?;
            if probe.is_ready(&html) {
                return Ok(RawPage {
                    url: url.to_string(),
                    html,
                });
            }
            if Instant::now() >= deadline {
                return Err(FetchError::NotRendered {
                    url: url.to_string(),
                    probe: probe.as_str().to_string(),
                    timeout: self.fetch_timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn close(self: Box<Self>) {
        if let Err(e) = self.client.close().await {
            warn!(error = %e, "browser session did not close cleanly");
        }
    }
}

/// Factory connecting new sessions to a WebDriver endpoint.
pub struct WebDriverFactory {
    webdriver_url: String,
    headless: bool,
    fetch_timeout: Duration,
    poll_interval: Duration,
    limiter: Arc<NavLimiter>,
}

impl WebDriverFactory {
    pub fn new(
        webdriver_url: impl Into<String>,
        headless: bool,
        fetch_timeout: Duration,
        poll_interval: Duration,
        nav_per_second: u32,
    ) -> anyhow::Result<Self> {
        let quota = Quota::per_second(
            NonZeroU32::new(nav_per_second)
                .ok_or_else(|| anyhow::anyhow!("navigation rate limit must be greater than 0"))?,
        );
        Ok(Self {
            webdriver_url: webdriver_url.into(),
            headless,
            fetch_timeout,
            poll_interval,
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut args = vec!["--window-size=1200,800".to_string()];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": args }),
        );
        caps
    }
}

#[async_trait]
impl PageClientFactory for WebDriverFactory {
    async fn create(&self) -> Result<Box<dyn PageClient>, FetchError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let client = builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| FetchError::SessionUnavailable(e.to_string()))?;
        debug!(endpoint = %self.webdriver_url, "browser session started");
        Ok(Box::new(WebDriverClient {
            client,
            fetch_timeout: self.fetch_timeout,
            poll_interval: self.poll_interval,
            limiter: Arc::clone(&self.limiter),
            consent_dismissed: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_matches_settled_page() {
        let probe = ReadinessProbe::css("table.partido tbody tr").unwrap();
        let settled = "<table class=\"partido\"><tbody><tr><td>x</td></tr></tbody></table>";
        let skeleton = "<table class=\"partido\"><tbody></tbody></table>";
        assert!(probe.is_ready(settled));
        assert!(!probe.is_ready(skeleton));
    }

    #[test]
    fn error_kinds_split_transient_from_fatal() {
        let transient = FetchError::Navigation {
            url: "http://x".into(),
            message: "timeout".into(),
        };
        let fatal = FetchError::SessionLost("invalid session id".into());
        assert_eq!(transient.kind(), ErrorKind::Transient);
        assert_eq!(fatal.kind(), ErrorKind::Fatal);
        assert!(fatal.is_fatal());
    }
}
