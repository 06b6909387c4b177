//! HTTP client with browser-like defaults and a shared cookie jar.

mod error;
mod response;
mod user_agent;

pub use error::FetchError;
pub use response::{cookie_value, HttpResponse};
pub use user_agent::{desktop_user_agent, resolve_user_agent, DESKTOP_USER_AGENTS, IMPERSONATE, USER_AGENT};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use tracing::debug;

use crate::services::download::AssetFetcher;

/// Request deadlines. Any of them expiring is a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Overall deadline for a request, body included.
    pub total: Duration,
    pub connect: Duration,
    /// Longest allowed gap between reads.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            total: Duration::from_secs(60),
            connect: Duration::from_secs(10),
            read: Duration::from_secs(30),
        }
    }
}

/// Accept header sent with asset requests.
const ASSET_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// HTTP client with a persistent cookie jar.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    cookies: Arc<Jar>,
    user_agent: String,
    referer: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeouts: Timeouts) -> Result<Self, FetchError> {
        Self::with_user_agent(timeouts, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use the default browser user agent
    /// - Some("impersonate"): Use random real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeouts: Timeouts,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeouts.total)
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .cookie_provider(cookies.clone())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::Build)?;

        Ok(Self {
            client,
            cookies,
            user_agent,
            referer: None,
        })
    }

    /// Set the Referer header for requests.
    pub fn with_referer(mut self, referer: String) -> Self {
        self.referer = Some(referer);
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Make a GET request with extra headers and an optional deadline
    /// shorter than the client-wide one.
    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, FetchError> {
        let mut request = self.client.get(url);

        if let Some(referer) = &self.referer {
            if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("referer")) {
                request = request.header("Referer", referer);
            }
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let start = Instant::now();
        let response = request.send().await?;
        debug!(
            "GET {} -> {} in {}ms",
            url,
            response.status().as_u16(),
            start.elapsed().as_millis()
        );

        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(name.to_string(), v.to_string());
            }
        }

        Ok(HttpResponse {
            status: response.status(),
            headers: response_headers,
            response,
        })
    }

    /// Value of a cookie the jar would send to `url`.
    pub fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let url = url::Url::parse(url).ok()?;
        let header = self.cookies.cookies(&url)?;
        cookie_value(header.to_str().ok()?, name)
    }
}

#[async_trait]
impl AssetFetcher for HttpClient {
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get(url, &[("Accept", ASSET_ACCEPT)], None)
            .await?
            .error_for_status()?
            .bytes()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let t = Timeouts::default();
        assert_eq!(t.total, Duration::from_secs(60));
        assert_eq!(t.connect, Duration::from_secs(10));
        assert_eq!(t.read, Duration::from_secs(30));
    }

    #[test]
    fn test_client_builds_with_custom_agent() {
        let client = HttpClient::with_user_agent(Timeouts::default(), Some("TestAgent/1.0")).unwrap();
        assert_eq!(client.user_agent(), "TestAgent/1.0");
        assert_eq!(client.cookie("https://www.pinterest.com/", "csrftoken"), None);
    }
}
