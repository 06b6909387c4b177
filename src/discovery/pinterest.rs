//! [`PageSource`] backed by the public Pinterest web endpoints.
//!
//! The first seed request doubles as session bootstrap: it fills the cookie
//! jar and yields the CSRF token and app version that the resource API
//! expects as headers.

use std::sync::LazyLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::source::{PageSource, SeedMode};
use crate::models::Section;
use crate::scrapers::{FetchError, HttpClient};

pub const PINTEREST_BASE: &str = "https://www.pinterest.com";

const PINS_RESOURCE: &str = "/resource/UserPinsResource/get/";

/// Sent until a page tells us the current one.
const DEFAULT_APP_VERSION: &str = "2f0e462";

const SEED_TIMEOUT: Duration = Duration::from_secs(20);
const FULL_PAGE_TIMEOUT: Duration = Duration::from_secs(60);
const API_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest raw body excerpt written to the debug log.
const DUMP_CHARS: usize = 3000;

const SEC_CH_UA: &str = r#""Chromium";v="122", "Not(A:Brand";v="24", "Google Chrome";v="122""#;

const DOCUMENT_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("sec-ch-ua", SEC_CH_UA),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
];

const API_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json, text/javascript, */*; q=0.01"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("X-Requested-With", "XMLHttpRequest"),
    ("X-Pinterest-AppState", "active"),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-origin"),
    ("sec-ch-ua", SEC_CH_UA),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
];

static CSRF_IN_HTML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""csrftoken"\s*:\s*"([^"]+)""#).unwrap());

static APP_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""appVersion"\s*:\s*"([^"]+)""#).unwrap());

/// Request context learned from the seed page.
#[derive(Debug, Clone)]
struct SessionContext {
    csrf_token: Option<String>,
    app_version: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            csrf_token: None,
            app_version: DEFAULT_APP_VERSION.to_string(),
        }
    }
}

/// Fetches profile pages and resource API pages from Pinterest.
pub struct PinterestSource {
    client: HttpClient,
    base_url: String,
    session: RwLock<SessionContext>,
    dump_bodies: bool,
}

impl PinterestSource {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: PINTEREST_BASE.to_string(),
            session: RwLock::new(SessionContext::default()),
            dump_bodies: false,
        }
    }

    /// Point the source at another host (tests, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Log truncated raw response bodies at debug level.
    pub fn with_body_dumps(mut self, enabled: bool) -> Self {
        self.dump_bodies = enabled;
        self
    }

    fn dump(&self, label: &str, body: &str) {
        if self.dump_bodies {
            debug!("{}:\n{}", label, truncate_chars(body, DUMP_CHARS));
        }
    }

    async fn fetch_document(&self, url: &str, timeout: Duration) -> Result<(u16, String), FetchError> {
        let response = self.client.get(url, DOCUMENT_HEADERS, Some(timeout)).await?;
        let status = response.status.as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Record the CSRF token and app version found in a seed response.
    async fn learn_session(&self, url: &str, html: &str) {
        let csrf = self
            .client
            .cookie(url, "csrftoken")
            .or_else(|| capture(&CSRF_IN_HTML, html));
        let app_version = capture(&APP_VERSION, html);

        let mut session = self.session.write().await;
        if let Some(token) = csrf {
            debug!("CSRF token: {}...", truncate_chars(&token, 20));
            session.csrf_token = Some(token);
        }
        if let Some(version) = app_version {
            debug!("App version: {}", version);
            session.app_version = version;
        }
    }

    fn api_url(&self, profile: &str, section: Section, cursor: Option<&str>) -> String {
        let source_url = section.source_path(profile);
        let data = api_request_data(profile, section, cursor).to_string();
        format!(
            "{}{}?source_url={}&data={}&_={}",
            self.base_url,
            PINS_RESOURCE,
            urlencoding::encode(&source_url),
            urlencoding::encode(&data),
            unix_millis()
        )
    }
}

#[async_trait]
impl PageSource for PinterestSource {
    async fn seed(&self, profile: &str, section: Section, mode: SeedMode) -> Option<String> {
        let (url, timeout) = match mode {
            SeedMode::Quick => (
                format!("{}{}", self.base_url, section.source_path(profile)),
                SEED_TIMEOUT,
            ),
            SeedMode::FullPage => (format!("{}/{}/", self.base_url, profile), FULL_PAGE_TIMEOUT),
        };

        info!("Fetching {}", url);
        let (status, html) = match self.fetch_document(&url, timeout).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                return None;
            }
        };
        self.dump("Seed page", &html);
        self.learn_session(&url, &html).await;

        if !(200..300).contains(&status) {
            warn!("Seed page {} returned HTTP {}", url, status);
            return None;
        }
        Some(html)
    }

    async fn page(&self, profile: &str, section: Section, cursor: Option<&str>) -> Option<Value> {
        let url = self.api_url(profile, section, cursor);
        let referer = format!("{}/", self.base_url);
        let session = self.session.read().await.clone();

        let mut headers: Vec<(&str, &str)> = API_HEADERS.to_vec();
        headers.push(("Referer", referer.as_str()));
        headers.push(("X-APP-VERSION", session.app_version.as_str()));
        if let Some(token) = &session.csrf_token {
            headers.push(("X-CSRFToken", token.as_str()));
        }

        let response = match self.client.get(&url, &headers, Some(API_TIMEOUT)).await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!("API request timed out: {}", e);
                return None;
            }
            Err(e) => {
                warn!("API request failed: {}", e);
                return None;
            }
        };
        let status = response.status;
        debug!(
            "API status: {} ({})",
            status.as_u16(),
            response.content_type().unwrap_or("no content type")
        );

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read API response: {}", e);
                return None;
            }
        };
        self.dump(&format!("API response (cursor {:?})", cursor), &body);

        if !status.is_success() {
            warn!("API returned HTTP {}", status.as_u16());
            return None;
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) if map.is_empty() => None,
            Ok(value) => Some(value),
            Err(e) => {
                warn!("API response is not JSON: {}", e);
                None
            }
        }
    }
}

/// The `data` parameter of a resource API request.
fn api_request_data(profile: &str, section: Section, cursor: Option<&str>) -> Value {
    let mut options = json!({
        "username": profile,
        "field_set_key": "grid_item",
        "pin_filter": "None",
        "privacy_filter": "all",
    });
    if section == Section::Created {
        options["is_own_profile_pins"] = json!(false);
    }
    if let Some(cursor) = cursor {
        options["bookmarks"] = json!([cursor]);
    }
    json!({ "options": options, "context": {} })
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
