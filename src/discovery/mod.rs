//! Content discovery.
//!
//! A discovery run seeds from the rendered profile page, then follows the
//! paged API cursor until it runs dry or stops yielding new records. When
//! that produces nothing, one broader page fetch is scanned as a last
//! resort.

mod cursor;
mod extract;
mod html;
mod pinterest;
mod source;

use std::time::Duration;

use tracing::{debug, info, warn};

pub use cursor::{is_terminal, next_cursor, END_MARKER};
pub use extract::{extract, ExtractError, RecordExtractor, DEFAULT_RESOLUTION_LADDER};
pub use html::scan_html;
pub use pinterest::{PinterestSource, PINTEREST_BASE};
pub use source::{PageSource, SeedMode};

use crate::models::{ContentRecord, RecordSet, Section};

/// Default pause between API pages.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(400);

/// Tunables for a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub page_delay: Duration,
    /// Upper bound on API pages; `None` pages until the cursor runs out.
    pub max_pages: Option<usize>,
    pub extractor: RecordExtractor,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            page_delay: DEFAULT_PAGE_DELAY,
            max_pages: None,
            extractor: RecordExtractor::default(),
        }
    }
}

/// Why paging stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page source returned nothing usable.
    NoResponse,
    /// The response carried no cursor, or the end marker.
    EndOfCursor,
    /// A page added no new records.
    Plateau,
    /// The configured page limit was reached.
    PageLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::NoResponse => "no response",
            StopReason::EndOfCursor => "end of cursor",
            StopReason::Plateau => "no new records",
            StopReason::PageLimit => "page limit",
        };
        f.write_str(s)
    }
}

/// Summary of a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    pub records: Vec<ContentRecord>,
    /// Records found while seeding, before any API page.
    pub seeded: usize,
    /// API pages that returned a response.
    pub pages: usize,
    pub stop_reason: StopReason,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscoveryState {
    Seeding,
    Paging,
    Done(StopReason),
}

/// Drives a [`PageSource`] until a profile section is exhausted.
pub struct DiscoveryLoop<S> {
    source: S,
    options: DiscoveryOptions,
}

impl<S: PageSource> DiscoveryLoop<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, DiscoveryOptions::default())
    }

    pub fn with_options(source: S, options: DiscoveryOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Discover every record in a profile section, in order of first sighting.
    pub async fn discover(&self, profile: &str, section: Section) -> Vec<ContentRecord> {
        self.discover_with_report(profile, section).await.records
    }

    /// Like [`discover`](Self::discover) but also reports how the run went.
    pub async fn discover_with_report(&self, profile: &str, section: Section) -> DiscoveryReport {
        let extractor = &self.options.extractor;
        let mut records = RecordSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        let mut seeded = 0usize;
        let mut state = DiscoveryState::Seeding;

        let stop_reason = loop {
            state = match state {
                DiscoveryState::Seeding => {
                    if let Some(html) = self.source.seed(profile, section, SeedMode::Quick).await {
                        seeded = scan_html(&html, extractor, &mut records);
                    }
                    info!("Seed page for {}/{}: {} records", profile, section, seeded);
                    DiscoveryState::Paging
                }
                DiscoveryState::Paging => {
                    if self.options.max_pages.is_some_and(|max| pages >= max) {
                        DiscoveryState::Done(StopReason::PageLimit)
                    } else {
                        self.page_once(profile, section, &mut cursor, &mut records, &mut pages)
                            .await
                    }
                }
                DiscoveryState::Done(reason) => break reason,
            };
        };

        debug!(
            "Paging for {}/{} stopped after {} pages: {}",
            profile, section, pages, stop_reason
        );

        let mut used_fallback = false;
        if records.is_empty() {
            used_fallback = true;
            info!("No records from paging, trying full page fetch");
            if let Some(html) = self.source.seed(profile, section, SeedMode::FullPage).await {
                let found = scan_html(&html, extractor, &mut records);
                info!("Full page fetch found {} records", found);
            }
        }

        DiscoveryReport {
            records: records.into_records(),
            seeded,
            pages,
            stop_reason,
            used_fallback,
        }
    }

    async fn page_once(
        &self,
        profile: &str,
        section: Section,
        cursor: &mut Option<String>,
        records: &mut RecordSet,
        pages: &mut usize,
    ) -> DiscoveryState {
        let Some(response) = self.source.page(profile, section, cursor.as_deref()).await else {
            warn!("Page request failed, stopping pagination");
            return DiscoveryState::Done(StopReason::NoResponse);
        };
        *pages += 1;

        let before = records.len();
        self.options.extractor.extract(&response, records);
        let gained = records.len() - before;

        let next = next_cursor(&response);
        debug!(
            "Page {}: +{} records (total {}), next cursor {:?}",
            pages,
            gained,
            records.len(),
            next
        );

        if is_terminal(next.as_deref()) {
            return DiscoveryState::Done(StopReason::EndOfCursor);
        }
        if gained == 0 {
            return DiscoveryState::Done(StopReason::Plateau);
        }

        *cursor = next;
        tokio::time::sleep(self.options.page_delay).await;
        DiscoveryState::Paging
    }
}
