//! Page source abstraction used by the discovery loop.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::Section;

/// How much effort a seed fetch should spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// The section page as normally served.
    Quick,
    /// A broader, slower fetch of the whole profile page, used once when
    /// pagination produced nothing.
    FullPage,
}

/// Something that can produce raw profile pages and paged API responses.
///
/// Failures are reported as `None`; the discovery loop treats them as
/// "no further data" rather than errors.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch rendered HTML for a profile section.
    async fn seed(&self, profile: &str, section: Section, mode: SeedMode) -> Option<String>;

    /// Fetch one page of the paged API, starting after `cursor`.
    async fn page(&self, profile: &str, section: Section, cursor: Option<&str>) -> Option<Value>;
}
