//! Data models for pinacquire.

mod record;
mod section;

pub use record::{is_valid_id, page_url_for, ContentRecord, RecordSet, PIN_PAGE_BASE};
pub use section::Section;
