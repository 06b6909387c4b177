//! Shared utility functions.
//!
//! - `filename`: filesystem-safe names and media extensions
//! - `ladder`: candidate URL ladders for media assets

mod filename;
pub mod ladder;

pub use filename::{extension_for_url, sanitize_filename, DEFAULT_EXTENSION, MAX_TITLE_CHARS};
pub use ladder::{candidates, candidates_with_tiers, strip_query, LadderTiers};
