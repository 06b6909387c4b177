//! Candidate URL ladders for media assets.
//!
//! Pinterest encodes the rendition size as a path segment (`/736x/`,
//! `/236x/`, `/600x315/`). Swapping that segment yields other renditions of
//! the same asset, which lets a download fall back from the original upload
//! to smaller sizes.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RESOLUTION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+x\d*/").unwrap());

/// Replacement markers for each rung of the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderTiers {
    /// Marker for the uncropped original upload.
    #[serde(default = "default_original")]
    pub original: String,
    /// High-resolution rendition.
    #[serde(default = "default_high")]
    pub high: String,
    /// Medium-resolution rendition.
    #[serde(default = "default_medium")]
    pub medium: String,
}

fn default_original() -> String {
    "originals".to_string()
}

fn default_high() -> String {
    "736x".to_string()
}

fn default_medium() -> String {
    "474x".to_string()
}

impl Default for LadderTiers {
    fn default() -> Self {
        Self {
            original: default_original(),
            high: default_high(),
            medium: default_medium(),
        }
    }
}

/// Strip the query string and fragment from a URL.
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Candidate URLs for an asset, best quality first, using default tiers.
pub fn candidates(url: &str) -> Vec<String> {
    candidates_with_tiers(url, &LadderTiers::default())
}

/// Candidate URLs for an asset, best quality first.
///
/// Always contains the query-stripped input. It comes last unless its tier
/// is one of the ladder tiers, in which case it keeps that tier's place.
pub fn candidates_with_tiers(url: &str, tiers: &LadderTiers) -> Vec<String> {
    let base = strip_query(url);

    let mut ladder = Vec::with_capacity(4);
    if RESOLUTION_SEGMENT.is_match(base) {
        for marker in [&tiers.original, &tiers.high, &tiers.medium] {
            let replacement = format!("/{}/", marker);
            ladder.push(
                RESOLUTION_SEGMENT
                    .replace(base, regex::NoExpand(&replacement))
                    .into_owned(),
            );
        }
    }
    ladder.push(base.to_string());

    // First occurrence wins, so an input already on a ladder tier keeps
    // that tier's priority.
    let mut out: Vec<String> = Vec::with_capacity(ladder.len());
    for candidate in ladder {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}
