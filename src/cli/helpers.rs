//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};

use pinacquire::models::Section;

/// Derive the profile name from a profile URL or a bare username.
///
/// Accepts `https://www.pinterest.com/alice/`, `pinterest.com/alice`,
/// `/alice/_created/` and `alice`.
pub fn profile_id_from_reference(reference: &str) -> Option<String> {
    let reference = reference.trim();
    let path = match url::Url::parse(reference) {
        Ok(parsed) if parsed.has_host() => parsed.path().to_string(),
        _ => {
            let first = reference.trim_start_matches('/').split('/').next().unwrap_or("");
            if first.contains('.') {
                // Host without a scheme.
                reference
                    .trim_start_matches('/')
                    .split_once('/')
                    .map(|(_, rest)| rest.to_string())
                    .unwrap_or_default()
            } else {
                reference.to_string()
            }
        }
    };

    let profile = path.trim_matches('/').split('/').next().unwrap_or("");
    let valid = !profile.is_empty()
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    valid.then(|| profile.to_string())
}

/// Default output directory for a profile section.
pub fn default_output_dir(profile: &str, section: Section) -> PathBuf {
    PathBuf::from(format!("pinterest_{}_{}", profile, section))
}

/// Directory a manifest lives in, for downloads that do not name one.
pub fn manifest_dir(manifest: &Path) -> PathBuf {
    match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Parse a concurrency flag, which must be at least 1.
pub fn parse_concurrency(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err("concurrency must be at least 1".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
