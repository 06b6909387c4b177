//! Filename helpers for downloaded media.

/// Longest title (in characters) kept in a filename.
pub const MAX_TITLE_CHARS: usize = 80;

/// Extension used when the URL does not carry a known media suffix.
pub const DEFAULT_EXTENSION: &str = ".jpg";

const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".mp4"];

/// Sanitize a string for use as a filename.
///
/// Filesystem-unsafe characters become `_`, the result is cut to
/// [`MAX_TITLE_CHARS`] and trimmed. Empty input yields `"pin"`.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_TITLE_CHARS)
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        "pin".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick the file extension (with leading dot) for a media URL.
///
/// Only the URL path is inspected, so query strings never leak into the
/// extension.
pub fn extension_for_url(url: &str) -> &'static str {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    let ext = match last_segment.rfind('.') {
        Some(pos) if pos > 0 => last_segment[pos..].to_lowercase(),
        _ => return DEFAULT_EXTENSION,
    };

    MEDIA_EXTENSIONS
        .iter()
        .find(|known| **known == ext)
        .copied()
        .unwrap_or(DEFAULT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_special_chars() {
        assert_eq!(sanitize_filename("file/with:bad*chars?"), "file_with_bad_chars_");
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert_eq!(sanitize_filename(""), "pin");
        assert_eq!(sanitize_filename("   "), "pin");
    }

    #[test]
    fn test_sanitize_filename_long() {
        let long_name = "a".repeat(150);
        assert_eq!(sanitize_filename(&long_name).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_sanitize_filename_multibyte_is_cut_on_char_boundary() {
        let long_name = "گربه ".repeat(40);
        let sanitized = sanitize_filename(&long_name);
        assert!(sanitized.chars().count() <= MAX_TITLE_CHARS);
        assert!(!sanitized.ends_with(' '));
    }

    #[test]
    fn test_sanitize_filename_is_stable() {
        let once = sanitize_filename(&format!("{}  tail", "x".repeat(79)));
        assert_eq!(sanitize_filename(&once), once);
    }

    #[test]
    fn test_extension_known() {
        assert_eq!(extension_for_url("https://i.pinimg.com/736x/a/b.png"), ".png");
        assert_eq!(extension_for_url("https://v.pinimg.com/videos/x.MP4"), ".mp4");
        assert_eq!(extension_for_url("https://i.pinimg.com/736x/a/b.webp?w=1"), ".webp");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(extension_for_url("https://i.pinimg.com/736x/a/b"), ".jpg");
        assert_eq!(extension_for_url("https://i.pinimg.com/736x/a/b.svg"), ".jpg");
        assert_eq!(extension_for_url("https://i.pinimg.com/736x/a.b/c"), ".jpg");
    }
}
