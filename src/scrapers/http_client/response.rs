//! HTTP response wrapper.

use std::collections::HashMap;

use reqwest::{Response, StatusCode};

use super::FetchError;

/// HTTP response wrapper.
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub(crate) response: Response,
}

impl HttpResponse {
    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Turn a non-success status into an error.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status(self.status.as_u16()))
        }
    }

    /// Get response body as bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, FetchError> {
        Ok(self.response.bytes().await.map(|b| b.to_vec())?)
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String, FetchError> {
        Ok(self.response.text().await?)
    }
}

/// Find a cookie value in a `Cookie` header string (`a=1; b=2`).
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let header = "csrftoken=abc123; _pinterest_sess=xyz; empty=";
        assert_eq!(cookie_value(header, "csrftoken"), Some("abc123".to_string()));
        assert_eq!(cookie_value(header, "_pinterest_sess"), Some("xyz".to_string()));
        assert_eq!(cookie_value(header, "empty"), None);
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn test_cookie_value_with_equals_in_value() {
        assert_eq!(cookie_value("token=a=b", "token"), Some("a=b".to_string()));
    }
}
