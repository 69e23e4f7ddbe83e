//! Source link validation
//!
//! Decides whether an inbound message is a Streamtape video link before any
//! network call is made, and extracts the video identifier that later names
//! the local artifact.

use lazy_regex::regex_captures;
use thiserror::Error;
use url::Url;

use crate::core::config::validation::MAX_URL_LENGTH;

/// Validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Message text is not a Streamtape video link
    #[error("not a Streamtape video link: {0}")]
    NotAVideoLink(String),

    /// Message text is longer than any link we accept
    #[error("link too long ({0} bytes)")]
    TooLong(usize),
}

/// A well-formed Streamtape video page link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    url: Url,
    video_id: String,
}

impl SourceLink {
    /// Extracts the first Streamtape video link from raw message text.
    ///
    /// Accepts `https://streamtape.com/v/<id>` and `https://www.streamtape.com/v/<id>/<anything>`
    /// where `<id>` is made of ASCII letters, digits, `_` and `-`. The link may be
    /// surrounded by other words but must stand on its own (whitespace on both sides).
    ///
    /// # Examples
    /// ```
    /// use tapebot::core::validation::SourceLink;
    ///
    /// let link = SourceLink::parse("https://streamtape.com/v/abc123/file.mp4").unwrap();
    /// assert_eq!(link.video_id(), "abc123");
    ///
    /// let link = SourceLink::parse("please grab https://streamtape.com/v/abc123 thanks").unwrap();
    /// assert_eq!(link.url().as_str(), "https://streamtape.com/v/abc123");
    ///
    /// assert!(SourceLink::parse("not a link").is_err());
    /// assert!(SourceLink::parse("http://streamtape.com/v/abc123").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let not_a_link = || ValidationError::NotAVideoLink(text.to_string());

        let (_, link, video_id, _) = regex_captures!(
            r"(?:^|\s)(https://(?:www\.)?streamtape\.com/v/([A-Za-z0-9_-]+)(?:/\S*)?)(\s|$)",
            text
        )
        .ok_or_else(not_a_link)?;

        if link.len() > MAX_URL_LENGTH {
            return Err(ValidationError::TooLong(link.len()));
        }

        let url = Url::parse(link).map_err(|_| not_a_link())?;

        Ok(Self {
            video_id: video_id.to_string(),
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Opaque video identifier (the `/v/<id>` segment).
    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl std::fmt::Display for SourceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Reduces a string to characters that are safe in a file name.
///
/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
/// Empty input yields `"video"`.
pub fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .take(64)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_and_www_links() {
        let link = SourceLink::parse("https://streamtape.com/v/abc123").unwrap();
        assert_eq!(link.video_id(), "abc123");

        let link = SourceLink::parse("https://www.streamtape.com/v/Xy_9-Z/some.video.mp4").unwrap();
        assert_eq!(link.video_id(), "Xy_9-Z");
        assert_eq!(link.url().host_str(), Some("www.streamtape.com"));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let link = SourceLink::parse("  https://streamtape.com/v/abc123/file.mp4\n").unwrap();
        assert_eq!(link.to_string(), "https://streamtape.com/v/abc123/file.mp4");
    }

    #[test]
    fn test_finds_link_inside_text() {
        let link = SourceLink::parse("look https://streamtape.com/v/abc123").unwrap();
        assert_eq!(link.video_id(), "abc123");

        let link = SourceLink::parse(
            "first https://streamtape.com/v/one1/a.mp4\nthen https://streamtape.com/v/two2",
        )
        .unwrap();
        assert_eq!(link.video_id(), "one1");
        assert_eq!(link.to_string(), "https://streamtape.com/v/one1/a.mp4");

        let link = SourceLink::parse("https://example.com/x https://streamtape.com/v/abc123 ok").unwrap();
        assert_eq!(link.video_id(), "abc123");
    }

    #[test]
    fn test_rejects_other_shapes() {
        for text in [
            "not a link",
            "",
            "http://streamtape.com/v/abc123",
            "https://streamtape.com/e/abc123",
            "https://streamtape.com/v/",
            "https://evilstreamtape.com/v/abc123",
            "https://streamtape.com.evil.org/v/abc123",
            "https://youtube.com/watch?v=abc",
            "https://streamtape.com/v/abc123?dl=1",
            "xhttps://streamtape.com/v/abc123",
        ] {
            assert!(SourceLink::parse(text).is_err(), "accepted {:?}", text);
        }
    }

    #[test]
    fn test_rejects_overlong_text() {
        let long = format!("https://streamtape.com/v/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(SourceLink::parse(&long), Err(ValidationError::TooLong(_))));
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("abc123"), "abc123");
        assert_eq!(sanitize_file_stem("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_file_stem(""), "video");
        assert_eq!(sanitize_file_stem(&"x".repeat(100)).len(), 64);
    }
}
