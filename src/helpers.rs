use std::path::Path;

use chrono::{Local, TimeZone};
use url::Url;

use crate::error::ExtractError;

/// Accepts only absolute https URLs with a host.
pub fn validate_url(input: &str) -> Result<Url, ExtractError> {
    let text = input.trim();
    if !text.to_ascii_lowercase().starts_with("https://") {
        return Err(ExtractError::InvalidUrl(text.to_string()));
    }
    let parsed = Url::parse(text).map_err(|_| ExtractError::InvalidUrl(text.to_string()))?;
    if parsed.host_str().map(|h| h.is_empty()).unwrap_or(true) {
        return Err(ExtractError::InvalidUrl(text.to_string()));
    }
    Ok(parsed)
}

/// Sidebar timestamp format, e.g. `25/10/13, 16:24:20`.
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%y/%m/%d, %H:%M:%S").to_string(),
        None => String::new(),
    }
}

pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn accepts_https_with_host() {
        assert!(validate_url("https://www.youtube.com/watch?v=abc").is_ok());
        assert!(validate_url("  HTTPS://example.com/x  ").is_ok());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(validate_url("http://example.com").is_err());
        assert!(validate_url("example.com/video").is_err());
        assert!(validate_url("https://").is_err());
        assert!(validate_url("").is_err());
    }

    #[test]
    fn timestamp_has_sidebar_shape() {
        let s = format_timestamp(1_760_000_000);
        assert_eq!(s.len(), "25/10/09, 08:53:20".len());
        assert_eq!(&s[2..3], "/");
        assert_eq!(&s[8..10], ", ");
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name_of(&PathBuf::from("/tmp/x/song.mp3")), "song.mp3");
    }

    #[test]
    fn sanitize_replaces_reserved_chars() {
        assert_eq!(sanitize_filename(" a/b:c?.mp3 "), "a_b_c_.mp3");
    }
}
