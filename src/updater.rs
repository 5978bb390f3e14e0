use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const YTDLP_LATEST_API_URL: &str = "https://api.github.com/repos/yt-dlp/yt-dlp/releases/latest";
pub const YTDLP_RELEASES_PAGE: &str = "https://github.com/yt-dlp/yt-dlp/releases/latest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInfo {
    pub installed_version: Option<String>,
    pub latest_version: String,
    pub update_available: bool,
    pub release_url: String,
}

/// Compare dotted version strings, e.g. yt-dlp's `2025.09.26` or `v1.2.3`.
/// Segments compare numerically so `2025.10.1` sorts after `2025.9.30`.
pub fn compare_versions(current: &str, latest: &str) -> Ordering {
    let parts = |v: &str| -> Vec<u32> {
        v.trim()
            .trim_start_matches('v')
            .split('.')
            .filter_map(|s| s.parse().ok())
            .collect()
    };
    let current_parts = parts(current);
    let latest_parts = parts(latest);

    for (c, l) in current_parts.iter().zip(latest_parts.iter()) {
        match c.cmp(l) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    current_parts.len().cmp(&latest_parts.len())
}

pub fn evaluate_release(installed: Option<&str>, release: GitHubRelease) -> UpdateInfo {
    let update_available = match installed {
        Some(v) => compare_versions(v, &release.tag_name) == Ordering::Less,
        None => false,
    };
    UpdateInfo {
        installed_version: installed.map(|s| s.to_string()),
        latest_version: release.tag_name,
        update_available,
        release_url: release.html_url.unwrap_or_else(|| YTDLP_RELEASES_PAGE.to_string()),
    }
}

/// Ask GitHub for the latest yt-dlp release.
pub async fn check_ytdlp_release(installed: Option<&str>) -> Result<UpdateInfo, String> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("Media.Ext/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|e| format!("HTTP client error: {}", e))?;

    let response = client
        .get(YTDLP_LATEST_API_URL)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("GitHub API error: {}", response.status()));
    }

    let release: GitHubRelease = response
        .json()
        .await
        .map_err(|e| format!("JSON parse error: {}", e))?;

    Ok(evaluate_release(installed, release))
}

pub fn open_release_page(url: &str) -> Result<(), String> {
    webbrowser::open(url).map_err(|e| format!("Failed to open release page: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str) -> GitHubRelease {
        GitHubRelease { tag_name: tag.into(), html_url: None }
    }

    #[test]
    fn test_version_comparison() {
        assert_eq!(compare_versions("2025.09.26", "2025.10.22"), Ordering::Less);
        assert_eq!(compare_versions("2025.10.22", "2025.10.22"), Ordering::Equal);
        assert_eq!(compare_versions("2025.10.1", "2025.9.30"), Ordering::Greater);
        assert_eq!(compare_versions("v0.1.6", "v0.1.7"), Ordering::Less);
        assert_eq!(compare_versions("2025.10.22", "2025.10.22.1"), Ordering::Less);
    }

    #[test]
    fn release_without_installed_version_is_not_an_update() {
        let info = evaluate_release(None, release("2025.10.22"));
        assert!(!info.update_available);
        assert_eq!(info.release_url, YTDLP_RELEASES_PAGE);
    }

    #[test]
    fn older_install_reports_update() {
        let info = evaluate_release(Some("2025.01.15"), release("2025.10.22"));
        assert!(info.update_available);
        assert_eq!(info.latest_version, "2025.10.22");
    }

    #[test]
    fn release_json_parses_with_missing_fields() {
        let r: GitHubRelease = serde_json::from_str(r#"{"tag_name":"2025.10.22"}"#).unwrap();
        assert_eq!(r.tag_name, "2025.10.22");
        assert!(r.html_url.is_none());
    }
}
