use serde::{Deserialize, Serialize};

/// Loudness target applied by ffmpeg's loudnorm filter after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    Low,
    Medium,
    #[default]
    High,
}

impl Normalization {
    pub const ALL: [Normalization; 3] = [Normalization::Low, Normalization::Medium, Normalization::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Normalization::Low => "Low",
            Normalization::Medium => "Medium",
            Normalization::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Normalization> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Normalization::Low),
            "medium" => Some(Normalization::Medium),
            "high" => Some(Normalization::High),
            _ => None,
        }
    }

    /// Integrated loudness (LUFS), true peak (dBTP) and loudness range.
    pub fn loudnorm_targets(&self) -> (i32, f32, u32) {
        match self {
            Normalization::Low => (-19, -2.0, 11),
            Normalization::Medium => (-16, -1.5, 9),
            Normalization::High => (-13, -1.0, 6),
        }
    }

    pub fn loudnorm_filter(&self) -> String {
        let (i, tp, lra) = self.loudnorm_targets();
        format!("loudnorm=I={}:TP={:.1}:LRA={}", i, tp, lra)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Backend {
    #[default]
    YtDlp,
    Demo,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::YtDlp => "ytdlp",
            Backend::Demo => "demo",
        }
    }

    pub fn from_str(s: &str) -> Option<Backend> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ytdlp" | "yt-dlp" => Some(Backend::YtDlp),
            "demo" => Some(Backend::Demo),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::YtDlp => "yt-dlp",
            Backend::Demo => "Demo (no network)",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub download_dir: String,     // empty => ~/Downloads/Media.Ext
    #[serde(default)]
    pub ytdlp_path: String,       // empty => auto-detect
    #[serde(default)]
    pub ffmpeg_path: String,      // empty => auto-detect
    #[serde(default)]
    pub notifications: bool,
    #[serde(default)]
    pub check_for_updates: bool,
    #[serde(default)]
    pub theme: String,            // "dark" | "light"
    #[serde(default)]
    pub sidebar_width: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::YtDlp,
            normalization: Normalization::High,
            download_dir: String::new(),
            ytdlp_path: String::new(),
            ffmpeg_path: String::new(),
            notifications: true,
            check_for_updates: true,
            theme: "dark".to_string(),
            sidebar_width: 250.0,
        }
    }
}

/// One persisted extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub file: String,
    pub url: String,
    pub ts: i64,
}

/// A sidebar row: either a group header or a file with its display timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub title: String,
    pub timestamp: String,
    pub is_group: bool,
    pub url: Option<String>,
    pub history_id: Option<u64>,
}

impl MediaItem {
    pub fn group(title: &str) -> Self {
        Self {
            title: title.to_string(),
            timestamp: String::new(),
            is_group: true,
            url: None,
            history_id: None,
        }
    }

    pub fn item(title: &str, timestamp: &str) -> Self {
        Self {
            title: title.to_string(),
            timestamp: timestamp.to_string(),
            is_group: false,
            url: None,
            history_id: None,
        }
    }

    pub fn with_source(mut self, entry: &HistoryEntry) -> Self {
        self.url = Some(entry.url.clone());
        self.history_id = Some(entry.id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_is_default_normalization() {
        assert_eq!(Normalization::default(), Normalization::High);
        assert_eq!(Config::default().normalization, Normalization::High);
    }

    #[test]
    fn loudnorm_filter_matches_preset() {
        assert_eq!(Normalization::High.loudnorm_filter(), "loudnorm=I=-13:TP=-1.0:LRA=6");
        assert_eq!(Normalization::Low.loudnorm_filter(), "loudnorm=I=-19:TP=-2.0:LRA=11");
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(Normalization::from_str("medium"), Some(Normalization::Medium));
        assert_eq!(Backend::from_str("yt-dlp"), Some(Backend::YtDlp));
        assert_eq!(Backend::from_str("DEMO"), Some(Backend::Demo));
        assert_eq!(Backend::from_str("vlc"), None);
    }
}
