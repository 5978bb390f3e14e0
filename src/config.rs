use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::models::{Backend, Config, Normalization};

fn config_file_path() -> PathBuf {
    crate::storage::data_dir().join("mediaext_config.txt")
}

pub fn read_config() -> Result<Config, io::Error> {
    read_config_from(&config_file_path())
}

pub fn read_config_from(path: &Path) -> Result<Config, io::Error> {
    let content = fs::read_to_string(path)?;
    Ok(parse_config(&content))
}

/// Unknown keys are skipped, unparsable values keep their defaults.
pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            let v = v.trim();
            match k.trim() {
                "backend" => cfg.backend = Backend::from_str(v).unwrap_or_default(),
                "normalization" => cfg.normalization = Normalization::from_str(v).unwrap_or_default(),
                "download_dir" => cfg.download_dir = v.to_string(),
                "ytdlp_path" => cfg.ytdlp_path = v.to_string(),
                "ffmpeg_path" => cfg.ffmpeg_path = v.to_string(),
                "notifications" => cfg.notifications = v.parse::<u8>().map(|n| n != 0).unwrap_or(true),
                "check_for_updates" => cfg.check_for_updates = v.parse::<u8>().map(|n| n != 0).unwrap_or(true),
                "theme" => cfg.theme = v.to_string(),
                "sidebar_width" => cfg.sidebar_width = v.parse::<f32>().unwrap_or(250.0).clamp(200.0, 400.0),
                _ => {}
            }
        }
    }
    cfg
}

pub fn save_config(cfg: &Config) -> Result<(), io::Error> {
    save_config_to(&config_file_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
    let mut f = fs::File::create(path)?;
    writeln!(f, "backend={}", cfg.backend.as_str())?;
    writeln!(f, "normalization={}", cfg.normalization.as_str())?;
    if !cfg.download_dir.trim().is_empty() { writeln!(f, "download_dir={}", cfg.download_dir.trim())?; }
    if !cfg.ytdlp_path.trim().is_empty() { writeln!(f, "ytdlp_path={}", cfg.ytdlp_path.trim())?; }
    if !cfg.ffmpeg_path.trim().is_empty() { writeln!(f, "ffmpeg_path={}", cfg.ffmpeg_path.trim())?; }
    writeln!(f, "notifications={}", if cfg.notifications { 1 } else { 0 })?;
    writeln!(f, "check_for_updates={}", if cfg.check_for_updates { 1 } else { 0 })?;
    if !cfg.theme.is_empty() { writeln!(f, "theme={}", cfg.theme)?; }
    if cfg.sidebar_width > 0.0 { writeln!(f, "sidebar_width={:.1}", cfg.sidebar_width)?; }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_config("");
        assert_eq!(cfg.backend, Backend::YtDlp);
        assert_eq!(cfg.normalization, Normalization::High);
        assert!(cfg.notifications);
        assert_eq!(cfg.sidebar_width, 250.0);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = parse_config("normalization=loud\nnotifications=maybe\nsidebar_width=9000\nfoo=bar\n");
        assert_eq!(cfg.normalization, Normalization::High);
        assert!(cfg.notifications);
        assert_eq!(cfg.sidebar_width, 400.0);
    }

    #[test]
    fn save_then_read_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mediaext_config.txt");
        let cfg = Config {
            backend: Backend::Demo,
            normalization: Normalization::Low,
            download_dir: "~/Music".into(),
            ytdlp_path: "/opt/homebrew/bin/yt-dlp".into(),
            notifications: false,
            theme: "light".into(),
            sidebar_width: 310.0,
            ..Config::default()
        };
        save_config_to(&path, &cfg).unwrap();
        let back = read_config_from(&path).unwrap();
        assert_eq!(back.backend, Backend::Demo);
        assert_eq!(back.normalization, Normalization::Low);
        assert_eq!(back.download_dir, "~/Music");
        assert_eq!(back.ytdlp_path, "/opt/homebrew/bin/yt-dlp");
        assert!(back.ffmpeg_path.is_empty());
        assert!(!back.notifications);
        assert!(back.check_for_updates);
        assert_eq!(back.theme, "light");
        assert_eq!(back.sidebar_width, 310.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config_from(&dir.path().join("nope.txt")).is_err());
    }
}
