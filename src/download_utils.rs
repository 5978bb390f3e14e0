use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::helpers::sanitize_filename;

/// Expand save directory with ~ expansion and default fallback
pub fn expand_download_dir(download_dir: &str) -> PathBuf {
    let raw = download_dir.trim();
    let default_dir = || {
        if let Some(ud) = directories::UserDirs::new() {
            if let Some(dl) = ud.download_dir() {
                return dl.join("Media.Ext");
            }
        }
        if let Some(home) = std::env::var_os("HOME") {
            let mut p = PathBuf::from(home);
            p.push("Downloads");
            p.push("Media.Ext");
            return p;
        }
        let mut p = std::env::temp_dir();
        p.push("mediaext_downloads");
        p
    };
    if raw.is_empty() {
        return default_dir();
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            let mut p = PathBuf::from(home);
            p.push(rest);
            return p;
        }
    }
    PathBuf::from(raw)
}

/// Fresh per-job working directory under the system temp dir.
pub fn create_job_dir() -> io::Result<PathBuf> {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    let dir = std::env::temp_dir().join(format!("mediaext-{}-{}", stamp, std::process::id()));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// The converted file yt-dlp left in `dir`, if any.
pub fn find_output_file(dir: &Path, ext: &str) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(ext))
                    .unwrap_or(false)
        })
        .collect();
    found.sort();
    found.into_iter().next()
}

/// Default destination when the save dialog is dismissed; never overwrites.
pub fn fallback_destination(save_dir: &Path, src: &Path) -> PathBuf {
    let name = src
        .file_name()
        .map(|n| sanitize_filename(&n.to_string_lossy()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "audio.mp3".to_string());
    let candidate = save_dir.join(&name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = Path::new(&name).file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let ext = Path::new(&name).extension().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "mp3".into());
    let mut n = 2;
    loop {
        let p = save_dir.join(format!("{} ({}).{}", stem, n, ext));
        if !p.exists() {
            return p;
        }
        n += 1;
    }
}

/// Move `src` to `dest` (overwriting), falling back to copy+remove across
/// volumes, then drop the now empty job directory.
pub fn move_file(src: &Path, dest: &Path) -> io::Result<PathBuf> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(src, dest).is_err() {
        fs::copy(src, dest)?;
        fs::remove_file(src)?;
    }
    if let Some(job_dir) = src.parent() {
        let is_job_dir = job_dir
            .file_name()
            .map(|n| n.to_string_lossy().starts_with("mediaext-"))
            .unwrap_or(false);
        if is_job_dir {
            let _ = fs::remove_dir_all(job_dir);
        }
    }
    Ok(dest.to_path_buf())
}
