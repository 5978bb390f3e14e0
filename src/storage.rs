use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use once_cell::sync::OnceCell;

use crate::logger::log_line;
use crate::models::HistoryEntry;

static DEV_MODE: OnceCell<bool> = OnceCell::new();

/// `--dev` keeps every data file in the working directory.
pub fn set_dev_mode(dev: bool) {
    let _ = DEV_MODE.set(dev);
}

pub fn data_dir() -> PathBuf {
    if DEV_MODE.get().copied().unwrap_or(false) {
        return PathBuf::from(".");
    }
    // macOS: ~/Library/Application Support/com.mediaext.Media-Ext
    if let Some(dirs) = ProjectDirs::from("com", "mediaext", "Media.Ext") {
        return dirs.data_dir().to_path_buf();
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".mediaext")
}

fn history_file() -> PathBuf { let d = data_dir(); let _ = fs::create_dir_all(&d); d.join("history.json") }

pub fn load_history() -> Vec<HistoryEntry> {
    load_history_from(&history_file())
}

pub fn load_history_from(path: &Path) -> Vec<HistoryEntry> {
    if let Ok(mut f) = fs::File::open(path) {
        let mut s = String::new();
        if f.read_to_string(&mut s).is_ok() {
            match serde_json::from_str::<Vec<HistoryEntry>>(&s) {
                Ok(v) => return v,
                Err(e) => log_line(&format!("history.json unreadable, starting empty: {}", e)),
            }
        }
    }
    Vec::new()
}

fn write_history(path: &Path, all: &[HistoryEntry]) -> Result<(), String> {
    let json = serde_json::to_string_pretty(all).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("write {}: {}", path.display(), e))
}

/// Appends a row and returns it with its freshly assigned id.
pub fn add_history(file: &str, url: &str, ts: i64) -> Result<HistoryEntry, String> {
    add_history_to(&history_file(), file, url, ts)
}

pub fn add_history_to(path: &Path, file: &str, url: &str, ts: i64) -> Result<HistoryEntry, String> {
    let mut all = load_history_from(path);
    let id = all.iter().map(|e| e.id).max().unwrap_or(0) + 1;
    let entry = HistoryEntry { id, file: file.to_string(), url: url.to_string(), ts };
    all.push(entry.clone());
    write_history(path, &all)?;
    Ok(entry)
}

pub fn remove_history(id: u64) -> Result<(), String> {
    remove_history_from(&history_file(), id)
}

pub fn remove_history_from(path: &Path, id: u64) -> Result<(), String> {
    let mut all = load_history_from(path);
    all.retain(|e| e.id != id);
    write_history(path, &all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_history_from(&dir.path().join("history.json")).is_empty());
    }

    #[test]
    fn add_assigns_increasing_ids_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let a = add_history_to(&path, "a.mp3", "https://example.com/a", 100).unwrap();
        let b = add_history_to(&path, "b.mp3", "https://example.com/b", 200).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        let all = load_history_from(&path);
        assert_eq!(all, vec![a, b]);
    }

    #[test]
    fn remove_drops_only_matching_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        add_history_to(&path, "a.mp3", "https://example.com/a", 100).unwrap();
        add_history_to(&path, "b.mp3", "https://example.com/b", 200).unwrap();
        remove_history_from(&path, 1).unwrap();
        let all = load_history_from(&path);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].file, "b.mp3");
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_history_from(&path).is_empty());
    }
}
