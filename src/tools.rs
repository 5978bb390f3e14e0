use std::path::Path;
use std::process::Command;

use crate::models::Config;

const YTDLP_CANDIDATES: [&str; 4] = [
    "/opt/homebrew/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/usr/bin/yt-dlp",
    "~/.local/bin/yt-dlp",
];

const FFMPEG_CANDIDATES: [&str; 3] = [
    "/opt/homebrew/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/usr/bin/ffmpeg",
];

/// External programs the yt-dlp backend relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolInfo {
    pub ytdlp_path: Option<String>,
    pub ytdlp_version: Option<String>,
    pub ffmpeg_path: Option<String>,
    pub ffmpeg_version: Option<String>,
}

impl ToolInfo {
    pub fn summary(&self) -> String {
        let part = |name: &str, path: &Option<String>, ver: &Option<String>| match (path, ver) {
            (Some(_), Some(v)) => format!("{} {}", name, v),
            (Some(_), None) => format!("{} found", name),
            (None, _) => format!("{} missing", name),
        };
        format!(
            "{}, {}",
            part("yt-dlp", &self.ytdlp_path, &self.ytdlp_version),
            part("ffmpeg", &self.ffmpeg_path, &self.ffmpeg_version)
        )
    }
}

fn which(name: &str) -> Option<String> {
    Command::new("which")
        .arg(name)
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn expand_home(p: &str) -> String {
    match (p.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => p.to_string(),
    }
}

/// Configured path wins when it exists, then PATH, then well-known install locations.
pub fn resolve_tool(custom: &str, name: &str, candidates: &[&str]) -> Option<String> {
    let custom = custom.trim();
    if !custom.is_empty() {
        let p = expand_home(custom);
        if Path::new(&p).exists() {
            return Some(p);
        }
    }
    if let Some(p) = which(name).filter(|p| Path::new(p).exists()) {
        return Some(p);
    }
    candidates
        .iter()
        .map(|c| expand_home(c))
        .find(|c| Path::new(c).exists())
}

fn first_line_of_output(program: &str, flag: &str) -> Option<String> {
    Command::new(program)
        .arg(flag)
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .and_then(|s| s.lines().next().map(|l| l.trim().to_string()))
        .filter(|s| !s.is_empty())
}

/// `ffmpeg version 6.1.1 Copyright ...` -> `6.1.1`
pub fn parse_ffmpeg_version(line: &str) -> Option<String> {
    line.strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .map(|s| s.to_string())
}

pub fn resolve_ytdlp(cfg: &Config) -> Option<String> {
    resolve_tool(&cfg.ytdlp_path, "yt-dlp", &YTDLP_CANDIDATES)
}

pub fn resolve_ffmpeg(cfg: &Config) -> Option<String> {
    resolve_tool(&cfg.ffmpeg_path, "ffmpeg", &FFMPEG_CANDIDATES)
}

/// Paths handed to an extraction job. The detected set is reused so the UI
/// thread only searches `PATH` before detection has reported back.
pub fn job_tool_paths(cached: Option<&ToolInfo>, cfg: &Config) -> (Option<String>, Option<String>) {
    match cached {
        Some(info) => (info.ytdlp_path.clone(), info.ffmpeg_path.clone()),
        None => (resolve_ytdlp(cfg), resolve_ffmpeg(cfg)),
    }
}

/// Blocking; run it off the UI thread.
pub fn detect_tools(cfg: &Config) -> ToolInfo {
    let ytdlp_path = resolve_ytdlp(cfg);
    let ffmpeg_path = resolve_ffmpeg(cfg);
    let ytdlp_version = ytdlp_path.as_deref().and_then(|p| first_line_of_output(p, "--version"));
    let ffmpeg_version = ffmpeg_path
        .as_deref()
        .and_then(|p| first_line_of_output(p, "-version"))
        .and_then(|l| parse_ffmpeg_version(&l));
    ToolInfo { ytdlp_path, ytdlp_version, ffmpeg_path, ffmpeg_version }
}
