use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::app_state::{Msg, StatusKind};
use crate::download_utils::{create_job_dir, find_output_file};
use crate::error::ExtractError;
use crate::logger::{log_command, log_line};
use crate::models::{Backend, Normalization};

const DEMO_DELAY: Duration = Duration::from_millis(1200);
const DEMO_LOG: &str = "test\ntest\ntest";
const CANCEL_POLL: Duration = Duration::from_millis(200);
const OUTPUT_EXT: &str = "mp3";

static PROGRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+(\d{1,3}(?:\.\d+)?)%").expect("progress regex"));

/// Everything a background job needs; captured when Extract is pressed.
#[derive(Debug, Clone)]
pub struct ExtractJob {
    pub url: String,
    pub backend: Backend,
    pub normalization: Normalization,
    pub ytdlp: Option<String>,
    pub ffmpeg: Option<String>,
}

/// `[download]  42.3% of 3.51MiB at ...` -> 42.3
pub fn parse_progress_line(line: &str) -> Option<f32> {
    PROGRESS_RE
        .captures(line.trim_start())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .map(|p| p.clamp(0.0, 100.0))
}

/// yt-dlp prints `WARNING: ...` and `ERROR: ...`; show them with the log panel's tags.
pub fn format_tool_line(line: &str) -> String {
    let line = line.trim_end();
    if let Some(rest) = line.strip_prefix("WARNING:") {
        format!("[WARNING] {}", rest.trim_start())
    } else if let Some(rest) = line.strip_prefix("ERROR:") {
        format!("[ERROR] {}", rest.trim_start())
    } else {
        line.to_string()
    }
}

pub fn build_ytdlp_args(url: &str, out_dir: &Path, norm: Normalization, ffmpeg: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = [
        "--newline",
        "--no-playlist",
        "-f",
        "bestaudio/best",
        "-x",
        "--audio-format",
        OUTPUT_EXT,
        "--audio-quality",
        "0",
        "--no-embed-metadata",
        "--no-embed-thumbnail",
        "--no-write-thumbnail",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    if let Some(ff) = ffmpeg {
        args.push("--ffmpeg-location".into());
        args.push(ff.to_string());
    }
    args.push("--postprocessor-args".into());
    args.push(format!("ffmpeg:-af {}", norm.loudnorm_filter()));
    args.push("-o".into());
    args.push(out_dir.join("%(title)s.%(ext)s").to_string_lossy().to_string());
    args.push(url.to_string());
    args
}

/// Run the job on the tokio runtime; all results arrive on `tx`.
pub fn spawn_extract(job: ExtractJob, tx: Sender<Msg>, cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        log_line(&format!("Extract started ({}): {}", job.backend.as_str(), job.url));
        let result = match job.backend {
            Backend::Demo => run_demo(&tx, &cancel).await,
            Backend::YtDlp => run_ytdlp(&job, &tx, &cancel).await,
        };
        let msg = match result {
            Ok(path) => Msg::ExtractFinished(path),
            Err(ExtractError::Cancelled) => Msg::ExtractCancelled,
            Err(e) => {
                log_line(&format!("Extract failed: {}", e));
                Msg::ExtractFailed(e.to_string())
            }
        };
        let _ = tx.send(msg);
    });
}

/// Placeholder output goes to the log once up front and once after the delay.
async fn run_demo(tx: &Sender<Msg>, cancel: &AtomicBool) -> Result<Option<PathBuf>, ExtractError> {
    let _ = tx.send(Msg::Log(DEMO_LOG.into()));
    tokio::time::sleep(DEMO_DELAY).await;
    if cancel.load(Ordering::Relaxed) {
        return Err(ExtractError::Cancelled);
    }
    let _ = tx.send(Msg::Status { kind: StatusKind::Success, message: "Success".into() });
    let _ = tx.send(Msg::Log(DEMO_LOG.into()));
    Ok(None)
}

async fn run_ytdlp(job: &ExtractJob, tx: &Sender<Msg>, cancel: &AtomicBool) -> Result<Option<PathBuf>, ExtractError> {
    let program = job.ytdlp.clone().ok_or(ExtractError::ToolMissing("yt-dlp"))?;
    if job.ffmpeg.is_none() {
        let _ = tx.send(Msg::Log("[WARNING] ffmpeg not found; yt-dlp will look for it on PATH.".into()));
    }
    let out_dir = create_job_dir()?;
    let args = build_ytdlp_args(&job.url, &out_dir, job.normalization, job.ffmpeg.as_deref());
    log_command(&program, &args);

    let mut child = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(ExtractError::Spawn)?;

    let mut readers = Vec::new();
    if let Some(out) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(out, tx.clone())));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(err, tx.clone())));
    }

    let waited = loop {
        tokio::select! {
            status = child.wait() => break status,
            _ = tokio::time::sleep(CANCEL_POLL) => {
                if cancel.load(Ordering::Relaxed) {
                    let _ = child.kill().await;
                    let _ = std::fs::remove_dir_all(&out_dir);
                    return Err(ExtractError::Cancelled);
                }
            }
        }
    };
    for r in readers {
        let _ = r.await;
    }
    collect_output(&out_dir, waited.map(|s| s.code()))
}

/// Turns the child's exit into the converted file. `Ok(Some(0))` is a clean
/// exit, `Ok(None)` a kill by signal. The job dir is removed on every failure.
fn collect_output(out_dir: &Path, exit: std::io::Result<Option<i32>>) -> Result<Option<PathBuf>, ExtractError> {
    let result = match exit {
        Err(e) => Err(ExtractError::Io(e)),
        Ok(Some(0)) => find_output_file(out_dir, OUTPUT_EXT).map(Some).ok_or(ExtractError::OutputNotFound),
        Ok(code) => Err(ExtractError::ToolFailed(code.unwrap_or(-1))),
    };
    if result.is_err() {
        let _ = std::fs::remove_dir_all(out_dir);
    }
    result
}

async fn forward_lines<R: AsyncRead + Unpin>(stream: R, tx: Sender<Msg>) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(p) = parse_progress_line(&line) {
            if tx.send(Msg::Progress(p)).is_err() {
                break;
            }
            if p < 100.0 {
                continue;
            }
        }
        if tx.send(Msg::Log(format_tool_line(&line))).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_lines_are_parsed() {
        assert_eq!(parse_progress_line("[download]  42.3% of 3.51MiB at 1.2MiB/s ETA 00:02"), Some(42.3));
        assert_eq!(parse_progress_line("[download] 100% of 3.51MiB in 00:03"), Some(100.0));
        assert_eq!(parse_progress_line("[download] Destination: /tmp/x.webm"), None);
        assert_eq!(parse_progress_line("[ExtractAudio] Destination: x.mp3"), None);
    }

    #[test]
    fn tool_lines_get_tags() {
        assert_eq!(format_tool_line("WARNING: slow"), "[WARNING] slow");
        assert_eq!(format_tool_line("ERROR: Unsupported URL"), "[ERROR] Unsupported URL");
        assert_eq!(format_tool_line("[youtube] abc: Downloading webpage\r"), "[youtube] abc: Downloading webpage");
    }

    #[test]
    fn args_carry_normalization_and_output_template() {
        let args = build_ytdlp_args(
            "https://example.com/v",
            Path::new("/tmp/job"),
            Normalization::Medium,
            Some("/usr/bin/ffmpeg"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-x --audio-format mp3"));
        assert!(joined.contains("--ffmpeg-location /usr/bin/ffmpeg"));
        assert!(args.contains(&"ffmpeg:-af loudnorm=I=-16:TP=-1.5:LRA=9".to_string()));
        assert_eq!(args[args.len() - 2], "/tmp/job/%(title)s.%(ext)s");
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/v"));
    }

    #[test]
    fn args_skip_ffmpeg_location_when_unknown() {
        let args = build_ytdlp_args("https://e.com/v", Path::new("/tmp/j"), Normalization::High, None);
        assert!(!args.iter().any(|a| a == "--ffmpeg-location"));
    }

    #[tokio::test]
    async fn demo_job_reports_success_without_file() {
        let (tx, rx) = std::sync::mpsc::channel();
        let result = run_demo(&tx, &AtomicBool::new(false)).await;
        assert!(matches!(result, Ok(None)));
        let got: Vec<Msg> = rx.try_iter().collect();
        assert_eq!(got.len(), 3);
        assert!(matches!(&got[0], Msg::Log(s) if s == "test\ntest\ntest"));
        assert!(matches!(got[1], Msg::Status { kind: StatusKind::Success, .. }));
        assert!(matches!(&got[2], Msg::Log(s) if s == "test\ntest\ntest"));
    }

    #[tokio::test]
    async fn demo_job_fills_log_with_two_placeholder_blocks() {
        let mut st = crate::app_state::ExtractState {
            url_input: "https://example.com/watch".into(),
            ..Default::default()
        };
        st.begin_extract().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let src = run_demo(&tx, &AtomicBool::new(false)).await.unwrap();
        for msg in rx.try_iter() {
            match msg {
                Msg::Log(line) => st.on_log(&line),
                Msg::Status { kind, message } => st.on_status(kind, &message),
                _ => {}
            }
        }
        st.on_finished(src);
        assert_eq!(st.log.as_str().matches("test\ntest\ntest").count(), 2);
        assert_eq!(st.status.kind, StatusKind::Success);
        assert!(!st.busy);
    }

    #[tokio::test]
    async fn cancelled_demo_job_stops_after_first_block() {
        let (tx, rx) = std::sync::mpsc::channel();
        let result = run_demo(&tx, &AtomicBool::new(true)).await;
        assert!(matches!(result, Err(ExtractError::Cancelled)));
        let got: Vec<Msg> = rx.try_iter().collect();
        assert_eq!(got.len(), 1);
        assert!(!got.iter().any(|m| matches!(m, Msg::Status { .. })));
    }

    #[test]
    fn wait_error_removes_job_dir() {
        let root = tempfile::tempdir().unwrap();
        let job = root.path().join("mediaext-wait-error");
        std::fs::create_dir_all(&job).unwrap();
        std::fs::write(job.join("partial.webm.part"), b"x").unwrap();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "wait failed");
        assert!(matches!(collect_output(&job, Err(err)), Err(ExtractError::Io(_))));
        assert!(!job.exists());
    }

    #[test]
    fn failed_exit_and_missing_output_remove_job_dir() {
        let root = tempfile::tempdir().unwrap();
        let job = root.path().join("mediaext-exit-1");
        std::fs::create_dir_all(&job).unwrap();
        assert!(matches!(collect_output(&job, Ok(Some(1))), Err(ExtractError::ToolFailed(1))));
        assert!(!job.exists());

        std::fs::create_dir_all(&job).unwrap();
        assert!(matches!(collect_output(&job, Ok(Some(0))), Err(ExtractError::OutputNotFound)));
        assert!(!job.exists());
    }

    #[test]
    fn clean_exit_keeps_converted_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("song.mp3"), b"audio").unwrap();
        let got = collect_output(root.path(), Ok(Some(0))).unwrap();
        assert_eq!(got, Some(root.path().join("song.mp3")));
        assert!(root.path().exists());
    }

    #[tokio::test]
    async fn missing_ytdlp_fails_cleanly() {
        let (tx, rx) = std::sync::mpsc::channel();
        let job = ExtractJob {
            url: "https://example.com/v".into(),
            backend: Backend::YtDlp,
            normalization: Normalization::High,
            ytdlp: None,
            ffmpeg: None,
        };
        let result = run_ytdlp(&job, &tx, &AtomicBool::new(false)).await;
        assert!(matches!(result, Err(ExtractError::ToolMissing("yt-dlp"))));
        assert!(rx.try_recv().is_err());
    }
}
