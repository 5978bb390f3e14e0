use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::error::ExtractError;
use crate::helpers::validate_url;
use crate::tools::ToolInfo;
use crate::updater::UpdateInfo;

const MAX_LOG_LINES: usize = 5_000;

#[derive(Debug, Clone)]
pub enum Msg {
    // Extraction job
    Log(String),
    Progress(f32),
    Status { kind: StatusKind, message: String },
    ExtractFinished(Option<PathBuf>),
    ExtractFailed(String),
    ExtractCancelled,

    // Tooling
    ToolsDetected(ToolInfo),
    YtDlpRelease(Result<UpdateInfo, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    None,
    Progress,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusPill {
    pub kind: StatusKind,
    pub message: String,
}

impl Default for StatusPill {
    fn default() -> Self {
        Self { kind: StatusKind::None, message: String::new() }
    }
}

impl StatusPill {
    pub fn set(&mut self, kind: StatusKind, message: &str) {
        if kind == StatusKind::None {
            self.reset();
            return;
        }
        self.kind = kind;
        self.message = message.to_string();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Text shown in the log panel. Reset at the start of every extraction.
#[derive(Debug, Default, Clone)]
pub struct LogBuffer {
    content: String,
    lines: usize,
}

impl LogBuffer {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn reset(&mut self) {
        self.content.clear();
        self.lines = 0;
    }

    pub fn debug(&mut self, msg: &str) {
        self.output(msg);
    }

    pub fn info(&mut self, msg: &str) {
        self.output(&format!("[INFO] {}", msg));
    }

    pub fn warning(&mut self, msg: &str) {
        self.output(&format!("[WARNING] {}", msg));
    }

    pub fn error(&mut self, msg: &str) {
        self.output(&format!("[ERROR] {}", msg));
    }

    fn output(&mut self, text: &str) {
        self.content.push_str(text);
        self.content.push('\n');
        self.lines += text.lines().count().max(1);
        if self.lines > MAX_LOG_LINES {
            self.trim_front(self.lines - MAX_LOG_LINES);
        }
    }

    fn trim_front(&mut self, drop: usize) {
        let cut = self
            .content
            .match_indices('\n')
            .nth(drop - 1)
            .map(|(i, _)| i + 1)
            .unwrap_or(self.content.len());
        self.content.drain(..cut);
        self.lines -= drop;
    }
}

/// Everything the content pane shows about the current extraction.
#[derive(Debug, Default)]
pub struct ExtractState {
    pub url_input: String,
    pub status: StatusPill,
    pub log: LogBuffer,
    pub busy: bool,
    pub current_url: Option<String>,
    pub progress: Option<f32>,
    pub(crate) cancel_flag: Option<Arc<AtomicBool>>,
}

impl ExtractState {
    /// Replace the field with clipboard text. Returns false when there is nothing to paste.
    /// The pill reports success either way.
    pub fn paste(&mut self, clipboard: Option<String>) -> bool {
        let pasted = match clipboard.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            Some(text) => {
                self.url_input = text;
                true
            }
            None => false,
        };
        self.status.set(StatusKind::Success, "Success");
        pasted
    }

    /// Validate the field and enter busy state. `Ok(None)` means there is nothing to do.
    pub fn begin_extract(&mut self) -> Result<Option<(Url, Arc<AtomicBool>)>, ExtractError> {
        if self.busy {
            return Ok(None);
        }
        let text = self.url_input.trim().to_string();
        if text.is_empty() {
            return Ok(None);
        }
        let url = validate_url(&text)?;
        let flag = Arc::new(AtomicBool::new(false));
        self.log.reset();
        self.log.info("Extract started.");
        self.status.set(StatusKind::Progress, "Downloading");
        self.busy = true;
        self.progress = None;
        self.current_url = Some(text);
        self.cancel_flag = Some(flag.clone());
        Ok(Some((url, flag)))
    }

    pub fn cancel(&self) {
        if let Some(flag) = &self.cancel_flag {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn on_log(&mut self, line: &str) {
        self.log.debug(line);
    }

    pub fn on_progress(&mut self, percent: f32) {
        if !self.busy {
            return;
        }
        self.progress = Some(percent);
        self.status.set(StatusKind::Progress, &format!("Downloading {:.0}%", percent));
    }

    pub fn on_status(&mut self, kind: StatusKind, message: &str) {
        self.status.set(kind, message);
    }

    /// Returns the file that still has to be saved, if the job produced one.
    pub fn on_finished(&mut self, src: Option<PathBuf>) -> Option<PathBuf> {
        match src {
            Some(path) => {
                self.log.info(&format!("Download finished successfully: {}", path.display()));
                self.status.set(StatusKind::Progress, "Saving File");
                Some(path)
            }
            None => {
                self.end_busy();
                None
            }
        }
    }

    pub fn on_failed(&mut self, error: &str) {
        self.log.error(&format!("Download failed: {}", error));
        self.status.set(StatusKind::Error, "Failed");
        self.end_busy();
    }

    pub fn on_cancelled(&mut self) {
        self.log.warning("Extraction cancelled.");
        self.status.set(StatusKind::Error, "Cancelled");
        self.end_busy();
    }

    pub fn finish_save(&mut self, result: Result<PathBuf, String>) {
        match result {
            Ok(path) => {
                self.log.info(&format!("Saving to: {}", path.display()));
                self.log.info("File saved successfully.");
                self.status.set(StatusKind::Success, "Success");
            }
            Err(e) => {
                self.log.error(&format!("Save failed: {}", e));
                self.status.set(StatusKind::Error, "Failed");
            }
        }
        self.end_busy();
    }

    fn end_busy(&mut self) {
        self.busy = false;
        self.progress = None;
        self.cancel_flag = None;
        self.url_input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paste_ignores_missing_clipboard_text() {
        let mut st = ExtractState { url_input: "keep".into(), ..Default::default() };
        assert!(!st.paste(None));
        assert!(!st.paste(Some("   ".into())));
        assert_eq!(st.url_input, "keep");
        assert!(st.paste(Some(" https://a.example/v \n".into())));
        assert_eq!(st.url_input, "https://a.example/v");
    }

    #[test]
    fn paste_reports_success_whatever_the_clipboard_held() {
        let mut st = ExtractState::default();
        st.paste(Some("https://a.example".into()));
        assert_eq!(st.status, StatusPill { kind: StatusKind::Success, message: "Success".into() });

        let mut empty = ExtractState { url_input: "keep".into(), ..Default::default() };
        assert!(!empty.paste(None));
        assert_eq!(empty.status.kind, StatusKind::Success);
        assert_eq!(empty.url_input, "keep");
    }

    #[test]
    fn empty_field_is_a_no_op() {
        let mut st = ExtractState::default();
        assert!(matches!(st.begin_extract(), Ok(None)));
        assert!(!st.busy);
        assert_eq!(st.status.kind, StatusKind::None);
    }

    #[test]
    fn invalid_url_leaves_state_untouched() {
        let mut st = ExtractState { url_input: "ftp://x".into(), ..Default::default() };
        assert!(matches!(st.begin_extract(), Err(ExtractError::InvalidUrl(_))));
        assert!(!st.busy);
        assert!(st.log.is_empty());
        assert_eq!(st.url_input, "ftp://x");
    }

    #[test]
    fn placeholder_sequence_ends_in_success() {
        let mut st = ExtractState::default();
        st.paste(Some("https://example.com/watch".into()));
        let started = st.begin_extract().unwrap();
        assert!(started.is_some());
        assert!(st.busy);
        assert_eq!(st.status, StatusPill { kind: StatusKind::Progress, message: "Downloading".into() });
        assert_eq!(st.log.as_str(), "[INFO] Extract started.\n");

        st.on_status(StatusKind::Success, "Success");
        st.on_log("test\ntest\ntest");
        assert_eq!(st.on_finished(None), None);

        assert!(!st.busy);
        assert_eq!(st.status.message, "Success");
        assert!(st.log.as_str().ends_with("test\ntest\ntest\n"));
        assert!(st.url_input.is_empty());
    }

    #[test]
    fn second_press_while_busy_does_nothing() {
        let mut st = ExtractState { url_input: "https://example.com/a".into(), ..Default::default() };
        st.begin_extract().unwrap();
        st.url_input = "https://example.com/b".into();
        assert!(matches!(st.begin_extract(), Ok(None)));
        assert_eq!(st.current_url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn finished_file_goes_through_save() {
        let mut st = ExtractState { url_input: "https://example.com/a".into(), ..Default::default() };
        st.begin_extract().unwrap();
        let src = st.on_finished(Some(PathBuf::from("/tmp/job/a.mp3")));
        assert_eq!(src, Some(PathBuf::from("/tmp/job/a.mp3")));
        assert!(st.busy);
        assert_eq!(st.status.message, "Saving File");
        st.finish_save(Ok(PathBuf::from("/music/a.mp3")));
        assert!(!st.busy);
        assert_eq!(st.status.kind, StatusKind::Success);
    }

    #[test]
    fn failure_and_cancel_report_errors() {
        let mut st = ExtractState { url_input: "https://example.com/a".into(), ..Default::default() };
        let (_, flag) = st.begin_extract().unwrap().unwrap();
        st.cancel();
        assert!(flag.load(Ordering::Relaxed));
        st.on_cancelled();
        assert_eq!(st.status.kind, StatusKind::Error);

        st.url_input = "https://example.com/b".into();
        st.begin_extract().unwrap();
        st.on_failed("yt-dlp exited with status 1");
        assert!(st.log.as_str().contains("[ERROR] Download failed: yt-dlp exited with status 1"));
        assert_eq!(st.status.message, "Failed");
        assert!(!st.busy);
    }

    #[test]
    fn progress_only_counts_while_busy() {
        let mut st = ExtractState::default();
        st.on_progress(40.0);
        assert_eq!(st.status.kind, StatusKind::None);
        st.url_input = "https://example.com/a".into();
        st.begin_extract().unwrap();
        st.on_progress(42.4);
        assert_eq!(st.status.message, "Downloading 42%");
    }

    #[test]
    fn log_buffer_drops_oldest_lines() {
        let mut log = LogBuffer::default();
        for i in 0..(MAX_LOG_LINES + 10) {
            log.debug(&format!("line {}", i));
        }
        assert!(log.as_str().starts_with("line 10\n"));
        assert_eq!(log.as_str().lines().count(), MAX_LOG_LINES);
    }
}
