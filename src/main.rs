use eframe::egui::{self, Color32, RichText, ViewportCommand};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

mod app_state;
mod config;
mod download_utils;
mod downloader;
mod error;
mod helpers;
mod history;
mod icon;
mod logger;
mod menu;
mod models;
mod notifications;
mod sidebar;
mod storage;
mod tools;
mod ui_helpers;
mod updater;

use app_state::{ExtractState, Msg};
use config::{read_config, save_config};
use download_utils::{expand_download_dir, fallback_destination, move_file};
use downloader::{spawn_extract, ExtractJob};
use error::ExtractError;
use helpers::{file_name_of, format_timestamp, now_timestamp};
use history::{demo_seed, group_history, insert_just_now};
use logger::{log_error, log_line};
use menu::MenuAction;
use models::{Backend, Config, HistoryEntry, MediaItem, Normalization};
use sidebar::SidebarEvent;
use tools::ToolInfo;
use ui_helpers::{Toast, ToastType};
use updater::UpdateInfo;

const WINDOW_SIZE: [f32; 2] = [840.0, 620.0];
const WINDOW_MIN_SIZE: [f32; 2] = [600.0, 360.0];
const RELEASE_CHECK_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_MSGS_PER_FRAME: usize = 64;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct CliFlags {
    demo: bool,
    dev: bool,
}

fn parse_cli_flags<I: IntoIterator<Item = String>>(args: I) -> CliFlags {
    let mut flags = CliFlags::default();
    for a in args {
        match a.as_str() {
            "--demo" => flags.demo = true,
            "--dev" => flags.dev = true,
            _ => {}
        }
    }
    flags
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    let flags = parse_cli_flags(std::env::args().skip(1));
    storage::set_dev_mode(flags.dev);
    log_line(&format!("Media.Ext {} starting (demo={}, dev={})", env!("CARGO_PKG_VERSION"), flags.demo, flags.dev));

    let viewport = egui::ViewportBuilder::default()
        .with_title("Media.Ext")
        .with_inner_size(WINDOW_SIZE)
        .with_min_inner_size(WINDOW_MIN_SIZE)
        .with_icon(icon::generate_icon(256));
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Media.Ext",
        options,
        Box::new(move |_cc| Box::new(MediaExt::new(flags.demo))),
    )
}

struct MediaExt {
    config: Config,
    config_draft: Option<Config>,
    tx: Sender<Msg>,
    rx: Receiver<Msg>,

    extract: ExtractState,
    history: Vec<HistoryEntry>,
    rows: Vec<MediaItem>,
    selected_row: Option<usize>,

    tools: Option<ToolInfo>,
    ytdlp_release: Option<UpdateInfo>,

    sidebar_visible: bool,
    zoomed: bool,
    show_about: bool,
    show_invalid_url: bool,
    theme_applied: bool,
    toasts: Vec<Toast>,
}

impl MediaExt {
    fn new(force_demo: bool) -> Self {
        let mut config = read_config().unwrap_or_else(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                log_error("Reading config failed, using defaults", &e);
            }
            Config::default()
        });
        if force_demo {
            config.backend = Backend::Demo;
        }
        let (tx, rx) = mpsc::channel();
        let history = storage::load_history();

        let mut app = Self {
            config,
            config_draft: None,
            tx,
            rx,
            extract: ExtractState::default(),
            history,
            rows: Vec::new(),
            selected_row: None,
            tools: None,
            ytdlp_release: None,
            sidebar_visible: true,
            zoomed: false,
            show_about: false,
            show_invalid_url: false,
            theme_applied: false,
            toasts: Vec::new(),
        };
        app.rebuild_rows();
        app.spawn_tool_detection();
        app
    }

    fn is_demo(&self) -> bool {
        self.config.backend == Backend::Demo
    }

    fn rebuild_rows(&mut self) {
        self.rows = if self.is_demo() {
            demo_seed()
        } else {
            group_history(&self.history, now_timestamp())
        };
        self.selected_row = None;
    }

    fn add_toast(&mut self, message: impl Into<String>, toast_type: ToastType) {
        self.toasts.push(Toast::new(message, toast_type));
    }

    /// Tool lookup runs `which` and `--version`, so keep it off the UI thread.
    fn spawn_tool_detection(&self) {
        let cfg = self.config.clone();
        let check_release = cfg.check_for_updates && !self.is_demo();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let info = match tokio::task::spawn_blocking(move || tools::detect_tools(&cfg)).await {
                Ok(info) => info,
                Err(e) => {
                    log_line(&format!("Tool detection task failed: {}", e));
                    ToolInfo::default()
                }
            };
            let installed = info.ytdlp_version.clone();
            let _ = tx.send(Msg::ToolsDetected(info));
            if !check_release {
                return;
            }
            let result = match tokio::time::timeout(
                RELEASE_CHECK_TIMEOUT,
                updater::check_ytdlp_release(installed.as_deref()),
            )
            .await
            {
                Ok(r) => r,
                Err(_) => Err("yt-dlp release check timed out".to_string()),
            };
            let _ = tx.send(Msg::YtDlpRelease(result));
        });
    }

    fn copy_to_clipboard(&mut self, text: &str) -> bool {
        match arboard::Clipboard::new().and_then(|mut c| c.set_text(text.to_string())) {
            Ok(()) => true,
            Err(e) => {
                log_line(&format!("Clipboard write failed: {}", e));
                self.add_toast("Clipboard not available", ToastType::Error);
                false
            }
        }
    }

    fn paste_url(&mut self) {
        if self.extract.busy {
            return;
        }
        let text = arboard::Clipboard::new().and_then(|mut c| c.get_text()).ok();
        self.extract.paste(text);
    }

    fn start_extract(&mut self) {
        match self.extract.begin_extract() {
            Ok(None) => {}
            Ok(Some((url, cancel))) => {
                let (ytdlp, ffmpeg) = match self.config.backend {
                    Backend::Demo => (None, None),
                    Backend::YtDlp => tools::job_tool_paths(self.tools.as_ref(), &self.config),
                };
                let job = ExtractJob {
                    url: url.to_string(),
                    backend: self.config.backend,
                    normalization: self.config.normalization,
                    ytdlp,
                    ffmpeg,
                };
                spawn_extract(job, self.tx.clone(), cancel);
            }
            Err(ExtractError::InvalidUrl(text)) => {
                log_line(&format!("Rejected URL: {}", text));
                self.show_invalid_url = true;
            }
            Err(e) => {
                log_line(&format!("Extract could not start: {}", e));
                self.add_toast(e.to_string(), ToastType::Error);
            }
        }
    }

    fn handle_msg(&mut self, msg: Msg) {
        match msg {
            Msg::Log(line) => self.extract.on_log(&line),
            Msg::Progress(p) => self.extract.on_progress(p),
            Msg::Status { kind, message } => self.extract.on_status(kind, &message),
            Msg::ExtractFinished(src) => {
                if let Some(path) = self.extract.on_finished(src) {
                    self.save_file(path);
                }
            }
            Msg::ExtractFailed(e) => {
                self.extract.on_failed(&e);
                self.add_toast(format!("Extraction failed: {}", e), ToastType::Error);
            }
            Msg::ExtractCancelled => self.extract.on_cancelled(),
            Msg::ToolsDetected(info) => {
                log_line(&format!("Tools: {}", info.summary()));
                if !self.is_demo() && info.ytdlp_path.is_none() {
                    self.add_toast("yt-dlp not found. Set its path in Preferences.", ToastType::Warning);
                }
                self.tools = Some(info);
            }
            Msg::YtDlpRelease(Ok(info)) => {
                if info.update_available {
                    self.add_toast(
                        format!(
                            "yt-dlp {} is available (installed {})",
                            info.latest_version,
                            info.installed_version.as_deref().unwrap_or("unknown")
                        ),
                        ToastType::Info,
                    );
                }
                self.ytdlp_release = Some(info);
            }
            Msg::YtDlpRelease(Err(e)) => log_line(&format!("yt-dlp release check failed: {}", e)),
        }
    }

    /// Ask where to keep the file, move it there and record it.
    fn save_file(&mut self, src: PathBuf) {
        let save_dir = expand_download_dir(&self.config.download_dir);
        if let Err(e) = std::fs::create_dir_all(&save_dir) {
            log_error("Creating save directory failed", &e);
        }
        let mut dest = rfd::FileDialog::new()
            .set_title("Save Audio")
            .set_directory(&save_dir)
            .set_file_name(file_name_of(&src))
            .add_filter("MP3 Audio", &["mp3"])
            .save_file()
            .unwrap_or_else(|| fallback_destination(&save_dir, &src));
        if dest.extension().is_none() {
            dest.set_extension("mp3");
        }

        let result = move_file(&src, &dest).map_err(|e| e.to_string());
        match &result {
            Ok(path) => self.record_saved(path),
            Err(e) => log_line(&format!("Save failed for {}: {}", src.display(), e)),
        }
        self.extract.finish_save(result);
    }

    fn record_saved(&mut self, path: &std::path::Path) {
        let name = file_name_of(path);
        let url = self.extract.current_url.clone().unwrap_or_default();
        let ts = now_timestamp();
        let mut row = MediaItem::item(&name, &format_timestamp(ts));
        match storage::add_history(&name, &url, ts) {
            Ok(entry) => {
                row = row.with_source(&entry);
                self.history.push(entry);
            }
            Err(e) => log_line(&format!("Could not persist history: {}", e)),
        }
        insert_just_now(&mut self.rows, row);
        self.selected_row = None;
        if self.config.notifications {
            notifications::notify_extraction_completed(&name);
        }
        log_line(&format!("Saved {} from {}", path.display(), url));
    }

    fn apply_menu_action(&mut self, ctx: &egui::Context, action: MenuAction) {
        match action {
            MenuAction::About => self.show_about = true,
            MenuAction::Preferences => {
                if self.config_draft.is_none() {
                    self.config_draft = Some(self.config.clone());
                }
            }
            MenuAction::Quit | MenuAction::CloseWindow => {
                self.extract.cancel();
                ctx.send_viewport_cmd(ViewportCommand::Close);
            }
            MenuAction::PasteUrl => self.paste_url(),
            MenuAction::CopyLog => {
                if self.extract.log.is_empty() {
                    self.add_toast("Log is empty", ToastType::Info);
                    return;
                }
                let text = self.extract.log.as_str().to_string();
                if self.copy_to_clipboard(&text) {
                    self.add_toast("Log copied to clipboard", ToastType::Success);
                }
            }
            MenuAction::ClearLog => self.extract.log.reset(),
            MenuAction::Minimize => ctx.send_viewport_cmd(ViewportCommand::Minimized(true)),
            MenuAction::Zoom => {
                self.zoomed = !self.zoomed;
                ctx.send_viewport_cmd(ViewportCommand::Maximized(self.zoomed));
            }
            MenuAction::ToggleSidebar => self.sidebar_visible = !self.sidebar_visible,
            MenuAction::SupportedSites => {
                if let Err(e) = webbrowser::open(menu::SUPPORTED_SITES_URL) {
                    log_error("Opening browser failed", &e);
                }
            }
            MenuAction::OpenLogFile => {
                let path = logger::log_path();
                if !path.exists() {
                    log_line("Log file created");
                }
                if let Err(e) = webbrowser::open(&path.to_string_lossy()) {
                    log_error("Opening log file failed", &e);
                    self.add_toast(format!("Log file: {}", path.display()), ToastType::Info);
                }
            }
        }
    }

    fn handle_sidebar_event(&mut self, event: SidebarEvent) {
        match event {
            SidebarEvent::Selected(i) => {
                if !sidebar::selectable(&self.rows, i) {
                    return;
                }
                self.selected_row = Some(i);
                if let Some(url) = self.rows[i].url.clone() {
                    if self.copy_to_clipboard(&url) {
                        self.add_toast("URL copied to clipboard", ToastType::Success);
                    }
                }
            }
            SidebarEvent::CopyUrl(url) => {
                if self.copy_to_clipboard(&url) {
                    self.add_toast("URL copied to clipboard", ToastType::Success);
                }
            }
            SidebarEvent::OpenUrl(url) => {
                if let Err(e) = webbrowser::open(&url) {
                    log_error("Opening browser failed", &e);
                }
            }
            SidebarEvent::Remove(id) => match storage::remove_history(id) {
                Ok(()) => {
                    self.history.retain(|h| h.id != id);
                    self.rebuild_rows();
                }
                Err(e) => {
                    log_line(&format!("Removing history entry {} failed: {}", id, e));
                    self.add_toast("Could not remove entry", ToastType::Error);
                }
            },
        }
    }

    fn apply_draft(&mut self, draft: Config) {
        let theme_changed = draft.theme != self.config.theme;
        let backend_changed = draft.backend != self.config.backend;
        let tools_changed = draft.ytdlp_path != self.config.ytdlp_path || draft.ffmpeg_path != self.config.ffmpeg_path;
        self.config = draft;
        if let Err(e) = save_config(&self.config) {
            log_error("Saving config failed", &e);
            self.add_toast("Could not save preferences", ToastType::Error);
            return;
        }
        if theme_changed {
            self.theme_applied = false;
        }
        if backend_changed {
            self.rebuild_rows();
        }
        if tools_changed {
            self.tools = None;
            self.spawn_tool_detection();
        }
        self.add_toast("Preferences saved", ToastType::Success);
    }

    fn render_url_row(&mut self, ui: &mut egui::Ui) {
        let busy = self.extract.busy;
        let mut paste = false;
        let mut extract = false;
        let mut cancel = false;
        ui.horizontal(|ui| {
            let buttons_w = if busy { 210.0 } else { 150.0 };
            let field = ui.add_enabled(
                !busy,
                egui::TextEdit::singleline(&mut self.extract.url_input)
                    .hint_text("https")
                    .desired_width((ui.available_width() - buttons_w).max(120.0)),
            );
            if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                extract = true;
            }
            if ui.add_enabled(!busy, egui::Button::new("Paste")).clicked() {
                paste = true;
            }
            if ui.add_enabled(!busy, egui::Button::new(RichText::new("Extract").strong())).clicked() {
                extract = true;
            }
            if busy && ui.button("Cancel").clicked() {
                cancel = true;
            }
        });
        if paste {
            self.paste_url();
        }
        if extract {
            self.start_extract();
        }
        if cancel {
            self.extract.cancel();
        }
    }

    fn render_preferences(&mut self, ctx: &egui::Context) {
        let Some(draft) = self.config_draft.as_mut() else {
            return;
        };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        let mut open_release = None;
        let tools = self.tools.as_ref();
        let release = self.ytdlp_release.as_ref();

        egui::Window::new("Preferences")
            .collapsible(false)
            .resizable(false)
            .default_width(460.0)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                egui::Grid::new("prefs_grid").num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
                    ui.label("Backend:");
                    egui::ComboBox::from_id_source("prefs_backend")
                        .selected_text(draft.backend.label())
                        .show_ui(ui, |ui| {
                            for b in [Backend::YtDlp, Backend::Demo] {
                                ui.selectable_value(&mut draft.backend, b, b.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Normalization:");
                    egui::ComboBox::from_id_source("prefs_normalization")
                        .selected_text(draft.normalization.as_str())
                        .show_ui(ui, |ui| {
                            for n in Normalization::ALL {
                                ui.selectable_value(&mut draft.normalization, n, n.as_str());
                            }
                        });
                    ui.end_row();

                    ui.label("Save folder:");
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut draft.download_dir)
                                .hint_text("~/Downloads/Media.Ext")
                                .desired_width(220.0),
                        );
                        if ui.button("Choose…").clicked() {
                            if let Some(dir) = rfd::FileDialog::new()
                                .set_directory(expand_download_dir(&draft.download_dir))
                                .pick_folder()
                            {
                                draft.download_dir = dir.to_string_lossy().to_string();
                            }
                        }
                    });
                    ui.end_row();

                    ui.label("yt-dlp path:");
                    ui.add(egui::TextEdit::singleline(&mut draft.ytdlp_path).hint_text("auto-detect"));
                    ui.end_row();

                    ui.label("ffmpeg path:");
                    ui.add(egui::TextEdit::singleline(&mut draft.ffmpeg_path).hint_text("auto-detect"));
                    ui.end_row();

                    ui.label("Theme:");
                    egui::ComboBox::from_id_source("prefs_theme")
                        .selected_text(draft.theme.as_str())
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut draft.theme, "dark".to_string(), "dark");
                            ui.selectable_value(&mut draft.theme, "light".to_string(), "light");
                        });
                    ui.end_row();
                });

                ui.add_space(4.0);
                ui.checkbox(&mut draft.notifications, "Notify when an extraction completes");
                ui.checkbox(&mut draft.check_for_updates, "Check for new yt-dlp releases at startup");

                ui.separator();
                match tools {
                    None => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.weak("Detecting tools…");
                        });
                    }
                    Some(info) => {
                        let line = |ui: &mut egui::Ui, name: &str, path: &Option<String>, ver: &Option<String>| {
                            match path {
                                Some(p) => ui.label(format!("{} {} ({})", name, ver.as_deref().unwrap_or("?"), p)),
                                None => ui.colored_label(Color32::from_rgb(220, 120, 60), format!("{} not found", name)),
                            };
                        };
                        line(ui, "yt-dlp", &info.ytdlp_path, &info.ytdlp_version);
                        line(ui, "ffmpeg", &info.ffmpeg_path, &info.ffmpeg_version);
                    }
                }
                if let Some(r) = release {
                    ui.horizontal(|ui| {
                        ui.label(format!("Latest yt-dlp release: {}", r.latest_version));
                        if r.update_available && ui.small_button("Open release page").clicked() {
                            open_release = Some(r.release_url.clone());
                        }
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if let Some(url) = open_release {
            if let Err(e) = updater::open_release_page(&url) {
                log_line(&e);
            }
        }
        if save {
            if let Some(draft) = self.config_draft.take() {
                self.apply_draft(draft);
            }
        } else if cancel || !open {
            self.config_draft = None;
        }
    }

    fn render_about(&mut self, ctx: &egui::Context) {
        let mut open = self.show_about;
        egui::Window::new("About Media.Ext")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .open(&mut open)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(6.0);
                    ui.label(RichText::new("Media.Ext").strong().size(20.0));
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(6.0);
                    ui.label("Extracts loudness-normalized MP3 audio from online media.");
                    ui.weak("Powered by yt-dlp and ffmpeg.");
                    ui.add_space(6.0);
                });
            });
        self.show_about = open;
    }

    fn render_invalid_url(&mut self, ctx: &egui::Context) {
        if !self.show_invalid_url {
            return;
        }
        let mut dismiss = false;
        egui::Window::new("Invalid URL")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Please enter a valid URL.");
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismiss = true;
                    }
                });
            });
        if dismiss || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.show_invalid_url = false;
        }
    }
}

impl eframe::App for MediaExt {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            match self.config.theme.as_str() {
                "light" => ctx.set_visuals(egui::Visuals::light()),
                _ => ctx.set_visuals(egui::Visuals::dark()),
            }
            self.theme_applied = true;
        }

        let mut handled = 0;
        while handled < MAX_MSGS_PER_FRAME {
            let Ok(msg) = self.rx.try_recv() else { break };
            self.handle_msg(msg);
            handled += 1;
        }
        if self.extract.busy || handled > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let modal_open = self.show_invalid_url;
        if !modal_open {
            if let Some(action) = menu::shortcut_action(ctx) {
                self.apply_menu_action(ctx, action);
            }
        }

        let mut action = None;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            action = menu::render_menu_bar(ui);
            ui.add_space(2.0);
            if let Some(a) = menu::render_toolbar(ui, self.sidebar_visible) {
                action = Some(a);
            }
            ui.add_space(2.0);
        });
        if let Some(a) = action {
            self.apply_menu_action(ctx, a);
        }

        let mut sidebar_event = None;
        let panel = egui::SidePanel::left("history_sidebar")
            .default_width(self.config.sidebar_width)
            .width_range(200.0..=400.0)
            .resizable(true)
            .show_animated(ctx, self.sidebar_visible, |ui| {
                sidebar_event = sidebar::render_sidebar(ui, &self.rows, self.selected_row);
            });
        if let Some(inner) = panel {
            let w = inner.response.rect.width();
            if (w - self.config.sidebar_width).abs() > 4.0 && !ctx.input(|i| i.pointer.any_down()) {
                self.config.sidebar_width = w.clamp(200.0, 400.0);
                if let Err(e) = save_config(&self.config) {
                    log_error("Saving sidebar width failed", &e);
                }
            }
        }
        if let Some(ev) = sidebar_event {
            self.handle_sidebar_event(ev);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!modal_open, |ui| {
                ui.add_space(6.0);
                self.render_url_row(ui);
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.set_min_height(24.0);
                    ui_helpers::render_status_pill(ui, &self.extract.status);
                    if let Some(p) = self.extract.progress {
                        ui.add(egui::ProgressBar::new(p / 100.0).desired_width(160.0));
                    }
                });
                ui.add_space(6.0);
                ui_helpers::render_log_panel(ui, &self.extract.log);
            });
        });

        self.render_preferences(ctx);
        self.render_about(ctx);
        self.render_invalid_url(ctx);
        ui_helpers::render_toasts(ctx, &mut self.toasts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cli_flags_are_recognized() {
        assert_eq!(parse_cli_flags(args(&[])), CliFlags::default());
        assert_eq!(parse_cli_flags(args(&["--demo"])), CliFlags { demo: true, dev: false });
        assert_eq!(parse_cli_flags(args(&["--dev", "--demo", "--other"])), CliFlags { demo: true, dev: true });
    }
}
