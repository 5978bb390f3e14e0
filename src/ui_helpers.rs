use std::time::{Duration, Instant};

use eframe::egui::{self, Color32, RichText, Ui};

use crate::app_state::{LogBuffer, StatusKind, StatusPill};

const TOAST_DURATION: f32 = 5.0; // seconds
const TOAST_FADE_OUT: f32 = 1.0; // seconds fade-out
const TOAST_WIDTH: f32 = 360.0;

#[derive(Clone)]
pub struct Toast {
    pub message: String,
    pub toast_type: ToastType,
    pub created_at: Instant,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ToastType {
    Info,
    Success,
    Warning,
    Error,
}

impl Toast {
    pub fn new(message: impl Into<String>, toast_type: ToastType) -> Self {
        Self { message: message.into(), toast_type, created_at: Instant::now() }
    }

    /// 1.0 while fully visible, fading to 0.0 during the last second.
    pub fn alpha_at(&self, now: Instant) -> f32 {
        let elapsed = now.duration_since(self.created_at).as_secs_f32();
        if elapsed > TOAST_DURATION {
            (1.0 - (elapsed - TOAST_DURATION) / TOAST_FADE_OUT).max(0.0)
        } else {
            1.0
        }
    }
}

fn toast_colors(kind: ToastType, alpha: f32) -> (Color32, Color32) {
    let a = |v: f32| (v * alpha) as u8;
    match kind {
        ToastType::Info => (
            Color32::from_rgba_unmultiplied(60, 120, 180, a(200.0)),
            Color32::from_rgba_unmultiplied(255, 255, 255, a(255.0)),
        ),
        ToastType::Success => (
            Color32::from_rgba_unmultiplied(60, 180, 80, a(200.0)),
            Color32::from_rgba_unmultiplied(255, 255, 255, a(255.0)),
        ),
        ToastType::Warning => (
            Color32::from_rgba_unmultiplied(220, 180, 60, a(200.0)),
            Color32::from_rgba_unmultiplied(40, 40, 40, a(255.0)),
        ),
        ToastType::Error => (
            Color32::from_rgba_unmultiplied(200, 60, 60, a(200.0)),
            Color32::from_rgba_unmultiplied(255, 255, 255, a(255.0)),
        ),
    }
}

/// Stack of toasts in the top-right corner; drops expired ones.
pub fn render_toasts(ctx: &egui::Context, toasts: &mut Vec<Toast>) {
    let now = Instant::now();
    toasts.retain(|t| t.alpha_at(now) > 0.0);
    if toasts.is_empty() {
        return;
    }

    let screen_rect = ctx.screen_rect();
    let margin = 16.0;
    for (i, toast) in toasts.iter().enumerate() {
        let alpha = toast.alpha_at(now);
        let pos = egui::pos2(
            screen_rect.right() - TOAST_WIDTH - margin,
            screen_rect.top() + 40.0 + i as f32 * 58.0,
        );
        let (bg, fg) = toast_colors(toast.toast_type, alpha);
        egui::Area::new(egui::Id::new(("toast", i)))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(bg)
                    .rounding(8.0)
                    .inner_margin(egui::Margin::symmetric(14.0, 10.0))
                    .shadow(egui::epaint::Shadow {
                        extrusion: 8.0,
                        color: Color32::from_black_alpha((50.0 * alpha) as u8),
                    })
                    .show(ui, |ui| {
                        ui.set_max_width(TOAST_WIDTH - 28.0);
                        ui.style_mut().wrap = Some(true);
                        ui.label(RichText::new(&toast.message).color(fg));
                    });
            });
    }
    ctx.request_repaint_after(Duration::from_millis(100));
}

/// Background and text color per pill kind; `None` for the hidden pill.
pub fn pill_colors(kind: StatusKind) -> Option<(Color32, Color32)> {
    match kind {
        StatusKind::None => None,
        StatusKind::Progress => Some((Color32::from_rgb(52, 110, 200), Color32::WHITE)),
        StatusKind::Success => Some((Color32::from_rgb(46, 160, 67), Color32::WHITE)),
        StatusKind::Error => Some((Color32::from_rgb(200, 55, 55), Color32::WHITE)),
    }
}

pub fn render_status_pill(ui: &mut Ui, status: &StatusPill) {
    let Some((bg, fg)) = pill_colors(status.kind) else {
        return;
    };
    egui::Frame::none()
        .fill(bg)
        .rounding(10.0)
        .inner_margin(egui::Margin::symmetric(10.0, 3.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                match status.kind {
                    StatusKind::Progress => {
                        ui.add(egui::Spinner::new().size(12.0).color(fg));
                    }
                    StatusKind::Success => {
                        ui.label(RichText::new("✔").color(fg));
                    }
                    StatusKind::Error => {
                        ui.label(RichText::new("✖").color(fg));
                    }
                    StatusKind::None => {}
                }
                ui.label(RichText::new(&status.message).color(fg).strong());
            });
        });
}

/// Read-only, selectable log that follows new output.
pub fn render_log_panel(ui: &mut Ui, log: &LogBuffer) {
    egui::Frame::none()
        .fill(ui.visuals().extreme_bg_color)
        .rounding(6.0)
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .id_source("log_scroll")
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    let mut text = log.as_str();
                    ui.add(
                        egui::TextEdit::multiline(&mut text)
                            .font(egui::TextStyle::Monospace)
                            .desired_width(f32::INFINITY)
                            .frame(false),
                    );
                });
        });
}
