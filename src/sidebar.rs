use eframe::egui::{self, Align2, Color32, FontId, Sense, Ui};
use egui_extras::{Column, TableBuilder};

use crate::models::MediaItem;

pub const GROUP_ROW_HEIGHT: f32 = 28.0;
pub const ITEM_ROW_HEIGHT: f32 = 48.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarEvent {
    Selected(usize),
    CopyUrl(String),
    OpenUrl(String),
    Remove(u64),
}

pub fn row_height(item: &MediaItem) -> f32 {
    if item.is_group { GROUP_ROW_HEIGHT } else { ITEM_ROW_HEIGHT }
}

/// Only item rows can be selected.
pub fn selectable(rows: &[MediaItem], index: usize) -> bool {
    rows.get(index).map(|r| !r.is_group).unwrap_or(false)
}

pub fn render_sidebar(ui: &mut Ui, rows: &[MediaItem], selected: Option<usize>) -> Option<SidebarEvent> {
    let mut event = None;
    if rows.is_empty() {
        ui.add_space(12.0);
        ui.vertical_centered(|ui| {
            ui.weak("No extractions yet");
        });
        return None;
    }

    TableBuilder::new(ui)
        .striped(false)
        .resizable(false)
        .vscroll(true)
        .auto_shrink([false, false])
        .column(Column::remainder())
        .body(|body| {
            let heights = rows.iter().map(row_height);
            body.heterogeneous_rows(heights, |index, mut row| {
                let item = &rows[index];
                row.col(|ui| {
                    if item.is_group {
                        render_group_row(ui, item);
                    } else if let Some(ev) = render_item_row(ui, item, index, selected == Some(index)) {
                        event = Some(ev);
                    }
                });
            });
        });
    event
}

fn render_group_row(ui: &mut Ui, item: &MediaItem) {
    ui.add_space(6.0);
    ui.label(egui::RichText::new(&item.title).small().strong().color(ui.visuals().weak_text_color()));
}

fn render_item_row(ui: &mut Ui, item: &MediaItem, index: usize, is_selected: bool) -> Option<SidebarEvent> {
    let mut event = None;
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
    let visuals = ui.visuals();

    if is_selected {
        ui.painter().rect_filled(rect.shrink(1.0), 6.0, visuals.selection.bg_fill);
    } else if response.hovered() {
        ui.painter().rect_filled(rect.shrink(1.0), 6.0, visuals.widgets.hovered.weak_bg_fill);
    }

    let text_color = if is_selected { visuals.selection.stroke.color } else { visuals.text_color() };
    let sub_color = if is_selected { text_color } else { visuals.weak_text_color() };
    let left = rect.left() + 10.0;
    ui.painter().text(
        egui::pos2(left, rect.top() + 8.0),
        Align2::LEFT_TOP,
        &item.title,
        FontId::proportional(13.0),
        text_color,
    );
    ui.painter().text(
        egui::pos2(left, rect.top() + 27.0),
        Align2::LEFT_TOP,
        &item.timestamp,
        FontId::proportional(11.0),
        sub_color,
    );
    if is_selected {
        ui.painter().hline(rect.x_range(), rect.bottom(), (0.5, Color32::from_gray(90)));
    }

    let response = response.on_hover_text(item.url.as_deref().unwrap_or(&item.title));
    if response.clicked() {
        event = Some(SidebarEvent::Selected(index));
    }
    response.context_menu(|ui| {
        let url = item.url.clone();
        if ui.add_enabled(url.is_some(), egui::Button::new("Copy URL")).clicked() {
            event = url.clone().map(SidebarEvent::CopyUrl);
            ui.close_menu();
        }
        if ui.add_enabled(url.is_some(), egui::Button::new("Open URL in Browser")).clicked() {
            event = url.map(SidebarEvent::OpenUrl);
            ui.close_menu();
        }
        ui.separator();
        if ui.add_enabled(item.history_id.is_some(), egui::Button::new("Remove from History")).clicked() {
            event = item.history_id.map(SidebarEvent::Remove);
            ui.close_menu();
        }
    });
    event
}
