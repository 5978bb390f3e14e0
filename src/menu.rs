use eframe::egui::{self, Key, KeyboardShortcut, Modifiers, Ui};

pub const SUPPORTED_SITES_URL: &str = "https://github.com/yt-dlp/yt-dlp/blob/master/supportedsites.md";

/// egui has no comma key, so ⌘, is matched on the text event it produces.
const PREFERENCES_TEXT: &str = ",";
const PREFERENCES_LABEL: &str = "⌘,";
const QUIT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Q);
const CLOSE_WINDOW: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::W);
const MINIMIZE: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::M);
const PASTE_URL: KeyboardShortcut =
    KeyboardShortcut::new(Modifiers { shift: true, ..Modifiers::COMMAND }, Key::V);
const TOGGLE_SIDEBAR: KeyboardShortcut =
    KeyboardShortcut::new(Modifiers { shift: true, ..Modifiers::COMMAND }, Key::S);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    About,
    Preferences,
    Quit,
    CloseWindow,
    PasteUrl,
    CopyLog,
    ClearLog,
    Minimize,
    Zoom,
    ToggleSidebar,
    SupportedSites,
    OpenLogFile,
}

/// Shortcuts are consumed before widgets see them. Longer modifier sets first
/// so ⌘⇧V is not swallowed by a plain ⌘V binding.
pub fn shortcut_action(ctx: &egui::Context) -> Option<MenuAction> {
    let table = [
        (PASTE_URL, MenuAction::PasteUrl),
        (TOGGLE_SIDEBAR, MenuAction::ToggleSidebar),
        (QUIT, MenuAction::Quit),
        (CLOSE_WINDOW, MenuAction::CloseWindow),
        (MINIMIZE, MenuAction::Minimize),
    ];
    ctx.input_mut(|i| {
        if let Some(action) = table.iter().find(|(sc, _)| i.consume_shortcut(sc)).map(|(_, action)| *action) {
            return Some(action);
        }
        if is_preferences_chord(&i.events, i.modifiers) {
            i.events.retain(|e| !matches!(e, egui::Event::Text(t) if t == PREFERENCES_TEXT));
            return Some(MenuAction::Preferences);
        }
        None
    })
}

pub fn is_preferences_chord(events: &[egui::Event], modifiers: Modifiers) -> bool {
    modifiers.command
        && !modifiers.shift
        && events.iter().any(|e| matches!(e, egui::Event::Text(t) if t == PREFERENCES_TEXT))
}

fn item(ui: &mut Ui, label: &str, shortcut: Option<&KeyboardShortcut>, action: MenuAction, out: &mut Option<MenuAction>) {
    let text = shortcut.map(|sc| ui.ctx().format_shortcut(sc));
    item_with_text(ui, label, text.as_deref(), action, out);
}

fn item_with_text(ui: &mut Ui, label: &str, shortcut: Option<&str>, action: MenuAction, out: &mut Option<MenuAction>) {
    let mut button = egui::Button::new(label);
    if let Some(text) = shortcut {
        button = button.shortcut_text(text);
    }
    if ui.add(button).clicked() {
        *out = Some(action);
        ui.close_menu();
    }
}

pub fn render_menu_bar(ui: &mut Ui) -> Option<MenuAction> {
    let mut action = None;
    egui::menu::bar(ui, |ui| {
        ui.menu_button("Media.Ext", |ui| {
            item(ui, "About Media.Ext", None, MenuAction::About, &mut action);
            ui.separator();
            item_with_text(ui, "Preferences…", Some(PREFERENCES_LABEL), MenuAction::Preferences, &mut action);
            ui.separator();
            item(ui, "Quit Media.Ext", Some(&QUIT), MenuAction::Quit, &mut action);
        });
        ui.menu_button("File", |ui| {
            item(ui, "Close Window", Some(&CLOSE_WINDOW), MenuAction::CloseWindow, &mut action);
        });
        ui.menu_button("Edit", |ui| {
            item(ui, "Paste URL", Some(&PASTE_URL), MenuAction::PasteUrl, &mut action);
            item(ui, "Copy Log", None, MenuAction::CopyLog, &mut action);
            item(ui, "Clear Log", None, MenuAction::ClearLog, &mut action);
        });
        ui.menu_button("Window", |ui| {
            item(ui, "Minimize", Some(&MINIMIZE), MenuAction::Minimize, &mut action);
            item(ui, "Zoom", None, MenuAction::Zoom, &mut action);
            ui.separator();
            item(ui, "Toggle Sidebar", Some(&TOGGLE_SIDEBAR), MenuAction::ToggleSidebar, &mut action);
        });
        ui.menu_button("Help", |ui| {
            item(ui, "Supported Sites", None, MenuAction::SupportedSites, &mut action);
            item(ui, "Open Log File", None, MenuAction::OpenLogFile, &mut action);
        });
    });
    action
}

/// Toolbar under the menu bar; only the sidebar toggle does anything.
pub fn render_toolbar(ui: &mut Ui, sidebar_visible: bool) -> Option<MenuAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let hint = if sidebar_visible { "Hide sidebar" } else { "Show sidebar" };
        if ui.selectable_label(sidebar_visible, "☰").on_hover_text(hint).clicked() {
            action = Some(MenuAction::ToggleSidebar);
        }
    });
    action
}
