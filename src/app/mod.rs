//! The host browser window: a searchable host list, a detail panel and the add/edit dialog.

mod form;

use std::cell::RefCell;
use std::rc::Rc;

use eframe::{CreationContext, egui};
use egui::ViewportCommand;
use tracing::warn;

pub use form::HostForm;

use crate::cli::Settings;
use crate::error::Error;
use crate::keys;
use crate::ssh_config::{self, HostEntry, add_entry, delete_entry, parse_file, update_entry};
use crate::visits::VisitStore;

/// Alias chosen with Connect; read by `main` once the window has closed.
pub type PendingConnect = Rc<RefCell<Option<String>>>;

struct Editor {
    /// `None` while adding a new host
    original_alias: Option<String>,
    form: HostForm,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Confirm {
    Delete(String),
    ClearVisits,
}

pub struct HostManagerApp {
    settings: Settings,
    hosts: Vec<HostEntry>,
    visits: VisitStore,
    selected: Option<String>,
    search_query: String,
    search_focused: bool,
    editor: Option<Editor>,
    confirm: Option<Confirm>,
    show_shortcuts: bool,
    key_files: Vec<String>,
    status_message: String,
    pending_connect: PendingConnect,
    initialized: bool,
}

impl HostManagerApp {
    pub fn new(_cc: &CreationContext, settings: Settings, pending_connect: PendingConnect) -> Self {
        let mut status_message = String::new();
        let visits = match VisitStore::load(&settings.visits_path) {
            Ok(visits) => visits,
            Err(e) => {
                warn!(error = %e, "starting with empty visit counts");
                status_message = format!("Error loading visit counts: {e}");
                VisitStore::empty(&settings.visits_path)
            }
        };

        Self {
            settings,
            hosts: Vec::new(),
            visits,
            selected: None,
            search_query: String::new(),
            search_focused: false,
            editor: None,
            confirm: None,
            show_shortcuts: false,
            key_files: Vec::new(),
            status_message,
            pending_connect,
            initialized: false,
        }
    }

    fn reload(&mut self) {
        let path = self.settings.config_path.clone();
        match parse_file(&path) {
            Ok(config) => {
                let dropped = config.dropped.len();
                self.hosts = config.entries.into_iter().filter(|e| !e.is_global()).collect();
                self.sort_hosts();

                let still_listed = self
                    .selected
                    .as_ref()
                    .is_none_or(|alias| self.hosts.iter().any(|h| &h.alias == alias));
                if !still_listed {
                    self.selected = None;
                }

                self.status_message = if dropped > 0 {
                    format!(
                        "Loaded: {} ({} hosts, {} block(s) without HostName ignored)",
                        path.display(),
                        self.hosts.len(),
                        dropped
                    )
                } else {
                    format!("Loaded: {} ({} hosts)", path.display(), self.hosts.len())
                };
            }
            Err(e) => {
                self.status_message = format!("Error loading config: {e}");
            }
        }
    }

    fn sort_hosts(&mut self) {
        let aliases: Vec<&str> = self.hosts.iter().map(|h| h.alias.as_str()).collect();
        let order = self.visits.sort_by_frequency(&aliases);
        self.hosts.sort_by_cached_key(|h| {
            order
                .iter()
                .position(|alias| *alias == h.alias)
                .unwrap_or(usize::MAX)
        });
    }

    fn selected_host(&self) -> Option<&HostEntry> {
        let alias = self.selected.as_deref()?;
        self.hosts.iter().find(|h| h.alias == alias)
    }

    fn visible_hosts(&self) -> Vec<&HostEntry> {
        self.hosts
            .iter()
            .filter(|h| h.matches(&self.search_query))
            .collect()
    }

    fn refresh_key_files(&mut self) {
        self.key_files = match ssh_config::ssh_dir() {
            Ok(dir) => keys::discover_keys(&dir),
            Err(e) => {
                warn!(error = %e, "cannot look for key files");
                Vec::new()
            }
        };
    }

    fn open_new_host(&mut self) {
        self.refresh_key_files();
        self.editor = Some(Editor {
            original_alias: None,
            form: HostForm::for_new_host(),
            error: None,
        });
    }

    fn open_edit_selected(&mut self) {
        let Some(host) = self.selected_host() else {
            self.status_message = "Select a host to edit".to_string();
            return;
        };
        let editor = Editor {
            original_alias: Some(host.alias.clone()),
            form: HostForm::from_entry(host),
            error: None,
        };
        self.refresh_key_files();
        self.editor = Some(editor);
    }

    fn alias_taken(&self, alias: &str, original: Option<&str>) -> bool {
        original != Some(alias) && self.hosts.iter().any(|h| h.alias == alias)
    }

    fn submit_editor(&mut self) {
        let Some(editor) = &self.editor else {
            return;
        };
        let original = editor.original_alias.clone();
        let entry = editor.form.to_entry();

        let check = editor.form.validate().and_then(|()| {
            if self.alias_taken(&entry.alias, original.as_deref()) {
                Err(Error::InvalidEntry(format!(
                    "Host '{}' already exists",
                    entry.alias
                )))
            } else {
                Ok(())
            }
        });
        if let Err(e) = check {
            if let Some(editor) = &mut self.editor {
                editor.error = Some(e.to_string());
            }
            return;
        }

        let path = self.settings.config_path.clone();
        let alias = entry.alias.clone();
        let result = match &original {
            Some(original) => update_entry(&path, original, entry).map(|found| {
                if found {
                    format!("Updated '{alias}'")
                } else {
                    format!("Host '{original}' is no longer in the config")
                }
            }),
            None => add_entry(&path, entry).map(|()| format!("Added '{alias}'")),
        };

        match result {
            Ok(message) => {
                self.editor = None;
                self.reload();
                if self.hosts.iter().any(|h| h.alias == alias) {
                    self.selected = Some(alias);
                }
                self.status_message = message;
            }
            Err(e) => {
                if let Some(editor) = &mut self.editor {
                    editor.error = Some(e.to_string());
                }
            }
        }
    }

    fn delete_host(&mut self, alias: &str) {
        match delete_entry(&self.settings.config_path, alias) {
            Ok(removed) => {
                self.selected = None;
                self.reload();
                self.status_message = format!("Deleted '{alias}' ({removed} block(s))");
            }
            Err(e) => {
                self.status_message = format!("Error deleting '{alias}': {e}");
            }
        }
    }

    fn clear_visits(&mut self) {
        self.visits.clear_all();
        self.status_message = match self.visits.save() {
            Ok(()) => "Visit counts cleared".to_string(),
            Err(e) => format!("Error saving visit counts: {e}"),
        };
        self.sort_hosts();
    }

    /// Records the visit and closes the window; `main` starts ssh afterwards.
    fn connect(&mut self, ctx: &egui::Context, alias: String) {
        self.visits.increment(&alias);
        if let Err(e) = self.visits.save() {
            warn!(error = %e, "could not save visit counts");
        }
        *self.pending_connect.borrow_mut() = Some(alias);
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }

    fn connect_selected(&mut self, ctx: &egui::Context) {
        match self.selected.clone() {
            Some(alias) => self.connect(ctx, alias),
            None => self.status_message = "Select a host to connect".to_string(),
        }
    }

    fn request_delete_selected(&mut self) {
        match &self.selected {
            Some(alias) => self.confirm = Some(Confirm::Delete(alias.clone())),
            None => self.status_message = "Select a host to delete".to_string(),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let modal_open = self.editor.is_some() || self.confirm.is_some();

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.editor.is_some() {
                self.editor = None;
            } else if self.confirm.is_some() {
                self.confirm = None;
            } else if self.show_shortcuts {
                self.show_shortcuts = false;
            } else {
                self.search_query.clear();
                self.search_focused = false;
            }
            return;
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Q)) {
            ctx.send_viewport_cmd(ViewportCommand::Close);
            return;
        }

        if modal_open {
            return;
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::F)) {
            self.search_focused = true;
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::N)) {
            self.open_new_host();
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::E)) {
            self.open_edit_selected();
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::R)) {
            self.reload();
        }

        // Plain keys belong to the text field while one has focus
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Delete)) {
            self.request_delete_selected();
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.connect_selected(ctx);
        }

        let step = ctx.input(|i| {
            if i.key_pressed(egui::Key::ArrowDown) {
                1
            } else if i.key_pressed(egui::Key::ArrowUp) {
                -1
            } else {
                0
            }
        });
        if step != 0 {
            self.move_selection(step);
        }
    }

    fn move_selection(&mut self, step: isize) {
        let visible = self.visible_hosts();
        if visible.is_empty() {
            return;
        }
        let current = self
            .selected
            .as_deref()
            .and_then(|alias| visible.iter().position(|h| h.alias == alias));
        let next = match current {
            Some(idx) => idx.saturating_add_signed(step).min(visible.len() - 1),
            None => 0,
        };
        self.selected = Some(visible[next].alias.clone());
    }

    fn show_hosts_panel(&mut self, ctx: &egui::Context) {
        let mut connect_to = None;

        egui::SidePanel::left("hosts_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("SSH Hosts");
                ui.separator();

                ui.horizontal(|ui| {
                    ui.label("🔍");
                    let search_response = ui.add(
                        egui::TextEdit::singleline(&mut self.search_query)
                            .hint_text("alias, address, user, tag"),
                    );

                    if self.search_focused {
                        search_response.request_focus();
                        self.search_focused = false;
                    }

                    // Enter in the search box picks the first match
                    if search_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        if let Some(first) = self.hosts.iter().find(|h| h.matches(&self.search_query)) {
                            self.selected = Some(first.alias.clone());
                        }
                    }

                    if !self.search_query.is_empty() && ui.button("✖").clicked() {
                        self.search_query.clear();
                    }
                });
                ui.separator();

                if self.hosts.is_empty() {
                    ui.label(
                        egui::RichText::new("No hosts yet. Press Ctrl+N to add one.")
                            .color(egui::Color32::GRAY)
                            .italics(),
                    );
                    return;
                }

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for host in self.hosts.iter().filter(|h| h.matches(&self.search_query)) {
                        let is_selected = self.selected.as_deref() == Some(host.alias.as_str());
                        let visits = self.visits.get_count(&host.alias);
                        let text = if visits > 0 {
                            format!("{}  ({visits})", host.alias)
                        } else {
                            host.alias.clone()
                        };

                        let response = ui
                            .selectable_label(is_selected, text)
                            .on_hover_text(host.connection_string());
                        if response.clicked() {
                            self.selected = Some(host.alias.clone());
                        }
                        if response.double_clicked() {
                            connect_to = Some(host.alias.clone());
                        }
                    }
                });
            });

        if let Some(alias) = connect_to {
            self.connect(ctx, alias);
        }
    }

    fn show_details_panel(&mut self, ctx: &egui::Context) {
        let mut edit = false;
        let mut delete = false;
        let mut connect = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Host Details");
            ui.separator();

            let Some(host) = self.selected_host() else {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.label("Select a host from the left panel");
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new(self.settings.config_path.display().to_string())
                            .color(egui::Color32::GRAY),
                    );
                });
                return;
            };

            if !host.description.is_empty() {
                ui.label(egui::RichText::new(&host.description).italics());
                ui.add_space(6.0);
            }

            let port = if host.port.is_empty() {
                "(default: 22)".to_string()
            } else {
                host.port.clone()
            };
            let or_dash = |value: &str| {
                if value.is_empty() {
                    "-".to_string()
                } else {
                    value.to_string()
                }
            };

            egui::Grid::new("host_details")
                .num_columns(2)
                .spacing([16.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    let rows = [
                        ("Alias", host.alias.clone()),
                        ("HostName", or_dash(&host.address)),
                        ("User", or_dash(&host.user)),
                        ("Port", port),
                        ("IdentityFile", or_dash(&host.identity_file)),
                        ("Tags", or_dash(&host.tags.join(", "))),
                        ("Connection", host.connection_string()),
                        ("Command", host.ssh_command()),
                        ("Visits", self.visits.get_count(&host.alias).to_string()),
                    ];
                    for (label, value) in rows {
                        ui.label(egui::RichText::new(label).strong());
                        ui.label(egui::RichText::new(value).monospace());
                        ui.end_row();
                    }
                });

            ui.add_space(15.0);
            ui.separator();

            ui.horizontal(|ui| {
                connect = ui.button("▶ Connect  (Enter)").clicked();
                edit = ui.button("✏ Edit  (Ctrl+E)").clicked();
                delete = ui.button("🗑 Delete  (Del)").clicked();
            });
        });

        if connect {
            self.connect_selected(ctx);
        } else if edit {
            self.open_edit_selected();
        } else if delete {
            self.request_delete_selected();
        }
    }

    fn show_editor_dialog(&mut self, ctx: &egui::Context) {
        let key_files = self.key_files.clone();
        let mut submit = false;
        let mut cancel = false;

        let Some(editor) = &mut self.editor else {
            return;
        };
        let title = match &editor.original_alias {
            Some(alias) => format!("✏ Edit Host '{alias}'"),
            None => "➕ New Host".to_string(),
        };

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(440.0);
                let form = &mut editor.form;

                egui::Grid::new("host_form")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Host alias:");
                        ui.add(egui::TextEdit::singleline(&mut form.alias).hint_text("web-prod"));
                        ui.end_row();

                        ui.label("HostName:");
                        ui.add(egui::TextEdit::singleline(&mut form.address).hint_text("10.0.0.5"));
                        ui.end_row();

                        ui.label("User:");
                        ui.text_edit_singleline(&mut form.user);
                        ui.end_row();

                        ui.label("Port:");
                        ui.add(egui::TextEdit::singleline(&mut form.port).hint_text("22"));
                        ui.end_row();

                        ui.label("IdentityFile:");
                        ui.horizontal(|ui| {
                            ui.add(
                                egui::TextEdit::singleline(&mut form.identity_file)
                                    .hint_text("~/.ssh/id_ed25519")
                                    .desired_width(200.0),
                            );

                            if !key_files.is_empty() {
                                egui::ComboBox::from_id_salt("identity_file_combo")
                                    .selected_text("Keys")
                                    .show_ui(ui, |ui| {
                                        for key in &key_files {
                                            let is_selected = form.identity_file == *key;
                                            if ui.selectable_label(is_selected, key.as_str()).clicked() {
                                                form.identity_file = key.clone();
                                            }
                                        }
                                    });
                            }

                            if ui.button("Browse…").clicked() {
                                let mut dialog = rfd::FileDialog::new();
                                if let Ok(dir) = ssh_config::ssh_dir() {
                                    dialog = dialog.set_directory(dir);
                                }
                                if let Some(path) = dialog.pick_file() {
                                    form.identity_file = path.display().to_string();
                                }
                            }
                        });
                        ui.end_row();

                        ui.label("Description:");
                        ui.text_edit_singleline(&mut form.description);
                        ui.end_row();

                        ui.label("Tags:");
                        ui.add(egui::TextEdit::singleline(&mut form.tags).hint_text("prod, db"));
                        ui.end_row();
                    });

                if let Some(error) = &editor.error {
                    ui.add_space(6.0);
                    ui.label(egui::RichText::new(format!("⚠ {error}")).color(egui::Color32::RED));
                }

                ui.add_space(10.0);
                ui.separator();

                ui.horizontal(|ui| {
                    submit = ui.button("Save").clicked()
                        || ui.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::Enter));
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if cancel {
            self.editor = None;
        } else if submit {
            self.submit_editor();
        }
    }

    fn show_confirm_dialog(&mut self, ctx: &egui::Context) {
        let Some(confirm) = self.confirm.clone() else {
            return;
        };
        let (title, question) = match &confirm {
            Confirm::Delete(alias) => (
                "⚠ Delete Host",
                format!("Remove '{alias}' from {}?", self.settings.config_path.display()),
            ),
            Confirm::ClearVisits => (
                "⚠ Clear Visit Counts",
                "Reset the visit count of every host?".to_string(),
            ),
        };

        let mut accepted = false;
        let mut dismissed = false;

        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(300.0);
                ui.label(question);
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    accepted = ui.button("Yes").clicked();
                    dismissed = ui.button("Cancel").clicked();
                });
            });

        if accepted {
            self.confirm = None;
            match confirm {
                Confirm::Delete(alias) => self.delete_host(&alias),
                Confirm::ClearVisits => self.clear_visits(),
            }
        } else if dismissed {
            self.confirm = None;
        }
    }

    fn show_shortcuts_popup(&mut self, ctx: &egui::Context) {
        egui::Window::new("⌨ Keyboard Shortcuts")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(360.0);

                let section = |ui: &mut egui::Ui, heading: &str, keys: &[(&str, &str)]| {
                    ui.heading(heading);
                    ui.separator();
                    for (key, action) in keys {
                        ui.horizontal(|ui| {
                            ui.label(egui::RichText::new(*key).monospace().strong());
                            ui.label(*action);
                        });
                    }
                    ui.add_space(10.0);
                };

                section(
                    ui,
                    "Hosts",
                    &[
                        ("Ctrl+N", "New host"),
                        ("Ctrl+E", "Edit selected host"),
                        ("Delete", "Delete selected host"),
                        ("Enter", "Connect to selected host"),
                        ("↑ / ↓", "Move selection"),
                    ],
                );
                section(
                    ui,
                    "Search & Navigation",
                    &[
                        ("Ctrl+F", "Focus search box"),
                        ("Escape", "Clear search / close dialog"),
                    ],
                );
                section(
                    ui,
                    "Application",
                    &[("Ctrl+R", "Reload config"), ("Ctrl+Q", "Quit")],
                );

                ui.separator();
                if ui.button("Close").clicked() {
                    self.show_shortcuts = false;
                }
            });
    }
}

impl eframe::App for HostManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(std::time::Duration::from_millis(500));

        if !self.initialized {
            self.reload();
            self.initialized = true;
        }

        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::containers::menu::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Reload  (Ctrl+R)").clicked() {
                        self.reload();
                        ui.close();
                    }

                    ui.separator();

                    if ui.button("Quit  (Ctrl+Q)").clicked() {
                        ctx.send_viewport_cmd(ViewportCommand::Close);
                        ui.close();
                    }
                });

                ui.menu_button("Host", |ui| {
                    if ui.button("New Host  (Ctrl+N)").clicked() {
                        self.open_new_host();
                        ui.close();
                    }
                    if ui.button("Edit Host  (Ctrl+E)").clicked() {
                        self.open_edit_selected();
                        ui.close();
                    }
                    if ui.button("Delete Host  (Del)").clicked() {
                        self.request_delete_selected();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Connect  (Enter)").clicked() {
                        self.connect_selected(ctx);
                        ui.close();
                    }
                });

                ui.menu_button("Visits", |ui| {
                    if ui.button("Clear Visit Counts").clicked() {
                        self.confirm = Some(Confirm::ClearVisits);
                        ui.close();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("Keyboard Shortcuts").clicked() {
                        self.show_shortcuts = true;
                        ui.close();
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_message);
            });
        });

        self.show_hosts_panel(ctx);
        self.show_details_panel(ctx);

        if self.show_shortcuts {
            self.show_shortcuts_popup(ctx);
        }
        self.show_confirm_dialog(ctx);
        self.show_editor_dialog(ctx);
    }
}
