use super::TagDropApp;
use crate::status::{RecordKind, RemoteFileRecord, SubStatus};
use crate::upload::{FileCategory, NotificationKind, UploadItem, UploadStatus};
use crate::utils::color::palette;
use crate::utils::file_size::FileSizeUtils;
use chrono::Utc;
use eframe::egui::{self, Color32, RichText};
use rfd::FileDialog;

const ACCENT: &str = "#a159e1";
const SUCCESS: &str = "#4ade80";
const ERROR: &str = "#f87171";
const MUTED: &str = "#9ca3af";

const MEDIA_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "mp4", "mov", "webm", "mkv"];

impl TagDropApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("status_panel")
            .resizable(false)
            .exact_width(300.0)
            .show(ctx, |ui| self.render_status_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("TagDrop");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Drop images, videos or JSON files anywhere in this window")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_pickers(ui);
                self.render_notification(ui);

                if !self.session.state().items.is_empty() {
                    ui.add_space(20.0);
                    self.render_items(ui);
                }

                if self.session.state().is_uploading() {
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.colored_label(
                            palette(ACCENT),
                            "Uploading to backend... Files are being processed by AI.",
                        );
                    });
                }

                if !self.session.state().skipped.is_empty() {
                    ui.add_space(10.0);
                    self.render_skipped(ui);
                }

                ui.add_space(20.0);
                self.render_remote_files(ui);
            });
        });
    }

    fn render_pickers(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                if ui.button("📷 Browse Media").clicked() {
                    if let Some(paths) = FileDialog::new()
                        .add_filter("Images & Videos", MEDIA_EXTENSIONS)
                        .pick_files()
                    {
                        self.submit_paths(&paths);
                    }
                }
                if ui.button("🗄 Browse JSON").clicked() {
                    if let Some(paths) = FileDialog::new().add_filter("JSON", &["json"]).pick_files() {
                        self.submit_paths(&paths);
                    }
                }
                if ui.button("📁 Browse Folder").clicked() {
                    if let Some(path) = FileDialog::new().pick_folder() {
                        self.submit_paths(&[path]);
                    }
                }
            });
        });
    }

    fn render_notification(&self, ui: &mut egui::Ui) {
        if let Some(notification) = self.session.state().notifier.current() {
            ui.add_space(10.0);
            let (icon, color) = match notification.kind {
                NotificationKind::Success => ("✅", palette(SUCCESS)),
                NotificationKind::Error => ("❌", palette(ERROR)),
            };
            ui.horizontal(|ui| {
                ui.label(icon);
                ui.colored_label(color, &notification.message);
            });
        }
    }

    fn render_items(&mut self, ui: &mut egui::Ui) {
        let mut clear = false;
        ui.group(|ui| {
            let state = self.session.state();
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("Processing Files ({})", state.items.len())).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Clear Completed").clicked() {
                        clear = true;
                    }
                });
            });

            ui.add(
                egui::ProgressBar::new(state.get_progress_percentage())
                    .show_percentage()
                    .animate(false)
                    .fill(palette(ACCENT)),
            );
            ui.label(state.get_status_text());
            ui.add_space(8.0);

            for item in state.items.iter() {
                render_item(ui, item);
                ui.add_space(6.0);
            }
        });

        if clear {
            self.session.clear_completed();
        }
    }

    fn render_skipped(&mut self, ui: &mut egui::Ui) {
        let label = if self.show_details {
            "Hide Skipped Files"
        } else {
            "Show Skipped Files"
        };
        if ui.button(label).clicked() {
            self.show_details = !self.show_details;
        }

        if self.show_details {
            for skipped in &self.session.state().skipped {
                ui.horizontal(|ui| {
                    ui.label("⏩");
                    ui.colored_label(
                        palette(MUTED),
                        format!("{} - {}", skipped.name, skipped.reason),
                    );
                });
            }
        }
    }

    fn render_remote_files(&mut self, ui: &mut egui::Ui) {
        let mut refresh = false;
        ui.group(|ui| {
            let state = self.session.state();
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("Stored Files ({})", state.remote_files.len())).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("🔄 Refresh").clicked() {
                        refresh = true;
                    }
                });
            });

            if let Some(error) = &state.files_error {
                ui.colored_label(palette(ERROR), error);
            }

            if state.remote_files.is_empty() {
                ui.label(RichText::new("No files uploaded yet").color(palette(MUTED)));
            }

            for file in &state.remote_files {
                render_remote_file(ui, file);
                ui.separator();
            }
        });

        if refresh {
            self.session.refresh_files();
        }
    }

    fn render_status_panel(&self, ui: &mut egui::Ui) {
        let state = self.session.state();
        let system = &state.system;

        ui.add_space(10.0);
        let (color, title, detail) = if system.online {
            (palette(SUCCESS), "Backend Online", "All systems operational")
        } else {
            (palette(ERROR), "Backend Offline", "Cannot connect to server")
        };
        ui.colored_label(color, RichText::new(title).strong());
        ui.label(RichText::new(detail).small().color(palette(MUTED)));

        ui.add_space(20.0);
        ui.label(RichText::new("System Status").strong());
        status_row(ui, "AI", &system.processing);
        status_row(ui, "Storage", &system.storage);
        status_row(ui, "Queue", &system.queue);

        ui.add_space(20.0);
        ui.label(RichText::new("Live Activity").strong());
        if state.activity.is_empty() {
            ui.label(RichText::new("No recent activity").color(palette(MUTED)));
        }
        let now = Utc::now();
        for entry in &state.activity {
            ui.label(RichText::new(entry.summary()).small());
            ui.label(RichText::new(entry.time_ago(now)).small().color(palette(MUTED)));
            ui.add_space(6.0);
        }
    }
}

fn status_row(ui: &mut egui::Ui, name: &str, status: &SubStatus) {
    ui.horizontal(|ui| {
        ui.label(name);
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.colored_label(palette(status.severity.hex()), &status.label);
        });
    });
}

fn render_item(ui: &mut egui::Ui, item: &UploadItem) {
    let fill = match item.status {
        UploadStatus::Failed => palette(ERROR),
        UploadStatus::Completed => palette(SUCCESS),
        _ => palette(ACCENT),
    };

    ui.horizontal(|ui| {
        ui.label(RichText::new(&item.payload.name).strong());
        ui.label(RichText::new(FileSizeUtils::format_size(Some(item.payload.size))).small());
    });
    ui.add(
        egui::ProgressBar::new(item.status.progress_percent() as f32 / 100.0)
            .animate(!item.status.is_terminal())
            .fill(fill),
    );

    let detail = match (item.status, item.category) {
        (UploadStatus::Analyzing, FileCategory::Media) => "🤖 AI Analyzing content...".to_string(),
        (UploadStatus::Analyzing, FileCategory::Structured) => "🤖 AI Analyzing schema...".to_string(),
        (UploadStatus::Tagging, _) => format!(
            "🏷 {}: {}",
            item.status.label(),
            item.derived_tags.as_deref().unwrap_or_default().join(", ")
        ),
        (UploadStatus::Storing, _) => format!(
            "📁 {}: {}",
            item.status.label(),
            item.derived_target.as_deref().unwrap_or_default()
        ),
        (status, _) => status.label().to_string(),
    };
    let color = match item.status {
        UploadStatus::Failed => palette(ERROR),
        UploadStatus::Completed => palette(SUCCESS),
        _ => Color32::LIGHT_BLUE,
    };
    ui.colored_label(color, detail);

    if item.status == UploadStatus::Completed {
        if let Some(tags) = &item.derived_tags {
            ui.label(RichText::new(tags.join(" · ")).small().color(palette(ACCENT)));
        }
    }
}

fn render_remote_file(ui: &mut egui::Ui, file: &RemoteFileRecord) {
    ui.horizontal(|ui| {
        let icon = match file.kind {
            RecordKind::Media => "🖼",
            RecordKind::Json => "🗄",
            RecordKind::Other => "📄",
        };
        ui.label(icon);
        ui.label(RichText::new(&file.filename).strong());

        if let Some(url) = &file.url {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Open").clicked() {
                    let _ = open::that(url);
                }
            });
        }
    });

    let date = file
        .timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    ui.label(
        RichText::new(format!("{} • {}", FileSizeUtils::format_size(file.size), date))
            .small()
            .color(palette(MUTED)),
    );

    let (tags, hidden) = file.tag_preview();
    if !tags.is_empty() {
        let mut line = tags.join(", ");
        if hidden > 0 {
            line.push_str(&format!(" +{}", hidden));
        }
        ui.label(RichText::new(line).small().color(palette(ACCENT)));
    }
    if let Some(category) = &file.category {
        ui.label(RichText::new(format!("📁 {}", category)).small());
    }
    if let Some(db_type) = &file.db_type {
        ui.label(
            RichText::new(format!("🗄 {} • {} records", db_type, file.record_count.unwrap_or(0)))
                .small()
                .color(Color32::LIGHT_BLUE),
        );
    }
}
