//! Status bar showing load progress, unsaved changes and the last message

use eframe::egui;

use crate::app::{FrontmatterApp, Status};

/// Bottom status bar
pub struct StatusBar;

impl StatusBar {
    /// Show the status bar
    pub fn show(ui: &mut egui::Ui, app: &mut FrontmatterApp) {
        let ready = app.store.ready();
        ui.horizontal(|ui| {
            let mark = |done: bool| if done { "\u{2714}" } else { "\u{2026}" };
            ui.label(format!(
                "Files {}  Tree {}  Content {}",
                mark(ready.file_list),
                mark(ready.file_tree),
                mark(ready.file_content)
            ));
            if ready.exporting {
                ui.spinner();
                ui.label("Exporting...");
            } else if let Some(job) = &app.busy {
                ui.spinner();
                ui.label(format!("{}...", job));
            }

            ui.separator();
            ui.label(format!(
                "{} documents, {} unsaved",
                app.store.len(),
                app.store.modified_count()
            ));

            if let Some(status) = &app.status {
                ui.separator();
                match status {
                    Status::Info(msg) => ui.label(msg.as_str()),
                    Status::Error(msg) => ui.colored_label(ui.visuals().error_fg_color, msg.as_str()),
                };
            }
        });
    }
}
