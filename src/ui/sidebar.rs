//! Sidebar component containing the document tree and unsaved changes

use eframe::egui;

use super::file_tree::FileTreePanel;
use crate::app::FrontmatterApp;

/// Sidebar with the document tree and a list of unsaved documents
pub struct Sidebar;

impl Sidebar {
    /// Show the sidebar
    pub fn show(ui: &mut egui::Ui, app: &mut FrontmatterApp) {
        ui.vertical(|ui| {
            let unsaved: Vec<String> = app
                .store
                .documents()
                .filter(|(_, doc)| doc.modified)
                .map(|(_, doc)| doc.relative_path.clone())
                .collect();

            if app.config.ui.show_unsaved_list && !unsaved.is_empty() {
                ui.collapsing(format!("Unsaved Changes ({})", unsaved.len()), |ui| {
                    for relative in unsaved {
                        let selected = app.store.selected_relative_path() == Some(relative.as_str());
                        if ui.selectable_label(selected, relative.as_str()).clicked() {
                            app.store.set_selection(relative);
                        }
                    }
                    if ui.button("Save All").clicked() {
                        app.save_changes();
                    }
                });
                ui.separator();
            }

            FileTreePanel::show(ui, app);
        });
    }
}
