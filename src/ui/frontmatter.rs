//! Frontmatter inspector for the selected document

use eframe::egui;

use crate::app::FrontmatterApp;
use crate::core::document::Document;
use crate::core::spreadsheet::cell_text;

/// Read-only view of the selected document's frontmatter
pub struct FrontmatterPanel;

impl FrontmatterPanel {
    /// Show the inspector panel
    pub fn show(ui: &mut egui::Ui, app: &mut FrontmatterApp) {
        let Some(doc) = app.store.selected_document() else {
            Self::show_welcome(ui, app.store.selected_relative_path());
            return;
        };

        let mut revert = false;
        let mut close = false;
        ui.horizontal(|ui| {
            ui.heading(doc.title());
            if doc.modified {
                ui.label(egui::RichText::new("unsaved").italics().weak());
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                close = ui.button("\u{2715}").on_hover_text("Close").clicked();
                revert = ui
                    .add_enabled(doc.modified, egui::Button::new("Revert"))
                    .on_hover_text("Discard unsaved changes to this document")
                    .clicked();
            });
        });
        ui.label(egui::RichText::new(&doc.relative_path).monospace().weak());
        if let Some(absolute) = app.store.selected_absolute_path() {
            ui.label(egui::RichText::new(absolute).small().weak());
        }
        ui.separator();

        if doc.frontmatter.is_empty() {
            ui.label("No frontmatter");
        } else {
            Self::show_grid(ui, doc);
        }

        if revert {
            app.revert_selected();
        } else if close {
            app.store.clear_selection();
        }
    }

    fn show_grid(ui: &mut egui::Ui, doc: &Document) {
        egui::ScrollArea::vertical()
            .id_salt("frontmatter_scroll")
            .show(ui, |ui| {
                egui::Grid::new("frontmatter_grid")
                    .num_columns(2)
                    .striped(true)
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        for (key, value) in doc.frontmatter.iter() {
                            ui.label(egui::RichText::new(key).strong());
                            let text = if value.is_string() {
                                cell_text(value)
                            } else {
                                value.to_string()
                            };
                            ui.label(egui::RichText::new(text).monospace());
                            ui.end_row();
                        }
                    });
            });
    }

    /// Show welcome screen when no document is selected
    fn show_welcome(ui: &mut egui::Ui, missing: Option<&str>) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);

            ui.heading("Frontmatter Studio");
            ui.add_space(20.0);

            match missing {
                Some(path) => ui.label(format!("{} is not loaded", path)),
                None => ui.label("Open a folder and select a document to inspect its frontmatter."),
            };
            ui.add_space(10.0);

            ui.label("Keyboard shortcuts:");
            ui.label("  Ctrl+O - Open folder");
            ui.label("  Ctrl+S - Save changes");
            ui.label("  Ctrl+B - Toggle sidebar");
        });
    }
}
