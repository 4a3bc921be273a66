//! Document tree panel for navigation

use std::collections::HashSet;

use eframe::egui;

use crate::app::FrontmatterApp;
use crate::core::file_tree::TreeNode;

/// Document tree panel
pub struct FileTreePanel;

impl FileTreePanel {
    /// Show the document tree panel
    pub fn show(ui: &mut egui::Ui, app: &mut FrontmatterApp) {
        ui.vertical(|ui| {
            // Header
            ui.horizontal(|ui| {
                ui.heading("Documents");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("\u{21BB}").on_hover_text("Reload").clicked() {
                        app.reload();
                    }
                });
            });

            ui.separator();

            egui::ScrollArea::vertical()
                .id_salt("file_tree_scroll")
                .show(ui, |ui| {
                    if app.store.ready().file_tree {
                        let tree = app.store.tree().to_vec();
                        let dirty: HashSet<String> = app
                            .store
                            .documents()
                            .filter(|(_, doc)| doc.modified)
                            .map(|(_, doc)| doc.relative_path.clone())
                            .collect();
                        if tree.is_empty() {
                            ui.label("No markdown files in this folder");
                        }
                        for node in &tree {
                            Self::show_node(ui, node, "", &dirty, app);
                        }
                    } else {
                        ui.label("No folder open");
                        ui.add_space(10.0);
                        if ui.button("Open Folder...").clicked() {
                            if let Some(path) = rfd::FileDialog::new().pick_folder() {
                                app.open_directory(path);
                            }
                        }
                    }
                });
        });
    }

    /// Recursively show a tree node
    fn show_node(
        ui: &mut egui::Ui,
        node: &TreeNode,
        parent: &str,
        dirty: &HashSet<String>,
        app: &mut FrontmatterApp,
    ) {
        match node {
            TreeNode::Folder { name, .. } => {
                let id = format!("{}/{}", parent, name);
                egui::CollapsingHeader::new(format!("\u{1F4C1} {} ({})", name, node.file_count()))
                    .id_salt(&id)
                    .default_open(parent.is_empty())
                    .show(ui, |ui| {
                        for child in node.children() {
                            Self::show_node(ui, child, &id, dirty, app);
                        }
                    });
            }
            TreeNode::File { name, path } => {
                let is_active = app.store.selected_relative_path() == Some(path.as_str());
                let display_name = if dirty.contains(path) {
                    format!("\u{1F4DD} {}*", name)
                } else {
                    format!("\u{1F4DD} {}", name)
                };

                ui.horizontal(|ui| {
                    ui.add_space(16.0); // Indent for files
                    if ui.selectable_label(is_active, display_name).clicked() {
                        app.store.set_selection(path.clone());
                    }
                });
            }
        }
    }
}
