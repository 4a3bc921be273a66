//! Bulk frontmatter edit panel

use eframe::egui;
use regex_lite::Regex;
use serde_json::Value;

use crate::app::FrontmatterApp;

/// Which bulk edit to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkOperation {
    #[default]
    Add,
    Remove,
    Normalize,
}

impl BulkOperation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "Add keys",
            Self::Remove => "Remove keys",
            Self::Normalize => "Normalize keys",
        }
    }

    /// Summary line for a finished run
    pub fn describe(self, count: usize) -> String {
        match self {
            Self::Add => format!("Added {} keys", count),
            Self::Remove => format!("Removed {} keys", count),
            Self::Normalize => format!("Normalized {} documents", count),
        }
    }
}

/// A parsed bulk edit ready to hand to the store
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    pub operation: BulkOperation,
    pub keys: Vec<String>,
    pub value: Value,
    pub target_key: String,
    pub pattern: String,
}

/// Form state of the bulk edit panel
#[derive(Debug, Clone, Default)]
pub struct BulkEditState {
    pub operation: BulkOperation,
    /// Comma separated keys
    pub keys: String,
    /// Value for added keys; JSON, or plain text otherwise
    pub value: String,
    pub target_key: String,
    pub pattern: String,
    pub last_result: Option<String>,
}

/// Split a comma separated key list, dropping blanks
pub fn parse_keys(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret the value field as JSON, falling back to a plain string
pub fn parse_value(text: &str) -> Value {
    let trimmed = text.trim();
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

impl BulkEditState {
    pub fn new(default_pattern: &str) -> Self {
        Self {
            pattern: default_pattern.to_string(),
            ..Default::default()
        }
    }

    pub fn request(&self) -> BulkRequest {
        BulkRequest {
            operation: self.operation,
            keys: parse_keys(&self.keys),
            value: parse_value(&self.value),
            target_key: self.target_key.trim().to_string(),
            pattern: self.pattern.clone(),
        }
    }

    /// Whether the form holds enough input to run
    pub fn is_complete(&self) -> bool {
        let has_keys = !parse_keys(&self.keys).is_empty();
        match self.operation {
            BulkOperation::Add | BulkOperation::Remove => has_keys,
            BulkOperation::Normalize => has_keys && !self.target_key.trim().is_empty(),
        }
    }
}

/// Panel hosting the bulk edit form
pub struct BulkEditPanel;

impl BulkEditPanel {
    /// Show the bulk edit panel
    pub fn show(ui: &mut egui::Ui, app: &mut FrontmatterApp) {
        ui.heading("Bulk Edit");
        ui.separator();

        let state = &mut app.bulk_edit;
        ui.horizontal(|ui| {
            for op in [BulkOperation::Add, BulkOperation::Remove, BulkOperation::Normalize] {
                ui.selectable_value(&mut state.operation, op, op.label());
            }
        });
        ui.add_space(8.0);

        egui::Grid::new("bulk_edit_grid")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Path pattern");
                ui.text_edit_singleline(&mut state.pattern);
                ui.end_row();

                let keys_label = match state.operation {
                    BulkOperation::Normalize => "Source keys",
                    _ => "Keys",
                };
                ui.label(keys_label);
                ui.text_edit_singleline(&mut state.keys)
                    .on_hover_text("Comma separated");
                ui.end_row();

                match state.operation {
                    BulkOperation::Add => {
                        ui.label("Value");
                        ui.text_edit_singleline(&mut state.value)
                            .on_hover_text("JSON such as false, 3 or [\"a\"]; anything else is text");
                        ui.end_row();
                    }
                    BulkOperation::Normalize => {
                        ui.label("Target key");
                        ui.text_edit_singleline(&mut state.target_key);
                        ui.end_row();
                    }
                    BulkOperation::Remove => {}
                }
            });

        ui.add_space(8.0);
        match Regex::new(&state.pattern) {
            Ok(regex) => {
                let matching = app
                    .store
                    .documents()
                    .filter(|(_, doc)| regex.is_match(&doc.relative_path))
                    .count();
                ui.label(format!("{} of {} documents match", matching, app.store.len()));
            }
            Err(e) => {
                ui.colored_label(ui.visuals().error_fg_color, format!("Invalid pattern: {}", e));
            }
        }

        ui.add_space(8.0);
        let ready = app.bulk_edit.is_complete() && !app.store.is_empty() && !app.is_busy();
        if ui.add_enabled(ready, egui::Button::new("Apply")).clicked() {
            app.apply_bulk_edit();
        }

        if let Some(result) = &app.bulk_edit.last_result {
            ui.add_space(8.0);
            ui.label(result.as_str());
        }
    }
}
