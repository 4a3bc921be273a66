//! Main application state and UI coordination

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context;
use eframe::egui;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::{backend::LocalBackend, config::AppConfig, store::DocumentStore};
use crate::ui::{
    bulk_edit::{BulkEditPanel, BulkEditState, BulkOperation},
    frontmatter::FrontmatterPanel,
    sidebar::Sidebar,
    status_bar::StatusBar,
};

/// Message shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// Store handed back by a background job, plus what to do with its result
struct Finished {
    store: DocumentStore,
    apply: Box<dyn FnOnce(&mut FrontmatterApp) + Send>,
}

/// Main application state
pub struct FrontmatterApp {
    /// Loaded documents, tree and readiness flags
    pub store: DocumentStore,
    /// Filesystem access for loading, saving and exporting
    pub backend: LocalBackend,
    /// Runtime driving backend calls off the UI thread
    runtime: tokio::runtime::Runtime,
    finished_tx: UnboundedSender<Finished>,
    finished_rx: UnboundedReceiver<Finished>,
    /// Label of the running background job
    pub busy: Option<String>,
    ctx: egui::Context,
    /// Application configuration
    pub config: AppConfig,
    /// Bulk edit form
    pub bulk_edit: BulkEditState,
    /// Last status message
    pub status: Option<Status>,
    /// Whether sidebar is visible
    pub sidebar_visible: bool,
    /// Whether the bulk edit panel is visible
    pub bulk_edit_visible: bool,
}

impl FrontmatterApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();

        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        });
        let bulk_edit = BulkEditState::new(&config.bulk_edit.default_pattern);
        let last_directory = config.last_directory.clone();

        let mut app = Self {
            store: DocumentStore::new(),
            backend: LocalBackend::new(),
            runtime,
            finished_tx,
            finished_rx,
            busy: None,
            ctx: cc.egui_ctx.clone(),
            config,
            bulk_edit,
            status: None,
            sidebar_visible: true,
            bulk_edit_visible: true,
        };

        if let Some(path) = last_directory.filter(|p| p.is_dir()) {
            app.open_directory(path);
        }
        Ok(app)
    }

    fn set_status(&mut self, status: Status) {
        match &status {
            Status::Info(msg) => tracing::info!("{}", msg),
            Status::Error(msg) => tracing::error!("{}", msg),
        }
        self.status = Some(status);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// Run `job` on a copy of the store without blocking the UI.
    ///
    /// The copy replaces the shown store once the job finishes, then `done`
    /// gets the job's output. Only one job runs at a time.
    fn run<T, Fut>(
        &mut self,
        label: &str,
        job: impl FnOnce(DocumentStore, LocalBackend) -> Fut,
        done: impl FnOnce(&mut Self, T) + Send + 'static,
    ) where
        Fut: Future<Output = (DocumentStore, T)> + Send + 'static,
        T: Send + 'static,
    {
        if let Some(running) = &self.busy {
            let message = format!("Wait for {} to finish", running.to_lowercase());
            self.set_status(Status::Error(message));
            return;
        }

        let future = job(self.store.clone(), self.backend);
        let sender = self.finished_tx.clone();
        let ctx = self.ctx.clone();
        self.busy = Some(label.to_string());
        self.runtime.spawn(async move {
            let (store, output) = future.await;
            let finished = Finished {
                store,
                apply: Box::new(move |app: &mut FrontmatterApp| done(app, output)),
            };
            if sender.send(finished).is_err() {
                tracing::debug!("Application closed before a background job finished");
            }
            ctx.request_repaint();
        });
    }

    /// Apply jobs that finished since the last frame
    fn poll_jobs(&mut self) {
        while let Ok(finished) = self.finished_rx.try_recv() {
            self.busy = None;
            self.store.adopt(finished.store);
            (finished.apply)(self);
        }
    }

    /// Open a content directory, replacing the current collection
    pub fn open_directory(&mut self, path: PathBuf) {
        let unsaved = self.store.modified_count();
        if unsaved > 0 {
            tracing::warn!("Discarding {} unsaved documents", unsaved);
        }

        let base = path.to_string_lossy().to_string();
        let job_base = base.clone();
        self.run(
            "Loading",
            move |mut store, backend| async move {
                let result = store.open_directory(&backend, &job_base).await;
                (store, result)
            },
            move |app, result| match result {
                Ok(count) => {
                    app.set_status(Status::Info(format!("Loaded {} documents from {}", count, base)));
                    app.config.add_recent_directory(path);
                    if let Err(e) = app.config.save() {
                        tracing::error!("Failed to save config: {:#}", e);
                    }
                }
                Err(e) => app.set_status(Status::Error(format!("Failed to open {}: {}", base, e))),
            },
        );
    }

    /// Reload the current directory from disk
    pub fn reload(&mut self) {
        if !self.store.base_path().is_empty() {
            self.open_directory(PathBuf::from(self.store.base_path()));
        }
    }

    /// Write every modified document back to disk
    pub fn save_changes(&mut self) {
        self.run(
            "Saving",
            |mut store, backend| async move {
                let result = store.save_modified(&backend).await;
                (store, result)
            },
            |app, result| match result {
                Ok(summary) if summary.failed.is_empty() => {
                    app.set_status(Status::Info(format!("Saved {} documents", summary.written)));
                }
                Ok(summary) => app.set_status(Status::Error(format!(
                    "Saved {} documents, {} failed: {}",
                    summary.written,
                    summary.failed.len(),
                    summary.failed.join(", ")
                ))),
                Err(e) => app.set_status(Status::Error(format!("Save failed: {}", e))),
            },
        );
    }

    /// Re-read the selected document from disk
    pub fn revert_selected(&mut self) {
        let Some(absolute) = self.store.selected_entry().map(|(path, _)| path.clone()) else {
            return;
        };
        let job_path = absolute.clone();
        self.run(
            "Reverting",
            move |mut store, backend| async move {
                let result = store.reload_document(&backend, &job_path).await;
                (store, result)
            },
            move |app, result| match result {
                Ok(()) => app.set_status(Status::Info(format!("Reverted {}", absolute))),
                Err(e) => app.set_status(Status::Error(format!("Revert failed: {}", e))),
            },
        );
    }

    /// Put the absolute path of every document on the clipboard
    pub fn copy_document_paths(&mut self) {
        let paths = self.store.list_absolute_paths();
        let count = paths.len();
        self.ctx.copy_text(paths.join("\n"));
        self.set_status(Status::Info(format!("Copied {} paths", count)));
    }

    fn dialog_directory(&self) -> Option<&Path> {
        let base = self.store.base_path();
        (!base.is_empty()).then(|| Path::new(base))
    }

    /// Export all frontmatter to a spreadsheet chosen by the user
    pub fn export_spreadsheet(&mut self) {
        if self.is_busy() {
            return;
        }
        let mut dialog = rfd::FileDialog::new()
            .set_title("Export frontmatter")
            .add_filter("Excel workbook", &["xlsx"])
            .set_file_name("frontmatter-export.xlsx");
        if let Some(dir) = self.dialog_directory() {
            dialog = dialog.set_directory(dir);
        }
        let Some(destination) = dialog.save_file() else {
            return;
        };

        let destination = destination.to_string_lossy().to_string();
        self.store.set_exporting(true);
        self.run(
            "Exporting",
            move |mut store, backend| async move {
                let result = store.export_spreadsheet(&backend, &destination).await;
                (store, result)
            },
            |app, result| match result {
                Ok(path) => {
                    app.set_status(Status::Info(format!("Exported frontmatter to {}", path)));
                    if let Err(e) = open::that(&path) {
                        tracing::warn!("Could not open {}: {}", path, e);
                    }
                }
                Err(e) => app.set_status(Status::Error(format!("Export failed: {}", e))),
            },
        );
    }

    /// Import frontmatter from a spreadsheet into the open directory
    pub fn import_spreadsheet(&mut self) {
        if self.is_busy() {
            return;
        }
        if self.store.base_path().is_empty() {
            self.set_status(Status::Error("Open a folder before importing".to_string()));
            return;
        }
        let Some(source) = rfd::FileDialog::new()
            .set_title("Import frontmatter")
            .add_filter("Excel workbook", &["xlsx"])
            .pick_file()
        else {
            return;
        };

        let source = source.to_string_lossy().to_string();
        self.run(
            "Importing",
            move |mut store, backend| async move {
                let result = store.import_spreadsheet(&backend, &source).await;
                (store, result)
            },
            |app, result| match result {
                Ok(message) => app.set_status(Status::Info(message)),
                Err(e) => app.set_status(Status::Error(format!("Import failed: {}", e))),
            },
        );
    }

    /// Archive every document of the open directory
    pub fn backup(&mut self) {
        if self.is_busy() {
            return;
        }
        if self.store.is_empty() {
            self.set_status(Status::Error("Nothing to back up".to_string()));
            return;
        }
        let Some(destination) = rfd::FileDialog::new()
            .set_title("Back up documents")
            .add_filter("Gzipped tar archive", &["gz"])
            .set_file_name("frontmatter-backup.tar.gz")
            .save_file()
        else {
            return;
        };

        let destination = destination.to_string_lossy().to_string();
        let level = self.config.backup.level();
        self.run(
            "Backing up",
            move |store, backend| async move {
                let result = store.backup(&backend, &destination, level).await;
                (store, result)
            },
            |app, result| match result {
                Ok(path) => {
                    let count = app.store.len();
                    app.set_status(Status::Info(format!("Backed up {} documents to {}", count, path)));
                }
                Err(e) => app.set_status(Status::Error(format!("Backup failed: {}", e))),
            },
        );
    }

    /// Restore a backup archive into a directory chosen by the user
    pub fn restore(&mut self) {
        if self.is_busy() {
            return;
        }
        let Some(archive) = rfd::FileDialog::new()
            .set_title("Restore backup")
            .add_filter("Gzipped tar archive", &["gz"])
            .pick_file()
        else {
            return;
        };
        let mut dialog = rfd::FileDialog::new().set_title("Restore into");
        if let Some(dir) = self.dialog_directory() {
            dialog = dialog.set_directory(dir);
        }
        let Some(target) = dialog.pick_folder() else {
            return;
        };

        let archive = archive.to_string_lossy().to_string();
        let target_str = target.to_string_lossy().to_string();
        self.run(
            "Restoring",
            move |store, backend| async move {
                let result = store.restore(&backend, &archive, &target_str).await;
                (store, result)
            },
            move |app, result| match result {
                Ok(summary) if summary.failed_count == 0 => {
                    app.set_status(Status::Info(format!(
                        "Restored {} files",
                        summary.success_count
                    )));
                    if Path::new(app.store.base_path()) == target {
                        app.reload();
                    }
                }
                Ok(summary) => app.set_status(Status::Error(format!(
                    "Restored {} files, {} failed verification: {}",
                    summary.success_count,
                    summary.failed_count,
                    summary.failed_paths.join(", ")
                ))),
                Err(e) => app.set_status(Status::Error(format!("Restore failed: {}", e))),
            },
        );
    }

    /// Run the bulk edit described by the form
    pub fn apply_bulk_edit(&mut self) {
        if self.is_busy() {
            self.set_status(Status::Error("Wait for the running job before editing".to_string()));
            return;
        }
        let request = self.bulk_edit.request();
        let result = match request.operation {
            BulkOperation::Add => {
                self.store
                    .add_frontmatter_keys(&request.keys, &request.value, &request.pattern)
            }
            BulkOperation::Remove => self
                .store
                .remove_frontmatter_keys(&request.keys, &request.pattern),
            BulkOperation::Normalize => self.store.normalize_frontmatter_key(
                &request.keys,
                &request.target_key,
                &request.pattern,
            ),
        };

        match result {
            Ok(count) => {
                let message = request.operation.describe(count);
                self.bulk_edit.last_result = Some(message.clone());
                self.set_status(Status::Info(message));
            }
            Err(e) => self.set_status(Status::Error(e.to_string())),
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Folder...").clicked() {
                        if let Some(path) = rfd::FileDialog::new().pick_folder() {
                            self.open_directory(path);
                        }
                        ui.close();
                    }
                    ui.menu_button("Open Recent", |ui| {
                        let recent = self.config.recent_directories.clone();
                        if recent.is_empty() {
                            ui.label("No recent folders");
                        }
                        for path in recent {
                            if ui.button(path.display().to_string()).clicked() {
                                self.open_directory(path);
                                ui.close();
                            }
                        }
                    });
                    if ui.button("Save Changes").clicked() {
                        self.save_changes();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Export Spreadsheet...").clicked() {
                        self.export_spreadsheet();
                        ui.close();
                    }
                    if ui.button("Import Spreadsheet...").clicked() {
                        self.import_spreadsheet();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Back Up...").clicked() {
                        self.backup();
                        ui.close();
                    }
                    if ui.button("Restore Backup...").clicked() {
                        self.restore();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Toggle Sidebar").clicked() {
                        self.sidebar_visible = !self.sidebar_visible;
                        ui.close();
                    }
                    if ui.button("Toggle Bulk Edit").clicked() {
                        self.bulk_edit_visible = !self.bulk_edit_visible;
                        ui.close();
                    }
                    if ui.button("Reload").clicked() {
                        self.reload();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Copy Document Paths").clicked() {
                        self.copy_document_paths();
                        ui.close();
                    }
                });
            });
        });
    }
}

impl eframe::App for FrontmatterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();

        // Handle keyboard shortcuts
        let (save, open, toggle_sidebar) = ctx.input(|i| {
            (
                i.modifiers.ctrl && i.key_pressed(egui::Key::S),
                i.modifiers.ctrl && i.key_pressed(egui::Key::O),
                i.modifiers.ctrl && i.key_pressed(egui::Key::B),
            )
        });
        if save {
            self.save_changes();
        }
        if open {
            if let Some(path) = rfd::FileDialog::new().pick_folder() {
                self.open_directory(path);
            }
        }
        if toggle_sidebar {
            self.sidebar_visible = !self.sidebar_visible;
        }

        self.render_menu_bar(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            StatusBar::show(ui, self);
        });

        if self.sidebar_visible {
            egui::SidePanel::left("sidebar")
                .resizable(true)
                .default_width(self.config.ui.sidebar_width)
                .min_width(150.0)
                .show(ctx, |ui| {
                    Sidebar::show(ui, self);
                });
        }

        if self.bulk_edit_visible {
            egui::SidePanel::right("bulk_edit")
                .resizable(true)
                .default_width(300.0)
                .min_width(220.0)
                .show(ctx, |ui| {
                    BulkEditPanel::show(ui, self);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            FrontmatterPanel::show(ui, self);
        });
    }
}
