//! Frontmatter Studio - browse a markdown content tree and bulk-edit its frontmatter
//!
//! Opens a directory of posts, shows them as a folder tree, and applies
//! pattern-scoped frontmatter edits that are written back on save.

mod app;
mod core;
mod ui;

use app::FrontmatterApp;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting Frontmatter Studio...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("Frontmatter Studio"),
        ..Default::default()
    };

    eframe::run_native(
        "Frontmatter Studio",
        native_options,
        Box::new(|cc| Ok(Box::new(FrontmatterApp::new(cc)?))),
    )
}
