//! DocuHub - markdown document hub
//!
//! Browse a tree of folders and markdown files, edit one file at a time,
//! preview it, and save, export or publish through a persistence bridge.

mod app;
mod bridge;
mod core;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::DocuHub;
use crate::bridge::simulated::SimulatedBridge;
use crate::core::{config::AppConfig, seed};
use crate::ui::console::Console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (mut config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize logging
    let level = config.log_level().parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    if let Some(e) = config_error {
        tracing::warn!("Failed to load config, using defaults: {:#}", e);
    }
    tracing::info!("Starting DocuHub...");

    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        config.seed = Some(path.clone());
        config.add_recent_seed(path);
        if let Err(e) = config.save() {
            tracing::warn!("Failed to save config: {:#}", e);
        }
    }

    let forest = match &config.seed {
        Some(path) => seed::load(path)
            .with_context(|| format!("Failed to load documents from: {}", path.display()))?,
        None => seed::default_forest(),
    };

    let hub = DocuHub::new(forest, SimulatedBridge::new(config.bridge.clone()))
        .with_preview(config.preview.clone());
    let mut console = Console::new(hub);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    console.run(stdin, &mut std::io::stdout()).await
}
