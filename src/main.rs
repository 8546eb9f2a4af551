// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Signal Gallery
//!
//! A frame gallery where anyone can circle, box or point at whatever they
//! see. Annotations are shared with every other viewer through a common
//! store.
//!
//! Usage: `signal-gallery [CONFIG.yaml]`

mod app;
mod config;
mod io;
mod models;
mod ui;
mod util;

use anyhow::Result;
use app::GalleryApp;
use config::GalleryConfig;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = GalleryConfig::load(config_path.as_deref())?;
    let store = config.store.open()?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 480.0])
            .with_title(config.title.clone()),
        ..Default::default()
    };

    let visuals = config.theme.visuals();
    let title = config.title.clone();

    // Run the application
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(visuals);
            Ok(Box::new(GalleryApp::new(config, store, &cc.egui_ctx)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
