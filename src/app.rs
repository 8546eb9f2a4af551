// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the annotation cache, the thumbnail cache and
//! the viewer state, and routes between the grid and the full-screen viewer.

use crate::config::GalleryConfig;
use crate::io::store::AnnotationStore;
use crate::io::sync::AnnotationSync;
use crate::models::annotation::AnnotationType;
use crate::models::collection::ImageId;
use crate::ui::gesture::DragGesture;
use crate::ui::grid::{self, ThumbnailCache};
use crate::ui::viewer::{self, ViewerAction, ViewerFrame};
use crate::ui::toolbar;
use crate::util::geometry::navigate;
use std::sync::Arc;

/// Current drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Circle,
    Rectangle,
    Arrow,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Circle, Tool::Rectangle, Tool::Arrow];

    pub fn annotation_type(self) -> AnnotationType {
        match self {
            Tool::Circle => AnnotationType::Circle,
            Tool::Rectangle => AnnotationType::Rectangle,
            Tool::Arrow => AnnotationType::Arrow,
        }
    }
}

/// Thumbnails are decoded at the grid's minimum cell width.
fn thumbnail_decode_width(config: &GalleryConfig) -> u32 {
    config.thumbnail_width.ceil().max(1.0) as u32
}

/// Main application state.
pub struct GalleryApp {
    config: GalleryConfig,

    /// Annotation cache fed by the store subscription
    sync: AnnotationSync,

    /// Currently selected drawing tool, if any
    current_tool: Option<Tool>,

    /// Frame open in the viewer (None while the grid is shown)
    viewer: Option<ViewerFrame>,

    /// In-progress drag on the viewer overlay
    gesture: DragGesture,

    thumbnails: ThumbnailCache,
}

impl GalleryApp {
    /// Create a new gallery application instance.
    ///
    /// Store pushes wake `ctx` so edits from any client show up without
    /// waiting for input.
    pub fn new(config: GalleryConfig, store: Arc<dyn AnnotationStore>, ctx: &egui::Context) -> Self {
        let ctx = ctx.clone();
        let thumbnails = ThumbnailCache::new(thumbnail_decode_width(&config));
        Self {
            config,
            sync: AnnotationSync::connect_with_hook(store, move || ctx.request_repaint()),
            current_tool: None,
            viewer: None,
            gesture: DragGesture::default(),
            thumbnails,
        }
    }

    pub fn selected_image(&self) -> Option<ImageId> {
        self.viewer.as_ref().map(ViewerFrame::image)
    }

    fn open_viewer(&mut self, image: ImageId) {
        log::info!("Opening frame {}", image);
        self.gesture.cancel();
        self.current_tool = None;
        self.viewer = Some(ViewerFrame::load(&self.config, image));
    }

    fn close_viewer(&mut self) {
        self.gesture.cancel();
        self.current_tool = None;
        self.viewer = None;
    }

    fn navigate_image(&mut self, direction: isize) {
        let Some(current) = self.selected_image() else {
            return;
        };
        let next = navigate(current, direction, self.config.frame_count);
        // A draft belongs to the frame it was started on.
        self.gesture.cancel();
        self.viewer = Some(ViewerFrame::load(&self.config, next));
    }

    /// Export the cached collection to a file.
    fn export_annotations(&self, path: std::path::PathBuf) {
        match crate::io::serialization::export(self.sync.annotations(), &path) {
            Ok(_) => log::info!("Exported annotations to {}", path.display()),
            Err(e) => log::error!("Failed to export annotations: {:#}", e),
        }
    }

    /// Import a collection file, writing each frame's list to the store.
    fn import_annotations(&self, path: std::path::PathBuf) {
        match crate::io::serialization::import(&path) {
            Ok(collection) => {
                for (image, annotations) in collection.iter() {
                    self.sync.write_sequence(image, annotations);
                }
                log::info!(
                    "Imported {} annotations on {} frames from {}",
                    collection.annotation_count(),
                    collection.image_count(),
                    path.display()
                );
            }
            Err(e) => log::error!("Failed to import annotations: {:#}", e),
        }
    }

    fn menu_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Import Annotations...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Annotations", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.import_annotations(path);
                        }
                        ui.close_menu();
                    }
                    ui.menu_button("Export Annotations", |ui| {
                        if ui.button("Export as YAML...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("YAML", &["yaml", "yml"])
                                .set_file_name("annotations.yaml")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                        if ui.button("Export as JSON...").clicked() {
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("JSON", &["json"])
                                .set_file_name("annotations.json")
                                .save_file()
                            {
                                self.export_annotations(path);
                            }
                            ui.close_menu();
                        }
                    });
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }

    fn status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                match self.selected_image() {
                    Some(image) => {
                        ui.label(format!("Frame {}", image));
                        ui.separator();
                        ui.label(format!("{} annotations", self.sync.annotations().get(image).len()));
                        ui.separator();
                        match self.current_tool {
                            Some(tool) => ui.label(format!("Tool: {:?}", tool)),
                            None => ui.label("No tool"),
                        };
                    }
                    None => {
                        ui.label(format!("{} frames", self.config.frame_count));
                        ui.separator();
                        ui.label(format!(
                            "{} annotations on {} frames",
                            self.sync.annotations().annotation_count(),
                            self.sync.annotations().image_count()
                        ));
                    }
                }
            });
        });
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if self.viewer.is_none() || ctx.wants_keyboard_input() {
            return;
        }
        let (left, right, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if escape {
            self.close_viewer();
        } else if left {
            self.navigate_image(-1);
        } else if right {
            self.navigate_image(1);
        }
    }
}

impl eframe::App for GalleryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync.poll();
        self.thumbnails.poll(ctx);
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.poll(ctx);
        }

        // Background work reports through channels; keep polling while it runs
        // and at the store's cadence for pushes from other clients.
        let loading = self.thumbnails.has_pending() || self.viewer.as_ref().is_some_and(ViewerFrame::is_loading);
        if loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(self.config.store.poll_interval());
        }

        self.handle_keys(ctx);
        self.menu_bar(ctx);
        self.status_bar(ctx);

        if self.viewer.is_some() {
            egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
                toolbar::show(ui, &mut self.current_tool);
            });
        }

        let (action, opened) = egui::CentralPanel::default()
            .show(ctx, |ui| match &self.viewer {
                Some(frame) => {
                    let annotations = self.sync.annotations().get(frame.image());
                    let tool = self.current_tool.map(Tool::annotation_type);
                    let action = viewer::show(ui, &self.config, frame, annotations, &mut self.gesture, tool);
                    (action, None)
                }
                None => {
                    let clicked = grid::show(ui, &self.config, self.sync.annotations(), &mut self.thumbnails);
                    (ViewerAction::None, clicked)
                }
            })
            .inner;

        if let Some(image) = opened {
            self.open_viewer(image);
        }
        match action {
            ViewerAction::Commit(finished) => {
                self.sync.commit(finished);
                ctx.request_repaint();
            }
            ViewerAction::Navigate(direction) => self.navigate_image(direction),
            ViewerAction::Close => self.close_viewer(),
            ViewerAction::None => {}
        }
    }
}
