// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Full-screen frame viewer with the drawing overlay.
//!
//! The frame is fitted into the available space; the overlay covers exactly
//! the displayed image and works in the frame's native pixels, so pointer
//! positions are scaled by native size over displayed size.

use crate::config::GalleryConfig;
use crate::io::media::{spawn_frame_load, FrameResult};
use crate::models::annotation::{Annotation, AnnotationType, Point};
use crate::models::collection::ImageId;
use crate::ui::canvas::{render_overlay, EguiSurface};
use crate::ui::gesture::{DragGesture, FinishedDraft};
use crate::util::geometry::SurfaceLayout;
use std::sync::mpsc::Receiver;

/// Result of viewer interaction.
#[derive(Debug, PartialEq)]
pub enum ViewerAction {
    None,
    Close,
    Navigate(isize),
    Commit(FinishedDraft),
}

enum FrameState {
    Loading(Receiver<FrameResult>),
    Ready {
        texture: egui::TextureHandle,
        native: (u32, u32),
    },
    Failed,
}

/// The full-size frame currently shown in the viewer.
pub struct ViewerFrame {
    image: ImageId,
    state: FrameState,
}

impl ViewerFrame {
    /// Start loading `image` in the background.
    pub fn load(config: &GalleryConfig, image: ImageId) -> Self {
        Self {
            image,
            state: FrameState::Loading(spawn_frame_load(image, config.frame_path(image))),
        }
    }

    pub fn image(&self) -> ImageId {
        self.image
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FrameState::Loading(_))
    }

    /// Pick up the decoded frame. Returns whether the state changed.
    pub fn poll(&mut self, ctx: &egui::Context) -> bool {
        let FrameState::Loading(receiver) = &self.state else {
            return false;
        };
        let Ok((image, result)) = receiver.try_recv() else {
            return false;
        };

        self.state = match result {
            Ok(loaded) => {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(loaded.size(), &loaded.pixels);
                FrameState::Ready {
                    texture: ctx.load_texture(format!("frame_{}", image), color_image, egui::TextureOptions::LINEAR),
                    native: (loaded.width, loaded.height),
                }
            }
            Err(e) => {
                log::warn!("Frame {} unavailable: {}", image, e);
                FrameState::Failed
            }
        };
        true
    }
}

/// Largest rectangle with the frame's aspect ratio centered in `available`.
pub fn fit_rect(available: egui::Rect, native: (u32, u32)) -> egui::Rect {
    let (img_width, img_height) = native;
    if img_width == 0 || img_height == 0 || available.width() <= 0.0 || available.height() <= 0.0 {
        return egui::Rect::from_center_size(available.center(), egui::Vec2::ZERO);
    }

    let img_aspect = img_width as f32 / img_height as f32;
    let available_aspect = available.width() / available.height();

    let (display_width, display_height) = if img_aspect > available_aspect {
        // Image is wider - fit to width
        let width = available.width();
        (width, width / img_aspect)
    } else {
        // Image is taller - fit to height
        let height = available.height();
        (height * img_aspect, height)
    };

    egui::Rect::from_center_size(available.center(), egui::vec2(display_width, display_height))
}

/// Where a new draft starts, if the primary button went down on the image.
fn press_start(pressed: bool, origin: Option<egui::Pos2>, image_rect: egui::Rect) -> Option<egui::Pos2> {
    origin.filter(|pos| pressed && image_rect.contains(*pos))
}

fn to_surface(layout: &SurfaceLayout, pos: egui::Pos2) -> Point {
    layout.screen_to_surface(pos.x as f64, pos.y as f64)
}

/// Display the viewer and handle drawing on the overlay.
pub fn show(
    ui: &mut egui::Ui,
    config: &GalleryConfig,
    frame: &ViewerFrame,
    annotations: &[Annotation],
    gesture: &mut DragGesture,
    tool: Option<AnnotationType>,
) -> ViewerAction {
    let mut action = ViewerAction::None;
    let image = frame.image();

    ui.horizontal(|ui| {
        if ui.button(egui::RichText::new("◀").size(24.0)).clicked() {
            action = ViewerAction::Navigate(-1);
        }
        ui.label(
            egui::RichText::new(format!("Frame {} / {}", image, config.frame_count.saturating_sub(1)))
                .size(16.0),
        );
        if ui.button(egui::RichText::new("▶").size(24.0)).clicked() {
            action = ViewerAction::Navigate(1);
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(egui::RichText::new("✕").size(24.0)).clicked() {
                action = ViewerAction::Close;
            }
        });
    });
    ui.separator();

    let available = ui.available_rect_before_wrap();

    let (texture, native) = match &frame.state {
        FrameState::Ready { texture, native } => (texture, *native),
        FrameState::Loading(_) => {
            ui.put(available, egui::Spinner::new().size(32.0));
            return action;
        }
        FrameState::Failed => {
            ui.put(
                available,
                egui::Label::new(egui::RichText::new(format!("Frame {} could not be loaded", image)).weak()),
            );
            return action;
        }
    };

    ui.allocate_rect(available, egui::Sense::hover());
    let image_rect = fit_rect(available, native);
    let layout = SurfaceLayout {
        origin: Point::new(image_rect.min.x as f64, image_rect.min.y as f64),
        displayed: (image_rect.width() as f64, image_rect.height() as f64),
        native,
    };

    let response = ui.interact(image_rect, ui.id().with(("overlay", image)), egui::Sense::drag());
    let response = if tool.is_some() {
        response.on_hover_cursor(egui::CursorIcon::Crosshair)
    } else {
        response
    };

    // Start on the press itself so a click without movement still draws.
    let (pressed, origin) = ui.input(|i| (i.pointer.primary_pressed(), i.pointer.press_origin()));
    let pressed = (pressed && response.hovered()) || response.drag_started();
    if let Some(pos) = press_start(pressed, origin.or_else(|| response.interact_pointer_pos()), image_rect) {
        gesture.pointer_down(tool, image, to_surface(&layout, pos));
    }

    if gesture.is_drawing() {
        let (latest, primary_down) = ui.input(|i| (i.pointer.latest_pos(), i.pointer.primary_down()));
        let finished = match latest {
            Some(pos) if image_rect.contains(pos) => {
                if gesture.pointer_move(to_surface(&layout, pos)) {
                    ui.ctx().request_repaint();
                }
                if response.drag_stopped() || !primary_down {
                    gesture.pointer_up()
                } else {
                    None
                }
            }
            _ => gesture.pointer_leave(),
        };
        if let Some(finished) = finished {
            action = ViewerAction::Commit(finished);
        }
    }

    let painter = ui.painter_at(image_rect);
    painter.image(
        texture.id(),
        image_rect,
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        egui::Color32::WHITE,
    );
    let mut surface = EguiSurface::new(&painter, layout);
    render_overlay(&mut surface, annotations, gesture.draft_for(image));

    ui.painter().rect_stroke(
        image_rect.expand(2.0),
        0.0,
        egui::Stroke::new(4.0, config.theme.border()),
    );

    action
}
