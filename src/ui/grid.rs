// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Thumbnail grid.
//!
//! Cells keep the frames' aspect ratio and fill the available width. Only
//! visible rows are laid out, and thumbnails are requested from the
//! background loader when their cell scrolls into view. Each cell's
//! annotations are projected into the cell's measured box.

use crate::config::GalleryConfig;
use crate::io::media::ThumbnailLoader;
use crate::models::annotation::Annotation;
use crate::models::collection::{AnnotationCollection, ImageId};
use crate::ui::canvas::{ANNOTATION_COLOR, THUMBNAIL_STROKE_WIDTH};
use crate::util::projection::{BoxSize, Projector, ThumbnailShape};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

/// Thumbnails kept as textures at once; older ones are dropped and decoded
/// again if they scroll back into view.
const RESIDENT_THUMBNAILS: usize = 128;

enum SlotState {
    Pending,
    Ready(egui::TextureHandle),
    Failed,
}

struct Slot {
    state: SlotState,
    /// Frame counter value when the cell was last drawn.
    last_used: u64,
}

/// Thumbnail textures by frame, filled in as the loader finishes them.
///
/// Bounded to [`RESIDENT_THUMBNAILS`], evicting the least recently drawn.
pub struct ThumbnailCache {
    loader: ThumbnailLoader,
    slots: HashMap<ImageId, Slot>,
    capacity: usize,
    frame: u64,
}

impl ThumbnailCache {
    /// Decode thumbnails no wider than `decode_width` pixels.
    pub fn new(decode_width: u32) -> Self {
        Self {
            loader: ThumbnailLoader::spawn(decode_width, decode_width),
            slots: HashMap::new(),
            capacity: RESIDENT_THUMBNAILS,
            frame: 0,
        }
    }

    /// Upload finished thumbnails. Returns whether any arrived.
    ///
    /// Results for frames evicted while pending are dropped.
    pub fn poll(&mut self, ctx: &egui::Context) -> bool {
        let mut arrived = false;
        while let Some((image, result)) = self.loader.try_recv() {
            let Some(slot) = self.slots.get_mut(&image) else {
                continue;
            };
            if !matches!(slot.state, SlotState::Pending) {
                continue;
            }
            arrived = true;
            slot.state = match result {
                Ok(loaded) => {
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(loaded.size(), &loaded.pixels);
                    SlotState::Ready(ctx.load_texture(
                        format!("thumbnail_{}", image),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ))
                }
                Err(e) => {
                    log::warn!("Thumbnail for frame {} unavailable: {}", image, e);
                    SlotState::Failed
                }
            };
        }
        arrived
    }

    pub fn has_pending(&self) -> bool {
        self.slots.values().any(|slot| matches!(slot.state, SlotState::Pending))
    }

    /// Start a new grid pass; cells drawn from here on count as in use.
    fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Drop the least recently drawn slots over capacity. Cells drawn this
    /// pass are never dropped.
    fn evict(&mut self) {
        if self.slots.len() <= self.capacity {
            return;
        }
        let mut stale: Vec<(u64, ImageId)> = self
            .slots
            .iter()
            .filter(|(_, slot)| slot.last_used < self.frame)
            .map(|(image, slot)| (slot.last_used, *image))
            .collect();
        stale.sort_unstable();

        let excess = self.slots.len() - self.capacity;
        for (_, image) in stale.into_iter().take(excess) {
            self.slots.remove(&image);
        }
        log::debug!("Thumbnail cache holds {} frames", self.slots.len());
    }

    /// The frame's texture, requesting it on first use.
    fn texture(&mut self, image: ImageId, path: impl FnOnce() -> PathBuf) -> Option<&egui::TextureHandle> {
        let frame = self.frame;
        match self.slots.entry(image) {
            Entry::Vacant(vacant) => {
                self.loader.request(image, path());
                vacant.insert(Slot {
                    state: SlotState::Pending,
                    last_used: frame,
                });
                None
            }
            Entry::Occupied(occupied) => {
                let slot = occupied.into_mut();
                slot.last_used = frame;
                match &slot.state {
                    SlotState::Ready(texture) => Some(texture),
                    SlotState::Pending | SlotState::Failed => None,
                }
            }
        }
    }
}

/// Column count and cell size for a given width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    pub cell: egui::Vec2,
}

impl GridLayout {
    /// Fit as many cells of at least `min_cell_width` as the width allows.
    pub fn compute(available_width: f32, min_cell_width: f32, native: (u32, u32), frame_count: usize) -> Self {
        let columns = if available_width.is_finite() && min_cell_width > 0.0 {
            ((available_width / min_cell_width).floor() as usize).max(1)
        } else {
            1
        };
        let cell_width = if available_width.is_finite() && available_width > 0.0 {
            available_width / columns as f32
        } else {
            BoxSize::FALLBACK.width as f32
        };
        let aspect = native.1 as f32 / native.0 as f32;
        Self {
            columns,
            rows: frame_count.div_ceil(columns),
            cell: egui::vec2(cell_width, cell_width * aspect),
        }
    }
}

/// Display the grid. Returns the frame whose cell was clicked.
pub fn show(
    ui: &mut egui::Ui,
    config: &GalleryConfig,
    annotations: &AnnotationCollection,
    thumbnails: &mut ThumbnailCache,
) -> Option<ImageId> {
    let layout = GridLayout::compute(
        ui.available_width(),
        config.thumbnail_width,
        config.native_size(),
        config.frame_count,
    );
    let mut clicked = None;
    thumbnails.begin_frame();

    ui.spacing_mut().item_spacing = egui::Vec2::ZERO;
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show_rows(ui, layout.cell.y, layout.rows, |ui, row_range| {
            for row in row_range {
                ui.horizontal(|ui| {
                    for column in 0..layout.columns {
                        let image = row * layout.columns + column;
                        if image >= config.frame_count {
                            break;
                        }
                        if cell(ui, config, image, layout.cell, annotations.get(image), thumbnails) {
                            clicked = Some(image);
                        }
                    }
                });
            }
        });
    thumbnails.evict();

    clicked
}

fn cell(
    ui: &mut egui::Ui,
    config: &GalleryConfig,
    image: ImageId,
    size: egui::Vec2,
    annotations: &[Annotation],
    thumbnails: &mut ThumbnailCache,
) -> bool {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
    if !ui.is_rect_visible(rect) {
        return response.clicked();
    }

    let painter = ui.painter_at(rect);
    match thumbnails.texture(image, || config.frame_path(image)) {
        Some(texture) => {
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(rect, 0.0, config.theme.background());
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                format!("{}", image),
                egui::FontId::proportional(12.0),
                egui::Color32::from_gray(120),
            );
        }
    }

    if !annotations.is_empty() {
        let target = BoxSize::measured_or_fallback(rect.width() as f64, rect.height() as f64);
        let projector = Projector::new(config.native_size(), target);
        for annotation in annotations {
            if let Some(shape) = projector.project(annotation) {
                paint_projected(&painter, rect.min, &shape);
            }
        }
    }

    painter.rect_stroke(rect.shrink(0.5), 0.0, egui::Stroke::new(1.0, config.theme.border()));

    response.on_hover_cursor(egui::CursorIcon::PointingHand).clicked()
}

/// Paint a projected shape relative to the cell's top-left corner.
fn paint_projected(painter: &egui::Painter, origin: egui::Pos2, shape: &ThumbnailShape) {
    let stroke = egui::Stroke::new(THUMBNAIL_STROKE_WIDTH, ANNOTATION_COLOR);
    let offset = |x: f64, y: f64| origin + egui::vec2(x as f32, y as f32);

    match *shape {
        ThumbnailShape::Rect { left, top, width, height } => {
            let rect = egui::Rect::from_min_size(offset(left, top), egui::vec2(width as f32, height as f32));
            painter.rect_stroke(rect, 0.0, stroke);
        }
        ThumbnailShape::Circle { center, radius } => {
            painter.circle_stroke(offset(center.x, center.y), radius as f32, stroke);
        }
        ThumbnailShape::Arrow { start, .. } => {
            if let Some(end) = shape.arrow_end() {
                painter.line_segment([offset(start.x, start.y), offset(end.x, end.y)], stroke);
            }
        }
    }
}
