// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay canvas rendering.
//!
//! Annotations are drawn onto a [`Surface`] whose coordinate space is the
//! frame's native pixel space, so stored coordinates are used as-is. The
//! egui implementation maps that space onto the on-screen image rectangle.

use crate::models::annotation::{Annotation, AnnotationType, Point, RectGeometry};
use crate::util::geometry::SurfaceLayout;

/// Stroke color for every annotation.
pub const ANNOTATION_COLOR: egui::Color32 = egui::Color32::from_rgb(0xff, 0xf2, 0x00);

/// Stroke width in native pixels on the full-screen overlay.
pub const OVERLAY_STROKE_WIDTH: f64 = 3.0;

/// Stroke width in screen points on grid thumbnails.
pub const THUMBNAIL_STROKE_WIDTH: f32 = 2.0;

/// A drawing target in native pixel coordinates.
pub trait Surface {
    /// Erase everything drawn so far.
    fn clear(&mut self);
    fn stroke_rect(&mut self, rect: &RectGeometry);
    fn stroke_circle(&mut self, center: Point, radius: f64);
    fn stroke_segment(&mut self, from: Point, to: Point);
}

/// Repaint the overlay: committed annotations in order, then the draft on top.
pub fn render_overlay<S: Surface>(surface: &mut S, annotations: &[Annotation], draft: Option<&Annotation>) {
    surface.clear();
    for annotation in annotations {
        draw_annotation(surface, annotation);
    }
    if let Some(draft) = draft {
        draw_annotation(surface, draft);
    }
}

/// Draw a single annotation. Shapes with no extent draw nothing.
pub fn draw_annotation<S: Surface>(surface: &mut S, annotation: &Annotation) {
    if annotation.is_degenerate() {
        return;
    }

    match annotation.annotation_type {
        AnnotationType::Rectangle => surface.stroke_rect(&annotation.rect()),
        AnnotationType::Circle => {
            let circle = annotation.circle();
            surface.stroke_circle(circle.center, circle.radius);
        }
        AnnotationType::Arrow => {
            let arrow = annotation.arrow();
            surface.stroke_segment(arrow.start, arrow.end);
            for tip in arrow.head {
                surface.stroke_segment(arrow.end, tip);
            }
        }
    }
}

/// [`Surface`] backed by an egui painter clipped to the displayed image.
pub struct EguiSurface<'a> {
    painter: &'a egui::Painter,
    layout: SurfaceLayout,
    stroke: egui::Stroke,
}

impl<'a> EguiSurface<'a> {
    pub fn new(painter: &'a egui::Painter, layout: SurfaceLayout) -> Self {
        // Keep the stroke as thick relative to the image as it is natively.
        let (scale_x, scale_y) = layout.scale();
        let width = OVERLAY_STROKE_WIDTH / scale_x.max(scale_y);
        Self {
            painter,
            layout,
            stroke: egui::Stroke::new(width as f32, ANNOTATION_COLOR),
        }
    }

    fn to_screen(&self, point: Point) -> egui::Pos2 {
        let (x, y) = self.layout.surface_to_screen(&point);
        egui::pos2(x as f32, y as f32)
    }
}

impl Surface for EguiSurface<'_> {
    fn clear(&mut self) {
        // egui starts every frame from an empty shape list.
    }

    fn stroke_rect(&mut self, rect: &RectGeometry) {
        let min = self.to_screen(Point::new(rect.left, rect.top));
        let max = self.to_screen(Point::new(rect.right(), rect.bottom()));
        self.painter
            .rect_stroke(egui::Rect::from_min_max(min, max), 0.0, self.stroke);
    }

    fn stroke_circle(&mut self, center: Point, radius: f64) {
        let (scale_x, scale_y) = self.layout.scale();
        let screen_radius = radius / scale_x.max(scale_y);
        self.painter
            .circle_stroke(self.to_screen(center), screen_radius as f32, self.stroke);
    }

    fn stroke_segment(&mut self, from: Point, to: Point) {
        self.painter
            .line_segment([self.to_screen(from), self.to_screen(to)], self.stroke);
    }
}
