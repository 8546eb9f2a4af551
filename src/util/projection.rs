// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Projection of native-space annotations into a thumbnail box.
//!
//! Unlike the full-screen overlay, a thumbnail box need not match the frame's
//! aspect ratio, so every projected shape is clamped to stay inside the box.

use crate::models::annotation::{Annotation, AnnotationType, Point};

/// Rendered size of a thumbnail box, in screen points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    /// Used whenever the layout has not produced a measurable box yet.
    pub const FALLBACK: BoxSize = BoxSize {
        width: 280.0,
        height: 157.5,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The measured size, or [`BoxSize::FALLBACK`] if it is unusable.
    pub fn measured_or_fallback(width: f64, height: f64) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if usable(width) && usable(height) {
            Self::new(width, height)
        } else {
            Self::FALLBACK
        }
    }
}

/// A shape in thumbnail-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThumbnailShape {
    Rect {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
    Circle {
        center: Point,
        radius: f64,
    },
    /// Shaft only: a segment of `length` from `start` rotated by `angle` radians.
    Arrow {
        start: Point,
        length: f64,
        angle: f64,
    },
}

impl ThumbnailShape {
    /// End point of an arrow shaft; `None` for other shapes.
    pub fn arrow_end(&self) -> Option<Point> {
        match *self {
            ThumbnailShape::Arrow { start, length, angle } => Some(Point::new(
                start.x + length * angle.cos(),
                start.y + length * angle.sin(),
            )),
            _ => None,
        }
    }
}

/// Scales native-space geometry into a thumbnail box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    native_width: f64,
    native_height: f64,
    target: BoxSize,
}

impl Projector {
    pub fn new(native: (u32, u32), target: BoxSize) -> Self {
        Self {
            native_width: native.0 as f64,
            native_height: native.1 as f64,
            target,
        }
    }

    /// Per-axis scale from native pixels to box points.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.target.width / self.native_width,
            self.target.height / self.native_height,
        )
    }

    /// Project an annotation, or `None` if nothing would be visible.
    pub fn project(&self, annotation: &Annotation) -> Option<ThumbnailShape> {
        match annotation.annotation_type {
            AnnotationType::Rectangle => self.project_rect(annotation),
            AnnotationType::Circle => self.project_circle(annotation),
            AnnotationType::Arrow => self.project_arrow(annotation),
        }
    }

    fn project_rect(&self, annotation: &Annotation) -> Option<ThumbnailShape> {
        let (scale_x, scale_y) = self.scale();
        let rect = annotation.rect();

        let left = (rect.left * scale_x).max(0.0);
        let top = (rect.top * scale_y).max(0.0);
        let right = (rect.right() * scale_x).min(self.target.width);
        let bottom = (rect.bottom() * scale_y).min(self.target.height);

        let width = right - left;
        let height = bottom - top;
        if width > 0.0 && height > 0.0 {
            Some(ThumbnailShape::Rect {
                left,
                top,
                width,
                height,
            })
        } else {
            None
        }
    }

    fn project_circle(&self, annotation: &Annotation) -> Option<ThumbnailShape> {
        let (scale_x, scale_y) = self.scale();
        let circle = annotation.circle();

        // A circle wider than the box cannot be kept inside it by moving the center.
        let max_radius = self.target.width.min(self.target.height) / 2.0;
        let radius = (circle.radius * scale_x.min(scale_y)).min(max_radius);

        let center = Point::new(
            (circle.center.x * scale_x).clamp(radius, self.target.width - radius),
            (circle.center.y * scale_y).clamp(radius, self.target.height - radius),
        );
        Some(ThumbnailShape::Circle { center, radius })
    }

    fn project_arrow(&self, annotation: &Annotation) -> Option<ThumbnailShape> {
        let (scale_x, scale_y) = self.scale();
        let clamp_point = |p: Point| {
            Point::new(
                (p.x * scale_x).clamp(0.0, self.target.width),
                (p.y * scale_y).clamp(0.0, self.target.height),
            )
        };

        let start = clamp_point(annotation.start());
        let end = clamp_point(annotation.end());
        let length = start.distance_to(&end);
        if length > 0.0 {
            Some(ThumbnailShape::Arrow {
                start,
                length,
                angle: (end.y - start.y).atan2(end.x - start.x),
            })
        } else {
            None
        }
    }
}
