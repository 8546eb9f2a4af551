// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! An annotation is a shape tag plus two anchor points in the native pixel
//! space of the full-resolution frame. Everything else (rectangle bounds,
//! circle center and radius, arrow head) is derived from those two points,
//! and every renderer goes through the helpers here so the derivation is
//! the same everywhere.

use serde::{Deserialize, Serialize};

/// Length of each arrowhead stroke, in native pixels.
pub const ARROW_HEAD_LENGTH: f64 = 20.0;

/// Angle between the shaft and each arrowhead stroke.
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;

/// A 2D point in native pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Type of annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Circle,
    Rectangle,
    Arrow,
}

/// A committed (or draft) annotation.
///
/// Serialized as `{ "type": "circle", "startX": .., "startY": .., "endX": .., "endY": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

/// Axis-aligned bounds of a rectangle annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl RectGeometry {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Center and radius of a circle annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleGeometry {
    pub center: Point,
    pub radius: f64,
}

/// Shaft and head strokes of an arrow annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowGeometry {
    pub start: Point,
    pub end: Point,
    /// Far ends of the two head strokes; both strokes start at `end`.
    pub head: [Point; 2],
}

impl ArrowGeometry {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

impl Annotation {
    /// Create an annotation anchored at a single point (zero extent).
    pub fn new(annotation_type: AnnotationType, anchor: Point) -> Self {
        Self {
            annotation_type,
            start_x: anchor.x,
            start_y: anchor.y,
            end_x: anchor.x,
            end_y: anchor.y,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x, self.end_y)
    }

    /// Move the end anchor, keeping the start anchor.
    pub fn set_end(&mut self, end: Point) {
        self.end_x = end.x;
        self.end_y = end.y;
    }

    /// Bounds spanned by the two anchors.
    pub fn rect(&self) -> RectGeometry {
        RectGeometry {
            left: self.start_x.min(self.end_x),
            top: self.start_y.min(self.end_y),
            width: (self.end_x - self.start_x).abs(),
            height: (self.end_y - self.start_y).abs(),
        }
    }

    /// Circle whose diameter is the segment between the two anchors.
    pub fn circle(&self) -> CircleGeometry {
        CircleGeometry {
            center: Point::new(
                (self.start_x + self.end_x) / 2.0,
                (self.start_y + self.end_y) / 2.0,
            ),
            radius: self.start().distance_to(&self.end()) / 2.0,
        }
    }

    /// Arrow from start to end with the head at the end point.
    pub fn arrow(&self) -> ArrowGeometry {
        let angle = (self.end_y - self.start_y).atan2(self.end_x - self.start_x);
        let head_point = |offset: f64| {
            Point::new(
                self.end_x - ARROW_HEAD_LENGTH * (angle + offset).cos(),
                self.end_y - ARROW_HEAD_LENGTH * (angle + offset).sin(),
            )
        };
        ArrowGeometry {
            start: self.start(),
            end: self.end(),
            head: [head_point(-ARROW_HEAD_ANGLE), head_point(ARROW_HEAD_ANGLE)],
        }
    }

    /// True when the shape has no visible extent.
    pub fn is_degenerate(&self) -> bool {
        match self.annotation_type {
            AnnotationType::Rectangle => {
                let rect = self.rect();
                rect.width == 0.0 && rect.height == 0.0
            }
            AnnotationType::Circle => self.circle().radius == 0.0,
            AnnotationType::Arrow => self.arrow().length() == 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(annotation_type: AnnotationType, sx: f64, sy: f64, ex: f64, ey: f64) -> Annotation {
        Annotation {
            annotation_type,
            start_x: sx,
            start_y: sy,
            end_x: ex,
            end_y: ey,
        }
    }

    #[test]
    fn test_rect_normalizes_reversed_drag() {
        let rect = ann(AnnotationType::Rectangle, 300.0, 200.0, 100.0, 50.0).rect();
        assert_eq!(rect.left, 100.0);
        assert_eq!(rect.top, 50.0);
        assert_eq!(rect.width, 200.0);
        assert_eq!(rect.height, 150.0);
        assert_eq!(rect.right(), 300.0);
        assert_eq!(rect.bottom(), 200.0);
    }

    #[test]
    fn test_circle_center_and_radius() {
        let circle = ann(AnnotationType::Circle, 0.0, 0.0, 6.0, 8.0).circle();
        assert_eq!(circle.center, Point::new(3.0, 4.0));
        assert!((circle.radius - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_arrow_head_strokes() {
        let arrow = ann(AnnotationType::Arrow, 0.0, 0.0, 100.0, 0.0).arrow();
        assert_eq!(arrow.length(), 100.0);

        let cos30 = ARROW_HEAD_ANGLE.cos() * ARROW_HEAD_LENGTH;
        let sin30 = ARROW_HEAD_ANGLE.sin() * ARROW_HEAD_LENGTH;
        assert!((arrow.head[0].x - (100.0 - cos30)).abs() < 1e-9);
        assert!((arrow.head[0].y - sin30).abs() < 1e-9);
        assert!((arrow.head[1].x - (100.0 - cos30)).abs() < 1e-9);
        assert!((arrow.head[1].y + sin30).abs() < 1e-9);

        // Both head strokes are exactly ARROW_HEAD_LENGTH long.
        for tip in arrow.head {
            assert!((tip.distance_to(&arrow.end) - ARROW_HEAD_LENGTH).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_shapes() {
        assert!(ann(AnnotationType::Arrow, 5.0, 5.0, 5.0, 5.0).is_degenerate());
        assert!(ann(AnnotationType::Circle, 5.0, 5.0, 5.0, 5.0).is_degenerate());
        assert!(ann(AnnotationType::Rectangle, 5.0, 5.0, 5.0, 5.0).is_degenerate());
        // A flat rectangle still strokes a visible line.
        assert!(!ann(AnnotationType::Rectangle, 5.0, 5.0, 50.0, 5.0).is_degenerate());
    }

    #[test]
    fn test_serde_wire_shape() {
        let json = r#"{"type":"rectangle","startX":1.5,"startY":2,"endX":30,"endY":40}"#;
        let parsed: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, ann(AnnotationType::Rectangle, 1.5, 2.0, 30.0, 40.0));

        let value = serde_json::to_value(parsed).unwrap();
        assert_eq!(value["type"], "rectangle");
        assert_eq!(value["endY"], 40.0);
    }
}
