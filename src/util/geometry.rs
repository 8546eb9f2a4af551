// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Conversion from on-screen pointer positions to the overlay surface's
//! native pixel space, and wrap-around frame navigation.

use crate::models::annotation::Point;

/// Where the overlay surface sits on screen and how large it is natively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLayout {
    /// Top-left corner of the displayed surface, in screen points.
    pub origin: Point,
    /// Displayed size, in screen points.
    pub displayed: (f64, f64),
    /// Native size, in image pixels.
    pub native: (u32, u32),
}

impl SurfaceLayout {
    /// Native pixels per displayed point on each axis.
    ///
    /// A surface with no displayed extent maps 1:1.
    pub fn scale(&self) -> (f64, f64) {
        let axis = |native: u32, displayed: f64| {
            if displayed > 0.0 {
                native as f64 / displayed
            } else {
                1.0
            }
        };
        (
            axis(self.native.0, self.displayed.0),
            axis(self.native.1, self.displayed.1),
        )
    }

    /// Convert a screen position to surface (native pixel) coordinates.
    pub fn screen_to_surface(&self, screen_x: f64, screen_y: f64) -> Point {
        let (scale_x, scale_y) = self.scale();
        Point {
            x: (screen_x - self.origin.x) * scale_x,
            y: (screen_y - self.origin.y) * scale_y,
        }
    }

    /// Convert surface coordinates back to a screen position.
    pub fn surface_to_screen(&self, point: &Point) -> (f64, f64) {
        let (scale_x, scale_y) = self.scale();
        (
            self.origin.x + point.x / scale_x,
            self.origin.y + point.y / scale_y,
        )
    }
}

/// Step `direction` frames from `current`, wrapping at both ends.
///
/// Returns 0 for an empty gallery.
pub fn navigate(current: usize, direction: isize, frame_count: usize) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let count = frame_count as isize;
    (current as isize + direction).rem_euclid(count) as usize
}
