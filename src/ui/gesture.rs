// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drag-to-draw gesture on the full-screen overlay.
//!
//! `Idle -> Drawing -> Idle`. Pointer-down starts a zero-size draft when a
//! tool is selected, pointer-move drags its end point, and pointer-up (or the
//! pointer leaving the surface) hands back the finished annotation.

use crate::models::annotation::{Annotation, AnnotationType, Point};
use crate::models::collection::ImageId;

/// A finished drag, ready to be appended to its frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishedDraft {
    pub image: ImageId,
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragGesture {
    #[default]
    Idle,
    Drawing {
        image: ImageId,
        draft: Annotation,
    },
}

impl DragGesture {
    /// Start drawing at `at` (surface pixels). Ignored without a tool or mid-drag.
    pub fn pointer_down(&mut self, tool: Option<AnnotationType>, image: ImageId, at: Point) -> bool {
        let Some(annotation_type) = tool else {
            return false;
        };
        if self.is_drawing() {
            return false;
        }
        *self = DragGesture::Drawing {
            image,
            draft: Annotation::new(annotation_type, at),
        };
        true
    }

    /// Move the draft's end point. Returns whether a repaint is needed.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        match self {
            DragGesture::Drawing { draft, .. } => {
                draft.set_end(at);
                true
            }
            DragGesture::Idle => false,
        }
    }

    /// Finish the drag, returning to `Idle`.
    pub fn pointer_up(&mut self) -> Option<FinishedDraft> {
        match std::mem::take(self) {
            DragGesture::Drawing { image, draft } => Some(FinishedDraft {
                image,
                annotation: draft,
            }),
            DragGesture::Idle => None,
        }
    }

    /// Leaving the surface finishes the drag exactly like pointer-up.
    pub fn pointer_leave(&mut self) -> Option<FinishedDraft> {
        self.pointer_up()
    }

    /// Drop the draft without committing it.
    pub fn cancel(&mut self) {
        *self = DragGesture::Idle;
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self, DragGesture::Drawing { .. })
    }

    /// The in-progress draft, if it belongs to `image`.
    pub fn draft_for(&self, image: ImageId) -> Option<&Annotation> {
        match self {
            DragGesture::Drawing { image: drawing_on, draft } if *drawing_on == image => Some(draft),
            _ => None,
        }
    }
}
