// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-frame annotation collection.
//!
//! Maps a frame index to its ordered annotation list. Frames without
//! annotations have no entry at all, so an empty list is never stored.

use super::annotation::Annotation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Index of a frame in the gallery.
pub type ImageId = usize;

/// Annotations for every annotated frame, keyed by frame index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationCollection {
    images: BTreeMap<ImageId, Vec<Annotation>>,
}

impl AnnotationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a full store snapshot.
    ///
    /// Accepts an object keyed by frame-index strings or an array indexed by
    /// frame with `null` holes. A missing or `null` snapshot yields an empty
    /// collection. Entries that fail to decode are logged and skipped.
    pub fn from_snapshot(snapshot: Option<&Value>) -> Self {
        let mut collection = Self::new();
        match snapshot {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (key, entry) in map {
                    match key.parse::<ImageId>() {
                        Ok(id) => collection.insert_entry(id, entry),
                        Err(_) => log::warn!("Ignoring annotations under non-numeric key {:?}", key),
                    }
                }
            }
            Some(Value::Array(items)) => {
                for (id, entry) in items.iter().enumerate() {
                    if !entry.is_null() {
                        collection.insert_entry(id, entry);
                    }
                }
            }
            Some(other) => {
                log::warn!("Ignoring annotation snapshot of unexpected shape: {}", other);
            }
        }
        collection
    }

    fn insert_entry(&mut self, id: ImageId, entry: &Value) {
        let items: Vec<&Value> = match entry {
            Value::Array(items) => items.iter().collect(),
            // Sparse lists arrive as objects keyed by list position.
            Value::Object(map) => {
                let mut indexed: Vec<(usize, &Value)> = map
                    .iter()
                    .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                indexed.into_iter().map(|(_, v)| v).collect()
            }
            other => {
                log::warn!("Ignoring annotations for frame {}: expected a list, got {}", id, other);
                return;
            }
        };

        let annotations = items
            .into_iter()
            .filter(|item| !item.is_null())
            .filter_map(|item| match Annotation::deserialize(item) {
                Ok(annotation) => Some(annotation),
                Err(e) => {
                    log::warn!("Skipping malformed annotation on frame {}: {}", id, e);
                    None
                }
            })
            .collect();
        self.set_sequence(id, annotations);
    }

    /// Replace one frame's sequence. An empty sequence removes the frame.
    pub fn set_sequence(&mut self, id: ImageId, annotations: Vec<Annotation>) {
        if annotations.is_empty() {
            self.images.remove(&id);
        } else {
            self.images.insert(id, annotations);
        }
    }

    /// Annotations for a frame, in insertion order.
    pub fn get(&self, id: ImageId) -> &[Annotation] {
        self.images.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The frame's current sequence with `annotation` appended.
    pub fn with_appended(&self, id: ImageId, annotation: Annotation) -> Vec<Annotation> {
        let mut merged = self.get(id).to_vec();
        merged.push(annotation);
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &[Annotation])> {
        self.images.iter().map(|(id, list)| (*id, list.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of frames with at least one annotation.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Total number of annotations across all frames.
    pub fn annotation_count(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::AnnotationType;
    use serde_json::json;

    #[test]
    fn test_empty_snapshot_is_empty() {
        assert!(AnnotationCollection::from_snapshot(None).is_empty());
        assert!(AnnotationCollection::from_snapshot(Some(&Value::Null)).is_empty());
        assert!(AnnotationCollection::from_snapshot(Some(&json!({}))).is_empty());
    }

    #[test]
    fn test_object_snapshot() {
        let snapshot = json!({
            "3": [
                {"type": "circle", "startX": 0, "startY": 0, "endX": 10, "endY": 10},
                {"type": "arrow", "startX": 5, "startY": 5, "endX": 50, "endY": 5}
            ],
            "12": [{"type": "rectangle", "startX": 1, "startY": 2, "endX": 3, "endY": 4}]
        });
        let collection = AnnotationCollection::from_snapshot(Some(&snapshot));
        assert_eq!(collection.image_count(), 2);
        assert_eq!(collection.annotation_count(), 3);
        assert_eq!(collection.get(3)[0].annotation_type, AnnotationType::Circle);
        assert_eq!(collection.get(3)[1].annotation_type, AnnotationType::Arrow);
        assert_eq!(collection.get(12)[0].end_y, 4.0);
        assert!(collection.get(4).is_empty());
    }

    #[test]
    fn test_array_snapshot_with_holes() {
        let snapshot = json!([
            null,
            [{"type": "rectangle", "startX": 1, "startY": 2, "endX": 3, "endY": 4}],
            null
        ]);
        let collection = AnnotationCollection::from_snapshot(Some(&snapshot));
        assert_eq!(collection.image_count(), 1);
        assert_eq!(collection.get(1).len(), 1);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let snapshot = json!({
            "0": [
                {"type": "hexagon", "startX": 0, "startY": 0, "endX": 1, "endY": 1},
                {"type": "circle", "startX": 0, "startY": 0, "endX": 1, "endY": 1}
            ],
            "1": [{"type": "hexagon"}],
            "frames": [],
            "2": "not a list"
        });
        let collection = AnnotationCollection::from_snapshot(Some(&snapshot));
        assert_eq!(collection.image_count(), 1);
        assert_eq!(collection.get(0).len(), 1);
    }

    #[test]
    fn test_sparse_list_keeps_order() {
        let snapshot = json!({
            "7": {
                "10": {"type": "arrow", "startX": 0, "startY": 0, "endX": 2, "endY": 2},
                "2": {"type": "circle", "startX": 0, "startY": 0, "endX": 1, "endY": 1}
            }
        });
        let collection = AnnotationCollection::from_snapshot(Some(&snapshot));
        let list = collection.get(7);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].annotation_type, AnnotationType::Circle);
        assert_eq!(list[1].annotation_type, AnnotationType::Arrow);
    }

    #[test]
    fn test_with_appended_leaves_collection_untouched() {
        let mut collection = AnnotationCollection::new();
        let first = Annotation::new(AnnotationType::Circle, Default::default());
        collection.set_sequence(0, vec![first]);

        let second = Annotation::new(AnnotationType::Arrow, Default::default());
        let merged = collection.with_appended(0, second);
        assert_eq!(merged, vec![first, second]);
        assert_eq!(collection.get(0).len(), 1);
    }

    #[test]
    fn test_empty_sequence_removes_key() {
        let mut collection = AnnotationCollection::new();
        collection.set_sequence(5, vec![Annotation::new(AnnotationType::Circle, Default::default())]);
        collection.set_sequence(5, Vec::new());
        assert!(collection.is_empty());
    }

    #[test]
    fn test_json_roundtrip_uses_string_keys() {
        let mut collection = AnnotationCollection::new();
        collection.set_sequence(42, vec![Annotation::new(AnnotationType::Rectangle, Default::default())]);
        let value = serde_json::to_value(&collection).unwrap();
        assert!(value.get("42").is_some());
        assert_eq!(AnnotationCollection::from_snapshot(Some(&value)), collection);
    }
}
