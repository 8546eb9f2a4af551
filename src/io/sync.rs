// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Read-through annotation cache kept in step with the shared store.
//!
//! The cache only changes when the store pushes a snapshot; committing a new
//! annotation writes to the store, which echoes it straight back to local
//! subscribers before saving.

use super::store::{AnnotationStore, Snapshot};
use crate::models::annotation::Annotation;
use crate::models::collection::{AnnotationCollection, ImageId};
use crate::ui::gesture::FinishedDraft;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// Store path holding the whole collection.
pub const ANNOTATIONS_PATH: &str = "annotations";

fn image_path(image: ImageId) -> String {
    format!("{}/{}", ANNOTATIONS_PATH, image)
}

pub struct AnnotationSync {
    store: Arc<dyn AnnotationStore>,
    updates: Receiver<Snapshot>,
    annotations: AnnotationCollection,
    connected: bool,
}

impl AnnotationSync {
    pub fn connect(store: Arc<dyn AnnotationStore>) -> Self {
        let updates = store.subscribe(ANNOTATIONS_PATH);
        Self::with_updates(store, updates)
    }

    /// Like [`connect`](Self::connect), calling `on_update` whenever a
    /// snapshot arrives so the UI can wake up for it.
    pub fn connect_with_hook(store: Arc<dyn AnnotationStore>, on_update: impl Fn() + Send + 'static) -> Self {
        let upstream = store.subscribe(ANNOTATIONS_PATH);
        let (sender, updates) = channel();
        std::thread::spawn(move || {
            for snapshot in upstream {
                if sender.send(snapshot).is_err() {
                    break;
                }
                on_update();
            }
        });
        Self::with_updates(store, updates)
    }

    fn with_updates(store: Arc<dyn AnnotationStore>, updates: Receiver<Snapshot>) -> Self {
        Self {
            store,
            updates,
            annotations: AnnotationCollection::new(),
            connected: true,
        }
    }

    /// Apply pending snapshots. Only the newest one matters since each
    /// replaces the cache wholesale. Returns whether the cache changed.
    pub fn poll(&mut self) -> bool {
        let mut latest = None;
        loop {
            match self.updates.try_recv() {
                Ok(snapshot) => latest = Some(snapshot),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        log::error!("Annotation store subscription closed");
                        self.connected = false;
                    }
                    break;
                }
            }
        }

        match latest {
            Some(snapshot) => {
                let annotations = AnnotationCollection::from_snapshot(snapshot.as_ref());
                let changed = annotations != self.annotations;
                self.annotations = annotations;
                if self.annotations.is_empty() {
                    log::info!("Applied empty annotation snapshot");
                } else {
                    log::info!(
                        "Applied annotation snapshot: {} annotations on {} frames",
                        self.annotations.annotation_count(),
                        self.annotations.image_count()
                    );
                }
                changed
            }
            None => false,
        }
    }

    /// Read-only view of the cached collection.
    pub fn annotations(&self) -> &AnnotationCollection {
        &self.annotations
    }

    /// Append a finished draft to its frame and persist the merged list.
    pub fn commit(&self, finished: FinishedDraft) {
        let merged = self.annotations.with_appended(finished.image, finished.annotation);
        log::info!(
            "Committing {:?} on frame {} ({} total)",
            finished.annotation.annotation_type,
            finished.image,
            merged.len()
        );
        self.write_sequence(finished.image, &merged);
    }

    /// Replace one frame's whole list in the store. Best effort.
    pub fn write_sequence(&self, image: ImageId, annotations: &[Annotation]) {
        match serde_json::to_value(annotations) {
            Ok(value) => self.store.write(&image_path(image), value),
            Err(e) => log::error!("Failed to encode annotations for frame {}: {}", image, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::models::annotation::{AnnotationType, Point};
    use crate::ui::gesture::DragGesture;
    use crate::io::store::FileStore;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn connected() -> (MemoryStore, AnnotationSync) {
        let store = MemoryStore::new();
        let sync = AnnotationSync::connect(Arc::new(store.clone()));
        (store, sync)
    }

    #[test]
    fn test_drag_appends_exactly_one_annotation() {
        let (_store, mut sync) = connected();
        sync.poll();
        sync.write_sequence(4, &[Annotation::new(AnnotationType::Circle, Point::new(1.0, 1.0))]);
        sync.poll();
        let before = sync.annotations().get(4).len();

        let mut gesture = DragGesture::default();
        gesture.pointer_down(Some(AnnotationType::Rectangle), 4, Point::new(10.0, 20.0));
        gesture.pointer_move(Point::new(110.0, 220.0));
        let finished = gesture.pointer_up().unwrap();
        sync.commit(finished);

        // The cache follows the store's echo, not the commit itself.
        assert_eq!(sync.annotations().get(4).len(), before);
        assert!(sync.poll());

        let list = sync.annotations().get(4);
        assert_eq!(list.len(), before + 1);
        assert_eq!(
            list.last().copied(),
            Some(Annotation {
                annotation_type: AnnotationType::Rectangle,
                start_x: 10.0,
                start_y: 20.0,
                end_x: 110.0,
                end_y: 220.0,
            })
        );
        assert_eq!(list[0].annotation_type, AnnotationType::Circle);
    }

    #[test]
    fn test_empty_snapshot_clears_cache() {
        let (store, mut sync) = connected();
        store.write("annotations/1", json!([{"type": "arrow", "startX": 0, "startY": 0, "endX": 9, "endY": 9}]));
        sync.poll();
        assert_eq!(sync.annotations().annotation_count(), 1);

        store.write("annotations", Value::Null);
        assert!(sync.poll());
        assert!(sync.annotations().is_empty());
        assert!(sync.annotations().get(1).is_empty());
    }

    #[test]
    fn test_only_latest_snapshot_applies() {
        let (store, mut sync) = connected();
        store.write("annotations/1", json!([{"type": "arrow", "startX": 0, "startY": 0, "endX": 9, "endY": 9}]));
        store.write("annotations/2", json!([{"type": "circle", "startX": 0, "startY": 0, "endX": 9, "endY": 9}]));
        store.write("annotations/1", json!(null));
        sync.poll();
        assert_eq!(sync.annotations().image_count(), 1);
        assert_eq!(sync.annotations().get(2).len(), 1);
    }

    #[test]
    fn test_poll_without_updates_is_noop() {
        let (_store, mut sync) = connected();
        sync.poll();
        assert!(!sync.poll());
    }

    #[test]
    fn test_commit_survives_failed_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let store = FileStore::open(&path, Duration::from_millis(20)).unwrap();
        let mut sync = AnnotationSync::connect(Arc::new(store));
        sync.poll();

        let mut gesture = DragGesture::default();
        gesture.pointer_down(Some(AnnotationType::Rectangle), 0, Point::new(5.0, 5.0));
        gesture.pointer_move(Point::new(50.0, 40.0));
        sync.commit(gesture.pointer_up().unwrap());
        assert!(sync.poll());
        assert_eq!(sync.annotations().get(0).len(), 1);

        std::thread::sleep(Duration::from_millis(300));
        sync.poll();
        assert_eq!(sync.annotations().get(0).len(), 1);
    }

    #[test]
    fn test_update_hook_fires_per_snapshot() {
        let store = MemoryStore::new();
        let woken = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&woken);
        let mut sync = AnnotationSync::connect_with_hook(Arc::new(store.clone()), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.write("annotations/2", json!([{"type": "circle", "startX": 1, "startY": 1, "endX": 4, "endY": 5}]));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while woken.load(Ordering::SeqCst) < 2 {
            assert!(std::time::Instant::now() < deadline, "hook never fired");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(sync.poll());
        assert_eq!(sync.annotations().get(2).len(), 1);
    }

    #[test]
    fn test_click_without_drag_persists_zero_size_annotation() {
        let (_store, mut sync) = connected();
        let mut gesture = DragGesture::default();
        gesture.pointer_down(Some(AnnotationType::Circle), 7, Point::new(30.0, 30.0));
        sync.commit(gesture.pointer_up().unwrap());
        sync.poll();

        let list = sync.annotations().get(7);
        assert_eq!(list.len(), 1);
        assert!(list[0].is_degenerate());
    }
}
