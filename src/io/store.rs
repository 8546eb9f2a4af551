// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Shared annotation store.
//!
//! A path-addressed JSON tree. Subscribers receive the full value under their
//! path every time anything changes (and once on subscribe). Writes replace
//! the value at a path wholesale and report nothing back to the caller; a
//! failed write is only logged.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, SystemTime};

/// The full value at a subscribed path; `None` when nothing is stored there.
pub type Snapshot = Option<Value>;

/// A last-write-wins key-value store shared between clients.
pub trait AnnotationStore: Send + Sync {
    /// Receive the value at `path` now and after every change.
    fn subscribe(&self, path: &str) -> Receiver<Snapshot>;

    /// Replace the value at `path`. `null` or an empty list removes it.
    fn write(&self, path: &str, value: Value);
}

struct Subscriber {
    path: String,
    sender: Sender<Snapshot>,
}

/// Push the current value to every live subscriber, dropping closed ones.
fn notify(subscribers: &mut Vec<Subscriber>, doc: &Value) {
    subscribers.retain(|sub| sub.sender.send(value_at(doc, &sub.path)).is_ok());
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().all(Value::is_null),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Look up the value at `path`, treating list positions as keys.
pub fn value_at(doc: &Value, path: &str) -> Snapshot {
    let mut current = doc;
    for segment in segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if is_empty_value(current) {
        None
    } else {
        Some(current.clone())
    }
}

/// Replace the value at `path`, creating parents and pruning emptied ones.
pub fn set_at(doc: &mut Value, path: &str, value: Value) {
    let keys: Vec<&str> = segments(path).collect();
    if keys.is_empty() {
        *doc = if is_empty_value(&value) { Value::Null } else { value };
        return;
    }
    set_in(doc, &keys, value);
}

fn set_in(node: &mut Value, keys: &[&str], value: Value) {
    let map = as_object(node);
    let (key, rest) = match keys.split_first() {
        Some(split) => split,
        None => return,
    };

    if rest.is_empty() {
        if is_empty_value(&value) {
            map.remove(*key);
        } else {
            map.insert((*key).to_string(), value);
        }
        return;
    }

    let child = map.entry((*key).to_string()).or_insert(Value::Null);
    set_in(child, rest, value);
    if is_empty_value(child) {
        map.remove(*key);
    }
}

/// Coerce `node` into an object, re-keying list positions as strings.
fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        let mut map = Map::new();
        if let Value::Array(items) = node.take() {
            for (index, item) in items.into_iter().enumerate() {
                if !item.is_null() {
                    map.insert(index.to_string(), item);
                }
            }
        }
        *node = Value::Object(map);
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local store, used for offline sessions.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryShared>>,
}

#[derive(Default)]
struct MemoryShared {
    doc: Value,
    subscribers: Vec<Subscriber>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnnotationStore for MemoryStore {
    fn subscribe(&self, path: &str) -> Receiver<Snapshot> {
        let (sender, receiver) = channel();
        let mut shared = lock(&self.inner);
        if sender.send(value_at(&shared.doc, path)).is_ok() {
            shared.subscribers.push(Subscriber {
                path: path.to_string(),
                sender,
            });
        }
        receiver
    }

    fn write(&self, path: &str, value: Value) {
        let mut shared = lock(&self.inner);
        let MemoryShared { doc, subscribers } = &mut *shared;
        set_at(doc, path, value);
        notify(subscribers, doc);
    }
}

/// Store backed by a JSON document on disk.
///
/// Every client pointed at the same file shares annotations. Writes land in
/// the in-memory document and reach local subscribers at once; the file is
/// brought up to date by a writer thread, and a failed save is only logged.
/// Changes made by other processes are picked up by polling the file's
/// modification time.
pub struct FileStore {
    shared: Arc<Mutex<FileShared>>,
    persist: Sender<()>,
}

struct FileShared {
    doc: Value,
    subscribers: Vec<Subscriber>,
    last_modified: Option<SystemTime>,
    /// Local writes not yet saved; outside changes wait until they are.
    dirty: bool,
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Null);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read store {}", path.display()))?;
    if json.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&json).with_context(|| format!("Malformed store {}", path.display()))
}

fn write_document(path: &Path, doc: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(doc)?;
    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, json)
        .with_context(|| format!("Failed to write {}", staging.display()))?;
    std::fs::rename(&staging, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

impl FileStore {
    /// Open the store at `path` and start watching it for outside changes.
    pub fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self> {
        let path = path.into();
        // Fail early on a corrupt document rather than on the first write.
        let doc = read_document(&path)?;

        let shared = Arc::new(Mutex::new(FileShared {
            doc,
            subscribers: Vec::new(),
            last_modified: modified_time(&path),
            dirty: false,
        }));
        spawn_watcher(path.clone(), Arc::downgrade(&shared), poll_interval);
        let persist = spawn_writer(path.clone(), Arc::clone(&shared));
        log::info!("Annotation store at {}", path.display());
        Ok(Self { shared, persist })
    }
}

fn spawn_watcher(path: PathBuf, shared: Weak<Mutex<FileShared>>, poll_interval: Duration) {
    std::thread::spawn(move || loop {
        std::thread::sleep(poll_interval);
        let Some(shared) = shared.upgrade() else {
            break;
        };

        let mut state = lock(&shared);
        let modified = modified_time(&path);
        if state.dirty || modified == state.last_modified {
            continue;
        }
        state.last_modified = modified;

        match read_document(&path) {
            Ok(doc) => {
                log::debug!("Store changed on disk, notifying {} subscribers", state.subscribers.len());
                let FileShared { doc: current, subscribers, .. } = &mut *state;
                *current = doc;
                notify(subscribers, current);
            }
            Err(e) => log::error!("Failed to reload annotation store: {:#}", e),
        }
    });
}

/// Save the current document whenever a write is signalled.
///
/// Runs until the store is dropped, finishing any save still queued.
fn spawn_writer(path: PathBuf, shared: Arc<Mutex<FileShared>>) -> Sender<()> {
    let (persist, requests) = channel::<()>();
    std::thread::spawn(move || {
        while requests.recv().is_ok() {
            // Several writes queued up are covered by one save.
            requests.try_iter().for_each(drop);

            let mut state = lock(&shared);
            match write_document(&path, &state.doc) {
                Ok(()) => state.last_modified = modified_time(&path),
                Err(e) => log::error!("Failed to save annotation store: {:#}", e),
            }
            state.dirty = false;
        }
    });
    persist
}

impl AnnotationStore for FileStore {
    fn subscribe(&self, path: &str) -> Receiver<Snapshot> {
        let (sender, receiver) = channel();
        let mut state = lock(&self.shared);
        if sender.send(value_at(&state.doc, path)).is_ok() {
            state.subscribers.push(Subscriber {
                path: path.to_string(),
                sender,
            });
        }
        receiver
    }

    fn write(&self, path: &str, value: Value) {
        {
            let mut state = lock(&self.shared);
            let FileShared { doc, subscribers, dirty, .. } = &mut *state;
            set_at(doc, path, value);
            *dirty = true;
            notify(subscribers, doc);
        }
        if self.persist.send(()).is_err() {
            log::error!("Annotation store writer is gone; {:?} will not be saved", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_value_at_objects_and_arrays() {
        let doc = json!({"annotations": [null, [{"a": 1}]], "x": {"y": 2}});
        assert_eq!(value_at(&doc, "x/y"), Some(json!(2)));
        assert_eq!(value_at(&doc, "annotations/1"), Some(json!([{"a": 1}])));
        assert_eq!(value_at(&doc, "annotations/0"), None);
        assert_eq!(value_at(&doc, "annotations/9"), None);
        assert_eq!(value_at(&doc, "missing"), None);
        assert_eq!(value_at(&doc, ""), Some(doc.clone()));
    }

    #[test]
    fn test_set_at_creates_and_prunes() {
        let mut doc = Value::Null;
        set_at(&mut doc, "annotations/3", json!([1, 2]));
        assert_eq!(doc, json!({"annotations": {"3": [1, 2]}}));

        set_at(&mut doc, "annotations/4", json!([3]));
        set_at(&mut doc, "annotations/3", json!([]));
        assert_eq!(doc, json!({"annotations": {"4": [3]}}));

        set_at(&mut doc, "annotations/4", Value::Null);
        assert_eq!(doc, json!({}));
        assert_eq!(value_at(&doc, "annotations"), None);
    }

    #[test]
    fn test_set_at_rekeys_arrays() {
        let mut doc = json!({"annotations": [null, [1]]});
        set_at(&mut doc, "annotations/5", json!([2]));
        assert_eq!(doc, json!({"annotations": {"1": [1], "5": [2]}}));
    }

    #[test]
    fn test_memory_store_pushes_snapshots() {
        let store = MemoryStore::new();
        let updates = store.subscribe("annotations");
        assert_eq!(updates.try_recv().unwrap(), None);

        store.write("annotations/0", json!([{"k": 1}]));
        assert_eq!(updates.try_recv().unwrap(), Some(json!({"0": [{"k": 1}]})));

        store.write("annotations/0", json!([]));
        assert_eq!(updates.try_recv().unwrap(), None);
        assert!(updates.try_recv().is_err());
    }

    #[test]
    fn test_memory_store_drops_closed_subscribers() {
        let store = MemoryStore::new();
        drop(store.subscribe("annotations"));
        let live = store.subscribe("annotations");
        store.write("annotations/1", json!([1]));
        assert_eq!(lock(&store.inner).subscribers.len(), 1);
        assert_eq!(live.try_iter().count(), 2);
    }

    /// Wait for the writer thread to leave `expected` at `path` on disk.
    fn wait_for_saved(path: &Path, key: &str, expected: Value) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            let saved = read_document(path).ok().and_then(|doc| value_at(&doc, key));
            if saved.as_ref() == Some(&expected) {
                return;
            }
            assert!(std::time::Instant::now() < deadline, "store never saved {:?}", key);
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_file_store_write_persists_and_notifies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        let store = FileStore::open(&path, Duration::from_millis(50)).unwrap();
        let updates = store.subscribe("annotations");
        assert_eq!(updates.try_recv().unwrap(), None);

        store.write("annotations/3", json!([{"type": "arrow"}]));
        assert_eq!(updates.try_recv().unwrap(), Some(json!({"3": [{"type": "arrow"}]})));

        wait_for_saved(&path, "annotations/3", json!([{"type": "arrow"}]));
        let reopened = FileStore::open(&path, Duration::from_millis(50)).unwrap();
        let again = reopened.subscribe("annotations/3");
        assert_eq!(again.try_recv().unwrap(), Some(json!([{"type": "arrow"}])));
    }

    #[test]
    fn test_file_store_keeps_write_when_save_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        // A directory where the staging file goes makes every save fail.
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let store = FileStore::open(&path, Duration::from_millis(20)).unwrap();
        let updates = store.subscribe("annotations");
        assert_eq!(updates.try_recv().unwrap(), None);

        store.write("annotations/0", json!([{"type": "rectangle"}]));
        assert_eq!(updates.try_recv().unwrap(), Some(json!({"0": [{"type": "rectangle"}]})));

        std::thread::sleep(Duration::from_millis(200));
        assert!(updates.try_recv().is_err());
        assert!(!path.exists());
        let later = store.subscribe("annotations/0");
        assert_eq!(later.try_recv().unwrap(), Some(json!([{"type": "rectangle"}])));
    }

    #[test]
    fn test_file_store_sees_outside_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        let store = FileStore::open(&path, Duration::from_millis(20)).unwrap();
        let updates = store.subscribe("annotations");
        assert_eq!(updates.try_recv().unwrap(), None);

        std::fs::write(&path, r#"{"annotations": {"9": [{"type": "circle"}]}}"#).unwrap();

        let snapshot = updates.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(snapshot, Some(json!({"9": [{"type": "circle"}]})));
    }

    #[test]
    fn test_file_store_rejects_corrupt_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(FileStore::open(&path, Duration::from_millis(50)).is_err());
    }
}
