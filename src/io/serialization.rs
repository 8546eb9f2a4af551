// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation collection export and import.
//!
//! This module handles exporting and importing the whole collection in YAML
//! and JSON formats, keyed by frame index.

use crate::models::collection::AnnotationCollection;
use anyhow::{bail, Result};
use std::path::Path;

/// Export the collection to YAML: a map from frame index to that frame's
/// annotations in the same camelCase shape the store uses.
pub fn export_yaml(data: &AnnotationCollection, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export the collection to JSON, keyed by frame index exactly like the
/// store's `annotations` value.
pub fn export_json(data: &AnnotationCollection, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Import a collection written by [`export_yaml`]. Frames with empty lists
/// are kept as given; writing them back to the store removes them.
pub fn import_yaml(path: &Path) -> Result<AnnotationCollection> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import a collection from JSON format.
///
/// Goes through the snapshot decoder so store dumps in either the object or
/// the list layout are accepted.
pub fn import_json(path: &Path) -> Result<AnnotationCollection> {
    let json = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    Ok(AnnotationCollection::from_snapshot(Some(&value)))
}

/// Export by file extension.
pub fn export(data: &AnnotationCollection, path: &Path) -> Result<()> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => export_yaml(data, path),
        Some("json") => export_json(data, path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

/// Import by file extension.
pub fn import(path: &Path) -> Result<AnnotationCollection> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => bail!("Unsupported file extension: {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Annotation, AnnotationType};
    use tempfile::tempdir;

    fn sample() -> AnnotationCollection {
        let mut collection = AnnotationCollection::new();
        collection.set_sequence(
            2,
            vec![Annotation {
                annotation_type: AnnotationType::Arrow,
                start_x: 1.0,
                start_y: 2.0,
                end_x: 300.0,
                end_y: 400.0,
            }],
        );
        collection.set_sequence(
            17,
            vec![Annotation {
                annotation_type: AnnotationType::Circle,
                start_x: 10.0,
                start_y: 10.0,
                end_x: 20.0,
                end_y: 20.0,
            }],
        );
        collection
    }

    #[test]
    fn test_yaml_export_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.yaml");
        export(&sample(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("type: arrow"));
        assert!(text.contains("startX"));
        assert_eq!(import(&path).unwrap(), sample());
    }

    #[test]
    fn test_json_import_accepts_store_dump() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.json");
        std::fs::write(
            &path,
            r#"[null, null, [{"type":"arrow","startX":1,"startY":2,"endX":300,"endY":400}]]"#,
        )
        .unwrap();
        let imported = import(&path).unwrap();
        assert_eq!(imported.get(2), sample().get(2));
        assert_eq!(imported.image_count(), 1);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("annotations.txt");
        assert!(export(&sample(), &path).is_err());
        assert!(import(&path).is_err());
    }
}
