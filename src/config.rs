// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Gallery configuration.
//!
//! One gallery component serves every deployment; what differs between them
//! (theme, how many frames, how frames are named, where annotations live) is
//! read from a YAML file.

use crate::io::store::{AnnotationStore, FileStore, MemoryStore};
use crate::models::collection::ImageId;
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "gallery.yaml";

/// Color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn visuals(self) -> egui::Visuals {
        let mut visuals = match self {
            Theme::Dark => egui::Visuals::dark(),
            Theme::Light => egui::Visuals::light(),
        };
        visuals.panel_fill = self.background();
        visuals.extreme_bg_color = self.background();
        visuals
    }

    pub fn background(self) -> egui::Color32 {
        match self {
            Theme::Dark => egui::Color32::BLACK,
            Theme::Light => egui::Color32::WHITE,
        }
    }

    /// Grid cell borders and viewer frame.
    pub fn border(self) -> egui::Color32 {
        match self {
            Theme::Dark => egui::Color32::WHITE,
            Theme::Light => egui::Color32::BLACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
    pub poll_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: PathBuf::from("annotations.json"),
            poll_interval_ms: 1000,
        }
    }
}

impl StoreConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn open(&self) -> Result<Arc<dyn AnnotationStore>> {
        Ok(match self.backend {
            StoreBackend::File => Arc::new(FileStore::open(&self.path, self.poll_interval())?),
            StoreBackend::Memory => {
                log::info!("Using in-memory annotation store; nothing will be shared");
                Arc::new(MemoryStore::new())
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub title: String,
    pub theme: Theme,
    pub frame_count: usize,
    pub frame_name_pattern: String,
    pub asset_dir: PathBuf,
    /// Reference size for projecting annotations onto thumbnails.
    pub native_width: u32,
    pub native_height: u32,
    /// Minimum grid cell width in points.
    pub thumbnail_width: f32,
    pub store: StoreConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            title: "All Noise Is Potential Signal".to_string(),
            theme: Theme::Dark,
            frame_count: 1001,
            frame_name_pattern: "frame_{index:04}.jpg".to_string(),
            asset_dir: PathBuf::from("images"),
            native_width: 1600,
            native_height: 900,
            thumbnail_width: 280.0,
            store: StoreConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Load from `path`, else from [`DEFAULT_CONFIG_FILE`] if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    log::info!("No {} found, using built-in configuration", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let yaml = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_yaml(&yaml).with_context(|| format!("Invalid config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.frame_count > 0, "frame_count must be at least 1");
        ensure!(
            self.native_width > 0 && self.native_height > 0,
            "native_width and native_height must be positive"
        );
        ensure!(self.thumbnail_width > 0.0, "thumbnail_width must be positive");
        ensure!(self.store.poll_interval_ms > 0, "store.poll_interval_ms must be positive");
        parse_pattern(&self.frame_name_pattern)?;
        Ok(())
    }

    pub fn native_size(&self) -> (u32, u32) {
        (self.native_width, self.native_height)
    }

    /// File name of a frame, e.g. `frame_0042.jpg`.
    pub fn frame_name(&self, index: ImageId) -> String {
        match parse_pattern(&self.frame_name_pattern) {
            Ok(pattern) => pattern.format(index),
            // validate() rejects these; keep something usable anyway.
            Err(_) => format!("{}{}", self.frame_name_pattern, index),
        }
    }

    pub fn frame_path(&self, index: ImageId) -> PathBuf {
        self.asset_dir.join(self.frame_name(index))
    }
}

/// A frame-name pattern split around its `{index}` placeholder.
#[derive(Debug, PartialEq)]
struct FramePattern<'a> {
    prefix: &'a str,
    suffix: &'a str,
    width: usize,
}

impl FramePattern<'_> {
    fn format(&self, index: ImageId) -> String {
        format!("{}{:0width$}{}", self.prefix, index, self.suffix, width = self.width)
    }
}

/// Parse `{index}` or `{index:0N}` out of `pattern`.
fn parse_pattern(pattern: &str) -> Result<FramePattern<'_>> {
    let Some(open) = pattern.find("{index") else {
        bail!("frame_name_pattern {:?} has no {{index}} placeholder", pattern);
    };
    let Some(close) = pattern[open..].find('}').map(|i| open + i) else {
        bail!("frame_name_pattern {:?} has an unterminated placeholder", pattern);
    };

    let options = &pattern[open + "{index".len()..close];
    let width = match options.strip_prefix(':') {
        None if options.is_empty() => 0,
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => digits
            .parse()
            .with_context(|| format!("bad padding width in {:?}", pattern))?,
        _ => bail!("unsupported placeholder {:?} in frame_name_pattern", &pattern[open..=close]),
    };

    Ok(FramePattern {
        prefix: &pattern[..open],
        suffix: &pattern[close + 1..],
        width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_names() {
        let config = GalleryConfig::default();
        assert_eq!(config.frame_name(0), "frame_0000.jpg");
        assert_eq!(config.frame_name(1000), "frame_1000.jpg");
        assert_eq!(config.frame_path(7), PathBuf::from("images").join("frame_0007.jpg"));
    }

    #[test]
    fn test_plain_index_pattern() {
        let config = GalleryConfig {
            frame_name_pattern: "{index}.jpg".to_string(),
            ..Default::default()
        };
        assert_eq!(config.frame_name(5), "5.jpg");
        assert_eq!(config.frame_name(1159), "1159.jpg");
    }

    #[test]
    fn test_bad_patterns_rejected() {
        assert!(parse_pattern("frame.jpg").is_err());
        assert!(parse_pattern("frame_{index.jpg").is_err());
        assert!(parse_pattern("frame_{index:x4}.jpg").is_err());
        assert!(parse_pattern("frame_{index:}.jpg").is_err());
        assert_eq!(parse_pattern("{index:04}").unwrap().width, 4);
    }

    #[test]
    fn test_yaml_overrides_and_defaults() {
        let config = GalleryConfig::from_yaml(
            "theme: light\nframe_count: 1160\nframe_name_pattern: \"{index}.jpg\"\nstore:\n  backend: memory\n",
        )
        .unwrap();
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.frame_count, 1160);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.poll_interval_ms, 1000);
        assert_eq!(config.native_size(), (1600, 900));
    }

    #[test]
    fn test_invalid_yaml_values_rejected() {
        assert!(GalleryConfig::from_yaml("frame_count: 0").is_err());
        assert!(GalleryConfig::from_yaml("native_width: 0").is_err());
        assert!(GalleryConfig::from_yaml("frame_name_pattern: frames.jpg").is_err());
        assert!(GalleryConfig::from_yaml("theme: neon").is_err());
    }

    #[test]
    fn test_shipped_configs_parse() {
        let night = GalleryConfig::from_yaml(include_str!("../configs/night-1001.yaml")).unwrap();
        assert_eq!(night, GalleryConfig::default());

        let day = GalleryConfig::from_yaml(include_str!("../configs/day-1160.yaml")).unwrap();
        assert_eq!(day.theme, Theme::Light);
        assert_eq!(day.frame_name(1159), "1159.jpg");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        assert!(GalleryConfig::load(Some(Path::new("/nonexistent/gallery.yaml"))).is_err());
    }
}
