// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame image loading.
//!
//! Full-resolution frames for the viewer and downscaled thumbnails for the
//! grid, decoded to RGBA for upload as egui textures.

use crate::models::collection::ImageId;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Decoded RGBA pixels.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    fn from_dynamic(image: image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        }
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }
}

/// Load a frame at its natural size.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(LoadedImage::from_dynamic(image))
}

/// Load a frame scaled down to fit within `max_width` x `max_height`.
pub fn load_thumbnail(path: &Path, max_width: u32, max_height: u32) -> Result<LoadedImage> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(LoadedImage::from_dynamic(image.thumbnail(max_width, max_height)))
}

/// Result of a background load, tagged with the frame it belongs to.
pub type FrameResult = (ImageId, Result<LoadedImage, String>);

/// Decode a full-size frame on a background thread.
pub fn spawn_frame_load(image: ImageId, path: PathBuf) -> Receiver<FrameResult> {
    let (sender, receiver) = channel();
    std::thread::spawn(move || {
        let result = load_image(&path).map_err(|e| format!("{:#}", e));
        if let Ok(loaded) = &result {
            log::info!("Loaded frame {}: {} ({}x{})", image, path.display(), loaded.width, loaded.height);
        }
        let _ = sender.send((image, result));
    });
    receiver
}

/// Single worker thread decoding thumbnails, newest request first so the
/// cells on screen now win over ones already scrolled past.
pub struct ThumbnailLoader {
    requests: Sender<(ImageId, PathBuf)>,
    results: Receiver<FrameResult>,
}

impl ThumbnailLoader {
    pub fn spawn(max_width: u32, max_height: u32) -> Self {
        let (requests, request_rx) = channel::<(ImageId, PathBuf)>();
        let (result_tx, results) = channel();

        std::thread::spawn(move || {
            let mut queue: Vec<(ImageId, PathBuf)> = Vec::new();
            loop {
                if queue.is_empty() {
                    match request_rx.recv() {
                        Ok(request) => queue.push(request),
                        Err(_) => break,
                    }
                }
                queue.extend(request_rx.try_iter());
                let Some((image, path)) = queue.pop() else {
                    continue;
                };

                let result = load_thumbnail(&path, max_width, max_height).map_err(|e| format!("{:#}", e));
                if result_tx.send((image, result)).is_err() {
                    break;
                }
            }
        });

        Self { requests, results }
    }

    pub fn request(&self, image: ImageId, path: PathBuf) {
        if self.requests.send((image, path)).is_err() {
            log::error!("Thumbnail worker is gone; frame {} will not load", image);
        }
    }

    /// Next finished thumbnail, if any.
    pub fn try_recv(&self) -> Option<FrameResult> {
        self.results.try_recv().ok()
    }
}
