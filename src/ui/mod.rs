// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the gallery.

pub mod canvas;
pub mod gesture;
pub mod grid;
pub mod toolbar;
pub mod viewer;
