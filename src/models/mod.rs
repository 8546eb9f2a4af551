// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotations and the per-frame collection.

pub mod annotation;
pub mod collection;
