// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for images: loading, data URLs and export delivery.

pub mod data_url;
pub mod export;
pub mod media;
