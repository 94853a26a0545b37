// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model for the meme composer.

pub mod background;
pub mod caption;
pub mod document;
