// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Off-screen rendering of the final meme.

pub mod compositor;
pub mod fonts;
pub mod text;
