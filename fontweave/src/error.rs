// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for font construction and resource access.

use thiserror::Error;

/// Errors produced while constructing fonts or parsing declarations.
///
/// Construction contract violations (`AscentExceedsHeight`, `EmptyGrid`,
/// `GridMismatch`) fail closed: the font is simply not created. Parse and
/// decode failures are degradable at the call site, which logs and skips
/// the offending provider.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("glyph ascent {ascent} exceeds glyph height {height}")]
    AscentExceedsHeight { ascent: i32, height: u32 },
    #[error("bitmap font declares an empty codepoint grid")]
    EmptyGrid,
    #[error("atlas image {width}x{height} does not divide into a {columns}x{rows} codepoint grid")]
    GridMismatch {
        width: u32,
        height: u32,
        columns: u32,
        rows: u32,
    },
    #[error("failed to decode glyph atlas image")]
    Image(#[from] image::ImageError),
    #[error("malformed font declaration")]
    Declaration(#[from] serde_json::Error),
    #[error("font data is not a recognized outline font")]
    UnsupportedFontData,
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Errors produced by a [`ResourceSource`](crate::ResourceSource).
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(String),
}
