// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font declaration resolution and glyph caches for Textloom.
//!
//! This crate owns the font side of the engine: parsing raw per-namespace
//! font declarations into [`RawFontBundle`]s, resolving the (possibly
//! interdependent) declaration graph into flat [`FontCollection`]s, the
//! closed set of font kinds ([`FontFamily`]), the fixed-grid
//! [`BitmapFont`] glyph source, and the [`FastGlyphCache`] used to skip
//! full shaping for narrow ASCII runs.

mod bitmap;
mod collection;
mod declaration;
mod error;
mod fastchar;
mod font;
mod gpu;
mod graph;
mod outline;
mod resource;
mod space;

pub use peniko::Blob;

pub use bitmap::{BitmapFont, BitmapGlyph, GridDefinition};
pub use collection::FontCollection;
pub use declaration::{parse_font_document, RawFontBundle, RawProvider};
pub use error::{FontError, ResourceError};
pub use fastchar::{FastCharSet, FastGlyphCache, FAST_RANGE_START};
pub use font::{FamilyClass, FontFamily, FontKey, Glyph};
pub use gpu::{GpuResources, NullResources, PixelFormat, TextureHandle};
pub use graph::resolve;
pub use outline::OutlineFont;
pub use resource::{MemorySource, ResourceSource};
pub use space::SpaceFont;
