// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline (vector) font family backed by swash.

use std::sync::Arc;

use peniko::Blob;
use swash::FontRef;

use crate::{FamilyClass, FontError, FontKey, Glyph};

/// An outline font: a blob of font data plus the index of the face within
/// a collection file.
///
/// Only the charmap and linear glyph metrics are consumed here; contextual
/// shaping happens in the layout processor behind its own boundary.
#[derive(Clone)]
pub struct OutlineFont {
    name: Arc<str>,
    data: Blob<u8>,
    index: u32,
    class: FamilyClass,
    full_shaping: bool,
}

impl core::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("name", &self.name)
            .field("index", &self.index)
            .finish()
    }
}

impl OutlineFont {
    /// Creates a new outline font from raw font data.
    ///
    /// Fails with [`FontError::UnsupportedFontData`] when the blob does not
    /// contain a parseable face at `index`.
    pub fn new(name: &str, data: Blob<u8>, index: u32) -> Result<Self, FontError> {
        FontRef::from_index(data.as_ref(), index as usize)
            .ok_or(FontError::UnsupportedFontData)?;
        Ok(Self {
            name: name.into(),
            data,
            index,
            class: FamilyClass::default(),
            full_shaping: false,
        })
    }

    /// Marks this font as requiring full contextual shaping (disables the
    /// fast-glyph substitution path).
    pub fn with_full_shaping(mut self, full_shaping: bool) -> Self {
        self.full_shaping = full_shaping;
        self
    }

    pub fn with_class(mut self, class: FamilyClass) -> Self {
        self.class = class;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> FamilyClass {
        self.class
    }

    pub(crate) fn full_shaping_only(&self) -> bool {
        self.full_shaping
    }

    pub(crate) fn key(&self) -> FontKey {
        FontKey::from_hash((self.data.id(), self.index))
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.data.as_ref(), self.index as usize)
    }

    pub fn has_glyph(&self, codepoint: char) -> bool {
        self.font_ref()
            .map(|font| font.charmap().map(codepoint) != 0)
            .unwrap_or(false)
    }

    /// Maps a codepoint through the charmap and scales its advance to the
    /// given pixel size.
    pub fn get_glyph(&self, codepoint: char, px: f32) -> Option<Glyph> {
        let font = self.font_ref()?;
        let id = font.charmap().map(codepoint);
        if id == 0 {
            return None;
        }
        let advance = font.glyph_metrics(&[]).scale(px).advance_width(id);
        Some(Glyph { id, advance })
    }
}
