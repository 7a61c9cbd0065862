// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of font kinds and their shared capability surface.

use core::fmt;
use core::hash::{BuildHasher as _, Hash};

use crate::{BitmapFont, GpuResources, OutlineFont, SpaceFont};

/// A glyph reference produced by a font: the font-local glyph identifier
/// and the horizontal advance at the queried size.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct Glyph {
    pub id: u16,
    pub advance: f32,
}

/// Identity of a font for cache keying.
///
/// Derived from the font's cache-relevant content: the data blob for
/// outline fonts, the metric tuple for bitmap fonts. Two bitmap fonts
/// loaded from different packs with identical metrics produce the same
/// key on purpose.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[repr(transparent)]
pub struct FontKey(u64);

impl FontKey {
    pub(crate) fn from_hash(value: impl Hash) -> Self {
        Self(foldhash::fast::FixedState::default().hash_one(value))
    }

    /// Returns the underlying integer value.
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// Coverage class of a family, used by the default-font inclusion policy.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum FamilyClass {
    /// Covers (roughly) the ASCII subset.
    Ascii,
    /// A broad unicode fallback family.
    Unicode,
    #[default]
    Other,
}

/// A single font family: one member of a [`FontCollection`](crate::FontCollection).
///
/// A closed variant set rather than an open trait: every kind the engine
/// understands is listed here, and capability dispatch is a `match`.
pub enum FontFamily {
    Outline(OutlineFont),
    Bitmap(BitmapFont),
    Space(SpaceFont),
}

impl FontFamily {
    /// Returns the declared family name.
    pub fn family_name(&self) -> &str {
        match self {
            Self::Outline(f) => f.name(),
            Self::Bitmap(f) => f.name(),
            Self::Space(f) => f.name(),
        }
    }

    /// Returns true if the family can produce a glyph for the codepoint.
    pub fn has_glyph(&self, codepoint: char) -> bool {
        match self {
            Self::Outline(f) => f.has_glyph(codepoint),
            Self::Bitmap(f) => f.has_glyph(codepoint),
            Self::Space(f) => f.has_glyph(codepoint),
        }
    }

    /// Returns the glyph for the codepoint at the given pixel size.
    ///
    /// Bitmap and space fonts ignore `px`: their advances are fixed by the
    /// grid scale and the declared advance table respectively.
    pub fn get_glyph(&self, codepoint: char, px: f32) -> Option<Glyph> {
        match self {
            Self::Outline(f) => f.get_glyph(codepoint, px),
            Self::Bitmap(f) => f.get_glyph(codepoint),
            Self::Space(f) => f.get_glyph(codepoint),
        }
    }

    /// True if the family must always go through full contextual shaping
    /// (no fast-glyph substitution), e.g. a color-emoji font.
    pub fn full_shaping_only(&self) -> bool {
        match self {
            Self::Outline(f) => f.full_shaping_only(),
            Self::Bitmap(_) | Self::Space(_) => false,
        }
    }

    /// True for fixed-grid bitmap families, which are never rescaled by
    /// resolution level.
    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Bitmap(_))
    }

    pub fn class(&self) -> FamilyClass {
        match self {
            Self::Outline(f) => f.class(),
            Self::Bitmap(f) => f.class(),
            Self::Space(f) => f.class(),
        }
    }

    /// Cache identity of this family.
    pub fn key(&self) -> FontKey {
        match self {
            Self::Outline(f) => f.key(),
            Self::Bitmap(f) => f.key(),
            Self::Space(f) => f.key(),
        }
    }

    /// Releases any resources the family holds.
    ///
    /// For bitmap fonts this drops a still-decoded pixel buffer or releases
    /// an already-uploaded texture, exactly once. Must run on the thread
    /// that owns `gpu`.
    pub fn close(&self, gpu: &mut dyn GpuResources) {
        if let Self::Bitmap(f) = self {
            f.close(gpu);
        }
    }
}

impl fmt::Debug for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline(font) => f.debug_tuple("Outline").field(&font.name()).finish(),
            Self::Bitmap(font) => f.debug_tuple("Bitmap").field(&font.name()).finish(),
            Self::Space(font) => f.debug_tuple("Space").field(&font.name()).finish(),
        }
    }
}
