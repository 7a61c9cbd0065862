// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Precomputed narrow-ASCII glyph tables.
//!
//! A [`FastCharSet`] lets the renderer substitute glyphs for digit-heavy or
//! obfuscated runs without a shaping call per frame: every included glyph
//! fits inside a standard cell whose width is the advance of the digit
//! `'0'`, and carries a precomputed centering offset.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::debug;

use crate::{FontFamily, FontKey, Glyph};

/// First codepoint covered by a fast character set (`'!'`).
pub const FAST_RANGE_START: u32 = 0x21;
/// Last codepoint covered (`'~'`).
const FAST_RANGE_END: u32 = 0x7e;

/// Baked glyphs for the printable ASCII range of one font at one
/// resolution level. Immutable once built; rebuilt wholesale on
/// invalidation.
#[derive(Clone, Debug)]
pub struct FastCharSet {
    standard_advance: f32,
    /// Dense table indexed by `codepoint - FAST_RANGE_START`, trimmed so
    /// the last entry is always present.
    glyphs: Box<[Option<Glyph>]>,
    /// Parallel center offsets; meaningless where the glyph is absent.
    offsets: Box<[f32]>,
}

impl FastCharSet {
    /// The advance of `'0'`, which defines the cell every included glyph
    /// fits into.
    pub fn standard_advance(&self) -> f32 {
        self.standard_advance
    }

    /// Returns the baked glyph and its center offset.
    ///
    /// The offset of every glyph other than `'0'` is
    /// `(standard_advance - advance) / 2`, shifting narrower glyphs right
    /// by half the deficit. The stored offset for `'0'` itself is its own
    /// advance — callers substituting digits rely on this asymmetry.
    pub fn get(&self, codepoint: char) -> Option<(Glyph, f32)> {
        let index = (codepoint as u32).checked_sub(FAST_RANGE_START)? as usize;
        let glyph = (*self.glyphs.get(index)?)?;
        Some((glyph, self.offsets[index]))
    }

    /// Number of slots in the (tail-trimmed) table.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    fn build(font: &FontFamily, px: f32) -> Option<Self> {
        // Hard precondition: digit substitution assumes '0' exists.
        let zero = font.get_glyph('0', px)?;
        let standard = zero.advance;
        let mut glyphs = Vec::new();
        let mut offsets = Vec::new();
        for codepoint in FAST_RANGE_START..=FAST_RANGE_END {
            let ch = char::from_u32(codepoint).expect("printable ascii");
            let slot = match font.get_glyph(ch, px) {
                Some(glyph) if ch == '0' => {
                    offsets.push(standard);
                    Some(glyph)
                }
                Some(glyph) if ch.is_ascii_digit() => {
                    offsets.push((standard - glyph.advance) / 2.0);
                    Some(glyph)
                }
                // Glyphs wider than the standard cell cannot be substituted.
                Some(glyph) if glyph.advance > standard => {
                    offsets.push(0.0);
                    None
                }
                Some(glyph) => {
                    offsets.push((standard - glyph.advance) / 2.0);
                    Some(glyph)
                }
                None => {
                    offsets.push(0.0);
                    None
                }
            };
            glyphs.push(slot);
        }
        while matches!(glyphs.last(), Some(None)) {
            glyphs.pop();
            offsets.pop();
        }
        Some(Self {
            standard_advance: standard,
            glyphs: glyphs.into_boxed_slice(),
            offsets: offsets.into_boxed_slice(),
        })
    }
}

/// Cache of [`FastCharSet`]s keyed by font identity and resolution level.
///
/// Build failures (missing `'0'`) are memoized so the fast path stays
/// disabled for that pair without re-probing every frame.
#[derive(Debug, Default)]
pub struct FastGlyphCache {
    sets: HashMap<(FontKey, u8), Option<Arc<FastCharSet>>>,
}

impl FastGlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set for `(font, level)`, building it on first use.
    ///
    /// Fonts tagged for full shaping never get a fast path. Bitmap fonts
    /// are not rescaled by resolution level and always build as level 1.
    pub fn get_or_build(
        &mut self,
        font: &FontFamily,
        level: u8,
        px: f32,
    ) -> Option<Arc<FastCharSet>> {
        if font.full_shaping_only() {
            return None;
        }
        let level = if font.is_bitmap() { 1 } else { level };
        let key = (font.key(), level);
        if let Some(cached) = self.sets.get(&key) {
            return cached.clone();
        }
        let built = FastCharSet::build(font, px).map(Arc::new);
        if built.is_none() {
            debug!(
                font = font.family_name(),
                level, "font has no '0' glyph, fast path disabled"
            );
        }
        self.sets.insert(key, built.clone());
        built
    }

    /// Drops every baked set. Called on any cache-wide invalidation.
    pub fn clear(&mut self) {
        self.sets = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
