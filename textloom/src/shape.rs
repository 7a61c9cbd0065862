// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout-processor boundary and the published font map.

use std::sync::Arc;

use fontweave::{FontCollection, FontFamily, FontKey};
use hashbrown::HashMap;

use crate::analysis::BreakAnalysis;
use crate::layout::{GlyphInstance, Layout};
use crate::reload::EmojiMetadata;
use crate::rich::FlatText;
use crate::style::{LayoutFlags, RenderFlags};

/// The published output of a font resolution pass: one flattened
/// collection per name plus the default fallback, and the emoji metadata
/// loaded alongside them. Immutable after publication; off-thread
/// processors hold an `Arc` snapshot so a reload can never mutate what
/// they are reading.
#[derive(Clone, Debug, Default)]
pub struct FontMap {
    map: HashMap<Arc<str>, FontCollection>,
    default: FontCollection,
    emoji: EmojiMetadata,
}

impl FontMap {
    pub(crate) fn new(
        map: HashMap<Arc<str>, FontCollection>,
        default: FontCollection,
        emoji: EmojiMetadata,
    ) -> Self {
        Self {
            map,
            default,
            emoji,
        }
    }

    pub fn emoji(&self) -> &EmojiMetadata {
        &self.emoji
    }

    /// The collection for a font name, falling back to the default
    /// collection for unknown names.
    pub fn collection(&self, name: Option<&str>) -> &FontCollection {
        name.and_then(|name| self.map.get(name))
            .unwrap_or(&self.default)
    }

    pub fn get(&self, name: &str) -> Option<&FontCollection> {
        self.map.get(name)
    }

    pub fn default_collection(&self) -> &FontCollection {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &Arc<str>> {
        self.map.keys()
    }

    /// Every published collection, the default included.
    pub fn collections(&self) -> impl Iterator<Item = &FontCollection> {
        self.map.values().chain(core::iter::once(&self.default))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Computes layouts. Instances are thread-confined: one instance is never
/// used by two threads at once, which is what the processor pool enforces
/// for off-thread callers.
pub trait LayoutProcessor: Send {
    fn process(&mut self, text: &FlatText, fonts: &FontMap, px: f32, flags: LayoutFlags)
        -> Layout;
}

/// The reference processor: a per-character walk over the resolved
/// collection with first-fit font fallback. Contextual shaping lives
/// behind the same trait in hosts that have a full shaper; everything the
/// caches and the dump need is produced here.
pub struct CharWalkProcessor {
    analysis: Arc<dyn BreakAnalysis>,
    // Scratch for font-slot interning, reused across calls.
    slots: HashMap<FontKey, u16>,
}

impl CharWalkProcessor {
    pub fn new(analysis: Arc<dyn BreakAnalysis>) -> Self {
        Self {
            analysis,
            slots: HashMap::new(),
        }
    }
}

impl core::fmt::Debug for CharWalkProcessor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CharWalkProcessor").finish_non_exhaustive()
    }
}

impl LayoutProcessor for CharWalkProcessor {
    fn process(
        &mut self,
        text: &FlatText,
        fonts: &FontMap,
        px: f32,
        flags: LayoutFlags,
    ) -> Layout {
        self.slots.clear();
        let mut layout_fonts: Vec<Arc<FontFamily>> = Vec::new();
        let mut glyphs = Vec::new();
        let mut advances = flags
            .contains(LayoutFlags::ADVANCES)
            .then(|| Vec::with_capacity(text.char_count()));
        let mut x = 0.0_f32;

        for (ch, style) in text.chars() {
            let collection = fonts.collection(style.font.as_deref());
            let family = collection
                .family_for(ch)
                .or_else(|| collection.families().first())
                .or_else(|| fonts.default_collection().families().first());
            let Some(family) = family else {
                // No fonts at all; record a zero-width cluster so indices
                // stay aligned with the text.
                if let Some(advances) = advances.as_mut() {
                    advances.push(0.0);
                }
                continue;
            };
            let glyph = family.get_glyph(ch, px).unwrap_or(fontweave::Glyph {
                id: 0,
                // Missing-glyph placeholder box.
                advance: px * 0.5,
            });
            let slot = match self.slots.get(&family.key()) {
                Some(&slot) => slot,
                None => {
                    let slot = layout_fonts.len() as u16;
                    self.slots.insert(family.key(), slot);
                    layout_fonts.push(family.clone());
                    slot
                }
            };
            let mut render = style.render_flags();
            if family.is_bitmap() {
                render |= RenderFlags::EMBEDDED_BITMAP;
            }
            if family.full_shaping_only() || fonts.emoji().is_emoji(ch) {
                render |= RenderFlags::COLOR_EMOJI;
            }
            glyphs.push(GlyphInstance {
                font_slot: slot,
                glyph_id: glyph.id,
                x,
                y: 0.0,
                flags: render,
            });
            if let Some(advances) = advances.as_mut() {
                advances.push(glyph.advance);
            }
            x += glyph.advance;
        }

        let plain = text.to_plain_string();
        let boundaries = flags
            .contains(LayoutFlags::LINE_BOUNDARIES)
            .then(|| self.analysis.boundaries(&plain));

        Layout {
            text: plain,
            advances,
            boundaries,
            glyphs,
            fonts: layout_fonts,
            total_advance: x,
            computed: flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UniformBreaks;
    use crate::style::Style;
    use fontweave::SpaceFont;

    fn fonts() -> FontMap {
        let family = Arc::new(FontFamily::Space(SpaceFont::new(
            "fixture",
            ('a'..='z').map(|c| (c, 6.0)).chain([(' ', 4.0)]),
        )));
        let default = FontCollection::from_families([family]);
        let mut map = HashMap::new();
        map.insert(Arc::<str>::from("default"), default.clone());
        FontMap::new(map, default, EmojiMetadata::default())
    }

    #[test]
    fn advances_and_total_line_up() {
        let mut processor = CharWalkProcessor::new(Arc::new(UniformBreaks));
        let flat = FlatText::from_plain("ab c", &Style::default());
        let layout = processor.process(&flat, &fonts(), 16.0, LayoutFlags::ADVANCES);
        let advances = layout.advances().unwrap();
        assert_eq!(advances, &[6.0, 6.0, 4.0, 6.0]);
        assert_eq!(layout.total_advance(), 22.0);
        assert_eq!(layout.glyphs().len(), 4);
        // One distinct font referenced.
        assert_eq!(layout.fonts().len(), 1);
        assert!(layout.computed().contains(LayoutFlags::ADVANCES));
    }

    #[test]
    fn boundaries_only_when_requested() {
        let mut processor = CharWalkProcessor::new(Arc::new(UniformBreaks));
        let flat = FlatText::from_plain("ab", &Style::default());
        let layout = processor.process(&flat, &fonts(), 16.0, LayoutFlags::empty());
        assert!(layout.boundaries().is_none());
        assert!(layout.advances().is_none());
        let layout = processor.process(&flat, &fonts(), 16.0, LayoutFlags::LINE_BOUNDARIES);
        assert_eq!(layout.boundaries().unwrap().len(), 2);
    }

    #[test]
    fn glyph_positions_accumulate() {
        let mut processor = CharWalkProcessor::new(Arc::new(UniformBreaks));
        let flat = FlatText::from_plain("abc", &Style::default());
        let layout = processor.process(&flat, &fonts(), 16.0, LayoutFlags::empty());
        let xs: Vec<f32> = layout.glyphs().iter().map(|g| g.x).collect();
        assert_eq!(xs, vec![0.0, 6.0, 12.0]);
    }
}
