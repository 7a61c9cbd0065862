// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The computed, cacheable layout artifact.

use core::mem;
use std::sync::{Arc, OnceLock};

use fontweave::FontFamily;

use crate::style::{LayoutFlags, RenderFlags};

/// One positioned glyph in visual order. `font_slot` indexes the layout's
/// font vector.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlyphInstance {
    pub font_slot: u16,
    pub glyph_id: u16,
    pub x: f32,
    pub y: f32,
    pub flags: RenderFlags,
}

/// Break classification of one cluster, present when line boundaries were
/// requested.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Boundary {
    /// No break opportunity at this cluster.
    None,
    /// A grapheme boundary.
    Grapheme,
    /// A line-break opportunity.
    Line,
    /// A break is explicitly forbidden here (e.g. a no-break space).
    NoBreak,
}

/// A computed text layout.
///
/// Created whole by a layout processor and never mutated afterwards; a
/// flag upgrade replaces the cached instance with a fresh computation.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    pub(crate) text: String,
    pub(crate) advances: Option<Vec<f32>>,
    pub(crate) boundaries: Option<Vec<Boundary>>,
    pub(crate) glyphs: Vec<GlyphInstance>,
    pub(crate) fonts: Vec<Arc<FontFamily>>,
    pub(crate) total_advance: f32,
    pub(crate) computed: LayoutFlags,
}

impl Layout {
    /// The shared empty layout returned for empty inputs. Its computed
    /// flags are full so any flag request is satisfied without recompute.
    pub fn empty() -> Arc<Self> {
        static EMPTY: OnceLock<Arc<Layout>> = OnceLock::new();
        EMPTY
            .get_or_init(|| {
                Arc::new(Self {
                    computed: LayoutFlags::all(),
                    ..Default::default()
                })
            })
            .clone()
    }

    /// The source text in logical order.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Per-cluster advances, present when [`LayoutFlags::ADVANCES`] was
    /// computed.
    pub fn advances(&self) -> Option<&[f32]> {
        self.advances.as_deref()
    }

    /// Per-cluster break classes, present when
    /// [`LayoutFlags::LINE_BOUNDARIES`] was computed.
    pub fn boundaries(&self) -> Option<&[Boundary]> {
        self.boundaries.as_deref()
    }

    /// Glyphs in visual order.
    pub fn glyphs(&self) -> &[GlyphInstance] {
        &self.glyphs
    }

    /// The distinct fonts referenced by the glyphs, addressed by
    /// [`GlyphInstance::font_slot`].
    pub fn fonts(&self) -> &[Arc<FontFamily>] {
        &self.fonts
    }

    pub fn total_advance(&self) -> f32 {
        self.total_advance
    }

    /// Which optional computations this layout actually performed.
    pub fn computed(&self) -> LayoutFlags {
        self.computed
    }

    /// Self-reported heap footprint, for cache diagnostics.
    pub fn memory_footprint(&self) -> usize {
        self.text.capacity()
            + self
                .advances
                .as_ref()
                .map_or(0, |a| a.capacity() * mem::size_of::<f32>())
            + self
                .boundaries
                .as_ref()
                .map_or(0, |b| b.capacity() * mem::size_of::<Boundary>())
            + self.glyphs.capacity() * mem::size_of::<GlyphInstance>()
            + self.fonts.capacity() * mem::size_of::<Arc<FontFamily>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layout_is_shared_and_fully_computed() {
        let a = Layout::empty();
        let b = Layout::empty();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.computed().contains(LayoutFlags::all()));
        assert_eq!(a.total_advance(), 0.0);
    }
}
