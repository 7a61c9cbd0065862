// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable layout dumps for debugging.

use core::fmt::Write as _;

use crate::layout::{Boundary, Layout};

/// Renders a diagnostic dump of a computed layout: logical-order character
/// codes, per-cluster advances annotated with break markers, visual-order
/// glyphs with their font slot and flags, and the total advance.
///
/// Diagnostic only; nothing here is a performance-sensitive path.
pub fn dump_layout(layout: &Layout) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== text ({} chars) ==", layout.text().chars().count());
    for (index, ch) in layout.text().chars().enumerate() {
        let _ = writeln!(
            out,
            "  [{index:3}] U+{:04X} {:?}",
            ch as u32,
            ch
        );
    }

    if let Some(advances) = layout.advances() {
        let _ = writeln!(out, "== cluster advances ==");
        for (index, advance) in advances.iter().enumerate() {
            let marker = layout
                .boundaries()
                .and_then(|b| b.get(index))
                .map_or(' ', |b| match b {
                    Boundary::None => ' ',
                    Boundary::Grapheme => 'G',
                    Boundary::Line => 'L',
                    Boundary::NoBreak => 'N',
                });
            let _ = writeln!(out, "  [{index:3}] {advance:8.2} {marker}");
        }
    }

    let _ = writeln!(out, "== glyphs (visual order) ==");
    for (index, glyph) in layout.glyphs().iter().enumerate() {
        let _ = writeln!(
            out,
            "  [{index:3}] slot={} glyph={} x={:.2} y={:.2} flags={:?}",
            glyph.font_slot, glyph.glyph_id, glyph.x, glyph.y, glyph.flags
        );
    }

    let _ = writeln!(out, "== fonts ==");
    for (slot, family) in layout.fonts().iter().enumerate() {
        let _ = writeln!(out, "  [{slot:3}] {}", family.family_name());
    }

    let _ = writeln!(out, "total advance: {:.2}", layout.total_advance());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UniformBreaks;
    use crate::rich::FlatText;
    use crate::shape::{CharWalkProcessor, FontMap, LayoutProcessor};
    use crate::style::{LayoutFlags, Style};
    use fontweave::{FontCollection, FontFamily, SpaceFont};
    use std::sync::Arc;

    #[test]
    fn dump_covers_every_section() {
        let family = Arc::new(FontFamily::Space(SpaceFont::new(
            "mono",
            [('h', 6.0), ('i', 3.0), (' ', 4.0)],
        )));
        let default = FontCollection::from_families([family]);
        let fonts = FontMap::new(Default::default(), default, Default::default());
        let mut processor = CharWalkProcessor::new(Arc::new(UniformBreaks));
        let flat = FlatText::from_plain("hi", &Style::default());
        let layout = processor.process(
            &flat,
            &fonts,
            16.0,
            LayoutFlags::ADVANCES | LayoutFlags::LINE_BOUNDARIES,
        );
        let dump = dump_layout(&layout);
        assert!(dump.contains("U+0068"));
        assert!(dump.contains("cluster advances"));
        assert!(dump.contains("glyphs (visual order)"));
        assert!(dump.contains("mono"));
        assert!(dump.contains("total advance: 9.00"));
    }
}
