// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text styling: flags, colors and the legacy format marker.

use std::sync::Arc;

bitflags::bitflags! {
    /// Style bits a caller can request on a run of text.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const OBFUSCATED = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Per-glyph render bits carried by a computed layout.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const OBFUSCATED = 1 << 4;
        const COLOR_EMOJI = 1 << 5;
        const EMBEDDED_BITMAP = 1 << 6;
    }
}

bitflags::bitflags! {
    /// Optional computations a layout request can ask for. A cached layout
    /// records which of these it actually performed.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct LayoutFlags: u8 {
        const ADVANCES = 1 << 0;
        const LINE_BOUNDARIES = 1 << 1;
    }
}

/// The escape character that introduces a legacy inline format code.
///
/// A digit immediately following this marker selects a color and is
/// therefore significant — the digit-insensitive cache key must not fold
/// it (see [`crate::key`]).
pub const STYLE_MARKER: char = '\u{00a7}';

/// Style applied to a run of text.
///
/// `font` and `color` are optional so a style can inherit them from an
/// enclosing rich-text node; a default style with no flags is "empty".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub font: Option<Arc<str>>,
    pub flags: StyleFlags,
    pub color: Option<[u8; 4]>,
}

impl Style {
    /// True when every field is unset. Only rich-text roots with an empty
    /// style are eligible for the identity cache.
    pub fn is_empty(&self) -> bool {
        self.font.is_none() && self.flags.is_empty() && self.color.is_none()
    }

    /// Returns this style with unset fields inherited from `parent`.
    pub fn merged_with(&self, parent: &Self) -> Self {
        Self {
            font: self.font.clone().or_else(|| parent.font.clone()),
            flags: self.flags | parent.flags,
            color: self.color.or(parent.color),
        }
    }

    /// Maps the style bits onto per-glyph render bits.
    pub fn render_flags(&self) -> RenderFlags {
        RenderFlags::from_bits_truncate(self.flags.bits())
    }

    /// Applies one legacy format code (the character after
    /// [`STYLE_MARKER`]); returns `None` for an unknown code.
    pub(crate) fn apply_format_code(&self, code: char, base: &Self) -> Option<Self> {
        let mut style = self.clone();
        match code.to_ascii_lowercase() {
            'k' => style.flags |= StyleFlags::OBFUSCATED,
            'l' => style.flags |= StyleFlags::BOLD,
            'm' => style.flags |= StyleFlags::STRIKETHROUGH,
            'n' => style.flags |= StyleFlags::UNDERLINE,
            'o' => style.flags |= StyleFlags::ITALIC,
            'r' => style = base.clone(),
            c => {
                let index = c.to_digit(16)? as usize;
                // A color code also resets the decoration flags.
                style.flags = base.flags;
                style.color = Some(LEGACY_COLORS[index]);
            }
        }
        Some(style)
    }
}

/// The sixteen legacy palette entries selected by `§0`..`§f`.
const LEGACY_COLORS: [[u8; 4]; 16] = [
    [0x00, 0x00, 0x00, 0xff],
    [0x00, 0x00, 0xaa, 0xff],
    [0x00, 0xaa, 0x00, 0xff],
    [0x00, 0xaa, 0xaa, 0xff],
    [0xaa, 0x00, 0x00, 0xff],
    [0xaa, 0x00, 0xaa, 0xff],
    [0xff, 0xaa, 0x00, 0xff],
    [0xaa, 0xaa, 0xaa, 0xff],
    [0x55, 0x55, 0x55, 0xff],
    [0x55, 0x55, 0xff, 0xff],
    [0x55, 0xff, 0x55, 0xff],
    [0x55, 0xff, 0xff, 0xff],
    [0xff, 0x55, 0x55, 0xff],
    [0xff, 0x55, 0xff, 0xff],
    [0xff, 0xff, 0x55, 0xff],
    [0xff, 0xff, 0xff, 0xff],
];
