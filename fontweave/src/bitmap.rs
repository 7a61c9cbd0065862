// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitmap font family backed by a single fixed-grid texture atlas.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use std::sync::Arc;

use hashbrown::HashMap;
use image::RgbaImage;
use parking_lot::Mutex;
use tracing::warn;

use crate::{FamilyClass, FontError, FontKey, Glyph, GpuResources, PixelFormat, TextureHandle};

/// Declaration of a bitmap font's codepoint grid.
#[derive(Clone, Debug)]
pub struct GridDefinition {
    pub name: String,
    /// Logical height of a rendered glyph cell.
    pub height: u32,
    /// Distance from the top of the cell to the baseline. Must not exceed
    /// `height`.
    pub ascent: i32,
    /// One string per sprite row; `'\u{0}'` entries are padding cells.
    pub rows: Vec<String>,
}

/// Placement and metrics of one glyph within the atlas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BitmapGlyph {
    /// Grid column of the sprite cell.
    pub column: u32,
    /// Grid row of the sprite cell.
    pub row: u32,
    /// Ink width in source pixels after trailing-whitespace trimming.
    pub width: u32,
    /// Scaled horizontal advance.
    pub advance: f32,
}

enum PixelState {
    /// Decoded pixels, not yet baked to a GPU resource.
    Decoded(RgbaImage),
    Uploaded(TextureHandle),
    Closed,
}

/// A font backed by a fixed-grid atlas image.
///
/// The codepoint table is built once at construction; the decoded pixel
/// buffer is owned until the first upload, after which ownership lives in
/// the GPU resource and the CPU copy is gone.
pub struct BitmapFont {
    name: Arc<str>,
    ascent: i32,
    descent: i32,
    cell_width: u32,
    cell_height: u32,
    scale: f32,
    class: FamilyClass,
    glyphs: HashMap<char, BitmapGlyph>,
    columns: u32,
    pixels: Mutex<PixelState>,
}

impl BitmapFont {
    /// Builds a bitmap font from a grid definition and raw PNG bytes.
    ///
    /// Validates the declaration (non-empty grid, `ascent <= height`, image
    /// dimensions dividing evenly into the grid) and computes each glyph's
    /// actual ink width by scanning cell columns right to left for the first
    /// non-transparent pixel. Duplicate codepoint declarations are logged
    /// and the later one wins.
    pub fn create(
        grid: GridDefinition,
        image_bytes: &[u8],
        class: FamilyClass,
    ) -> Result<Self, FontError> {
        let rows = grid.rows.len() as u32;
        let columns = grid
            .rows
            .first()
            .map(|row| row.chars().count() as u32)
            .unwrap_or(0);
        if rows == 0 || columns == 0 {
            return Err(FontError::EmptyGrid);
        }
        if grid.ascent > grid.height as i32 {
            return Err(FontError::AscentExceedsHeight {
                ascent: grid.ascent,
                height: grid.height,
            });
        }
        let image =
            image::load_from_memory_with_format(image_bytes, image::ImageFormat::Png)?
                .into_rgba8();
        if image.width() % columns != 0 || image.height() % rows != 0 {
            return Err(FontError::GridMismatch {
                width: image.width(),
                height: image.height(),
                columns,
                rows,
            });
        }
        let cell_width = image.width() / columns;
        let cell_height = image.height() / rows;
        let scale = grid.height as f32 / cell_height as f32;

        let mut glyphs = HashMap::new();
        for (row, line) in grid.rows.iter().enumerate() {
            for (column, codepoint) in line.chars().enumerate() {
                if codepoint == '\u{0}' {
                    continue;
                }
                let (row, column) = (row as u32, column as u32);
                let width = ink_width(&image, column, row, cell_width, cell_height);
                let glyph = BitmapGlyph {
                    column,
                    row,
                    width,
                    advance: (width as f32 * scale).round() + 1.0,
                };
                if glyphs.insert(codepoint, glyph).is_some() {
                    warn!(
                        font = %grid.name,
                        codepoint = %codepoint.escape_unicode(),
                        "duplicate codepoint in glyph grid, keeping the later cell"
                    );
                }
            }
        }

        Ok(Self {
            name: grid.name.into(),
            ascent: grid.ascent,
            descent: grid.height as i32 - grid.ascent,
            cell_width,
            cell_height,
            scale,
            class,
            glyphs,
            columns,
            pixels: Mutex::new(PixelState::Decoded(image)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ascent(&self) -> i32 {
        self.ascent
    }

    pub fn descent(&self) -> i32 {
        self.descent
    }

    pub fn class(&self) -> FamilyClass {
        self.class
    }

    pub fn has_glyph(&self, codepoint: char) -> bool {
        self.glyphs.contains_key(&codepoint)
    }

    /// Glyph lookup by codepoint. No shaping is involved; the identifier is
    /// the cell's index in the sprite grid.
    ///
    /// This is a metric-only call: it never forces the GPU upload.
    pub fn get_glyph(&self, codepoint: char) -> Option<Glyph> {
        let sprite = self.glyphs.get(&codepoint)?;
        Some(Glyph {
            id: (sprite.row * self.columns + sprite.column) as u16,
            advance: sprite.advance,
        })
    }

    /// Sprite-cell placement for the codepoint, for rendering callers.
    pub fn sprite(&self, codepoint: char) -> Option<&BitmapGlyph> {
        self.glyphs.get(&codepoint)
    }

    /// Returns the atlas texture, uploading it on first use.
    ///
    /// Must only be called from the thread that owns `gpu`. The decoded
    /// pixel buffer is consumed by the upload and must not be read again.
    pub fn texture(&self, gpu: &mut dyn GpuResources) -> Option<TextureHandle> {
        let mut state = self.pixels.lock();
        match mem::replace(&mut *state, PixelState::Closed) {
            PixelState::Decoded(image) => {
                let handle = gpu.upload(
                    image.width(),
                    image.height(),
                    PixelFormat::Rgba8,
                    image.as_raw(),
                );
                *state = PixelState::Uploaded(handle);
                Some(handle)
            }
            PixelState::Uploaded(handle) => {
                *state = PixelState::Uploaded(handle);
                Some(handle)
            }
            PixelState::Closed => None,
        }
    }

    /// Releases whatever the font still owns: a never-uploaded pixel buffer
    /// is dropped, an uploaded texture is released exactly once.
    pub fn close(&self, gpu: &mut dyn GpuResources) {
        if let PixelState::Uploaded(handle) =
            mem::replace(&mut *self.pixels.lock(), PixelState::Closed)
        {
            gpu.release(handle);
        }
    }

    pub(crate) fn key(&self) -> FontKey {
        FontKey::from_hash((
            &*self.name,
            self.ascent,
            self.descent,
            self.cell_width,
            self.cell_height,
            self.scale.to_bits(),
        ))
    }
}

/// Scans the cell's columns right to left for the first column containing
/// a non-transparent pixel.
fn ink_width(image: &RgbaImage, column: u32, row: u32, cell_width: u32, cell_height: u32) -> u32 {
    let x0 = column * cell_width;
    let y0 = row * cell_height;
    for x in (0..cell_width).rev() {
        for y in 0..cell_height {
            if image.get_pixel(x0 + x, y0 + y).0[3] != 0 {
                return x + 1;
            }
        }
    }
    0
}

// Equality and hashing cover metrics only. Pixel content is deliberately
// excluded: two fonts loaded from different packs with identical metrics
// are interchangeable for caching.
impl PartialEq for BitmapFont {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ascent == other.ascent
            && self.descent == other.descent
            && self.cell_width == other.cell_width
            && self.cell_height == other.cell_height
            && self.scale.to_bits() == other.scale.to_bits()
    }
}

impl Eq for BitmapFont {}

impl Hash for BitmapFont {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.ascent.hash(state);
        self.descent.hash(state);
        self.cell_width.hash(state);
        self.cell_height.hash(state);
        self.scale.to_bits().hash(state);
    }
}

impl fmt::Debug for BitmapFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitmapFont")
            .field("name", &self.name)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .field("cell_width", &self.cell_width)
            .field("cell_height", &self.cell_height)
            .field("scale", &self.scale)
            .field("glyphs", &self.glyphs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullResources;
    use std::io::Cursor;

    fn grid(rows: &[&str], height: u32, ascent: i32) -> GridDefinition {
        GridDefinition {
            name: "test".into(),
            height,
            ascent,
            rows: rows.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    /// Encodes a 2x1 grid of 8x8 cells. Cell 0 has ink in its leftmost
    /// `ink` columns, cell 1 is fully opaque.
    fn atlas_png(ink: u32) -> Vec<u8> {
        let mut image = RgbaImage::new(16, 8);
        for y in 0..8 {
            for x in 0..ink {
                image.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
            for x in 8..16 {
                image.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
        }
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let font =
            BitmapFont::create(grid(&["ab"], 8, 7), &atlas_png(3), FamilyClass::Ascii).unwrap();
        let a = font.sprite('a').unwrap();
        assert_eq!(a.width, 3);
        // scale is 8/8 = 1, so advance = round(3 * 1) + 1.
        assert_eq!(a.advance, 4.0);
        let b = font.sprite('b').unwrap();
        assert_eq!(b.width, 8);
        assert_eq!(b.advance, 9.0);
    }

    #[test]
    fn scaled_advance_uses_logical_height() {
        // Logical height 16 over 8px cells doubles every advance.
        let font =
            BitmapFont::create(grid(&["ab"], 16, 14), &atlas_png(3), FamilyClass::Ascii).unwrap();
        assert_eq!(font.sprite('a').unwrap().advance, 7.0);
    }

    #[test]
    fn ascent_must_not_exceed_height() {
        let err = BitmapFont::create(grid(&["ab"], 8, 9), &atlas_png(3), FamilyClass::Ascii)
            .unwrap_err();
        assert!(matches!(err, FontError::AscentExceedsHeight { .. }));
    }

    #[test]
    fn empty_grid_is_rejected() {
        let err =
            BitmapFont::create(grid(&[], 8, 7), &atlas_png(3), FamilyClass::Ascii).unwrap_err();
        assert!(matches!(err, FontError::EmptyGrid));
    }

    #[test]
    fn duplicate_codepoint_keeps_later_cell() {
        let font =
            BitmapFont::create(grid(&["aa"], 8, 7), &atlas_png(3), FamilyClass::Ascii).unwrap();
        // The second (fully opaque) cell wins.
        assert_eq!(font.sprite('a').unwrap().width, 8);
    }

    #[test]
    fn padding_cells_are_skipped() {
        let font = BitmapFont::create(grid(&["a\u{0}"], 8, 7), &atlas_png(3), FamilyClass::Ascii)
            .unwrap();
        assert_eq!(font.glyphs.len(), 1);
    }

    #[test]
    fn upload_happens_once_and_close_releases() {
        let font =
            BitmapFont::create(grid(&["ab"], 8, 7), &atlas_png(3), FamilyClass::Ascii).unwrap();
        let mut gpu = NullResources::default();
        let first = font.texture(&mut gpu).unwrap();
        let second = font.texture(&mut gpu).unwrap();
        assert_eq!(first, second);
        assert_eq!(gpu.uploads(), 1);
        font.close(&mut gpu);
        assert_eq!(gpu.releases(), 1);
        // Closing again must not release twice.
        font.close(&mut gpu);
        assert_eq!(gpu.releases(), 1);
    }

    #[test]
    fn metric_equality_ignores_pixels() {
        let a = BitmapFont::create(grid(&["ab"], 8, 7), &atlas_png(3), FamilyClass::Ascii).unwrap();
        let b = BitmapFont::create(grid(&["ab"], 8, 7), &atlas_png(5), FamilyClass::Ascii).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }
}
