// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Advance-only font family.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::{FamilyClass, FontKey, Glyph};

/// A font that maps codepoints to bare advances and produces no visible
/// glyphs. Used for spacing declarations (and as a convenient stand-in
/// font in tests).
#[derive(Clone, Debug)]
pub struct SpaceFont {
    name: Arc<str>,
    class: FamilyClass,
    advances: HashMap<char, f32>,
}

impl SpaceFont {
    pub fn new(name: &str, advances: impl IntoIterator<Item = (char, f32)>) -> Self {
        Self {
            name: name.into(),
            class: FamilyClass::default(),
            advances: advances.into_iter().collect(),
        }
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

    pub fn has_glyph(&self, codepoint: char) -> bool {
        self.advances.contains_key(&codepoint)
    }

    pub fn get_glyph(&self, codepoint: char) -> Option<Glyph> {
        self.advances.get(&codepoint).map(|&advance| Glyph {
            id: 0,
            advance,
        })
    }

    pub(crate) fn key(&self) -> FontKey {
        FontKey::from_hash(&*self.name)
    }
}
