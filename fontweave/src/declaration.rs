// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parsing of raw font declaration documents.
//!
//! A declaration document is a JSON provider list:
//!
//! ```json
//! {
//!   "providers": [
//!     { "type": "outline", "file": "font/body.ttf" },
//!     { "type": "bitmap", "file": "font/ascii.png", "ascent": 7, "chars": ["ab"] },
//!     { "type": "space", "advances": { " ": 4.0 } },
//!     { "type": "reference", "id": "default" }
//!   ]
//! }
//! ```
//!
//! One malformed provider entry is logged and skipped; it never aborts the
//! rest of the document, and a document-level parse failure never aborts
//! the rest of the reload.

use std::sync::Arc;

use peniko::Blob;
use serde::Deserialize;
use tracing::warn;

use crate::{
    BitmapFont, FamilyClass, FontError, FontFamily, GridDefinition, OutlineFont, ResourceSource,
    SpaceFont,
};

/// One provider of a font name: either a concrete family or a reference to
/// another name.
#[derive(Clone, Debug)]
pub enum RawProvider {
    Family(Arc<FontFamily>),
    Reference(Arc<str>),
}

/// A resolution-graph node: a font name with its ordered providers and the
/// set of names it references. Used for a single reload pass and discarded
/// after resolution.
#[derive(Clone, Debug)]
pub struct RawFontBundle {
    pub name: Arc<str>,
    pub providers: Vec<RawProvider>,
    pub dependencies: Vec<Arc<str>>,
}

impl RawFontBundle {
    /// A bundle holding a single concrete family, for programmatic font
    /// registration.
    pub fn from_family(name: &str, family: Arc<FontFamily>) -> Self {
        Self {
            name: name.into(),
            providers: vec![RawProvider::Family(family)],
            dependencies: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct DocumentDecl {
    providers: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ProviderDecl {
    Outline {
        file: String,
        #[serde(default)]
        index: u32,
        #[serde(default)]
        full_shaping: bool,
        #[serde(default)]
        class: ClassDecl,
    },
    Bitmap {
        file: String,
        #[serde(default = "default_height")]
        height: u32,
        ascent: i32,
        chars: Vec<String>,
        #[serde(default)]
        class: ClassDecl,
    },
    Space {
        advances: std::collections::HashMap<char, f32>,
    },
    Reference {
        id: String,
    },
}

fn default_height() -> u32 {
    8
}

#[derive(Deserialize, Copy, Clone, Debug, Default)]
#[serde(rename_all = "snake_case")]
enum ClassDecl {
    Ascii,
    Unicode,
    #[default]
    Other,
}

impl From<ClassDecl> for FamilyClass {
    fn from(value: ClassDecl) -> Self {
        match value {
            ClassDecl::Ascii => Self::Ascii,
            ClassDecl::Unicode => Self::Unicode,
            ClassDecl::Other => Self::Other,
        }
    }
}

/// Parses one declaration document into a [`RawFontBundle`], loading
/// referenced files through `source`.
///
/// Returns `Err` only when the document itself is not valid JSON in the
/// provider-list shape; individual providers degrade to a warning.
pub fn parse_font_document(
    name: &str,
    bytes: &[u8],
    source: &dyn ResourceSource,
) -> Result<RawFontBundle, FontError> {
    let document: DocumentDecl = serde_json::from_slice(bytes)?;
    let mut providers = Vec::with_capacity(document.providers.len());
    let mut dependencies = Vec::new();
    for value in document.providers {
        let decl = match serde_json::from_value::<ProviderDecl>(value) {
            Ok(decl) => decl,
            Err(err) => {
                warn!(font = name, error = %err, "skipping malformed font provider");
                continue;
            }
        };
        match build_provider(name, decl, source) {
            Ok(RawProvider::Reference(id)) => {
                if !dependencies.contains(&id) {
                    dependencies.push(id.clone());
                }
                providers.push(RawProvider::Reference(id));
            }
            Ok(provider) => providers.push(provider),
            Err(err) => {
                warn!(font = name, error = %err, "skipping unloadable font provider");
            }
        }
    }
    Ok(RawFontBundle {
        name: name.into(),
        providers,
        dependencies,
    })
}

fn build_provider(
    name: &str,
    decl: ProviderDecl,
    source: &dyn ResourceSource,
) -> Result<RawProvider, FontError> {
    match decl {
        ProviderDecl::Outline {
            file,
            index,
            full_shaping,
            class,
        } => {
            let data = Blob::new(Arc::new(source.bytes(&file)?));
            let font = OutlineFont::new(name, data, index)?
                .with_full_shaping(full_shaping)
                .with_class(class.into());
            Ok(RawProvider::Family(Arc::new(FontFamily::Outline(font))))
        }
        ProviderDecl::Bitmap {
            file,
            height,
            ascent,
            chars,
            class,
        } => {
            let image = source.bytes(&file)?;
            let grid = GridDefinition {
                name: name.to_owned(),
                height,
                ascent,
                rows: chars,
            };
            let font = BitmapFont::create(grid, &image, class.into())?;
            Ok(RawProvider::Family(Arc::new(FontFamily::Bitmap(font))))
        }
        ProviderDecl::Space { advances } => {
            let font = SpaceFont::new(name, advances);
            Ok(RawProvider::Family(Arc::new(FontFamily::Space(font))))
        }
        ProviderDecl::Reference { id } => Ok(RawProvider::Reference(id.as_str().into())),
    }
}
