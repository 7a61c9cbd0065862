// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-phase resource reload.
//!
//! Phase 1 scatters the independent preparations — font declaration
//! parsing, emoji metadata, shortcode tables — onto scoped worker threads.
//! Each task writes only its own result holder, so the phase needs no
//! synchronization beyond the scope join, which is the barrier: phase 2
//! cannot observe a partially prepared state. Phase 2 runs synchronously
//! on the privileged thread (see `Engine::apply_reload`) and atomically
//! swaps the published font state before invalidating every cache.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::thread;

use fontweave::{parse_font_document, RawFontBundle, ResourceSource};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Logical path of the emoji metadata table.
pub const EMOJI_METADATA_PATH: &str = "font/emoji_metadata.json";
/// Logical path of the shortcode table.
pub const SHORTCODES_PATH: &str = "font/shortcodes.json";

/// Name of the fallback collection the engine cannot run without.
pub const DEFAULT_FONT_NAME: &str = "default";

/// Errors surfaced by a reload. Everything else degrades per font name.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// The default/fallback collection resolved to nothing; no text can be
    /// rendered at all, so this fails the whole reload.
    #[error("the default font collection failed to resolve")]
    MissingDefaultFont,
}

/// Codepoint ranges that must always take the full shaping path (color
/// emoji and friends).
#[derive(Clone, Debug, Default)]
pub struct EmojiMetadata {
    ranges: Vec<RangeInclusive<u32>>,
}

impl EmojiMetadata {
    pub fn is_emoji(&self, codepoint: char) -> bool {
        let cp = codepoint as u32;
        self.ranges.iter().any(|range| range.contains(&cp))
    }

    fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Doc {
            full_shaping: Vec<String>,
        }
        let doc: Doc = serde_json::from_slice(bytes)?;
        let mut ranges = Vec::with_capacity(doc.full_shaping.len());
        for entry in &doc.full_shaping {
            let mut parts = entry.splitn(2, '-');
            let lo = u32::from_str_radix(parts.next().unwrap_or(""), 16);
            let hi = parts.next().map(|p| u32::from_str_radix(p, 16));
            match (lo, hi) {
                (Ok(lo), None) => ranges.push(lo..=lo),
                (Ok(lo), Some(Ok(hi))) => ranges.push(lo..=hi),
                _ => warn!(entry = %entry, "skipping malformed emoji range"),
            }
        }
        Ok(Self { ranges })
    }
}

/// Mapping of `:shortcode:` names to literal replacements.
#[derive(Clone, Debug, Default)]
pub struct ShortcodeTable {
    map: HashMap<String, String>,
}

impl ShortcodeTable {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Replaces every `:name:` occurrence that names a known shortcode.
    pub fn expand(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(':') {
            out.push_str(&rest[..start]);
            let tail = &rest[start + 1..];
            match tail.find(':') {
                Some(end) if self.map.contains_key(&tail[..end]) => {
                    out.push_str(&self.map[&tail[..end]]);
                    rest = &tail[end + 1..];
                }
                _ => {
                    out.push(':');
                    rest = tail;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let map: HashMap<String, String> = serde_json::from_slice(bytes)?;
        Ok(Self { map })
    }
}

/// Everything phase 1 produced, ready for the synchronous apply step.
#[derive(Debug, Default)]
pub struct PreparedReload {
    pub(crate) bundles: Vec<RawFontBundle>,
    pub(crate) emoji: EmojiMetadata,
    pub(crate) shortcodes: ShortcodeTable,
}

/// Phase 1: concurrent preparation with a join barrier.
///
/// Safe to call from any thread; the result is handed to
/// `Engine::apply_reload` on the privileged thread. A panicking subtask is
/// logged and degrades to its default, keeping the reload driving to
/// completion.
pub fn prepare(source: &dyn ResourceSource) -> PreparedReload {
    thread::scope(|scope| {
        let fonts = scope.spawn(|| prepare_fonts(source));
        let emoji = scope.spawn(|| prepare_emoji(source));
        let shortcodes = scope.spawn(|| prepare_shortcodes(source));
        // The joins are the barrier: phase 2 input exists only once every
        // subtask has finished.
        PreparedReload {
            bundles: fonts.join().unwrap_or_else(|_| {
                warn!("font declaration task panicked, reloading with no declared fonts");
                Vec::new()
            }),
            emoji: emoji.join().unwrap_or_else(|_| {
                warn!("emoji metadata task panicked");
                EmojiMetadata::default()
            }),
            shortcodes: shortcodes.join().unwrap_or_else(|_| {
                warn!("shortcode table task panicked");
                ShortcodeTable::default()
            }),
        }
    })
}

fn prepare_fonts(source: &dyn ResourceSource) -> Vec<RawFontBundle> {
    let documents = source.font_documents();
    let mut bundles = Vec::with_capacity(documents.len());
    for (name, bytes) in documents {
        match parse_font_document(&name, &bytes, source) {
            Ok(bundle) => bundles.push(bundle),
            Err(err) => {
                warn!(font = %name, error = %err, "skipping unparseable font document");
            }
        }
    }
    bundles
}

fn prepare_emoji(source: &dyn ResourceSource) -> EmojiMetadata {
    match source.bytes(EMOJI_METADATA_PATH) {
        Ok(bytes) => EmojiMetadata::parse(&bytes).unwrap_or_else(|err| {
            warn!(error = %err, "malformed emoji metadata, continuing without");
            EmojiMetadata::default()
        }),
        Err(_) => EmojiMetadata::default(),
    }
}

fn prepare_shortcodes(source: &dyn ResourceSource) -> ShortcodeTable {
    match source.bytes(SHORTCODES_PATH) {
        Ok(bytes) => ShortcodeTable::parse(&bytes).unwrap_or_else(|err| {
            warn!(error = %err, "malformed shortcode table, continuing without");
            ShortcodeTable::default()
        }),
        Err(_) => ShortcodeTable::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fontweave::MemorySource;

    #[test]
    fn prepare_collects_all_three_holders() {
        let source = MemorySource::new()
            .with_document(
                "default",
                br#"{ "providers": [ { "type": "space", "advances": { " ": 4.0 } } ] }"#.to_vec(),
            )
            .with_file(
                EMOJI_METADATA_PATH,
                br#"{ "full_shaping": ["1F300-1F5FF", "2764"] }"#.to_vec(),
            )
            .with_file(SHORTCODES_PATH, br#"{ "heart": "\u2764" }"#.to_vec());
        let prepared = prepare(&source);
        assert_eq!(prepared.bundles.len(), 1);
        assert!(prepared.emoji.is_emoji('\u{1F30D}'));
        assert!(prepared.emoji.is_emoji('\u{2764}'));
        assert!(!prepared.emoji.is_emoji('a'));
        assert_eq!(prepared.shortcodes.get("heart"), Some("\u{2764}"));
    }

    #[test]
    fn missing_tables_degrade_to_defaults() {
        let prepared = prepare(&MemorySource::new());
        assert!(prepared.bundles.is_empty());
        assert!(!prepared.emoji.is_emoji('a'));
        assert!(prepared.shortcodes.is_empty());
    }

    #[test]
    fn shortcode_expansion() {
        let table = ShortcodeTable::parse(br#"{ "smile": "S" }"#).unwrap();
        assert_eq!(table.expand("a :smile: b"), "a S b");
        assert_eq!(table.expand(":unknown:"), ":unknown:");
        assert_eq!(table.expand("no codes"), "no codes");
        assert_eq!(table.expand("12:30"), "12:30");
    }
}
