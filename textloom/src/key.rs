// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache keys for the layout tables.
//!
//! Lookup keys are distinct from the owned key types so a cache probe
//! never allocates; only an insert materializes an owned key (the same
//! split the shaping caches use for their borrowed keys).

use core::hash::{Hash, Hasher};

use hashbrown::Equivalent;

use crate::rich::{FlatRun, FlatText};
use crate::style::{Style, STYLE_MARKER};

/// Key of the plain-string table: text plus base style, with ASCII digits
/// treated as interchangeable.
///
/// Strings that differ only in digits at the same positions produce the
/// same key, so a frame counter like `"fps: 59"` / `"fps: 60"` hits the
/// same slot instead of filling the table. A digit immediately after the
/// style marker is a color code, not content, and is *not* folded.
#[derive(Clone, Debug)]
pub struct PlainKey {
    pub text: String,
    pub style: Style,
}

/// Borrowed probe for the plain table.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PlainKeyRef<'a> {
    pub text: &'a str,
    pub style: &'a Style,
}

/// Folds content digits to `'0'`; `prev` is the preceding raw character.
fn fold_digit(prev: Option<char>, ch: char) -> char {
    if ch.is_ascii_digit() && prev != Some(STYLE_MARKER) {
        '0'
    } else {
        ch
    }
}

fn hash_folded<H: Hasher>(text: &str, state: &mut H) {
    let mut prev = None;
    for ch in text.chars() {
        state.write_u32(fold_digit(prev, ch) as u32);
        prev = Some(ch);
    }
    // Length terminator, as the str Hash impl does.
    state.write_u8(0xff);
}

fn eq_folded(a: &str, b: &str) -> bool {
    let mut prev_a = None;
    let mut prev_b = None;
    let mut ia = a.chars();
    let mut ib = b.chars();
    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return true,
            (Some(ca), Some(cb)) => {
                if fold_digit(prev_a, ca) != fold_digit(prev_b, cb) {
                    return false;
                }
                prev_a = Some(ca);
                prev_b = Some(cb);
            }
            _ => return false,
        }
    }
}

impl Hash for PlainKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_folded(&self.text, state);
        self.style.hash(state);
    }
}

impl PartialEq for PlainKey {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style && eq_folded(&self.text, &other.text)
    }
}

impl Eq for PlainKey {}

impl Hash for PlainKeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_folded(self.text, state);
        self.style.hash(state);
    }
}

impl Equivalent<PlainKey> for PlainKeyRef<'_> {
    fn equivalent(&self, key: &PlainKey) -> bool {
        *self.style == key.style && eq_folded(self.text, &key.text)
    }
}

impl PlainKeyRef<'_> {
    pub(crate) fn to_owned(self) -> PlainKey {
        PlainKey {
            text: self.text.to_owned(),
            style: self.style.clone(),
        }
    }
}

/// Key of the composite table: a materialized styled character sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeqKey {
    runs: Box<[FlatRun]>,
}

impl SeqKey {
    pub fn from_flat(flat: &FlatText) -> Self {
        Self {
            runs: flat.runs.clone().into_boxed_slice(),
        }
    }
}

/// Borrowed probe for the composite table; no ownership of the runs.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SeqKeyRef<'a>(pub &'a [FlatRun]);

impl Hash for SeqKeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Equivalent<SeqKey> for SeqKeyRef<'_> {
    fn equivalent(&self, key: &SeqKey) -> bool {
        self.0 == &*key.runs
    }
}
