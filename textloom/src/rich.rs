// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rich-text trees and their flattened run form.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::style::{Style, STYLE_MARKER};

/// Unique identity of a rich-text node, used as the identity-cache key.
///
/// Identity entries expire through the same tick TTL as every other cache
/// entry, so a stale id is at worst a few ticks of dead weight.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a new unique identifier.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }
}

/// A structured text tree: literal content plus styled children.
#[derive(Clone, Debug)]
pub struct RichText {
    id: NodeId,
    style: Style,
    text: String,
    children: Vec<RichText>,
}

impl RichText {
    pub fn new(text: impl Into<String>) -> Self {
        Self::styled(text, Style::default())
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            id: NodeId::new(),
            style,
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(child);
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Flattens the tree into styled runs, depth-first, each node's style
    /// inheriting the unset fields of its ancestors.
    pub fn flatten(&self, base: &Style) -> FlatText {
        let mut runs = Vec::new();
        self.flatten_into(base, &mut runs);
        FlatText { runs }
    }

    fn flatten_into(&self, inherited: &Style, runs: &mut Vec<FlatRun>) {
        let style = self.style.merged_with(inherited);
        if !self.text.is_empty() {
            runs.push(FlatRun {
                text: self.text.clone(),
                style: style.clone(),
            });
        }
        for child in &self.children {
            child.flatten_into(&style, runs);
        }
    }
}

/// One run of identically-styled characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlatRun {
    pub text: String,
    pub style: Style,
}

/// A flattened character sequence: what the layout processor consumes and
/// what the composite cache key is built from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlatText {
    pub runs: Vec<FlatRun>,
}

impl FlatText {
    /// A single run with no marker interpretation.
    pub fn from_plain(text: &str, style: &Style) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            runs: vec![FlatRun {
                text: text.to_owned(),
                style: style.clone(),
            }],
        }
    }

    /// Splits a string containing legacy [`STYLE_MARKER`] format codes into
    /// styled runs. Unknown codes are dropped along with their marker.
    pub fn from_marked(text: &str, base: &Style) -> Self {
        let mut runs = Vec::new();
        let mut style = base.clone();
        let mut current = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch != STYLE_MARKER {
                current.push(ch);
                continue;
            }
            let Some(code) = chars.next() else { break };
            let next = style.apply_format_code(code, base).unwrap_or_else(|| style.clone());
            if next != style && !current.is_empty() {
                runs.push(FlatRun {
                    text: core::mem::take(&mut current),
                    style: style.clone(),
                });
            }
            style = next;
        }
        if !current.is_empty() {
            runs.push(FlatRun {
                text: current,
                style,
            });
        }
        Self { runs }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.is_empty())
    }

    pub fn char_count(&self) -> usize {
        self.runs.iter().map(|run| run.text.chars().count()).sum()
    }

    /// Iterates characters in logical order with their styles.
    pub fn chars(&self) -> impl Iterator<Item = (char, &Style)> + '_ {
        self.runs
            .iter()
            .flat_map(|run| run.text.chars().map(move |ch| (ch, &run.style)))
    }

    /// Logical-order text with styling stripped.
    pub fn to_plain_string(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            out.push_str(&run.text);
        }
        out
    }
}
