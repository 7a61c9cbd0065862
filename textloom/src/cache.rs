// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The three layout cache tables.
//!
//! Plain strings, rich-text identities and composite character sequences
//! each get their own table; the choice of table is a pure function of the
//! request shape and configuration, never of prior cache state. Entries
//! carry a recompute-triggered TTL: the lifetime resets when an entry is
//! freshly computed or flag-upgraded, not on read, and the eviction tick
//! decrements every entry until it reaches zero.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::key::{PlainKey, PlainKeyRef, SeqKey, SeqKeyRef};
use crate::layout::Layout;
use crate::rich::FlatText;
use crate::style::{LayoutFlags, Style};
use crate::NodeId;

struct Entry {
    layout: Arc<Layout>,
    life: u32,
}

/// The layout cache. Mutated only through the engine context the
/// privileged thread owns.
pub struct LayoutCache {
    plain: HashMap<PlainKey, Entry>,
    rich: HashMap<NodeId, Entry>,
    seq: HashMap<SeqKey, Entry>,
    lifespan: u32,
}

impl LayoutCache {
    pub fn new(lifespan: u32) -> Self {
        Self {
            plain: HashMap::new(),
            rich: HashMap::new(),
            seq: HashMap::new(),
            lifespan,
        }
    }

    pub fn set_lifespan(&mut self, lifespan: u32) {
        self.lifespan = lifespan;
    }

    /// Looks up the plain-string table, recomputing on miss or when the
    /// cached entry lacks one of the requested flags. `compute` receives
    /// the union of the requested flags with whatever the existing entry
    /// had, so an upgrade never loses capabilities.
    pub fn plain(
        &mut self,
        text: &str,
        style: &Style,
        flags: LayoutFlags,
        compute: impl FnOnce(LayoutFlags) -> Arc<Layout>,
    ) -> Arc<Layout> {
        if text.is_empty() {
            return Layout::empty();
        }
        let probe = PlainKeyRef { text, style };
        if let Some(entry) = self.plain.get_mut(&probe) {
            if entry.layout.computed().contains(flags) {
                return entry.layout.clone();
            }
            let layout = compute(entry.layout.computed() | flags);
            entry.layout = layout.clone();
            entry.life = self.lifespan;
            return layout;
        }
        let layout = compute(flags);
        self.plain.insert(
            probe.to_owned(),
            Entry {
                layout: layout.clone(),
                life: self.lifespan,
            },
        );
        layout
    }

    /// Looks up the rich-text identity table.
    pub fn rich(
        &mut self,
        id: NodeId,
        flags: LayoutFlags,
        compute: impl FnOnce(LayoutFlags) -> Arc<Layout>,
    ) -> Arc<Layout> {
        match self.rich.get_mut(&id) {
            Some(entry) => {
                if entry.layout.computed().contains(flags) {
                    return entry.layout.clone();
                }
                let layout = compute(entry.layout.computed() | flags);
                entry.layout = layout.clone();
                entry.life = self.lifespan;
                layout
            }
            None => {
                let layout = compute(flags);
                self.rich.insert(
                    id,
                    Entry {
                        layout: layout.clone(),
                        life: self.lifespan,
                    },
                );
                layout
            }
        }
    }

    /// Looks up the composite table. The probe borrows the flattened runs;
    /// only an insert materializes an owned copy.
    pub fn sequence(
        &mut self,
        flat: &FlatText,
        flags: LayoutFlags,
        compute: impl FnOnce(LayoutFlags) -> Arc<Layout>,
    ) -> Arc<Layout> {
        if flat.is_empty() {
            return Layout::empty();
        }
        let probe = SeqKeyRef(&flat.runs);
        if let Some(entry) = self.seq.get_mut(&probe) {
            if entry.layout.computed().contains(flags) {
                return entry.layout.clone();
            }
            let layout = compute(entry.layout.computed() | flags);
            entry.layout = layout.clone();
            entry.life = self.lifespan;
            return layout;
        }
        let layout = compute(flags);
        self.seq.insert(
            SeqKey::from_flat(flat),
            Entry {
                layout: layout.clone(),
                life: self.lifespan,
            },
        );
        layout
    }

    /// One eviction sweep: decrements every entry's lifetime and removes
    /// the ones that reach zero. Reads between sweeps do not refresh a
    /// lifetime; only recomputation does.
    pub fn tick(&mut self) {
        fn sweep<K>(table: &mut HashMap<K, Entry>) {
            table.retain(|_, entry| {
                entry.life = entry.life.saturating_sub(1);
                entry.life > 0
            });
        }
        sweep(&mut self.plain);
        sweep(&mut self.rich);
        sweep(&mut self.seq);
    }

    /// Empties all three tables, rebuilding their backing storage so
    /// retained bucket capacity is released.
    pub fn clear(&mut self) {
        self.plain = HashMap::new();
        self.rich = HashMap::new();
        self.seq = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.plain.len() + self.rich.len() + self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of every cached layout's self-reported footprint, for
    /// diagnostics.
    pub fn memory_footprint(&self) -> usize {
        self.plain
            .values()
            .chain(self.rich.values())
            .chain(self.seq.values())
            .map(|entry| entry.layout.memory_footprint())
            .sum()
    }
}

impl core::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutCache")
            .field("plain", &self.plain.len())
            .field("rich", &self.rich.len())
            .field("seq", &self.seq.len())
            .field("lifespan", &self.lifespan)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with(flags: LayoutFlags) -> Arc<Layout> {
        Arc::new(Layout {
            text: "x".to_owned(),
            computed: flags,
            ..Default::default()
        })
    }

    #[test]
    fn hit_with_subset_returns_cached_instance() {
        let mut cache = LayoutCache::new(6);
        let style = Style::default();
        let first = cache.plain("abc", &style, LayoutFlags::ADVANCES, layout_with);
        let second = cache.plain("abc", &style, LayoutFlags::ADVANCES, |_| {
            panic!("must not recompute")
        });
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn flag_upgrade_recomputes_with_the_union() {
        let mut cache = LayoutCache::new(6);
        let style = Style::default();
        let first = cache.plain("abc", &style, LayoutFlags::ADVANCES, layout_with);
        let mut seen = LayoutFlags::empty();
        let second = cache.plain("abc", &style, LayoutFlags::LINE_BOUNDARIES, |union| {
            seen = union;
            layout_with(union)
        });
        assert_eq!(seen, LayoutFlags::ADVANCES | LayoutFlags::LINE_BOUNDARIES);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.computed().contains(LayoutFlags::ADVANCES));
        // The slot was overwritten, not duplicated.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_input_bypasses_the_table() {
        let mut cache = LayoutCache::new(6);
        let style = Style::default();
        let before = cache.len();
        let result = cache.plain("", &style, LayoutFlags::ADVANCES, |_| {
            panic!("empty input must not compute")
        });
        assert!(Arc::ptr_eq(&result, &Layout::empty()));
        assert_eq!(cache.len(), before);
    }

    #[test]
    fn entries_expire_after_lifespan_ticks() {
        let lifespan = 3;
        let mut cache = LayoutCache::new(lifespan);
        let style = Style::default();
        cache.plain("abc", &style, LayoutFlags::empty(), layout_with);
        for _ in 0..lifespan - 1 {
            cache.tick();
            assert_eq!(cache.len(), 1, "entry must survive until the last tick");
        }
        cache.tick();
        assert!(cache.is_empty());
    }

    #[test]
    fn reads_do_not_refresh_the_lifetime() {
        let mut cache = LayoutCache::new(2);
        let style = Style::default();
        cache.plain("abc", &style, LayoutFlags::empty(), layout_with);
        cache.tick();
        // A read after one tick...
        cache.plain("abc", &style, LayoutFlags::empty(), |_| {
            panic!("must not recompute")
        });
        // ...does not extend the entry's life.
        cache.tick();
        assert!(cache.is_empty());
    }

    #[test]
    fn recompute_refreshes_the_lifetime() {
        let mut cache = LayoutCache::new(2);
        let style = Style::default();
        cache.plain("abc", &style, LayoutFlags::empty(), layout_with);
        cache.tick();
        // The flag upgrade recomputes and resets the TTL.
        cache.plain("abc", &style, LayoutFlags::ADVANCES, layout_with);
        cache.tick();
        assert_eq!(cache.len(), 1);
        cache.tick();
        assert!(cache.is_empty());
    }

    #[test]
    fn tables_are_independent() {
        let mut cache = LayoutCache::new(6);
        let style = Style::default();
        cache.plain("abc", &style, LayoutFlags::empty(), layout_with);
        cache.rich(NodeId::new(), LayoutFlags::empty(), layout_with);
        let flat = FlatText::from_plain("abc", &style);
        cache.sequence(&flat, LayoutFlags::empty(), layout_with);
        assert_eq!(cache.len(), 3);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn memory_accounting_sums_entries() {
        let mut cache = LayoutCache::new(6);
        let style = Style::default();
        assert_eq!(cache.memory_footprint(), 0);
        cache.plain("abc", &style, LayoutFlags::empty(), layout_with);
        assert!(cache.memory_footprint() > 0);
    }
}
