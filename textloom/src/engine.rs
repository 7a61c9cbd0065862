// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine context.
//!
//! One `Engine` exists per application and is owned by the privileged
//! (render) thread. Ownership is the concurrency guard: every cache
//! mutation and GPU upload goes through `&mut Engine`, and other threads
//! only ever hold a [`LayoutHandle`], which either blocks on a hand-off to
//! the privileged thread or computes uncached on a pooled processor.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;
use fontweave::{
    resolve, FamilyClass, FastCharSet, FastGlyphCache, FontCollection, FontFamily, GpuResources,
    RawFontBundle, ResourceSource,
};
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use tracing::info;

use crate::analysis::UniformBreaks;
use crate::cache::LayoutCache;
use crate::config::{direction_for_language, DefaultFontPolicy, EngineConfig, TextDirection};
use crate::dispatch::{self, Dispatcher, Request};
use crate::layout::Layout;
use crate::pool::{ProcessorPool, DEFAULT_POOL_CAPACITY};
use crate::reload::{self, EmojiMetadata, PreparedReload, ReloadError, ShortcodeTable,
    DEFAULT_FONT_NAME};
use crate::rich::{FlatText, RichText};
use crate::shape::{CharWalkProcessor, FontMap, LayoutProcessor};
use crate::style::{LayoutFlags, Style};

/// The text engine: cache tables, fast-glyph cache, published font state
/// and the processor pool, with an explicit lifecycle instead of ambient
/// globals.
pub struct Engine {
    config: EngineConfig,
    fonts: Arc<FontMap>,
    shared_fonts: Arc<RwLock<Arc<FontMap>>>,
    cache: LayoutCache,
    fast: FastGlyphCache,
    pool: Arc<ProcessorPool>,
    processor: Box<dyn LayoutProcessor>,
    gpu: Box<dyn GpuResources>,
    registered: Vec<RawFontBundle>,
    emoji: EmojiMetadata,
    shortcodes: ShortcodeTable,
    direction: TextDirection,
    sdf_active: bool,
    font_names: Vec<Arc<str>>,
    batch_generation: u64,
    ticks: u64,
    requests: Receiver<Request>,
    dispatcher: Dispatcher,
}

impl Engine {
    /// Creates an engine on the calling thread, which becomes the
    /// privileged thread for its lifetime.
    pub fn new(config: EngineConfig, gpu: Box<dyn GpuResources>) -> Self {
        let analysis = Arc::new(UniformBreaks);
        let pool_analysis = analysis.clone();
        let pool = Arc::new(ProcessorPool::new(DEFAULT_POOL_CAPACITY, move || {
            Box::new(CharWalkProcessor::new(pool_analysis.clone()))
        }));
        let fonts = Arc::new(FontMap::default());
        let (dispatcher, requests) = dispatch::channel(thread::current().id());
        let direction = direction_for_language(&config.language);
        let sdf_active = config.display_density >= config.sdf_min_density;
        let cache = LayoutCache::new(config.clamped_lifespan());
        Self {
            config,
            fonts: fonts.clone(),
            shared_fonts: Arc::new(RwLock::new(fonts)),
            cache,
            fast: FastGlyphCache::new(),
            pool,
            processor: Box::new(CharWalkProcessor::new(analysis)),
            gpu,
            registered: Vec::new(),
            emoji: EmojiMetadata::default(),
            shortcodes: ShortcodeTable::default(),
            direction,
            sdf_active,
            font_names: Vec::new(),
            batch_generation: 0,
            ticks: 0,
            requests,
            dispatcher,
        }
    }

    /// Registers a font programmatically. Registered fonts are appended
    /// after declaration documents at resolution time, so they take
    /// precedence over passive resource bundles for the same name.
    pub fn register_font(&mut self, name: &str, family: Arc<FontFamily>) {
        self.registered
            .push(RawFontBundle::from_family(name, family));
    }

    /// Registers a whole declaration bundle (e.g. one carrying references).
    pub fn register_bundle(&mut self, bundle: RawFontBundle) {
        self.registered.push(bundle);
    }

    /// Resolves and publishes the registered fonts without consulting a
    /// resource source. Equivalent to a reload whose phase 1 found no
    /// documents.
    pub fn rebuild_fonts(&mut self) -> Result<(), ReloadError> {
        self.apply_reload(PreparedReload::default())
    }

    /// Runs a full reload against the host's current resource state:
    /// phase 1 scatters preparation onto worker threads, phase 2 applies
    /// the result here on the privileged thread.
    pub fn reload(&mut self, source: &dyn ResourceSource) -> Result<(), ReloadError> {
        let prepared = reload::prepare(source);
        self.apply_reload(prepared)
    }

    /// Phase 2 of a reload: synchronously swaps the font resolution state
    /// and invalidates every cache. Runs only on the privileged thread.
    pub fn apply_reload(&mut self, prepared: PreparedReload) -> Result<(), ReloadError> {
        let mut bundles = prepared.bundles;
        bundles.extend(self.registered.iter().cloned());
        let resolved = resolve(bundles);
        let default = resolved
            .get(DEFAULT_FONT_NAME)
            .cloned()
            .filter(|collection| !collection.is_empty())
            .ok_or(ReloadError::MissingDefaultFont)?;

        // Close the outgoing generation's fonts before the swap: decoded
        // pixel buffers that never reached the GPU are dropped, uploaded
        // textures are released once.
        let survivors: HashSet<_> = resolved
            .values()
            .flat_map(|collection| collection.iter().map(|family| family.key()))
            .collect();
        for family in self.fonts.collections().flat_map(FontCollection::iter) {
            if !survivors.contains(&family.key()) {
                family.close(&mut *self.gpu);
            }
        }

        let map = apply_default_policy(resolved, &default, self.config.default_font_policy);
        let mut names: Vec<Arc<str>> = map.keys().cloned().collect();
        names.sort();

        self.emoji = prepared.emoji;
        self.shortcodes = prepared.shortcodes;
        let fonts = Arc::new(FontMap::new(map, default, self.emoji.clone()));
        self.fonts = fonts.clone();
        *self.shared_fonts.write() = fonts;
        // Host-visible compatibility font set.
        self.font_names = names;
        self.clear_caches();

        // Re-derive settings that depend on the reloaded state.
        self.direction = direction_for_language(&self.config.language);
        self.sdf_active = self.config.display_density >= self.config.sdf_min_density;
        self.cache.set_lifespan(self.config.clamped_lifespan());
        info!(fonts = self.font_names.len(), "font state published");
        Ok(())
    }

    /// Lays out a plain string against the plain-text table. Empty input
    /// returns the shared empty layout without touching the table.
    pub fn layout_text(&mut self, text: &str, style: &Style, flags: LayoutFlags) -> Arc<Layout> {
        let fonts = self.fonts.clone();
        let px = self.config.px();
        let processor = &mut self.processor;
        self.cache.plain(text, style, flags, |union| {
            let flat = FlatText::from_marked(text, style);
            Arc::new(processor.process(&flat, &fonts, px, union))
        })
    }

    /// Lays out a rich-text tree. Roots with an empty style go through the
    /// identity table when the identity cache is enabled; everything else
    /// is keyed by its flattened run sequence. The table choice depends
    /// only on the input and configuration, never on cache contents.
    pub fn layout_rich(&mut self, rich: &RichText, flags: LayoutFlags) -> Arc<Layout> {
        let flat = rich.flatten(&Style::default());
        if flat.is_empty() {
            return Layout::empty();
        }
        let fonts = self.fonts.clone();
        let px = self.config.px();
        let processor = &mut self.processor;
        if self.config.identity_cache && rich.style().is_empty() {
            self.cache.rich(rich.id(), flags, |union| {
                Arc::new(processor.process(&flat, &fonts, px, union))
            })
        } else {
            self.cache.sequence(&flat, flags, |union| {
                Arc::new(processor.process(&flat, &fonts, px, union))
            })
        }
    }

    /// Lays out an arbitrary pre-flattened styled sequence against the
    /// composite table.
    pub fn layout_sequence(&mut self, flat: &FlatText, flags: LayoutFlags) -> Arc<Layout> {
        let fonts = self.fonts.clone();
        let px = self.config.px();
        let processor = &mut self.processor;
        self.cache.sequence(flat, flags, |union| {
            Arc::new(processor.process(flat, &fonts, px, union))
        })
    }

    /// Diagnostic dump for arbitrary styled text: logical character codes,
    /// cluster advances with break markers, visual-order glyphs and the
    /// total advance. Computes uncached with every optional computation
    /// enabled; not a performance-sensitive path.
    pub fn dump_text(&mut self, text: &str, style: &Style) -> String {
        let flat = FlatText::from_marked(text, style);
        let layout = self
            .processor
            .process(&flat, &self.fonts, self.config.px(), LayoutFlags::all());
        crate::dump::dump_layout(&layout)
    }

    /// Fast-glyph table for a family at the current resolution level, or
    /// `None` when the family has no fast path.
    pub fn fast_chars(&mut self, family: &FontFamily) -> Option<Arc<FastCharSet>> {
        let level = self.config.resolution_level;
        let px = self.config.px();
        self.fast.get_or_build(family, level, px)
    }

    /// One host tick: services queued off-thread requests and, at the
    /// configured cadence, runs an eviction sweep.
    pub fn tick(&mut self) {
        self.service_requests();
        self.ticks += 1;
        let cadence = self.config.eviction_cadence.max(1);
        if self.ticks % u64::from(cadence) == 0 {
            self.cache.tick();
        }
    }

    fn service_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            match request {
                Request::Plain {
                    text,
                    style,
                    flags,
                    reply,
                } => {
                    let layout = self.layout_text(&text, &style, flags);
                    let _ = reply.send(layout);
                }
                Request::Sequence { text, flags, reply } => {
                    let layout = self.layout_sequence(&text, flags);
                    let _ = reply.send(layout);
                }
            }
        }
    }

    /// Empties every cache tier and bumps the batch generation so any
    /// render batching keyed on glyph identity restarts from scratch.
    pub fn clear_caches(&mut self) {
        self.cache.clear();
        self.fast.clear();
        self.batch_generation += 1;
    }

    /// A cloneable handle for issuing layout requests from other threads.
    ///
    /// The handle snapshots the async-layout setting and scale; create a
    /// fresh handle after changing those.
    pub fn handle(&self) -> LayoutHandle {
        LayoutHandle {
            dispatcher: self.dispatcher.clone(),
            pool: self.pool.clone(),
            fonts: self.shared_fonts.clone(),
            async_layout: self.config.async_layout,
            px: self.config.px(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn fonts(&self) -> &FontMap {
        &self.fonts
    }

    /// The host-visible set of resolved font names, rebuilt on reload.
    pub fn font_names(&self) -> &[Arc<str>] {
        &self.font_names
    }

    pub fn emoji(&self) -> &EmojiMetadata {
        &self.emoji
    }

    pub fn shortcodes(&self) -> &ShortcodeTable {
        &self.shortcodes
    }

    pub fn direction(&self) -> TextDirection {
        self.direction
    }

    /// True when the display density clears the distance-field threshold.
    pub fn sdf_active(&self) -> bool {
        self.sdf_active
    }

    pub fn batch_generation(&self) -> u64 {
        self.batch_generation
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Total self-reported footprint of every cached layout.
    pub fn memory_footprint(&self) -> usize {
        self.cache.memory_footprint()
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("cache", &self.cache)
            .field("fonts", &self.font_names.len())
            .field("batch_generation", &self.batch_generation)
            .finish_non_exhaustive()
    }
}

/// Off-thread access to the engine.
///
/// With async layout enabled, requests borrow a pooled processor and
/// compute uncached against the current font snapshot. With it disabled,
/// requests block on a round-trip to the privileged thread and go through
/// the real caches there.
#[derive(Clone, Debug)]
pub struct LayoutHandle {
    dispatcher: Dispatcher,
    pool: Arc<ProcessorPool>,
    fonts: Arc<RwLock<Arc<FontMap>>>,
    async_layout: bool,
    px: f32,
}

impl LayoutHandle {
    pub fn layout_text(&self, text: &str, style: &Style, flags: LayoutFlags) -> Arc<Layout> {
        if text.is_empty() {
            return Layout::empty();
        }
        if self.async_layout {
            let fonts = self.fonts.read().clone();
            let flat = FlatText::from_marked(text, style);
            let mut processor = self.pool.acquire();
            Arc::new(processor.process(&flat, &fonts, self.px, flags))
        } else {
            self.dispatcher.request_plain_blocking(text, style, flags)
        }
    }

    pub fn layout_sequence(&self, flat: &FlatText, flags: LayoutFlags) -> Arc<Layout> {
        if flat.is_empty() {
            return Layout::empty();
        }
        if self.async_layout {
            let fonts = self.fonts.read().clone();
            let mut processor = self.pool.acquire();
            Arc::new(processor.process(flat, &fonts, self.px, flags))
        } else {
            self.dispatcher.request_sequence_blocking(flat, flags)
        }
    }
}

/// Appends the (policy-filtered) default families to every named
/// collection as an implicit fallback. The default collection itself is
/// published unfiltered.
fn apply_default_policy(
    resolved: HashMap<Arc<str>, FontCollection>,
    default: &FontCollection,
    policy: DefaultFontPolicy,
) -> HashMap<Arc<str>, FontCollection> {
    let fallback: Vec<Arc<FontFamily>> = default
        .iter()
        .filter(|family| match policy {
            DefaultFontPolicy::IgnoreAll => false,
            DefaultFontPolicy::AsciiOnly => family.class() == FamilyClass::Ascii,
            DefaultFontPolicy::ExceptUnicode => family.class() != FamilyClass::Unicode,
            DefaultFontPolicy::All => true,
        })
        .cloned()
        .collect();
    resolved
        .into_iter()
        .map(|(name, collection)| {
            if &*name == DEFAULT_FONT_NAME {
                return (name, collection);
            }
            let families = collection
                .iter()
                .cloned()
                .chain(fallback.iter().cloned());
            (name, FontCollection::from_families(families))
        })
        .collect()
}
