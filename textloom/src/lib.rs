// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached text shaping and layout for interactive applications.
//!
//! Textloom turns plain strings, rich-text trees and pre-flattened styled
//! sequences into positioned glyph runs, caching the results across
//! frames. The [`Engine`] context is owned by one privileged thread; a
//! [`LayoutHandle`] serves every other thread, either by a blocking
//! hand-off or by uncached computation on a pooled processor. Font
//! declarations resolve through [`fontweave`] into flattened fallback
//! collections, republished wholesale by the two-phase reload in
//! [`reload`].

pub use fontweave;

mod analysis;
mod cache;
mod config;
mod dispatch;
mod dump;
mod engine;
mod key;
mod layout;
mod pool;
pub mod reload;
mod rich;
mod shape;
mod style;

pub use analysis::{BreakAnalysis, UniformBreaks};
pub use cache::LayoutCache;
pub use config::{
    DefaultFontPolicy, EngineConfig, ResolutionScale, TextDirection, DEFAULT_LIFESPAN,
    MAX_LIFESPAN, MIN_LIFESPAN,
};
pub use dispatch::Dispatcher;
pub use dump::dump_layout;
pub use engine::{Engine, LayoutHandle};
pub use key::{PlainKey, SeqKey};
pub use layout::{Boundary, GlyphInstance, Layout};
pub use pool::{PooledProcessor, ProcessorPool, DEFAULT_POOL_CAPACITY};
pub use reload::{EmojiMetadata, PreparedReload, ReloadError, ShortcodeTable};
pub use rich::{FlatRun, FlatText, NodeId, RichText};
pub use shape::{CharWalkProcessor, FontMap, LayoutProcessor};
pub use style::{LayoutFlags, RenderFlags, Style, StyleFlags, STYLE_MARKER};
