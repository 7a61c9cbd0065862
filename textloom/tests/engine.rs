// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end engine scenarios.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fontweave::{
    FontFamily, MemorySource, NullResources, RawFontBundle, RawProvider, SpaceFont,
};
use textloom::{Engine, EngineConfig, LayoutFlags, ReloadError, RichText, Style};

fn family_x() -> Arc<FontFamily> {
    let advances = ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .map(|c| (c, 6.0))
        .chain([(' ', 4.0), (':', 3.0)]);
    Arc::new(FontFamily::Space(SpaceFont::new("family_x", advances)))
}

fn engine_with_fonts(config: EngineConfig) -> Engine {
    let mut engine = Engine::new(config, Box::new(NullResources::default()));
    engine.register_font("default", family_x());
    engine.register_bundle(RawFontBundle {
        name: "ui".into(),
        providers: vec![RawProvider::Reference("default".into())],
        dependencies: vec!["default".into()],
    });
    engine.rebuild_fonts().unwrap();
    engine
}

#[test]
fn reference_resolution_reaches_the_referenced_families() {
    let engine = engine_with_fonts(EngineConfig::default());
    let ui = engine.fonts().get("ui").expect("ui must resolve");
    assert_eq!(ui.len(), 1);
    assert_eq!(ui.families()[0].family_name(), "family_x");
}

#[test]
fn flag_upgrade_recomputes_and_keeps_the_union() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let style = Style::default();

    let first = engine.layout_text("Hello", &style, LayoutFlags::ADVANCES);
    assert!(first.computed().contains(LayoutFlags::ADVANCES));
    assert_eq!(first.advances().unwrap().len(), 5);

    let second = engine.layout_text(
        "Hello",
        &style,
        LayoutFlags::ADVANCES | LayoutFlags::LINE_BOUNDARIES,
    );
    // The second request forced a recompute...
    assert!(!Arc::ptr_eq(&first, &second));
    // ...and the final entry carries both capabilities.
    assert!(second
        .computed()
        .contains(LayoutFlags::ADVANCES | LayoutFlags::LINE_BOUNDARIES));
    assert_eq!(second.advances().unwrap().len(), 5);
    assert_eq!(second.boundaries().unwrap().len(), 5);
    assert_eq!(engine.cache_len(), 1);

    // Requesting either subset now returns the upgraded entry unchanged.
    let third = engine.layout_text("Hello", &style, LayoutFlags::ADVANCES);
    assert!(Arc::ptr_eq(&second, &third));
}

#[test]
fn empty_inputs_share_one_layout_and_no_table_entry() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let style = Style::default();
    let before = engine.cache_len();
    let a = engine.layout_text("", &style, LayoutFlags::ADVANCES);
    let b = engine.layout_rich(&RichText::new(""), LayoutFlags::empty());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(engine.cache_len(), before);
}

#[test]
fn digit_only_differences_share_a_cache_slot() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let style = Style::default();
    let first = engine.layout_text("fps: 59", &style, LayoutFlags::ADVANCES);
    let second = engine.layout_text("fps: 60", &style, LayoutFlags::ADVANCES);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn entries_evict_after_their_lifespan() {
    let mut config = EngineConfig::default();
    config.lifespan = 2;
    let mut engine = engine_with_fonts(config);
    let style = Style::default();
    engine.layout_text("Hello", &style, LayoutFlags::empty());
    engine.tick();
    assert_eq!(engine.cache_len(), 1);
    engine.tick();
    assert_eq!(engine.cache_len(), 0);
}

#[test]
fn rich_text_identity_cache_is_per_node() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let tree = RichText::new("Hello");
    let first = engine.layout_rich(&tree, LayoutFlags::empty());
    let again = engine.layout_rich(&tree, LayoutFlags::empty());
    assert!(Arc::ptr_eq(&first, &again));

    // A structurally identical but distinct node computes its own entry.
    let other = RichText::new("Hello");
    engine.layout_rich(&other, LayoutFlags::empty());
    assert_eq!(engine.cache_len(), 2);
}

#[test]
fn identity_cache_disabled_falls_back_to_sequence_keys() {
    let mut config = EngineConfig::default();
    config.identity_cache = false;
    let mut engine = engine_with_fonts(config);
    let first = engine.layout_rich(&RichText::new("Hello"), LayoutFlags::empty());
    // A distinct node with the same flattened runs now shares the entry.
    let second = engine.layout_rich(&RichText::new("Hello"), LayoutFlags::empty());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn reload_publishes_fonts_and_invalidates_caches() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let style = Style::default();
    engine.layout_text("Hello", &style, LayoutFlags::empty());
    assert_eq!(engine.cache_len(), 1);
    let generation = engine.batch_generation();

    let source = MemorySource::new().with_document(
        "hud",
        br#"{ "providers": [ { "type": "space", "advances": { "1": 5.0 } } ] }"#.to_vec(),
    );
    engine.reload(&source).unwrap();

    assert_eq!(engine.cache_len(), 0);
    assert!(engine.batch_generation() > generation);
    assert!(engine.fonts().get("hud").is_some());
    // Registered fonts survive the reload and still resolve.
    assert!(engine.fonts().get("ui").is_some());
    assert!(engine
        .font_names()
        .iter()
        .any(|name| &**name == "hud"));
}

#[test]
fn reload_without_a_default_font_is_fatal() {
    let mut engine = Engine::new(EngineConfig::default(), Box::new(NullResources::default()));
    let err = engine.rebuild_fonts().unwrap_err();
    assert!(matches!(err, ReloadError::MissingDefaultFont));
}

#[test]
fn blocking_handoff_round_trips_through_the_privileged_thread() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let handle = engine.handle();
    let worker = thread::spawn(move || {
        handle.layout_text("Hello", &Style::default(), LayoutFlags::ADVANCES)
    });
    // Service the queue until the worker resumes.
    for _ in 0..1000 {
        engine.tick();
        if worker.is_finished() {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    let layout = worker.join().unwrap();
    assert_eq!(layout.advances().unwrap().len(), 5);
    // The blocking path went through the real cache.
    assert_eq!(engine.cache_len(), 1);
}

#[test]
fn async_layout_computes_uncached() {
    let mut config = EngineConfig::default();
    config.async_layout = true;
    let mut engine = engine_with_fonts(config);
    let handle = engine.handle();
    let worker = thread::spawn(move || {
        handle.layout_text("Hello", &Style::default(), LayoutFlags::ADVANCES)
    });
    let layout = worker.join().unwrap();
    assert_eq!(layout.advances().unwrap().len(), 5);
    // Nothing was inserted into the shared tables.
    engine.tick();
    assert_eq!(engine.cache_len(), 0);
}

#[test]
fn fast_chars_come_from_the_engine_cache() {
    let mut engine = engine_with_fonts(EngineConfig::default());
    let family = family_x();
    let set = engine.fast_chars(&family).expect("family has a '0' glyph");
    assert_eq!(set.standard_advance(), 6.0);
    let again = engine.fast_chars(&family).unwrap();
    assert!(Arc::ptr_eq(&set, &again));
}
