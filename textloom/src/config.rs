// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

use std::sync::Arc;

/// Smallest allowed cache lifespan, in eviction ticks.
pub const MIN_LIFESPAN: u32 = 2;
/// Largest allowed cache lifespan, in eviction ticks.
pub const MAX_LIFESPAN: u32 = 15;
/// Default cache lifespan.
pub const DEFAULT_LIFESPAN: u32 = 6;

/// How much of the default font collection is appended as an implicit
/// fallback to every named collection.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum DefaultFontPolicy {
    /// Collections get no implicit default fallback.
    IgnoreAll,
    /// Only the ASCII-class default families are appended.
    AsciiOnly,
    /// Everything except the broad unicode fallback family is appended.
    ExceptUnicode,
    /// The whole default collection is appended.
    #[default]
    All,
}

/// Maps a resolution level to a device pixel size.
///
/// The exact scaling curve is host tuning, so it is a pluggable function
/// rather than a baked constant.
#[derive(Clone)]
pub struct ResolutionScale(Arc<dyn Fn(u8) -> f32 + Send + Sync>);

impl ResolutionScale {
    pub fn new(f: impl Fn(u8) -> f32 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn px(&self, level: u8) -> f32 {
        (self.0)(level)
    }
}

impl Default for ResolutionScale {
    fn default() -> Self {
        Self::new(|level| 8.0 * f32::from(level.max(1)))
    }
}

impl core::fmt::Debug for ResolutionScale {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ResolutionScale(..)")
    }
}

/// Base text direction derived from the configured language.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum TextDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

pub(crate) fn direction_for_language(language: &str) -> TextDirection {
    let primary = language.split(['-', '_']).next().unwrap_or("");
    match primary {
        "ar" | "he" | "fa" | "ur" | "yi" | "dv" => TextDirection::RightToLeft,
        _ => TextDirection::LeftToRight,
    }
}

/// Configuration surface of the engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Cache entry lifespan in eviction ticks; clamped to
    /// [`MIN_LIFESPAN`]..=[`MAX_LIFESPAN`] when read.
    pub lifespan: u32,
    /// Host ticks between eviction sweeps.
    pub eviction_cadence: u32,
    /// When enabled, off-thread requests compute uncached on a pooled
    /// processor instead of blocking on the privileged thread.
    pub async_layout: bool,
    /// When enabled, rich-text roots with an empty style are cached by
    /// node identity.
    pub identity_cache: bool,
    /// Minimum pixel density at which distance-field rendering engages.
    pub sdf_min_density: f32,
    /// Current display pixel density, compared against `sdf_min_density`.
    pub display_density: f32,
    pub default_font_policy: DefaultFontPolicy,
    /// Current resolution level.
    pub resolution_level: u8,
    /// Language tag driving the text direction heuristic.
    pub language: String,
    pub scale: ResolutionScale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lifespan: DEFAULT_LIFESPAN,
            eviction_cadence: 1,
            async_layout: false,
            identity_cache: true,
            sdf_min_density: 2.0,
            display_density: 1.0,
            default_font_policy: DefaultFontPolicy::default(),
            resolution_level: 2,
            language: "en".to_owned(),
            scale: ResolutionScale::default(),
        }
    }
}

impl EngineConfig {
    /// The lifespan clamped to its allowed bounds.
    pub fn clamped_lifespan(&self) -> u32 {
        self.lifespan.clamp(MIN_LIFESPAN, MAX_LIFESPAN)
    }

    /// Pixel size for the current resolution level.
    pub fn px(&self) -> f32 {
        self.scale.px(self.resolution_level)
    }
}
