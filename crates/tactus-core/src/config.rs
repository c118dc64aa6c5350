//! Configuration for recognizers and arenas.
//!
//! Everything here deserializes with serde so a host can ship gesture setups
//! as TOML. A [`GestureProfile`] describes an arena plus named recognizers and
//! the relations between them:
//!
//! ```toml
//! [arena]
//! end_grace_seconds = 0.001
//! device = { unit_multiplier = 326.0 }
//!
//! [[gestures]]
//! name = "double-tap"
//! gesture = { kind = "tap", number_of_taps_required = 2 }
//!
//! [[gestures]]
//! name = "tap"
//! gesture = { kind = "tap" }
//! require_failure_of = ["double-tap"]
//! ```

use crate::arena::{GestureArena, GestureId};
use crate::device::DeviceInfo;
use crate::error::{GestureError, Result};
use crate::gestures::{
    LongPressConfig, LongPressGesture, OneTouchRotateConfig, OneTouchRotateGesture,
    OneTouchScaleConfig, OneTouchScaleGesture, PanConfig, PanGesture, RotateConfig,
    RotateGesture, ScaleConfig, ScaleGesture, SwipeConfig, SwipeGesture, TapConfig, TapGesture,
};
use crate::recognizer::{GestureKind, GestureRecognizer, RecognizerCore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Name that stands for every gesture in `simultaneous_with`.
pub const ALL_GESTURES: &str = "*";

/// Default time a just-ended recognizer stays in the active registry.
pub const DEFAULT_END_GRACE_SECONDS: f32 = 0.001;

/// Options shared by every recognizer kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerOptions {
    /// Fewest touches the gesture needs.
    pub min_touches: usize,
    /// Most touches the gesture tracks.
    pub max_touches: usize,
    /// Drop tracked touches when the gesture ends or fails.
    pub clear_tracked_touches_on_end_or_fail: bool,
    /// Fully reset after ending.
    pub reset_on_end: bool,
    /// Let recognizers on different views run together unconditionally.
    pub allow_simultaneous_if_views_differ: bool,
    /// Scale applied to pixel lengths before unit conversion.
    pub view_scale: f32,
}

impl RecognizerOptions {
    /// Default options with a touch range.
    #[must_use]
    pub fn with_touches(min_touches: usize, max_touches: usize) -> Self {
        Self {
            min_touches,
            max_touches,
            ..Self::default()
        }
        .normalized()
    }

    /// Clamp touch counts to at least one with `min <= max`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.min_touches = self.min_touches.max(1);
        self.max_touches = self.max_touches.max(self.min_touches);
        self
    }
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            min_touches: 1,
            max_touches: 1,
            clear_tracked_touches_on_end_or_fail: false,
            reset_on_end: true,
            allow_simultaneous_if_views_differ: true,
            view_scale: 1.0,
        }
    }
}

/// Partial [`RecognizerOptions`] applied over a kind's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerOverrides {
    /// See [`RecognizerOptions::min_touches`].
    pub min_touches: Option<usize>,
    /// See [`RecognizerOptions::max_touches`].
    pub max_touches: Option<usize>,
    /// See [`RecognizerOptions::clear_tracked_touches_on_end_or_fail`].
    pub clear_tracked_touches_on_end_or_fail: Option<bool>,
    /// See [`RecognizerOptions::reset_on_end`].
    pub reset_on_end: Option<bool>,
    /// See [`RecognizerOptions::allow_simultaneous_if_views_differ`].
    pub allow_simultaneous_if_views_differ: Option<bool>,
    /// See [`RecognizerOptions::view_scale`].
    pub view_scale: Option<f32>,
}

impl RecognizerOverrides {
    /// Apply the present fields to `core`.
    pub fn apply(&self, core: &mut RecognizerCore) {
        if let Some(max) = self.max_touches {
            core.set_max_touches(max);
        }
        if let Some(min) = self.min_touches {
            core.set_min_touches(min);
        }
        if let Some(clear) = self.clear_tracked_touches_on_end_or_fail {
            core.set_clear_tracked_touches_on_end_or_fail(clear);
        }
        if let Some(reset) = self.reset_on_end {
            core.set_reset_on_end(reset);
        }
        if let Some(allow) = self.allow_simultaneous_if_views_differ {
            core.set_allow_simultaneous_if_views_differ(allow);
        }
        if let Some(scale) = self.view_scale {
            core.set_view_scale(scale);
        }
    }
}

/// Arena-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Seconds a just-ended recognizer stays in the active registry.
    pub end_grace_seconds: f32,
    /// Pixel to unit conversion.
    pub device: DeviceInfo,
}

impl ArenaConfig {
    /// Grace period as a duration; invalid values fall back to the default.
    #[must_use]
    pub fn end_grace_period(&self) -> Duration {
        Duration::try_from_secs_f32(self.end_grace_seconds)
            .or_else(|_| Duration::try_from_secs_f32(DEFAULT_END_GRACE_SECONDS))
            .unwrap_or_default()
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            end_grace_seconds: DEFAULT_END_GRACE_SECONDS,
            device: DeviceInfo::default(),
        }
    }
}

/// Kind and kind-specific configuration of a profile entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GestureConfig {
    /// Tap recognizer.
    Tap(TapConfig),
    /// Long-press recognizer.
    LongPress(LongPressConfig),
    /// Pan recognizer.
    Pan(PanConfig),
    /// Two-finger scale recognizer.
    Scale(ScaleConfig),
    /// One-finger scale recognizer.
    OneTouchScale(OneTouchScaleConfig),
    /// Two-finger rotate recognizer.
    Rotate(RotateConfig),
    /// One-finger rotate recognizer.
    OneTouchRotate(OneTouchRotateConfig),
    /// Swipe recognizer.
    Swipe(SwipeConfig),
}

impl From<GestureConfig> for GestureKind {
    fn from(config: GestureConfig) -> Self {
        match config {
            GestureConfig::Tap(c) => TapGesture::with_config(c).into(),
            GestureConfig::LongPress(c) => LongPressGesture::with_config(c).into(),
            GestureConfig::Pan(c) => PanGesture::with_config(c).into(),
            GestureConfig::Scale(c) => ScaleGesture::with_config(c).into(),
            GestureConfig::OneTouchScale(c) => OneTouchScaleGesture::with_config(c).into(),
            GestureConfig::Rotate(c) => RotateGesture::with_config(c).into(),
            GestureConfig::OneTouchRotate(c) => OneTouchRotateGesture::with_config(c).into(),
            GestureConfig::Swipe(c) => SwipeGesture::with_config(c).into(),
        }
    }
}

/// One named recognizer in a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureEntry {
    /// Unique name, also used as the recognizer label.
    pub name: String,
    /// What to recognize.
    pub gesture: GestureConfig,
    /// Overrides of the kind's default options.
    #[serde(default)]
    pub options: RecognizerOverrides,
    /// Entries allowed to run at the same time, or `"*"` for all.
    #[serde(default)]
    pub simultaneous_with: Vec<String>,
    /// Entries that must fail before this one may end.
    #[serde(default)]
    pub require_failure_of: Vec<String>,
}

impl GestureEntry {
    /// Build the recognizer described by this entry.
    #[must_use]
    pub fn build(&self) -> GestureRecognizer {
        let mut recognizer =
            GestureRecognizer::new(GestureKind::from(self.gesture.clone())).with_label(&self.name);
        self.options.apply(recognizer.core_mut());
        recognizer
    }
}

/// An arena configuration plus named recognizers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureProfile {
    /// Arena-wide settings.
    pub arena: ArenaConfig,
    /// Recognizers in registration order.
    pub gestures: Vec<GestureEntry>,
}

impl GestureProfile {
    /// Parse a profile from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Add every entry to `arena` in order, then wire relations.
    ///
    /// Entry names and relation names are validated before anything is
    /// added.
    pub fn install(&self, arena: &mut GestureArena) -> Result<BTreeMap<String, GestureId>> {
        let mut seen = BTreeSet::new();
        if let Some(entry) = self.gestures.iter().find(|g| !seen.insert(g.name.as_str())) {
            return Err(GestureError::DuplicateProfileEntry(entry.name.clone()));
        }
        let known = |name: &String| self.gestures.iter().any(|g| &g.name == name);
        for entry in &self.gestures {
            let unknown = entry
                .simultaneous_with
                .iter()
                .filter(|n| n.as_str() != ALL_GESTURES)
                .chain(&entry.require_failure_of)
                .find(|n| !known(n));
            if let Some(name) = unknown {
                return Err(GestureError::UnknownProfileEntry(name.clone()));
            }
        }

        let mut ids = BTreeMap::new();
        for entry in &self.gestures {
            ids.insert(entry.name.clone(), arena.add(entry.build()));
        }
        for entry in &self.gestures {
            let id = ids[&entry.name];
            for peer in &entry.simultaneous_with {
                if peer == ALL_GESTURES {
                    arena.allow_simultaneous_with_all(id)?;
                } else {
                    arena.allow_simultaneous(id, ids[peer])?;
                }
            }
            for required in &entry.require_failure_of {
                arena.require_failure_of(id, ids[required])?;
            }
        }
        tracing::debug!(gestures = ids.len(), "installed gesture profile");
        Ok(ids)
    }
}
