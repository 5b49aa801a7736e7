//! # Recognition Engine
//!
//! Turns one device's event stream into steno strokes.
//!
//! This module handles:
//! - Normalizing raw events and applying renames
//! - Quantizing stick samples into segments
//! - Tracking ordered stick gestures and unordered chords
//! - Deciding when a stroke is complete
//!
//! ## Stroke Completion
//!
//! A stroke completes once something is pending and every source is back at
//! rest: all stick axes at or below the stroke-end threshold, every trigger
//! at zero, and no button or hat held. Nothing is ever flushed on a timer.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use steno_stick::engine::{Engine, EngineSettings, RawEvent};
//! use steno_stick::grammar::Mapping;
//!
//! let mapping = Arc::new(Mapping::parse("button 0 is a\na -> -Z\n"));
//! let mut engine = Engine::new(mapping, EngineSettings::default());
//!
//! assert!(engine.handle(RawEvent::Button { button: 0, pressed: true }).is_none());
//! let stroke = engine.handle(RawEvent::Button { button: 0, pressed: false }).unwrap();
//! assert_eq!(stroke.to_string(), "-Z");
//! ```

pub mod event;
pub mod normalizer;
pub mod quantizer;
pub mod stroke;
pub mod tracker;

pub use event::{DeviceEvent, DeviceId, HatDirection, InputEvent, RawEvent};
pub use normalizer::EventNormalizer;
pub use quantizer::quantize;
pub use stroke::{resolve_unordered, Stroke};
pub use tracker::{GestureTracker, Resolution};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::grammar::{InputId, Mapping, Stick};

/// Default stick dead zone (before the sqrt(2) scaling).
pub const DEFAULT_STICK_DEAD_ZONE: f64 = 0.6;

/// Default magnitude at or below which a stick axis is at rest.
pub const DEFAULT_STROKE_END_THRESHOLD: f64 = 0.4;

/// Numeric tuning for one engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Segment detection sensitivity, a fraction scaled by sqrt(2).
    pub stick_dead_zone: f64,
    /// Stick axes at or below this magnitude count as at rest.
    pub stroke_end_threshold: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stick_dead_zone: DEFAULT_STICK_DEAD_ZONE,
            stroke_end_threshold: DEFAULT_STROKE_END_THRESHOLD,
        }
    }
}

/// Mutable recognition state of one device.
///
/// Per-stroke accumulators are cleared together when a stroke completes;
/// everything is cleared when the device goes away.
#[derive(Debug, Default, Clone)]
pub struct EngineState {
    stick_axis_values: HashMap<u16, f64>,
    trigger_axis_values: HashMap<u16, f64>,
    pressed: HashSet<String>,
    unsequenced_symbols: HashSet<String>,
    pending_keys: BTreeSet<String>,
    paths: GestureTracker,
}

impl EngineState {
    pub fn stick_axis_value(&self, axis: u16) -> f64 {
        self.stick_axis_values.get(&axis).copied().unwrap_or(0.0)
    }

    pub fn trigger_axis_value(&self, axis: u16) -> f64 {
        self.trigger_axis_values.get(&axis).copied().unwrap_or(0.0)
    }

    /// Buttons and hats currently held.
    pub fn pressed(&self) -> &HashSet<String> {
        &self.pressed
    }

    /// Symbols waiting for chord resolution.
    pub fn unsequenced_symbols(&self) -> &HashSet<String> {
        &self.unsequenced_symbols
    }

    /// Keys already resolved from stick gestures.
    pub fn pending_keys(&self) -> &BTreeSet<String> {
        &self.pending_keys
    }

    /// Segment path collected for a stick.
    pub fn stick_path(&self, stick: &str) -> &[String] {
        self.paths.path(stick)
    }

    /// Whether nothing is waiting to be emitted.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.unsequenced_symbols.is_empty() && self.pending_keys.is_empty() && self.paths.is_empty()
    }

    fn clear_stroke(&mut self) {
        self.unsequenced_symbols.clear();
        self.pending_keys.clear();
        self.paths.clear();
    }
}

/// Recognition engine for a single device.
///
/// Not thread-safe; feed one device's events in the order the device
/// produced them. Use one engine per device.
#[derive(Debug, Clone)]
pub struct Engine {
    mapping: Arc<Mapping>,
    settings: EngineSettings,
    normalizer: EventNormalizer,
    state: EngineState,
}

impl Engine {
    #[must_use]
    pub fn new(mapping: Arc<Mapping>, settings: EngineSettings) -> Self {
        Self {
            normalizer: EventNormalizer::new(Arc::clone(&mapping)),
            mapping,
            settings,
            state: EngineState::default(),
        }
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Processes a raw device event, returning a stroke if one completed.
    pub fn handle(&mut self, event: RawEvent) -> Option<Stroke> {
        let event = self.normalizer.normalize(event);
        self.handle_input(event)
    }

    /// Processes an already-normalized event.
    pub fn handle_input(&mut self, event: InputEvent) -> Option<Stroke> {
        match event {
            InputEvent::AxisSample { axis, value } => self.axis_sample(axis, value),
            InputEvent::ButtonEdge { name, pressed } => self.button_edge(name, pressed),
            InputEvent::HatMoved { name, direction } => {
                trace!("Hat {} moved {:?}", name, direction);
                self.state.pressed.insert(name);
            }
            InputEvent::HatCentered { name, symbols } => {
                self.state.pressed.remove(&name);
                self.state.unsequenced_symbols.extend(symbols);
            }
            InputEvent::DeviceLost => {
                self.reset();
                return None;
            }
        }

        self.maybe_complete_stroke()
    }

    /// Clears all state without emitting anything.
    pub fn reset(&mut self) {
        if !self.state.is_idle() {
            debug!("Discarding unfinished stroke");
        }
        self.state = EngineState::default();
        self.normalizer.reset();
    }

    fn axis_sample(&mut self, axis: u16, value: f64) {
        if let Some(trigger) = self.mapping.trigger_for_axis(axis) {
            self.state.trigger_axis_values.insert(axis, value);
            if value > 0.0 {
                self.state.unsequenced_symbols.insert(trigger.name.clone());
            }
        } else if self.mapping.is_stick_axis(axis) {
            self.state.stick_axis_values.insert(axis, value);
            let mapping = Arc::clone(&self.mapping);
            for stick in mapping.sticks_for_axis(axis) {
                let x = self.state.stick_axis_value(stick.x_axis());
                let y = self.state.stick_axis_value(stick.y_axis());
                self.state
                    .paths
                    .observe(stick, self.settings.stick_dead_zone, x, y);
            }
        } else {
            trace!("Ignoring undeclared axis {}", InputId::Axis(axis));
            return;
        }

        self.resolve_resting_sticks();
    }

    fn button_edge(&mut self, name: String, pressed: bool) {
        if pressed {
            self.state.unsequenced_symbols.insert(name.clone());
            self.state.pressed.insert(name);
        } else {
            self.state.pressed.remove(&name);
        }
    }

    /// Resolves the path of every stick currently at rest.
    fn resolve_resting_sticks(&mut self) {
        let mapping = Arc::clone(&self.mapping);
        for stick in mapping.sticks().values() {
            if !self.stick_at_rest(stick) {
                continue;
            }
            match self.state.paths.resolve(stick.name(), &mapping) {
                Resolution::Idle => {}
                Resolution::Matched(keys) => self.state.pending_keys.extend(keys),
                Resolution::Unmatched(symbols) => self.state.unsequenced_symbols.extend(symbols),
            }
        }
    }

    fn stick_at_rest(&self, stick: &Stick) -> bool {
        let threshold = self.settings.stroke_end_threshold;
        [stick.x_axis(), stick.y_axis()]
            .iter()
            .all(|&axis| self.state.stick_axis_value(axis).abs() <= threshold)
    }

    /// Emits the pending stroke if every source is back at rest.
    ///
    /// Idempotent; returns `None` when nothing is pending, a source is still
    /// active, or the resolved stroke is empty.
    pub fn maybe_complete_stroke(&mut self) -> Option<Stroke> {
        if self.state.unsequenced_symbols.is_empty() && self.state.pending_keys.is_empty() {
            return None;
        }

        let threshold = self.settings.stroke_end_threshold;
        if self
            .state
            .stick_axis_values
            .values()
            .any(|value| value.abs() > threshold)
        {
            return None;
        }
        if self.state.trigger_axis_values.values().any(|&value| value > 0.0) {
            return None;
        }
        if !self.state.pressed.is_empty() {
            return None;
        }

        let mut keys = resolve_unordered(
            &self.state.unsequenced_symbols,
            self.mapping.unordered_mappings(),
        );
        keys.extend(std::mem::take(&mut self.state.pending_keys));
        self.state.clear_stroke();

        if keys.is_empty() {
            debug!("Stroke resolved to no keys");
            return None;
        }

        let stroke = Stroke::from_keys(keys);
        debug!("Stroke complete: {}", stroke);
        Some(stroke)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIX_SEGMENT_MAPPING: &str = "\
left stick has segments (dr,d,dl,ul,u,ur) on axes 0 and 1 offset by 0 degrees
right stick has segments (r,d,l,u) on axes 3 and 4 offset by -45 degrees
trigger on axis 2 is lt
button 0 is a
button 1 is b
hat 0 is dpad
left(d,dl,ul,dl) -> TW-
right(u) -> -F
a,b -> KWR-
a -> -Z
b -> -D
lt -> S-
leftd -> H-
rightr -> -P
dpadu -> -G
";

    fn engine() -> Engine {
        Engine::new(
            Arc::new(Mapping::parse(SIX_SEGMENT_MAPPING)),
            EngineSettings::default(),
        )
    }

    fn axis(axis: u16, value: f64) -> RawEvent {
        RawEvent::Axis { axis, value }
    }

    fn button(button: u16, pressed: bool) -> RawEvent {
        RawEvent::Button { button, pressed }
    }

    /// Feeds a stick to full deflection at `degrees` (y grows downward).
    fn move_stick(engine: &mut Engine, x_axis: u16, y_axis: u16, degrees: f64) -> Vec<Stroke> {
        let radians = degrees.to_radians();
        [
            engine.handle(axis(x_axis, radians.cos())),
            engine.handle(axis(y_axis, radians.sin())),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn release_stick(engine: &mut Engine, x_axis: u16, y_axis: u16) -> Vec<Stroke> {
        [engine.handle(axis(x_axis, 0.0)), engine.handle(axis(y_axis, 0.0))]
            .into_iter()
            .flatten()
            .collect()
    }

    fn stroke(keys: &[&str]) -> Stroke {
        Stroke::from_keys(keys.iter().copied())
    }

    // ==================== Button Tests ====================

    #[test]
    fn test_button_press_release_emits_once() {
        let mut engine = engine();
        assert_eq!(engine.handle(button(0, true)), None);
        assert_eq!(engine.handle(button(0, false)), Some(stroke(&["-Z"])));
        assert_eq!(engine.maybe_complete_stroke(), None);
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_no_stroke_while_button_held() {
        let mut engine = engine();
        engine.handle(button(0, true));
        engine.handle(button(1, true));
        assert_eq!(engine.handle(button(0, false)), None);
        assert_eq!(engine.handle(button(1, false)), Some(stroke(&["K-", "W-", "R-"])));
    }

    #[test]
    fn test_chord_precedence_through_engine() {
        let mut engine = engine();
        engine.handle(button(1, true));
        assert_eq!(engine.handle(button(1, false)), Some(stroke(&["-D"])));
    }

    #[test]
    fn test_unmapped_button_produces_nothing() {
        let mut engine = engine();
        engine.handle(button(9, true));
        assert_eq!(engine.handle(button(9, false)), None);
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_raw_id_rule() {
        let mapping = Arc::new(Mapping::parse("b4 -> -T"));
        let mut engine = Engine::new(mapping, EngineSettings::default());
        engine.handle(button(4, true));
        assert_eq!(engine.handle(button(4, false)), Some(stroke(&["-T"])));
    }

    #[test]
    fn test_release_without_press_is_noop() {
        let mut engine = engine();
        assert_eq!(engine.handle(button(0, false)), None);
    }

    // ==================== Stick Tests ====================

    #[test]
    fn test_ordered_gesture_emits_on_rest() {
        let mut engine = engine();
        let mut strokes = Vec::new();
        for degrees in [90.0, 150.0, 210.0, 150.0] {
            strokes.extend(move_stick(&mut engine, 0, 1, degrees));
        }
        assert!(strokes.is_empty());
        assert_eq!(
            engine.state().stick_path("left"),
            ["leftd", "leftdl", "leftul", "leftdl"]
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .as_slice()
        );

        strokes.extend(release_stick(&mut engine, 0, 1));
        assert_eq!(strokes, vec![stroke(&["T-", "W-"])]);
        assert_eq!(engine.maybe_complete_stroke(), None);
    }

    #[test]
    fn test_unmatched_gesture_falls_back_to_chords() {
        let mut engine = engine();
        move_stick(&mut engine, 0, 1, 90.0);
        let strokes = release_stick(&mut engine, 0, 1);
        assert_eq!(strokes, vec![stroke(&["H-"])]);
    }

    #[test]
    fn test_unmatched_gesture_without_chord_is_dropped() {
        let mut engine = engine();
        move_stick(&mut engine, 0, 1, 270.0);
        assert!(release_stick(&mut engine, 0, 1).is_empty());
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_small_motion_inside_dead_zone_is_ignored() {
        let mut engine = engine();
        // Above the stroke-end threshold but inside the scaled dead zone
        engine.handle(axis(0, 0.7));
        assert!(engine.state().stick_path("left").is_empty());
        assert_eq!(engine.handle(axis(0, 0.0)), None);
    }

    #[test]
    fn test_stick_blocks_completion_until_rest() {
        let mut engine = engine();
        engine.handle(button(0, true));
        move_stick(&mut engine, 0, 1, 90.0);
        assert_eq!(engine.handle(button(0, false)), None);
        // Still outside the stroke-end threshold on one axis
        assert_eq!(engine.handle(axis(0, 0.0)), None);
        assert_eq!(engine.handle(axis(1, 0.45)), None);
        assert_eq!(engine.handle(axis(1, 0.4)), Some(stroke(&["-Z", "H-"])));
    }

    #[test]
    fn test_two_sticks_resolve_independently() {
        let mut engine = engine();
        move_stick(&mut engine, 0, 1, 90.0);
        // Right stick up: atan2 gives 270 degrees, segment "u"
        move_stick(&mut engine, 3, 4, 270.0);

        // Right stick returns first; left is still deflected
        assert!(release_stick(&mut engine, 3, 4).is_empty());
        assert!(engine.state().stick_path("right").is_empty());
        assert!(engine.state().pending_keys().contains("-F"));
        assert_eq!(engine.state().stick_path("left").len(), 1);

        let strokes = release_stick(&mut engine, 0, 1);
        assert_eq!(strokes, vec![stroke(&["-F", "H-"])]);
    }

    #[test]
    fn test_sticks_sharing_an_axis_both_observe() {
        let mapping = Mapping::parse(
            "\
a stick has segments (r,d,l,u) on axes 0 and 1 offset by -45 degrees
b stick has segments (r,d,l,u) on axes 1 and 2 offset by -45 degrees
",
        );
        let mut engine = Engine::new(Arc::new(mapping), EngineSettings::default());

        assert_eq!(engine.handle(axis(1, 1.0)), None);
        // Axis 1 is y for stick a and x for stick b
        assert_eq!(engine.state().stick_path("a"), ["d".to_string()]);
        assert_eq!(engine.state().stick_path("b"), ["r".to_string()]);
    }

    #[test]
    fn test_stick_and_button_combine() {
        let mut engine = engine();
        engine.handle(button(0, true));
        for degrees in [90.0, 150.0, 210.0, 150.0] {
            move_stick(&mut engine, 0, 1, degrees);
        }
        release_stick(&mut engine, 0, 1);
        assert_eq!(engine.handle(button(0, false)), Some(stroke(&["T-", "W-", "-Z"])));
    }

    #[test]
    fn test_undeclared_axis_ignored() {
        let mut engine = engine();
        assert_eq!(engine.handle(axis(7, 1.0)), None);
        assert!(engine.state().is_idle());
        engine.handle(button(0, true));
        // Undeclared axis never blocks completion
        assert_eq!(engine.handle(button(0, false)), Some(stroke(&["-Z"])));
    }

    // ==================== Trigger Tests ====================

    #[test]
    fn test_trigger_blocks_until_released() {
        let mut engine = engine();
        assert_eq!(engine.handle(axis(2, 0.3)), None);
        assert!(engine.state().unsequenced_symbols().contains("lt"));
        assert_eq!(engine.handle(axis(2, 0.9)), None);
        assert_eq!(engine.handle(axis(2, 0.0)), Some(stroke(&["S-"])));
    }

    #[test]
    fn test_trigger_at_zero_contributes_nothing() {
        let mut engine = engine();
        assert_eq!(engine.handle(axis(2, 0.0)), None);
        assert!(engine.state().is_idle());
    }

    // ==================== Hat Tests ====================

    #[test]
    fn test_hat_push_emits_on_center() {
        let mut engine = engine();
        let up = RawEvent::Hat { hat: 0, direction: HatDirection::Up };
        let center = RawEvent::Hat { hat: 0, direction: HatDirection::Centered };

        assert_eq!(engine.handle(up), None);
        assert!(engine.state().pressed().contains("dpad"));
        assert_eq!(engine.handle(center), Some(stroke(&["-G"])));
    }

    #[test]
    fn test_hat_held_blocks_button_stroke() {
        let mut engine = engine();
        engine.handle(RawEvent::Hat { hat: 0, direction: HatDirection::Up });
        engine.handle(button(0, true));
        assert_eq!(engine.handle(button(0, false)), None);
        assert_eq!(
            engine.handle(RawEvent::Hat { hat: 0, direction: HatDirection::Centered }),
            Some(stroke(&["-G", "-Z"]))
        );
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn test_device_lost_discards_gesture() {
        let mut engine = engine();
        engine.handle(button(0, true));
        move_stick(&mut engine, 0, 1, 90.0);
        assert_eq!(engine.handle(RawEvent::DeviceRemoved), None);
        assert!(engine.state().is_idle());
        assert!(engine.state().pressed().is_empty());
        assert_eq!(engine.state().stick_axis_value(0), 0.0);
        assert_eq!(engine.maybe_complete_stroke(), None);
    }

    #[test]
    fn test_state_persists_across_strokes() {
        let mut engine = engine();
        engine.handle(button(0, true));
        assert!(engine.handle(button(0, false)).is_some());
        engine.handle(button(1, true));
        assert_eq!(engine.handle(button(1, false)), Some(stroke(&["-D"])));
    }

    #[test]
    fn test_maybe_complete_stroke_idle_is_noop() {
        let mut engine = engine();
        for _ in 0..3 {
            assert_eq!(engine.maybe_complete_stroke(), None);
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = EngineSettings::default();
        assert_eq!(settings.stick_dead_zone, 0.6);
        assert_eq!(settings.stroke_end_threshold, 0.4);
    }
}
