//! # Gesture Tracker
//!
//! Per-stick ordered segment history.
//!
//! Each stick moves through `at rest → in motion → resolved → at rest`.
//! While in motion, every newly entered segment is appended to the stick's
//! path; re-entering the segment the path already ends in is a no-op, so a
//! slow sweep produces a clean path. When the stick returns to rest, the path
//! is resolved against the ordered rules and cleared.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::quantizer::quantize;
use crate::grammar::{Mapping, Stick};

/// Outcome of resolving a stick's path once it is back at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The stick never left the dead zone.
    Idle,
    /// The path matched an ordered rule; these are its output keys.
    Matched(Vec<String>),
    /// No rule matched; the path's symbols fall through to chord matching.
    Unmatched(Vec<String>),
}

/// Ordered segment paths for every stick of one device.
#[derive(Debug, Default, Clone)]
pub struct GestureTracker {
    paths: HashMap<String, Vec<String>>,
}

impl GestureTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantizes a sample for `stick` and records the segment it lands in.
    ///
    /// Returns the symbol if it was appended to the path.
    pub fn observe(&mut self, stick: &Stick, dead_zone: f64, x: f64, y: f64) -> Option<&str> {
        let index = quantize(
            dead_zone,
            stick.offset_degrees(),
            stick.segment_count(),
            x,
            y,
        )?;
        self.push(stick.name(), stick.segment_symbol(index))
    }

    /// Appends `symbol` to the stick's path unless it repeats the last one.
    pub fn push(&mut self, stick: &str, symbol: String) -> Option<&str> {
        let path = self.paths.entry(stick.to_string()).or_default();
        if path.last() == Some(&symbol) {
            return None;
        }
        trace!("Stick {} entered {}", stick, symbol);
        path.push(symbol);
        path.last().map(String::as_str)
    }

    /// The path collected for `stick` since it left rest.
    #[must_use]
    pub fn path(&self, stick: &str) -> &[String] {
        self.paths.get(stick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolves and clears the path of a stick that returned to rest.
    pub fn resolve(&mut self, stick: &str, mapping: &Mapping) -> Resolution {
        let path = match self.paths.get_mut(stick) {
            Some(path) if !path.is_empty() => std::mem::take(path),
            _ => return Resolution::Idle,
        };

        match mapping.ordered_keys(&path) {
            Some(keys) => {
                debug!("Stick gesture {:?} matched {:?}", path, keys);
                Resolution::Matched(keys.to_vec())
            }
            None => {
                debug!("Stick gesture {:?} has no ordered rule", path);
                Resolution::Unmatched(path)
            }
        }
    }

    /// Drops every path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = "\
left stick has segments (dr,d,dl,ul,u,ur) on axes 0 and 1 offset by 0 degrees
right stick has segments (r,d,l,u) on axes 3 and 4 offset by -45 degrees
left(d,dl,ul,dl) -> TW-
";

    fn mapping() -> Mapping {
        Mapping::parse(MAPPING)
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Full deflection at `degrees` (y grows downward).
    fn at(degrees: f64) -> (f64, f64) {
        let radians = degrees.to_radians();
        (radians.cos(), radians.sin())
    }

    #[test]
    fn test_push_collapses_repeats() {
        let mut tracker = GestureTracker::new();
        for symbol in ["d", "d", "dl", "dl", "d"] {
            tracker.push("left", symbol.to_string());
        }
        assert_eq!(tracker.path("left"), strings(&["d", "dl", "d"]).as_slice());
    }

    #[test]
    fn test_repeated_symbol_never_grows_path() {
        let mut tracker = GestureTracker::new();
        assert!(tracker.push("left", "leftd".to_string()).is_some());
        for _ in 0..10 {
            assert!(tracker.push("left", "leftd".to_string()).is_none());
        }
        assert_eq!(tracker.path("left").len(), 1);
    }

    #[test]
    fn test_observe_qualifies_with_stick_name() {
        let mapping = mapping();
        let stick = &mapping.sticks()["left"];
        let mut tracker = GestureTracker::new();

        let (x, y) = at(90.0);
        assert_eq!(tracker.observe(stick, 0.6, x, y), Some("leftd"));
        assert_eq!(tracker.path("left"), strings(&["leftd"]).as_slice());
    }

    #[test]
    fn test_observe_ignores_dead_zone() {
        let mapping = mapping();
        let stick = &mapping.sticks()["left"];
        let mut tracker = GestureTracker::new();

        assert_eq!(tracker.observe(stick, 0.6, 0.2, 0.2), None);
        assert!(tracker.path("left").is_empty());
    }

    #[test]
    fn test_slow_sweep_produces_clean_path() {
        let mapping = mapping();
        let stick = &mapping.sticks()["left"];
        let mut tracker = GestureTracker::new();

        // Many samples per segment, sweeping from 70 to 220 degrees
        let mut degrees = 70.0;
        while degrees <= 220.0 {
            let (x, y) = at(degrees);
            tracker.observe(stick, 0.6, x, y);
            degrees += 2.0;
        }

        assert_eq!(
            tracker.path("left"),
            strings(&["leftd", "leftdl", "leftul"]).as_slice()
        );
    }

    #[test]
    fn test_resolve_matched_clears_path() {
        let mapping = mapping();
        let mut tracker = GestureTracker::new();
        for symbol in ["leftd", "leftdl", "leftul", "leftdl"] {
            tracker.push("left", symbol.to_string());
        }

        assert_eq!(
            tracker.resolve("left", &mapping),
            Resolution::Matched(strings(&["T-", "W-"]))
        );
        assert!(tracker.path("left").is_empty());
    }

    #[test]
    fn test_resolve_unmatched_returns_symbols() {
        let mapping = mapping();
        let mut tracker = GestureTracker::new();
        tracker.push("left", "leftd".to_string());
        tracker.push("left", "leftdl".to_string());

        assert_eq!(
            tracker.resolve("left", &mapping),
            Resolution::Unmatched(strings(&["leftd", "leftdl"]))
        );
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_resolve_idle() {
        let mapping = mapping();
        let mut tracker = GestureTracker::new();
        assert_eq!(tracker.resolve("left", &mapping), Resolution::Idle);
        assert_eq!(tracker.resolve("unknown", &mapping), Resolution::Idle);
    }

    #[test]
    fn test_sticks_are_independent() {
        let mapping = mapping();
        let mut tracker = GestureTracker::new();
        tracker.push("left", "leftd".to_string());
        tracker.push("right", "rightu".to_string());

        assert_eq!(
            tracker.resolve("right", &mapping),
            Resolution::Unmatched(strings(&["rightu"]))
        );
        assert_eq!(tracker.path("left"), strings(&["leftd"]).as_slice());
    }

    #[test]
    fn test_clear() {
        let mut tracker = GestureTracker::new();
        tracker.push("left", "leftd".to_string());
        tracker.clear();
        assert!(tracker.is_empty());
    }
}
