//! # Event Normalizer
//!
//! Translates [`RawEvent`]s into [`InputEvent`]s, applying the mapping's
//! button and hat renames so the rest of the core only sees canonical names.
//!
//! ## Hats
//!
//! A hat reports one position at a time, and a diagonal push usually passes
//! through one of its orthogonal neighbours on the way in or out. The
//! normalizer remembers every position visited since the hat left center and,
//! when it centers, reports the symbols the push contributes:
//!
//! - a diagonal whose symbol appears in a chord rule is authoritative and
//!   absorbs its two orthogonal components;
//! - a diagonal no rule mentions is split into its orthogonal components.
//!
//! Either way a single diagonal push never yields three symbols.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use super::event::{HatDirection, InputEvent, RawEvent};
use crate::grammar::{InputId, Mapping};

/// Per-device translator from raw ids to canonical names.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    mapping: Arc<Mapping>,
    hats: HashMap<u16, Vec<HatDirection>>,
}

impl EventNormalizer {
    #[must_use]
    pub fn new(mapping: Arc<Mapping>) -> Self {
        Self {
            mapping,
            hats: HashMap::new(),
        }
    }

    /// Normalizes one raw event.
    pub fn normalize(&mut self, event: RawEvent) -> InputEvent {
        match event {
            RawEvent::Axis { axis, value } => InputEvent::AxisSample { axis, value },
            RawEvent::Button { button, pressed } => InputEvent::ButtonEdge {
                name: self.mapping.alias(InputId::Button(button)),
                pressed,
            },
            RawEvent::Hat { hat, direction } => self.normalize_hat(hat, direction),
            RawEvent::DeviceRemoved => {
                self.hats.clear();
                InputEvent::DeviceLost
            }
        }
    }

    /// Forgets hat history.
    pub fn reset(&mut self) {
        self.hats.clear();
    }

    fn normalize_hat(&mut self, hat: u16, direction: HatDirection) -> InputEvent {
        let name = self.mapping.alias(InputId::Hat(hat));

        if direction == HatDirection::Centered {
            let visited = self.hats.remove(&hat).unwrap_or_default();
            let symbols = self.push_symbols(&name, &visited);
            trace!("Hat {} centered after {:?}, contributing {:?}", name, visited, symbols);
            return InputEvent::HatCentered { name, symbols };
        }

        let visited = self.hats.entry(hat).or_default();
        if visited.last() != Some(&direction) {
            visited.push(direction);
        }
        InputEvent::HatMoved { name, direction }
    }

    /// Symbols contributed by one push of a hat.
    fn push_symbols(&self, name: &str, visited: &[HatDirection]) -> Vec<String> {
        let mut kept = Vec::with_capacity(visited.len());
        let mut absorbed = HashSet::new();

        for &direction in visited {
            match direction.components() {
                Some(parts) if self.mapping.references_symbol(&hat_symbol(name, direction)) => {
                    kept.push(direction);
                    absorbed.extend(parts);
                }
                Some(parts) => kept.extend(parts),
                None => kept.push(direction),
            }
        }

        let mut seen = HashSet::new();
        kept.into_iter()
            .filter(|direction| !absorbed.contains(direction))
            .filter(|direction| seen.insert(*direction))
            .map(|direction| hat_symbol(name, direction))
            .collect()
    }
}

/// `name` plus the direction suffix, e.g. `dpadur`.
fn hat_symbol(name: &str, direction: HatDirection) -> String {
    format!("{}{}", name, direction.suffix().unwrap_or_default())
}
