//! # Mapping Grammar Module
//!
//! The textual mapping language and the [`Mapping`] model it produces.
//!
//! This module handles:
//! - Stick, trigger, button and hat declarations
//! - Ordered (stick gesture) and unordered (chord) rules
//! - Steno stroke notation conversion
//! - Alias resolution for raw input ids
//!
//! ## Example
//!
//! ```
//! use steno_stick::grammar::{InputId, Mapping};
//!
//! let mapping = Mapping::parse(
//!     "left stick has segments (dr,d,dl,ul,u,ur) on axes 0 and 1 offset by 0 degrees\n\
//!      button 0 is a\n\
//!      a -> -Z\n\
//!      left(d,dl) -> TW-\n",
//! );
//!
//! assert_eq!(mapping.sticks().len(), 1);
//! assert_eq!(mapping.alias(InputId::Button(0)), "a");
//! assert_eq!(mapping.alias(InputId::Button(9)), "b9");
//! ```

pub mod keys;
pub mod parser;

pub use keys::{keys_for_stroke, steno_notation};
pub use parser::{parse, Diagnostic, LineError, ParseOutcome};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;

use thiserror::Error;

/// Errors raised while building mapping model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A stick must have at least one segment.
    #[error("stick '{0}' declares no segments")]
    NoSegments(String),

    /// Segment symbols cannot be empty.
    #[error("stick '{0}' has an empty segment symbol")]
    EmptySegment(String),

    /// Both axes of a stick must differ.
    #[error("stick '{0}' uses axis {1} for both x and y")]
    SharedAxis(String, u16),
}

/// Raw identifier of a physical input, tagged by namespace.
///
/// The textual forms `aN`, `bN` and `hN` are what unaliased inputs are
/// called inside the recognition core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputId {
    /// Absolute axis (stick or trigger).
    Axis(u16),
    /// Digital button.
    Button(u16),
    /// Hat switch (d-pad).
    Hat(u16),
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputId::Axis(n) => write!(f, "a{n}"),
            InputId::Button(n) => write!(f, "b{n}"),
            InputId::Hat(n) => write!(f, "h{n}"),
        }
    }
}

/// An analog stick divided into equal angular segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Stick {
    name: String,
    x_axis: u16,
    y_axis: u16,
    offset_degrees: f64,
    segments: Vec<String>,
}

impl Stick {
    /// Creates a stick, rejecting declarations the quantizer cannot use.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] if `segments` is empty, contains an empty
    /// symbol, or both axes are the same.
    pub fn new(
        name: impl Into<String>,
        x_axis: u16,
        y_axis: u16,
        offset_degrees: f64,
        segments: Vec<String>,
    ) -> Result<Self, MappingError> {
        let name = name.into();
        if segments.is_empty() {
            return Err(MappingError::NoSegments(name));
        }
        if segments.iter().any(String::is_empty) {
            return Err(MappingError::EmptySegment(name));
        }
        if x_axis == y_axis {
            return Err(MappingError::SharedAxis(name, x_axis));
        }
        Ok(Self {
            name,
            x_axis,
            y_axis,
            offset_degrees,
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn x_axis(&self) -> u16 {
        self.x_axis
    }

    pub fn y_axis(&self) -> u16 {
        self.y_axis
    }

    pub fn offset_degrees(&self) -> f64 {
        self.offset_degrees
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; never zero.
    #[must_use]
    pub fn segment_count(&self) -> NonZeroUsize {
        // Stick::new guarantees at least one segment.
        NonZeroUsize::new(self.segments.len()).unwrap_or(NonZeroUsize::MIN)
    }

    /// Qualified symbol for a segment index, e.g. `leftdl`.
    #[must_use]
    pub fn segment_symbol(&self, index: usize) -> String {
        let segment = &self.segments[index % self.segments.len()];
        format!("{}{}", self.name, segment)
    }
}

/// An analog axis treated as a pressure-sensitive button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub name: String,
    pub axis: u16,
}

/// A rename of a button or hat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub id: InputId,
}

/// A chord rule: all `inputs` available at once produce `keys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnorderedRule {
    pub inputs: BTreeSet<String>,
    pub keys: Vec<String>,
}

/// Parsed mapping grammar.
///
/// Immutable once built; engines share it through an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    sticks: HashMap<String, Stick>,
    triggers: HashMap<u16, Trigger>,
    buttons_and_hats: HashMap<InputId, Alias>,
    unordered_mappings: Vec<UnorderedRule>,
    ordered_mappings: HashMap<Vec<String>, Vec<String>>,
    stick_axes: HashMap<u16, Vec<String>>,
    rule_symbols: HashSet<String>,
}

impl Mapping {
    /// Parses mapping text, logging and skipping lines it cannot understand.
    ///
    /// Use [`parse`] to inspect the diagnostics instead.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        parse(text).mapping
    }

    /// The mapping shipped with the crate, tuned for Xbox-layout pads.
    #[must_use]
    pub fn builtin() -> Self {
        Self::parse(DEFAULT_MAPPING)
    }

    pub fn sticks(&self) -> &HashMap<String, Stick> {
        &self.sticks
    }

    pub fn triggers(&self) -> &HashMap<u16, Trigger> {
        &self.triggers
    }

    pub fn buttons_and_hats(&self) -> &HashMap<InputId, Alias> {
        &self.buttons_and_hats
    }

    pub fn unordered_mappings(&self) -> &[UnorderedRule] {
        &self.unordered_mappings
    }

    pub fn ordered_mappings(&self) -> &HashMap<Vec<String>, Vec<String>> {
        &self.ordered_mappings
    }

    /// Canonical name for a raw input: its alias, or the raw id itself.
    #[must_use]
    pub fn alias(&self, id: InputId) -> String {
        match self.buttons_and_hats.get(&id) {
            Some(alias) => alias.name.clone(),
            None => id.to_string(),
        }
    }

    /// Every stick reading `axis`, in name order.
    pub fn sticks_for_axis(&self, axis: u16) -> impl Iterator<Item = &Stick> + '_ {
        self.stick_axes
            .get(&axis)
            .into_iter()
            .flatten()
            .filter_map(move |name| self.sticks.get(name))
    }

    /// Whether any stick reads `axis`.
    #[must_use]
    pub fn is_stick_axis(&self, axis: u16) -> bool {
        self.stick_axes.contains_key(&axis)
    }

    /// The trigger declared on `axis`, if any.
    #[must_use]
    pub fn trigger_for_axis(&self, axis: u16) -> Option<&Trigger> {
        self.triggers.get(&axis)
    }

    /// Whether any unordered rule lists `symbol` among its inputs.
    #[must_use]
    pub fn references_symbol(&self, symbol: &str) -> bool {
        self.rule_symbols.contains(symbol)
    }

    /// Output keys for an exact stick path.
    #[must_use]
    pub fn ordered_keys(&self, path: &[String]) -> Option<&[String]> {
        self.ordered_mappings.get(path).map(Vec::as_slice)
    }

    pub(crate) fn insert_stick(&mut self, stick: Stick) {
        self.sticks.insert(stick.name.clone(), stick);
    }

    pub(crate) fn insert_trigger(&mut self, trigger: Trigger) {
        self.triggers.insert(trigger.axis, trigger);
    }

    pub(crate) fn insert_alias(&mut self, alias: Alias) {
        self.buttons_and_hats.insert(alias.id, alias);
    }

    pub(crate) fn push_unordered(&mut self, rule: UnorderedRule) {
        self.unordered_mappings.push(rule);
    }

    pub(crate) fn insert_ordered(&mut self, path: Vec<String>, keys: Vec<String>) {
        self.ordered_mappings.insert(path, keys);
    }

    /// Rebuilds lookup indexes after declarations change.
    pub(crate) fn reindex(&mut self) {
        self.stick_axes.clear();
        for stick in self.sticks.values() {
            for axis in [stick.x_axis, stick.y_axis] {
                self.stick_axes
                    .entry(axis)
                    .or_default()
                    .push(stick.name.clone());
            }
        }
        for names in self.stick_axes.values_mut() {
            names.sort();
        }

        self.rule_symbols = self
            .unordered_mappings
            .iter()
            .flat_map(|rule| rule.inputs.iter().cloned())
            .collect();
    }
}

/// Mapping text bundled into the binary.
pub const DEFAULT_MAPPING: &str = include_str!("../../assets/default_mapping.txt");
