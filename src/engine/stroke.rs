//! # Stroke Assembly
//!
//! Chord resolution and the [`Stroke`] value emitted when a gesture cycle
//! completes.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::debug;

use crate::grammar::{steno_notation, UnorderedRule};

/// The keys produced by one completed gesture cycle.
///
/// # Examples
///
/// ```
/// use steno_stick::engine::Stroke;
///
/// let stroke = Stroke::from_keys(["W-", "T-"]);
/// assert!(stroke.contains("T-"));
/// assert_eq!(stroke.to_string(), "TW");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stroke {
    keys: BTreeSet<String>,
}

impl Stroke {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&steno_notation(self.keys()))
    }
}

/// Greedily resolves available symbols against chord rules.
///
/// Rules are tried in declaration order. A rule fires when all of its inputs
/// are still available; firing consumes those inputs, so a symbol used by an
/// earlier rule cannot satisfy a later one. Symbols left over are dropped.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use steno_stick::engine::resolve_unordered;
/// use steno_stick::grammar::Mapping;
///
/// let mapping = Mapping::parse("a,b -> S-\na -> T-\n");
/// let available: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
/// let keys = resolve_unordered(&available, mapping.unordered_mappings());
/// assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["S-"]);
/// ```
#[must_use]
pub fn resolve_unordered(symbols: &HashSet<String>, rules: &[UnorderedRule]) -> BTreeSet<String> {
    let mut available = symbols.clone();
    let mut keys = BTreeSet::new();

    for rule in rules {
        if rule.inputs.iter().all(|input| available.contains(input)) {
            for input in &rule.inputs {
                available.remove(input);
            }
            keys.extend(rule.keys.iter().cloned());
        }
    }

    if !available.is_empty() {
        debug!("Symbols without a chord rule: {:?}", available);
    }

    keys
}
