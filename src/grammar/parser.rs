//! # Mapping Parser
//!
//! Line-oriented, best-effort parser for the mapping language. A line that
//! cannot be understood produces a [`Diagnostic`] and is skipped; the rest of
//! the document still loads.
//!
//! ## Line Forms
//!
//! | Form | Example |
//! |------|---------|
//! | Stick | `left stick has segments (dr,d,dl,ul,u,ur) on axes 0 and 1 offset by 0 degrees` |
//! | Unordered rule | `a,b -> KWR-` |
//! | Ordered rule | `left(d,dl,ul) -> TW-` |
//! | Button rename | `button 0 is a` |
//! | Hat rename | `hat 0 is dpad` |
//! | Trigger rename | `trigger on axis 2 is lt` |
//! | Comment | `// anything`, alone or after any of the above |

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use super::keys::keys_for_stroke;
use super::{Alias, InputId, Mapping, MappingError, Stick, Trigger, UnorderedRule};

/// Comment marker; everything from it to the end of the line is ignored.
const COMMENT_PREFIX: &str = "//";

/// Separates the left and right side of a rule.
const RULE_ARROW: &str = " -> ";

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    /// The line matches none of the known forms.
    #[error("unrecognized line")]
    Unrecognized,

    /// A comma-separated list contained an empty entry.
    #[error("empty entry in list '{0}'")]
    EmptySymbol(String),

    /// A number could not be parsed.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    /// The right-hand side is not valid steno notation.
    #[error("invalid stroke '{0}'")]
    InvalidStroke(String),

    /// The stick declaration is structurally valid but unusable.
    #[error(transparent)]
    Stick(#[from] MappingError),
}

/// A skipped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line_number: usize,
    /// The offending line, trimmed.
    pub line: String,
    pub error: LineError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} ('{}'), skipping",
            self.line_number, self.error, self.line
        )
    }
}

/// Result of parsing a mapping document.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub mapping: Mapping,
    pub diagnostics: Vec<Diagnostic>,
}

/// One recognized declaration.
enum Declaration {
    Stick(Stick),
    Unordered(UnorderedRule),
    Ordered(Vec<String>, Vec<String>),
    Alias(Alias),
    Trigger(Trigger),
}

/// Parses a full mapping document.
///
/// Every unrecognized line is logged at `warn` and reported in
/// [`ParseOutcome::diagnostics`].
///
/// # Examples
///
/// ```
/// use steno_stick::grammar::parse;
///
/// let outcome = parse("button 0 is a\nthis is not valid\na -> -Z\n");
/// assert_eq!(outcome.diagnostics.len(), 1);
/// assert_eq!(outcome.diagnostics[0].line_number, 2);
/// assert_eq!(outcome.mapping.unordered_mappings().len(), 1);
/// ```
#[must_use]
pub fn parse(text: &str) -> ParseOutcome {
    let mut mapping = Mapping::default();
    let mut diagnostics = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let code = raw_line
            .split_once(COMMENT_PREFIX)
            .map_or(raw_line, |(code, _)| code);
        let line = code.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(Declaration::Stick(stick)) => mapping.insert_stick(stick),
            Ok(Declaration::Unordered(rule)) => mapping.push_unordered(rule),
            Ok(Declaration::Ordered(path, keys)) => mapping.insert_ordered(path, keys),
            Ok(Declaration::Alias(alias)) => mapping.insert_alias(alias),
            Ok(Declaration::Trigger(trigger)) => mapping.insert_trigger(trigger),
            Err(error) => {
                let diagnostic = Diagnostic {
                    line_number: index + 1,
                    line: line.to_string(),
                    error,
                };
                warn!("Mapping {}", diagnostic);
                diagnostics.push(diagnostic);
            }
        }
    }

    mapping.reindex();
    debug!(
        "Parsed mapping: {} sticks, {} triggers, {} aliases, {} unordered rules, {} ordered rules",
        mapping.sticks().len(),
        mapping.triggers().len(),
        mapping.buttons_and_hats().len(),
        mapping.unordered_mappings().len(),
        mapping.ordered_mappings().len()
    );

    ParseOutcome {
        mapping,
        diagnostics,
    }
}

fn parse_line(line: &str) -> Result<Declaration, LineError> {
    if let Some((lhs, rhs)) = line.split_once(RULE_ARROW) {
        return parse_rule(lhs, rhs);
    }
    if let Some(rest) = line.strip_prefix("button ") {
        let (index, name) = parse_rename(rest)?;
        return Ok(Declaration::Alias(Alias {
            name,
            id: InputId::Button(index),
        }));
    }
    if let Some(rest) = line.strip_prefix("hat ") {
        let (index, name) = parse_rename(rest)?;
        return Ok(Declaration::Alias(Alias {
            name,
            id: InputId::Hat(index),
        }));
    }
    if let Some(rest) = line.strip_prefix("trigger on axis ") {
        let (axis, name) = parse_rename(rest)?;
        return Ok(Declaration::Trigger(Trigger { name, axis }));
    }
    if line.contains(" stick has segments (") {
        return parse_stick(line);
    }
    Err(LineError::Unrecognized)
}

/// `NAME stick has segments (LIST) on axes X and Y offset by DEG degrees`
fn parse_stick(line: &str) -> Result<Declaration, LineError> {
    let (name, rest) = line
        .split_once(" stick has segments (")
        .ok_or(LineError::Unrecognized)?;
    let (segments, rest) = rest
        .split_once(") on axes ")
        .ok_or(LineError::Unrecognized)?;
    let (x_axis, rest) = rest.split_once(" and ").ok_or(LineError::Unrecognized)?;
    let (y_axis, rest) = rest
        .split_once(" offset by ")
        .ok_or(LineError::Unrecognized)?;
    let offset = rest
        .strip_suffix(" degrees")
        .ok_or(LineError::Unrecognized)?;

    if !is_word(name) || !segments.chars().all(|c| c.is_ascii_lowercase() || c == ',') {
        return Err(LineError::Unrecognized);
    }

    let offset_degrees = parse_offset(offset)?;
    let segments = parse_list(segments)?;
    let stick = Stick::new(
        name,
        parse_number(x_axis)?,
        parse_number(y_axis)?,
        offset_degrees,
        segments,
    )?;

    Ok(Declaration::Stick(stick))
}

/// `sym,sym -> STROKE` or `stick(dir,dir) -> STROKE`
fn parse_rule(lhs: &str, rhs: &str) -> Result<Declaration, LineError> {
    let keys = parse_stroke(rhs)?;

    if let Some((stick, directions)) = lhs.split_once('(') {
        let directions = directions
            .strip_suffix(')')
            .ok_or(LineError::Unrecognized)?;
        if !is_word(stick) || !directions.chars().all(|c| c.is_ascii_lowercase() || c == ',') {
            return Err(LineError::Unrecognized);
        }
        let path = parse_list(directions)?
            .into_iter()
            .map(|direction| format!("{stick}{direction}"))
            .collect();
        return Ok(Declaration::Ordered(path, keys));
    }

    if !lhs.chars().all(|c| is_symbol_char(c) || c == ',') {
        return Err(LineError::Unrecognized);
    }
    let inputs = parse_list(lhs)?.into_iter().collect();
    Ok(Declaration::Unordered(UnorderedRule { inputs, keys }))
}

/// `N is NAME`
fn parse_rename(rest: &str) -> Result<(u16, String), LineError> {
    let (index, name) = rest.split_once(" is ").ok_or(LineError::Unrecognized)?;
    if name.is_empty() || !name.chars().all(is_symbol_char) {
        return Err(LineError::Unrecognized);
    }
    Ok((parse_number(index)?, name.to_string()))
}

fn parse_stroke(stroke: &str) -> Result<Vec<String>, LineError> {
    let valid = !stroke.is_empty()
        && stroke
            .chars()
            .all(|c| c.is_ascii_uppercase() || matches!(c, '-' | '*' | '#'));
    if !valid {
        return Err(LineError::InvalidStroke(stroke.to_string()));
    }
    let keys = keys_for_stroke(stroke);
    if keys.is_empty() {
        return Err(LineError::InvalidStroke(stroke.to_string()));
    }
    Ok(keys)
}

fn parse_list(list: &str) -> Result<Vec<String>, LineError> {
    let items: Vec<String> = list.split(',').map(str::to_string).collect();
    if items.iter().any(String::is_empty) {
        return Err(LineError::EmptySymbol(list.to_string()));
    }
    Ok(items)
}

fn parse_number(text: &str) -> Result<u16, LineError> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(LineError::InvalidNumber(text.to_string()));
    }
    text.parse()
        .map_err(|_| LineError::InvalidNumber(text.to_string()))
}

fn parse_offset(text: &str) -> Result<f64, LineError> {
    let valid = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '.'));
    if !valid {
        return Err(LineError::InvalidNumber(text.to_string()));
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(LineError::InvalidNumber(text.to_string())),
    }
}

fn is_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}
