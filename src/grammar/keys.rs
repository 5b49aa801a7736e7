//! # Steno Key Notation
//!
//! Converts stroke strings such as `PHRO-FR` into canonical key names and
//! renders key sets back into steno notation.
//!
//! A `-` marks the boundary between the left and right key banks. Keys
//! before it are left-bank keys (`P-`), keys after it right-bank keys
//! (`-F`). `*` and `#` belong to neither bank and stay bare.

/// Keys that never carry a bank hyphen.
const BANKLESS_KEYS: [char; 2] = ['*', '#'];

/// Canonical steno order used when rendering a key set.
pub const STENO_ORDER: [&str; 23] = [
    "#", "S-", "T-", "K-", "P-", "W-", "H-", "R-", "A-", "O-", "*", "-E", "-U", "-F", "-R", "-P",
    "-B", "-L", "-G", "-T", "-S", "-D", "-Z",
];

/// Keys that separate the banks visually, making an explicit hyphen redundant.
const MIDDLE_KEYS: [&str; 5] = ["A-", "O-", "*", "-E", "-U"];

/// Converts a stroke string into its ordered key names.
///
/// Input character order is preserved; duplicates are kept.
///
/// # Examples
///
/// ```
/// use steno_stick::grammar::keys_for_stroke;
///
/// assert_eq!(
///     keys_for_stroke("PHRO-FR"),
///     vec!["P-", "H-", "R-", "O-", "-F", "-R"],
/// );
/// assert_eq!(keys_for_stroke("-Z"), vec!["-Z"]);
/// assert_eq!(keys_for_stroke("#*"), vec!["#", "*"]);
/// ```
#[must_use]
pub fn keys_for_stroke(stroke: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(stroke.len());
    let mut passed_hyphen = false;

    for key in stroke.chars() {
        if key == '-' {
            passed_hyphen = true;
            continue;
        }

        if BANKLESS_KEYS.contains(&key) {
            keys.push(key.to_string());
        } else if passed_hyphen {
            keys.push(format!("-{key}"));
        } else {
            keys.push(format!("{key}-"));
        }
    }

    keys
}

/// Renders a set of key names as a steno string.
///
/// Known keys are written in [`STENO_ORDER`]; a hyphen is inserted before the
/// first right-bank key unless a vowel or `*` already separates the banks.
/// Keys outside the standard layout are appended in the order given.
#[must_use]
pub fn steno_notation<'a, I>(keys: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let keys: Vec<&str> = keys.into_iter().collect();
    let has_middle = keys.iter().any(|key| MIDDLE_KEYS.contains(key));

    let mut out = String::new();
    let mut wrote_hyphen = false;

    for known in STENO_ORDER {
        if !keys.contains(&known) {
            continue;
        }
        if let Some(right) = known.strip_prefix('-') {
            if !has_middle && !wrote_hyphen {
                out.push('-');
                wrote_hyphen = true;
            }
            out.push_str(right);
        } else {
            out.push_str(known.trim_end_matches('-'));
        }
    }

    for extra in keys.iter().filter(|key| !STENO_ORDER.contains(key)) {
        out.push_str(extra);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_for_stroke_mixed_banks() {
        assert_eq!(
            keys_for_stroke("PHRO-FR"),
            vec!["P-", "H-", "R-", "O-", "-F", "-R"]
        );
    }

    #[test]
    fn test_keys_for_stroke_left_only() {
        assert_eq!(keys_for_stroke("TW-"), vec!["T-", "W-"]);
        assert_eq!(keys_for_stroke("TW"), vec!["T-", "W-"]);
    }

    #[test]
    fn test_keys_for_stroke_right_only() {
        assert_eq!(keys_for_stroke("-Z"), vec!["-Z"]);
        assert_eq!(keys_for_stroke("-FRPBLG"), vec!["-F", "-R", "-P", "-B", "-L", "-G"]);
    }

    #[test]
    fn test_keys_for_stroke_bankless() {
        assert_eq!(keys_for_stroke("*"), vec!["*"]);
        assert_eq!(keys_for_stroke("S*-T"), vec!["S-", "*", "-T"]);
        assert_eq!(keys_for_stroke("#-D"), vec!["#", "-D"]);
    }

    #[test]
    fn test_keys_for_stroke_is_deterministic() {
        assert_eq!(keys_for_stroke("KWR-RBGS"), keys_for_stroke("KWR-RBGS"));
    }

    #[test]
    fn test_keys_for_stroke_empty() {
        assert!(keys_for_stroke("").is_empty());
        assert!(keys_for_stroke("-").is_empty());
    }

    #[test]
    fn test_steno_notation_left_only() {
        assert_eq!(steno_notation(["W-", "T-"]), "TW");
    }

    #[test]
    fn test_steno_notation_right_only_gets_hyphen() {
        assert_eq!(steno_notation(["-Z"]), "-Z");
        assert_eq!(steno_notation(["-T", "S-"]), "S-T");
    }

    #[test]
    fn test_steno_notation_vowel_hides_hyphen() {
        let keys = keys_for_stroke("PHRO-FR");
        assert_eq!(steno_notation(keys.iter().map(String::as_str)), "PHROFR");
    }

    #[test]
    fn test_steno_notation_star_hides_hyphen() {
        assert_eq!(steno_notation(["*", "-D"]), "*D");
    }

    #[test]
    fn test_steno_notation_unknown_keys_appended() {
        assert_eq!(steno_notation(["X-", "T-"]), "TX-");
    }

    #[test]
    fn test_steno_order_is_complete() {
        assert_eq!(STENO_ORDER.len(), 23);
        assert_eq!(STENO_ORDER[0], "#");
        assert_eq!(STENO_ORDER[22], "-Z");
    }
}
