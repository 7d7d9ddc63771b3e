//! Contract consumed by the downstream text formatter.
//!
//! The capture pipeline does not interpret substitution directives; it hands
//! decoded entries to a formatter that does. This module fixes the shapes
//! both sides agree on.

use codec::Decoded;
use common::LogEntry;
use smallvec::SmallVec;

/// One styled run of text in a rendered entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub text: String,
    /// CSS-style declaration list applied to this run, if any.
    pub style: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
        }
    }
}

/// Styled runs for one rendered entry.
pub type Spans = SmallVec<[Span; 4]>;

/// Renders decoded entries into styled spans. Directive interpretation
/// (`%c` and friends) belongs to the implementor; the entry's `data` arrives
/// already decoded into plain values.
pub trait EntryFormatter {
    fn format(&self, entry: &LogEntry<Decoded>) -> Spans;
}

// Directive characters recognized after '%' in a leading string argument.
const DIRECTIVE_CHARS: [char; 7] = ['s', 'd', 'i', 'f', 'o', 'O', 'c'];

/// Whether a leading argument opts the entry into directive formatting.
pub fn has_directives(first: &Decoded) -> bool {
    let Decoded::Str(text) = first else {
        return false;
    };
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        if let Some(&next) = chars.peek() {
            if DIRECTIVE_CHARS.contains(&next) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_style_directive() {
        assert!(has_directives(&Decoded::Str("%ctest".to_string())));
        assert!(has_directives(&Decoded::Str("count: %d".to_string())));
    }

    #[test]
    fn test_unknown_directive_is_ignored() {
        assert!(!has_directives(&Decoded::Str("%u".to_string())));
        assert!(!has_directives(&Decoded::Str("100%".to_string())));
        assert!(!has_directives(&Decoded::Num(1.0)));
    }

    #[test]
    fn test_span_constructors() {
        assert_eq!(Span::plain("x").style, None);
        assert_eq!(
            Span::styled("x", "color: red").style.as_deref(),
            Some("color: red")
        );
    }
}
