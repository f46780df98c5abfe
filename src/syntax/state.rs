//! Per-line lexical state
//!
//! A line's exit state is everything the next line needs to start lexing
//! in the right context. It is compared after every relex to decide
//! whether the following line has gone stale.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::brackets::Bracket;
use super::spans::Span;

/// Shared state tags
///
/// Lexers are free to define their own tags; these cover the constructs
/// most languages have. Language-specific tags start at [`LANGUAGE_BASE`].
pub mod tag {
    /// Outside any multi-line construct
    pub const CLEAN: i32 = 0;
    /// Inside a block comment
    pub const COMMENT: i32 = 1;
    /// Inside a double-quoted string
    pub const DOUBLE_QUOTE: i32 = 2;
    /// Inside a single-quoted string
    pub const SINGLE_QUOTE: i32 = 3;
    /// Inside a backtick string or template literal
    pub const BACK_QUOTE: i32 = 4;
    /// Inside a triple double-quoted string
    pub const TRIPLE_DOUBLE: i32 = 5;
    /// Inside a triple single-quoted string
    pub const TRIPLE_SINGLE: i32 = 6;
    /// Inside a raw or long-bracket string whose closer is in the label
    pub const RAW_STRING: i32 = 7;
    /// Inside a regex or quote-like operator
    pub const REGEX: i32 = 8;
    /// Inside a here-document whose terminator is in the label
    pub const HEREDOC: i32 = 9;
    /// Inside a comment whose closer is in the label
    pub const LABELED_COMMENT: i32 = 10;
    /// Inside a line comment continued by a trailing backslash
    pub const LINE_COMMENT: i32 = 11;
    /// First tag free for language-specific use
    pub const LANGUAGE_BASE: i32 = 32;
}

/// State persisted at the end of a line and consumed by the next one
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlockState {
    /// Language-defined state tag, [`tag::CLEAN`] when nothing is open
    pub state: i32,
    /// Generic nesting counter (brace depth, comment depth, ...)
    pub open_nests: i32,
    /// Carried context: closing delimiters, indentation, nesting order
    pub label: String,
    /// Language-specific flag
    pub property: bool,
    /// Exit state of an embedded sub-language, if one is open
    pub sub: Option<Box<BlockState>>,
}

impl BlockState {
    /// Create a state with just a tag
    pub fn with_state(state: i32) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }

    /// Create a state with a tag and a label
    pub fn labeled(state: i32, label: impl Into<String>) -> Self {
        Self {
            state,
            label: label.into(),
            ..Default::default()
        }
    }

    /// Check if nothing is carried into the next line
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    /// Check if the state tag is `state`
    pub fn is(&self, state: i32) -> bool {
        self.state == state
    }

    /// Embedded sub-language state, or a clean one
    pub fn sub_state(&self) -> BlockState {
        self.sub.as_deref().cloned().unwrap_or_default()
    }

    /// Hash of the whole record
    ///
    /// Used by the scheduler to check that a deferred task still sees the
    /// predecessor state it was queued for.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Everything stored for one line after it has been lexed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineData {
    /// Predecessor state the line was lexed from
    pub entry: BlockState,
    /// State the line hands to its successor
    pub exit: BlockState,
    /// Classified regions
    pub spans: Vec<Span>,
    /// Brackets outside literal text
    pub brackets: Vec<Bracket>,
    /// Whether decorative rules ran, not just structural ones
    pub highlighted: bool,
    /// Whether the line has been lexed since its text last changed
    pub lexed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_state() {
        let state = BlockState::default();
        assert!(state.is_clean());
        assert!(state.is(tag::CLEAN));
        assert!(!BlockState::with_state(tag::COMMENT).is_clean());
    }

    #[test]
    fn test_labeled_state() {
        let state = BlockState::labeled(tag::HEREDOC, "EOF");
        assert!(state.is(tag::HEREDOC));
        assert_eq!(state.label, "EOF");
    }

    #[test]
    fn test_fingerprint_tracks_every_field() {
        let base = BlockState::with_state(tag::COMMENT);
        let mut nested = base.clone();
        nested.open_nests = 2;
        let mut embedded = base.clone();
        embedded.sub = Some(Box::new(BlockState::with_state(tag::REGEX)));

        assert_eq!(base.fingerprint(), base.clone().fingerprint());
        assert_ne!(base.fingerprint(), nested.fingerprint());
        assert_ne!(base.fingerprint(), embedded.fingerprint());
    }

    #[test]
    fn test_sub_state_defaults_to_clean() {
        assert!(BlockState::default().sub_state().is_clean());
        let mut outer = BlockState::default();
        outer.sub = Some(Box::new(BlockState::with_state(tag::DOUBLE_QUOTE)));
        assert!(outer.sub_state().is(tag::DOUBLE_QUOTE));
    }
}
