//! The pure per-line entry point
//!
//! [`Highlighter::relex`] classifies one line given its predecessor's exit
//! state. It owns no per-line data; the store and scheduler decide what to
//! relex and when.

use std::ops::Range;

use tracing::debug;

use super::brackets::{self, Bracket};
use super::context::LineCtx;
use super::language::{Language, Lexer};
use super::spans::Span;
use super::state::BlockState;
use super::format::Format;

/// Lines longer than this are not lexed
pub const DEFAULT_MAX_LINE_LENGTH: usize = 10_000;

/// Result of lexing one line
#[derive(Debug, Clone, PartialEq)]
pub struct LineOutput {
    /// Classified regions, in order
    pub spans: Vec<Span>,
    /// Brackets outside literal text
    pub brackets: Vec<Bracket>,
    /// State handed to the next line
    pub exit: BlockState,
    /// Whether decorative rules ran
    pub highlighted: bool,
}

/// Language selection plus the visibility gate
#[derive(Debug, Clone)]
pub struct Highlighter {
    language: Language,
    visible: Option<Range<usize>>,
    max_line_length: usize,
}

impl Highlighter {
    /// Create a highlighter for `language` with every line visible
    pub fn new(language: Language) -> Self {
        Self {
            language,
            visible: None,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Builder: set the long-line cutoff
    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// The active lexer
    pub fn lexer(&self) -> &'static dyn Lexer {
        self.language.lexer()
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Restrict decorative rules to `range` (`None` = every line)
    pub fn set_visible_range(&mut self, range: Option<Range<usize>>) {
        self.visible = range;
    }

    pub fn visible_range(&self) -> Option<Range<usize>> {
        self.visible.clone()
    }

    /// Whether decorative rules run for `line_index`
    pub fn is_visible(&self, line_index: usize) -> bool {
        self.visible.as_ref().map_or(true, |r| r.contains(&line_index))
    }

    /// Lex one line
    ///
    /// A pure function of the arguments and the active language. An
    /// over-long line becomes one `TooLong` span and passes `prev` through.
    pub fn relex(&self, line_index: usize, text: &str, prev: &BlockState) -> LineOutput {
        if text.len() > self.max_line_length {
            debug!(line = line_index, len = text.len(), limit = self.max_line_length, "line too long to highlight");
            return LineOutput {
                spans: vec![Span::new(0, text.len(), Format::TooLong)],
                brackets: Vec::new(),
                exit: prev.clone(),
                highlighted: true,
            };
        }

        let full = self.is_visible(line_index);
        let mut ctx = LineCtx::new(text, prev, full);
        self.lexer().lex(&mut ctx);
        LineOutput {
            brackets: brackets::collect(text, &ctx.formats),
            spans: ctx.formats.spans(),
            exit: ctx.next,
            highlighted: full,
        }
    }
}
