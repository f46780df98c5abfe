//! Per-call lexing context
//!
//! Everything a lexer reads or writes for one line travels in a
//! [`LineCtx`]. Embedded sub-languages get a fresh child context over
//! their slice of the line; its results are merged back when the child
//! returns, so no lexer ever sees another language's state.

use std::ops::Range;

use super::format::Format;
use super::language::Lexer;
use super::rules::PatternRule;
use super::spans::LineFormats;
use super::state::BlockState;

/// Lexing context for a single line
pub struct LineCtx<'a> {
    /// Line text, without the trailing newline
    pub text: &'a str,
    /// Exit state of the previous line
    pub prev: &'a BlockState,
    /// Exit state being computed for this line
    pub next: BlockState,
    /// Classification buffer
    pub formats: LineFormats,
    /// Whether decorative (keyword/pattern) rules should run
    pub full: bool,
    /// End of the last string literal formatted on this line
    pub quote_mark: usize,
    /// End of the last regex literal formatted on this line
    pub regex_mark: usize,
}

impl<'a> LineCtx<'a> {
    /// Create a context for `text`, starting from `prev`
    pub fn new(text: &'a str, prev: &'a BlockState, full: bool) -> Self {
        Self {
            text,
            prev,
            next: BlockState::default(),
            formats: LineFormats::new(text.len()),
            full,
            quote_mark: 0,
            regex_mark: 0,
        }
    }

    /// Line length in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the line is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte at `pos`, or 0 past the end
    pub fn byte(&self, pos: usize) -> u8 {
        self.text.as_bytes().get(pos).copied().unwrap_or(0)
    }

    /// Format at `pos`
    pub fn at(&self, pos: usize) -> Format {
        self.formats.at(pos)
    }

    /// Format `start..end`, overwriting
    pub fn set(&mut self, start: usize, end: usize, format: Format) {
        self.formats.set(start, end.saturating_sub(start), format);
    }

    /// Format `start..end` where nothing has been claimed yet
    pub fn set_unclaimed(&mut self, start: usize, end: usize, format: Format) {
        self.formats
            .set_unclaimed(start, end.saturating_sub(start), format);
    }

    /// Run decorative pattern rules, if this line gets them
    pub fn decorate(&mut self, patterns: &[PatternRule]) {
        if self.full {
            super::rules::apply_patterns(self.text, &mut self.formats, patterns);
        }
    }

    /// Run decorative pattern rules over `range` only
    ///
    /// Anchors in the patterns match at the start of the range.
    pub fn decorate_range(&mut self, range: Range<usize>, patterns: &[PatternRule]) {
        if !self.full {
            return;
        }
        let text: &'a str = self.text;
        let Some(slice) = text.get(range.start..range.end.min(text.len())) else {
            return;
        };
        for rule in patterns {
            rule.apply_slice(slice, range.start, &mut self.formats);
        }
    }

    /// Width of the leading whitespace
    pub fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start().len()
    }

    /// Whether the line is blank
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Lex `range` of this line with another lexer
    ///
    /// The child starts from `entry`, writes its formats over `range`, and
    /// its exit state is returned so the caller can persist it (usually in
    /// [`BlockState::sub`]).
    pub fn embed(&mut self, range: Range<usize>, lexer: &dyn Lexer, entry: &BlockState) -> BlockState {
        let text: &'a str = self.text;
        let end = range.end.min(text.len());
        let start = range.start.min(end);
        let mut child = LineCtx::new(&text[start..end], entry, self.full);
        lexer.lex(&mut child);
        self.formats.overlay(start, &child.formats);
        child.next
    }
}
