//! Span overlay model
//!
//! A line is classified into a per-byte format buffer while it is being
//! lexed, then run-length encoded into [`Span`]s for the renderer. The
//! buffer makes the check-then-skip idiom cheap: a rule asks what a
//! position already is before it claims it.

use super::format::Format;

/// A classified region of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset where this span starts (inclusive)
    pub start: usize,
    /// Byte offset where this span ends (exclusive)
    pub end: usize,
    /// Category of the region
    pub format: Format,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, format: Format) -> Self {
        Self { start, end, format }
    }

    /// Check if this span contains a byte position
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Get the length of this span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Per-byte format buffer for one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormats {
    formats: Vec<Format>,
}

impl LineFormats {
    /// Create an unclassified buffer for a line of `len` bytes
    pub fn new(len: usize) -> Self {
        Self {
            formats: vec![Format::Default; len],
        }
    }

    /// Length of the line in bytes
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether the line is empty
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    fn clamp(&self, start: usize, len: usize) -> (usize, usize) {
        let start = start.min(self.formats.len());
        let end = start.saturating_add(len).min(self.formats.len());
        (start, end)
    }

    /// Apply a format, overwriting whatever was there
    pub fn set(&mut self, start: usize, len: usize, format: Format) {
        let (start, end) = self.clamp(start, len);
        self.formats[start..end].fill(format);
    }

    /// Apply a format except over bytes already carrying `protected`
    pub fn set_unless(&mut self, start: usize, len: usize, format: Format, protected: Format) {
        let (start, end) = self.clamp(start, len);
        for slot in &mut self.formats[start..end] {
            if *slot != protected {
                *slot = format;
            }
        }
    }

    /// Apply a format only over bytes nobody has claimed yet
    pub fn set_unclaimed(&mut self, start: usize, len: usize, format: Format) {
        self.set_unless_any(start, len, format, |f| f != Format::Default);
    }

    /// Apply a format except where `protected` says a byte is taken
    pub fn set_unless_any(
        &mut self,
        start: usize,
        len: usize,
        format: Format,
        protected: impl Fn(Format) -> bool,
    ) {
        let (start, end) = self.clamp(start, len);
        for slot in &mut self.formats[start..end] {
            if !protected(*slot) {
                *slot = format;
            }
        }
    }

    /// Format at a byte position (`Default` past the end)
    pub fn at(&self, pos: usize) -> Format {
        self.formats.get(pos).copied().unwrap_or_default()
    }

    /// Whether the byte at `pos` carries `format`
    pub fn is(&self, pos: usize, format: Format) -> bool {
        self.at(pos) == format
    }

    /// Whether the byte at `pos` is still unclassified
    pub fn is_unclaimed(&self, pos: usize) -> bool {
        self.at(pos) == Format::Default
    }

    /// Whether any byte in `start..end` is literal text
    pub fn any_literal(&self, start: usize, end: usize) -> bool {
        let (start, end) = self.clamp(start, end.saturating_sub(start));
        self.formats[start..end].iter().any(Format::is_literal)
    }

    /// Copy another buffer in at a byte offset
    ///
    /// Used to merge the result of an embedded sub-lexer back into the
    /// line that hosts it.
    pub fn overlay(&mut self, offset: usize, other: &LineFormats) {
        for (i, format) in other.formats.iter().enumerate() {
            if let Some(slot) = self.formats.get_mut(offset + i) {
                *slot = *format;
            }
        }
    }

    /// Run-length encode the claimed bytes into spans
    pub fn spans(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut start = 0;
        while start < self.formats.len() {
            let format = self.formats[start];
            let mut end = start + 1;
            while end < self.formats.len() && self.formats[end] == format {
                end += 1;
            }
            if format != Format::Default {
                spans.push(Span::new(start, end, format));
            }
            start = end;
        }
        spans
    }
}
