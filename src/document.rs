//! Host-side document facade
//!
//! Ties the line store, the highlighter and the scheduler together. Every
//! edit relexes the edited line at once; lines below it are queued only if
//! the edit changed what they start from, and are processed by [`pump`]
//! in strict top-to-bottom order.
//!
//! [`pump`]: Document::pump

use std::ops::Range;

use tracing::debug;

use crate::config::Config;
use crate::error::{RelexError, Result};
use crate::syntax::{
    BlockState, Bracket, Highlighter, Language, LineData, LineStore, Scheduler, Span, Task,
};

/// An incrementally highlighted document
#[derive(Debug, Clone)]
pub struct Document {
    store: LineStore,
    highlighter: Highlighter,
    scheduler: Scheduler,
    batch: usize,
}

impl Document {
    /// Create a document with a single empty line
    pub fn new(language: Language) -> Self {
        Self::from_text("", language)
    }

    /// Create a document from text; nothing is lexed until [`pump`](Self::pump)
    pub fn from_text(text: &str, language: Language) -> Self {
        Self::with_config(text, language, &Config::default())
    }

    /// Create a document using the limits from `config`
    pub fn with_config(text: &str, language: Language, config: &Config) -> Self {
        let lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
        let mut doc = Self {
            store: LineStore::from_lines(lines),
            highlighter: Highlighter::new(language).with_max_line_length(config.max_line_length),
            scheduler: Scheduler::new(),
            batch: config.rehighlight_batch.max(1),
        };
        doc.schedule(0);
        doc
    }

    pub fn line_count(&self) -> usize {
        self.store.len()
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.store.text(index)
    }

    pub fn language(&self) -> Language {
        self.highlighter.language()
    }

    /// Switch language; every line is relexed from the top
    pub fn set_language(&mut self, language: Language) {
        self.highlighter.set_language(language);
        self.store.invalidate_all();
        self.scheduler.clear();
        self.schedule(0);
    }

    /// Restrict decorative highlighting to `range`
    ///
    /// Newly visible lines that were only structurally lexed are queued.
    pub fn set_visible_range(&mut self, range: Option<Range<usize>>) {
        self.highlighter.set_visible_range(range);
        let end = self
            .highlighter
            .visible_range()
            .map_or(self.store.len(), |r| r.end.min(self.store.len()));
        let start = self.highlighter.visible_range().map_or(0, |r| r.start);
        for index in start..end {
            let plain = self.store.data(index).is_some_and(|d| d.lexed && !d.highlighted);
            if plain {
                self.schedule(index);
            }
        }
    }

    /// Replace the text of line `index`
    pub fn set_line(&mut self, index: usize, text: &str) -> Result<()> {
        self.store.set_text(index, text)?;
        self.relex_now(index);
        Ok(())
    }

    /// Insert a line before `index` (`index == line_count()` appends)
    pub fn insert_line(&mut self, index: usize, text: &str) -> Result<()> {
        self.store.insert(index, text)?;
        self.relex_now(index);
        Ok(())
    }

    /// Remove line `index`, returning its text
    pub fn remove_line(&mut self, index: usize) -> Result<String> {
        if self.store.len() <= 1 {
            let text = self.store.text(index).ok_or(RelexError::LineOutOfRange(index))?.to_string();
            self.set_line(index, "")?;
            return Ok(text);
        }
        let text = self.store.remove(index)?;
        if index > 0 {
            self.propagate(index - 1);
        } else if self.store.data(0).is_some_and(|d| !d.lexed || !d.entry.is_clean()) {
            self.schedule(0);
        }
        Ok(text)
    }

    /// Run up to `budget` deferred relex tasks; returns how many ran
    pub fn pump(&mut self, budget: usize) -> usize {
        let mut processed = 0;
        while processed < budget {
            let Some((index, _)) = self.scheduler.pop(&self.store) else {
                break;
            };
            self.relex(index);
            processed += 1;
        }
        debug!(processed, remaining = self.scheduler.len(), "rehighlight pump");
        processed
    }

    /// Run deferred tasks until none remain
    pub fn flush(&mut self) -> usize {
        let mut total = 0;
        while !self.scheduler.is_empty() {
            total += self.pump(self.batch);
        }
        total
    }

    /// Number of queued relex tasks
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    pub fn spans(&self, index: usize) -> Option<&[Span]> {
        self.store.data(index).map(|d| d.spans.as_slice())
    }

    pub fn brackets(&self, index: usize) -> Option<&[Bracket]> {
        self.store.data(index).map(|d| d.brackets.as_slice())
    }

    pub fn exit_state(&self, index: usize) -> Option<&BlockState> {
        self.store.data(index).map(|d| &d.exit)
    }

    /// Everything stored for line `index`
    pub fn line_data(&self, index: usize) -> Option<&LineData> {
        self.store.data(index)
    }

    /// Whether line `index` is up to date
    pub fn is_lexed(&self, index: usize) -> bool {
        self.store.is_lexed(index)
    }

    /// Relex an edited line if its predecessor is settled
    ///
    /// Otherwise the line stays stale and the pending chain above reaches it.
    fn relex_now(&mut self, index: usize) {
        if index == 0 || self.store.is_lexed(index - 1) {
            self.relex(index);
        }
    }

    fn relex(&mut self, index: usize) {
        let entry = self.store.exit_before(index);
        let Some(text) = self.store.text(index) else {
            return;
        };
        let out = self.highlighter.relex(index, text, &entry);
        let data = LineData {
            entry,
            exit: out.exit,
            spans: out.spans,
            brackets: out.brackets,
            highlighted: out.highlighted,
            lexed: true,
        };
        if self.store.set_data(index, data).is_ok() {
            self.propagate(index);
        }
    }

    /// Queue the line after `index` if it no longer starts from the right state
    fn propagate(&mut self, index: usize) {
        let next = index + 1;
        let (Some(data), Some(following)) = (self.store.data(index), self.store.data(next)) else {
            return;
        };
        let stale = !following.lexed || self.highlighter.lexer().affects_next(&following.entry, &data.exit);
        if stale {
            self.schedule(next);
        }
    }

    fn schedule(&mut self, index: usize) {
        if let Some(task) = Task::capture(&self.store, index) {
            self.scheduler.schedule(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{tag, Format};

    fn format_at(doc: &Document, line: usize, pos: usize) -> Format {
        doc.spans(line)
            .and_then(|spans| spans.iter().find(|s| s.contains(pos)))
            .map_or(Format::Default, |s| s.format)
    }

    #[test]
    fn test_from_text_lexes_on_flush() {
        let mut doc = Document::from_text("int a; /* x\ny\n*/ int b;", Language::C);
        assert_eq!(doc.line_count(), 3);
        assert!(!doc.is_lexed(0));
        assert_eq!(doc.flush(), 3);
        assert!(doc.exit_state(0).unwrap().is(tag::COMMENT));
        assert_eq!(format_at(&doc, 1, 0), Format::Comment);
        assert_eq!(format_at(&doc, 2, 3), Format::Keyword);
        assert!(doc.exit_state(2).unwrap().is_clean());
    }

    #[test]
    fn test_closing_a_string_reaches_later_lines() {
        let text = "x = 1\ny = 2\ns = \"\"\"open\nstill string\nif True: pass";
        let mut doc = Document::from_text(text, Language::Python);
        doc.flush();
        assert_eq!(format_at(&doc, 4, 0), Format::String);

        doc.set_line(2, "s = \"\"\"closed\"\"\"").unwrap();
        assert!(doc.exit_state(2).unwrap().is_clean());
        assert_eq!(doc.pending(), 1);
        assert_eq!(format_at(&doc, 4, 0), Format::String);

        doc.flush();
        assert_eq!(format_at(&doc, 3, 0), Format::Default);
        assert_eq!(format_at(&doc, 4, 0), Format::Keyword);
    }

    #[test]
    fn test_unaffecting_edit_schedules_nothing() {
        let mut doc = Document::from_text("a = 1\nb = 2\nc = 3", Language::Python);
        doc.flush();
        doc.set_line(1, "b = 'two'").unwrap();
        assert_eq!(doc.pending(), 0);
        assert_eq!(format_at(&doc, 1, 4), Format::String);
    }

    #[test]
    fn test_pump_respects_budget() {
        let mut doc = Document::from_text("/*\na\nb\nc\n*/", Language::C);
        assert_eq!(doc.pump(2), 2);
        assert!(doc.is_lexed(1));
        assert!(!doc.is_lexed(2));
        doc.flush();
        assert!(doc.exit_state(4).unwrap().is_clean());
    }

    #[test]
    fn test_insert_and_remove_lines() {
        let mut doc = Document::from_text("a\nb", Language::C);
        doc.flush();
        doc.insert_line(1, "/* open").unwrap();
        doc.flush();
        assert_eq!(doc.line_count(), 3);
        assert_eq!(format_at(&doc, 2, 0), Format::Comment);

        assert_eq!(doc.remove_line(1).unwrap(), "/* open");
        doc.flush();
        assert_eq!(format_at(&doc, 1, 0), Format::Default);
        assert!(doc.exit_state(1).unwrap().is_clean());
    }

    /// Every line lexed, and identical to a clean top-to-bottom pass
    fn assert_converged(doc: &Document) {
        let highlighter = Highlighter::new(doc.language());
        let mut prev = BlockState::default();
        for index in 0..doc.line_count() {
            assert!(doc.is_lexed(index), "line {index} not lexed");
            let out = highlighter.relex(index, doc.text(index).unwrap(), &prev);
            let data = doc.line_data(index).unwrap();
            assert_eq!(data.entry, prev, "line {index}");
            assert_eq!(data.spans, out.spans, "line {index}");
            assert_eq!(data.exit, out.exit, "line {index}");
            prev = out.exit;
        }
    }

    #[test]
    fn test_removing_first_line_before_lexing() {
        let mut doc = Document::from_text("int a;\nint b;", Language::C);
        doc.remove_line(0).unwrap();
        assert_eq!(doc.pending(), 1);
        assert_eq!(doc.flush(), 1);
        assert!(doc.is_lexed(0));
        assert_eq!(format_at(&doc, 0, 0), Format::Keyword);
    }

    #[test]
    fn test_edits_between_partial_pumps_converge() {
        let text = "int a;\n/* one\ntwo\nthree */\nint b;\nchar *s = \"x\";\nint c;";
        let mut doc = Document::from_text(text, Language::C);
        assert_eq!(doc.pump(2), 2);
        doc.set_line(4, "/* reopened").unwrap();
        assert!(!doc.is_lexed(4));
        doc.insert_line(2, "*/ int d;").unwrap();
        assert!(doc.exit_state(2).unwrap().is_clean());
        doc.remove_line(0).unwrap();
        doc.pump(1);
        doc.set_line(0, "int z;").unwrap();
        doc.flush();
        assert_converged(&doc);
        assert_eq!(format_at(&doc, 5, 0), Format::Comment);
        assert!(doc.exit_state(7).unwrap().is(tag::COMMENT));
    }

    #[test]
    fn test_removing_first_line_mid_chain_converges() {
        let text = "s = '''\nx\n'''\ny = 1\nz = '''open";
        let mut doc = Document::from_text(text, Language::Python);
        doc.remove_line(0).unwrap();
        doc.pump(1);
        doc.insert_line(1, "w = 2").unwrap();
        doc.remove_line(0).unwrap();
        doc.flush();
        assert_converged(&doc);
        assert!(doc.exit_state(1).unwrap().is(tag::TRIPLE_SINGLE));
        assert_eq!(format_at(&doc, 2, 0), Format::String);
        assert!(doc.exit_state(3).unwrap().is_clean());
    }

    #[test]
    fn test_edit_out_of_range() {
        let mut doc = Document::new(Language::C);
        assert!(matches!(doc.set_line(3, "x"), Err(RelexError::LineOutOfRange(3))));
        assert!(matches!(doc.insert_line(2, "x"), Err(RelexError::LineOutOfRange(2))));
        assert!(doc.remove_line(0).is_ok());
        assert_eq!(doc.line_count(), 1);
    }

    #[test]
    fn test_visible_range_upgrades_lines() {
        let mut doc = Document::from_text("int a;\nint b;\nint c;", Language::C);
        doc.set_visible_range(Some(0..1));
        doc.flush();
        assert!(doc.line_data(0).unwrap().highlighted);
        assert!(!doc.line_data(2).unwrap().highlighted);
        assert_eq!(format_at(&doc, 2, 0), Format::Default);

        doc.set_visible_range(Some(1..3));
        assert_eq!(doc.pending(), 2);
        doc.flush();
        assert_eq!(format_at(&doc, 2, 0), Format::Keyword);
    }

    #[test]
    fn test_set_language_relexes_everything() {
        let mut doc = Document::from_text("# heading\nx = 1", Language::Python);
        doc.flush();
        assert_eq!(format_at(&doc, 0, 0), Format::Comment);
        doc.set_language(Language::Markdown);
        doc.flush();
        assert_eq!(format_at(&doc, 0, 0), Format::Heading);
        assert_eq!(doc.language(), Language::Markdown);
    }
}
