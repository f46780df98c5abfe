//! Pattern rules for syntax highlighting
//!
//! Two kinds of rules drive the code lexers:
//! - [`PatternRule`]: single-line decorative patterns (keywords, numbers),
//!   applied only over text no structural rule has claimed.
//! - [`MultilineRule`]: structural constructs (comments, strings) that may
//!   stay open at the end of a line and carry state into the next.

use regex::Regex;

use super::format::Format;
use super::scan;
use super::spans::LineFormats;

/// A single-line pattern rule
///
/// Matches a regex pattern and assigns a format to the match, or to one of
/// its capture groups. Rules are applied in priority order (highest first)
/// and never overwrite text that is already classified.
pub struct PatternRule {
    /// Name for debugging
    pub name: String,
    /// Compiled regex pattern
    pub pattern: Regex,
    /// Format to assign to matches
    pub format: Format,
    /// Priority (higher = applied first)
    pub priority: i32,
    /// Capture group to format (0 = whole match)
    pub group: usize,
}

impl PatternRule {
    /// Create a new pattern rule
    pub fn new(name: &str, pattern: &str, format: Format, priority: i32) -> Option<Self> {
        Self::with_group(name, pattern, format, priority, 0)
    }

    /// Create a rule that formats only capture group `group`
    pub fn with_group(
        name: &str,
        pattern: &str,
        format: Format,
        priority: i32,
        group: usize,
    ) -> Option<Self> {
        Regex::new(pattern).ok().map(|regex| Self {
            name: name.to_string(),
            pattern: regex,
            format,
            priority,
            group,
        })
    }

    /// Find the first match in text starting at position
    pub fn find_at(&self, text: &str, start: usize) -> Option<(usize, usize)> {
        if start >= text.len() {
            return None;
        }
        self.pattern
            .find_at(text, start)
            .map(|m| (m.start(), m.end()))
    }

    /// Apply this rule to every match on the line
    ///
    /// A match whose first byte is already classified is skipped whole, so
    /// a keyword inside a string never lights up.
    pub fn apply(&self, text: &str, formats: &mut LineFormats) {
        self.apply_slice(text, 0, formats);
    }

    /// Apply this rule to a slice of the line starting at `offset`
    pub fn apply_slice(&self, slice: &str, offset: usize, formats: &mut LineFormats) {
        for caps in self.pattern.captures_iter(slice) {
            let Some(m) = caps.get(self.group) else {
                continue;
            };
            let start = offset + m.start();
            if m.is_empty() || !formats.is_unclaimed(start) {
                continue;
            }
            formats.set_unclaimed(start, m.len(), self.format);
        }
    }
}

/// Collect compiled rules into a table sorted by priority (highest first)
///
/// Rules whose pattern failed to compile are dropped.
pub fn table(rules: Vec<Option<PatternRule>>) -> Vec<PatternRule> {
    let mut rules: Vec<PatternRule> = rules.into_iter().flatten().collect();
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    rules
}

/// Apply a priority-sorted table of pattern rules
pub fn apply_patterns(text: &str, formats: &mut LineFormats, rules: &[PatternRule]) {
    for rule in rules {
        rule.apply(text, formats);
    }
}

/// How a multi-line construct ends
pub enum Closer {
    /// A fixed closing pattern
    Pattern(Regex),
    /// The end of the line (line comments)
    EndOfLine,
    /// The opening match is the whole construct
    Whole,
    /// A closing string derived from the opening match
    ///
    /// The derived closer is carried in the state label while the
    /// construct stays open.
    Label(fn(&str) -> String),
}

/// Whether an unterminated construct continues on the next line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiline {
    /// Always continues
    Yes,
    /// Continues only if the line ends with an unescaped backslash
    Backslash,
    /// Never continues; the rest of the line is still formatted
    No,
}

/// A multi-line construct rule (block comments, strings)
///
/// These rules track state across lines for constructs that
/// can span multiple lines.
pub struct MultilineRule {
    /// Name for debugging
    pub name: String,
    /// Pattern that starts the construct
    pub start: Regex,
    /// How the construct ends
    pub closer: Closer,
    /// Format for this construct
    pub format: Format,
    /// Escape character that hides the opener and closer
    pub escape: Option<u8>,
    /// Unique state tag while the construct is open (0 = never carried)
    pub state_id: i32,
    /// Continuation policy
    pub multiline: Multiline,
    /// Whether openers nest inside the construct
    pub nested: bool,
    /// Extra test an opener must pass at its match position
    pub guard: Option<fn(&str, usize) -> bool>,
}

impl MultilineRule {
    fn build(name: &str, start_pattern: &str, closer: Closer, format: Format, state_id: i32) -> Option<Self> {
        let start = Regex::new(start_pattern).ok()?;
        Some(Self {
            name: name.to_string(),
            start,
            closer,
            format,
            escape: None,
            state_id,
            multiline: Multiline::Yes,
            nested: false,
            guard: None,
        })
    }

    /// Create a new multiline rule
    pub fn new(
        name: &str,
        start_pattern: &str,
        end_pattern: &str,
        format: Format,
        state_id: i32,
    ) -> Option<Self> {
        let end = Regex::new(end_pattern).ok()?;
        Self::build(name, start_pattern, Closer::Pattern(end), format, state_id)
    }

    /// Create a multiline rule with escape support
    pub fn with_escape(
        name: &str,
        start_pattern: &str,
        end_pattern: &str,
        format: Format,
        state_id: i32,
        escape_char: char,
    ) -> Option<Self> {
        let mut rule = Self::new(name, start_pattern, end_pattern, format, state_id)?;
        rule.escape = u8::try_from(escape_char).ok();
        Some(rule)
    }

    /// Create a rule that runs to the end of the line
    pub fn line(name: &str, start_pattern: &str, format: Format) -> Option<Self> {
        Self::build(name, start_pattern, Closer::EndOfLine, format, 0)
    }

    /// Create a rule whose opening match is the whole construct
    pub fn token(name: &str, pattern: &str, format: Format) -> Option<Self> {
        Self::build(name, pattern, Closer::Whole, format, 0)
    }

    /// Create a rule whose closer is derived from its opener
    pub fn labeled(
        name: &str,
        start_pattern: &str,
        closer: fn(&str) -> String,
        format: Format,
        state_id: i32,
    ) -> Option<Self> {
        Self::build(name, start_pattern, Closer::Label(closer), format, state_id)
    }

    /// Builder: set the continuation policy
    pub fn continued(mut self, multiline: Multiline) -> Self {
        self.multiline = multiline;
        self
    }

    /// Builder: continue on the next line after a trailing backslash
    ///
    /// Also sets the state tag the construct is carried under.
    pub fn continued_by_backslash(mut self, state_id: i32) -> Self {
        self.multiline = Multiline::Backslash;
        self.state_id = state_id;
        self
    }

    /// Builder: openers nest inside the construct
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Builder: set the escape character
    pub fn escaped_by(mut self, escape: u8) -> Self {
        self.escape = Some(escape);
        self
    }

    /// Builder: require `guard(text, start)` for an opener to count
    pub fn guarded(mut self, guard: fn(&str, usize) -> bool) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Whether an open construct of this rule is carried under `state`
    pub fn carries(&self, state: i32) -> bool {
        self.state_id != 0 && self.state_id == state
    }

    /// Find start of this construct in text
    ///
    /// Returns the opener's byte range. Openers that are escaped, fail the
    /// guard, or are rejected by `accept` are skipped.
    pub fn find_start(
        &self,
        text: &str,
        start: usize,
        accept: impl Fn(usize) -> bool,
    ) -> Option<(usize, usize)> {
        let mut from = start;
        while from < text.len() {
            let m = self.start.find_at(text, from)?;
            let ok = accept(m.start())
                && !self
                    .escape
                    .is_some_and(|esc| scan::is_escaped_with(text, 0, m.start(), esc))
                && self.guard.map_or(true, |guard| guard(text, m.start()));
            if ok && !m.is_empty() {
                return Some((m.start(), m.end()));
            }
            from = scan::next_boundary(text, m.start() + 1);
        }
        None
    }

    /// Closing text for an opener, for rules with a derived closer
    pub fn label_for(&self, opener: &str) -> Option<String> {
        match &self.closer {
            Closer::Label(derive) => Some(derive(opener)),
            _ => None,
        }
    }

    /// Find end of this construct in text, respecting escapes
    ///
    /// `start` is where the body begins; escapes are never counted past
    /// it. `label` is the derived closer for [`Closer::Label`] rules and
    /// `depth` the nesting level for nested rules. Returns the position
    /// just past the closer.
    pub fn find_end(&self, text: &str, start: usize, label: &str, depth: &mut i32) -> Option<usize> {
        if start > text.len() {
            return None;
        }
        match &self.closer {
            Closer::EndOfLine => None,
            Closer::Whole => Some(start),
            Closer::Label(_) => self.find_literal_end(text, start, label),
            Closer::Pattern(end) => {
                if self.nested {
                    self.find_nested_end(text, start, end, depth)
                } else {
                    self.find_pattern_end(text, start, end)
                }
            }
        }
    }

    fn find_pattern_end(&self, text: &str, start: usize, end: &Regex) -> Option<usize> {
        let mut pos = start;
        while pos <= text.len() {
            let m = end.find_at(text, pos)?;
            if let Some(esc) = self.escape {
                // Odd number of escapes = escaped
                if scan::is_escaped_with(text, start, m.start(), esc) {
                    pos = scan::next_boundary(text, m.start() + 1);
                    continue;
                }
            }
            return Some(m.end());
        }
        None
    }

    fn find_literal_end(&self, text: &str, start: usize, closer: &str) -> Option<usize> {
        if closer.is_empty() {
            return Some(start);
        }
        let mut pos = start;
        while let Some(found) = text.get(pos..).and_then(|rest| rest.find(closer)) {
            let at = pos + found;
            match self.escape {
                Some(esc) if scan::is_escaped_with(text, start, at, esc) => {
                    pos = scan::next_boundary(text, at + 1);
                }
                _ => return Some(at + closer.len()),
            }
        }
        None
    }

    fn find_nested_end(&self, text: &str, start: usize, end: &Regex, depth: &mut i32) -> Option<usize> {
        let mut pos = start;
        if *depth < 1 {
            *depth = 1;
        }
        loop {
            let open = self.start.find_at(text, pos);
            let close = end.find_at(text, pos);
            match (open, close) {
                (Some(open), Some(close)) if open.start() < close.start() => {
                    *depth += 1;
                    pos = open.end();
                }
                (Some(open), None) => {
                    *depth += 1;
                    pos = open.end();
                }
                (_, Some(close)) => {
                    *depth -= 1;
                    pos = close.end();
                    if *depth == 0 {
                        return Some(pos);
                    }
                }
                (None, None) => return None,
            }
        }
    }
}

/// Collect compiled multiline rules, keeping table order
pub fn multiline_table(rules: Vec<Option<MultilineRule>>) -> Vec<MultilineRule> {
    rules.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_rule() {
        let rule = PatternRule::new("number", r"\d+", Format::Number, 50).unwrap();
        assert_eq!(rule.find_at("abc 123 def", 0), Some((4, 7)));
        assert_eq!(rule.find_at("abc 123 def", 5), Some((5, 7)));
        assert_eq!(rule.find_at("no numbers", 0), None);
    }

    #[test]
    fn test_pattern_rule_group() {
        let rule = PatternRule::with_group("def", r"\bdef\s+(\w+)", Format::Function, 50, 1).unwrap();
        let mut formats = LineFormats::new(11);
        rule.apply("def foo(x):", &mut formats);
        assert_eq!(formats.at(0), Format::Default);
        assert_eq!(formats.at(4), Format::Function);
        assert_eq!(formats.at(6), Format::Function);
        assert_eq!(formats.at(7), Format::Default);
    }

    #[test]
    fn test_pattern_skips_claimed_text() {
        let rule = PatternRule::new("keyword", r"\bif\b", Format::Keyword, 80).unwrap();
        let text = r#""if" if"#;
        let mut formats = LineFormats::new(text.len());
        formats.set(0, 4, Format::String);
        rule.apply(text, &mut formats);
        assert_eq!(formats.at(1), Format::String);
        assert_eq!(formats.at(5), Format::Keyword);
    }

    #[test]
    fn test_table_sorted_and_flattened() {
        let rules = table(vec![
            PatternRule::new("low", "a", Format::Number, 1),
            PatternRule::new("broken", "(", Format::Number, 99),
            PatternRule::new("high", "b", Format::Keyword, 10),
        ]);
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low"]);
    }

    #[test]
    fn test_multiline_rule() {
        let rule = MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, 1).unwrap();
        let mut depth = 0;
        assert_eq!(rule.find_start("/* comment */", 0, |_| true), Some((0, 2)));
        assert_eq!(rule.find_end("/* comment */", 2, "", &mut depth), Some(13));
    }

    #[test]
    fn test_multiline_with_escape() {
        let rule = MultilineRule::with_escape("string", "\"", "\"", Format::String, 2, '\\').unwrap();
        let mut depth = 0;
        assert_eq!(rule.find_end(r#"hello""#, 0, "", &mut depth), Some(6));
        assert_eq!(rule.find_end(r#"hello\"world""#, 0, "", &mut depth), Some(13));
    }

    #[test]
    fn test_escaped_opener_skipped() {
        let rule = MultilineRule::with_escape("string", "\"", "\"", Format::String, 2, '\\').unwrap();
        assert_eq!(rule.find_start(r#"a\"b"c"#, 0, |_| true), Some((4, 5)));
    }

    #[test]
    fn test_nested_end() {
        let rule = MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, 1)
            .unwrap()
            .nested();
        let text = "/* a /* b */ c */ d";
        let mut depth = 0;
        assert_eq!(rule.find_end(text, 2, "", &mut depth), Some(17));
        assert_eq!(depth, 0);

        let mut depth = 0;
        assert_eq!(rule.find_end("/* a /* b */", 2, "", &mut depth), None);
        assert_eq!(depth, 1);
    }

    #[test]
    fn test_labeled_end() {
        fn lua_closer(opener: &str) -> String {
            let level = opener.chars().filter(|c| *c == '=').count();
            format!("]{}]", "=".repeat(level))
        }
        let rule = MultilineRule::labeled("long", r"\[=*\[", lua_closer, Format::String, 7).unwrap();
        assert_eq!(rule.label_for("[==["), Some("]==]".to_string()));
        let mut depth = 0;
        assert_eq!(rule.find_end("a]=] b]==] c", 0, "]==]", &mut depth), Some(10));
    }

    #[test]
    fn test_guard_rejects_opener() {
        fn not_after_digit(text: &str, pos: usize) -> bool {
            pos == 0 || !text.as_bytes()[pos - 1].is_ascii_digit()
        }
        let rule = MultilineRule::token("char", r"'.'", Format::String).unwrap().guarded(not_after_digit);
        assert_eq!(rule.find_start("1'0'0 'x'", 0, |_| true), Some((6, 9)));
    }
}
