//! Generic lexical primitives
//!
//! The structural engine here is shared by every code language: it walks
//! a line finding the earliest opener among the language's multi-line
//! rules (and regex literals, if it has them), closes each construct on
//! the same line when it can, and persists the open one in the exit state
//! when it cannot.

use once_cell::sync::Lazy;
use regex::Regex;

use super::context::LineCtx;
use super::format::Format;
use super::regex_literal::RegexSyntax;
use super::rules::{Closer, Multiline, MultilineRule};

static NOTES: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\b(?:TODO|FIXME|XXX|HACK|NOTE|BUG)\b").ok());

static URLS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"\b(?:https?|ftp|file)://[^\s<>"'`)\]}]+|\b[\w.+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+\b"#).ok()
});

/// Whether the character at `pos` is escaped by a backslash
pub fn is_escaped(text: &str, pos: usize) -> bool {
    is_escaped_with(text, 0, pos, b'\\')
}

/// Whether the character at `pos` is escaped by `esc`
///
/// Counts consecutive escape characters immediately before `pos`, never
/// looking at or before `floor`. An odd count means escaped.
pub fn is_escaped_with(text: &str, floor: usize, pos: usize, esc: u8) -> bool {
    let bytes = text.as_bytes();
    let mut i = pos.min(bytes.len());
    let mut count = 0;
    while i > floor && bytes[i - 1] == esc {
        count += 1;
        i -= 1;
    }
    count % 2 == 1
}

/// Whether the line ends with an unescaped backslash
pub fn ends_with_continuation(text: &str) -> bool {
    text.ends_with('\\') && !is_escaped(text, text.len() - 1)
}

/// First char boundary at or after `pos`
pub fn next_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

/// Whether `b` can be part of an identifier
pub fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// The structural grammar of a code language
pub struct Grammar<'g> {
    /// Comment and string rules, in tie-break order
    pub rules: &'g [MultilineRule],
    /// Regex and quote-like literals, if the language has them
    pub regex: Option<&'g RegexSyntax>,
}

impl<'g> Grammar<'g> {
    /// A grammar without regex literals
    pub fn new(rules: &'g [MultilineRule]) -> Self {
        Self { rules, regex: None }
    }

    /// A grammar with regex literals
    pub fn with_regex(rules: &'g [MultilineRule], regex: &'g RegexSyntax) -> Self {
        Self {
            rules,
            regex: Some(regex),
        }
    }
}

/// Run the structural layer over the whole line
pub fn structure(ctx: &mut LineCtx<'_>, grammar: &Grammar<'_>) {
    structure_from(ctx, grammar, 0);
}

/// Run the structural layer starting at `from`
///
/// A construct carried in from the previous line is finished first, but
/// only when `from` is 0. Returns `false` if the line ended inside an
/// open construct.
pub fn structure_from(ctx: &mut LineCtx<'_>, grammar: &Grammar<'_>, from: usize) -> bool {
    let mut pos = from;
    if from == 0 {
        match resume(ctx, grammar) {
            Some(next) => pos = next,
            None => return false,
        }
    }

    let text = ctx.text;
    while pos < text.len() {
        let mut best: Option<(usize, usize, &MultilineRule)> = None;
        for rule in grammar.rules {
            let limit = best.map_or(text.len(), |(start, _, _)| start);
            if pos >= limit {
                break;
            }
            if let Some((start, end)) = rule.find_start(text, pos, |p| ctx.formats.is_unclaimed(p)) {
                if start < limit {
                    best = Some((start, end, rule));
                }
            }
        }

        if let Some(regex) = grammar.regex {
            let limit = best.map(|(start, _, _)| start);
            if let Some(open) = regex.find_start(ctx, pos, limit) {
                match regex.run(ctx, open) {
                    Some(end) => {
                        pos = end.max(pos + 1);
                        continue;
                    }
                    None => return false,
                }
            }
        }

        let Some((start, end, rule)) = best else {
            break;
        };
        let label = rule.label_for(&text[start..end]).unwrap_or_default();
        let depth = if rule.nested { 1 } else { 0 };
        match finish(ctx, rule, start, end, &label, depth) {
            Some(close) => pos = close.max(start + 1),
            None => return false,
        }
    }
    true
}

/// Finish a construct carried in from the previous line
///
/// Returns where ordinary scanning resumes, or `None` if the whole line
/// stayed inside the construct.
fn resume(ctx: &mut LineCtx<'_>, grammar: &Grammar<'_>) -> Option<usize> {
    let prev = ctx.prev;
    if prev.state == 0 {
        return Some(0);
    }
    if let Some(rule) = grammar.rules.iter().find(|r| r.carries(prev.state)) {
        return finish(ctx, rule, 0, 0, &prev.label, prev.open_nests);
    }
    if let Some(regex) = grammar.regex {
        if regex.carries(prev.state) {
            return regex.resume(ctx);
        }
    }
    Some(0)
}

/// Scan for the closer of an opened construct and format it
fn finish(
    ctx: &mut LineCtx<'_>,
    rule: &MultilineRule,
    start: usize,
    body: usize,
    label: &str,
    mut depth: i32,
) -> Option<usize> {
    match rule.find_end(ctx.text, body, label, &mut depth) {
        Some(end) => {
            mark(ctx, rule.format, start, end);
            Some(end)
        }
        None => {
            let len = ctx.len();
            mark(ctx, rule.format, start, len);
            let carried = match rule.multiline {
                Multiline::Yes => !matches!(rule.closer, Closer::EndOfLine),
                Multiline::Backslash => ends_with_continuation(ctx.text),
                Multiline::No => false,
            };
            if carried && rule.state_id != 0 {
                ctx.next.state = rule.state_id;
                ctx.next.open_nests = if rule.nested { depth } else { 0 };
                if matches!(rule.closer, Closer::Label(_)) {
                    ctx.next.label = label.to_string();
                }
            }
            None
        }
    }
}

/// Format a finished literal and move the watermarks past it
fn mark(ctx: &mut LineCtx<'_>, format: Format, start: usize, end: usize) {
    ctx.set(start, end, format);
    match format {
        Format::String | Format::AltString => ctx.quote_mark = end,
        Format::Regex => ctx.regex_mark = end,
        _ => {}
    }
    decorate_literal(ctx, start, end, format);
}

/// Layer URLs (and notes, in comments) over a literal span
pub fn decorate_literal(ctx: &mut LineCtx<'_>, start: usize, end: usize, format: Format) {
    if !ctx.full || start >= end {
        return;
    }
    let Some(slice) = ctx.text.get(start..end) else {
        return;
    };
    if let Some(urls) = URLS.as_ref() {
        for m in urls.find_iter(slice) {
            ctx.formats.set(start + m.start(), m.len(), Format::Url);
        }
    }
    if format == Format::Comment {
        if let Some(notes) = NOTES.as_ref() {
            for m in notes.find_iter(slice) {
                ctx.formats.set(start + m.start(), m.len(), Format::Note);
            }
        }
    }
}

/// Here-document syntax
///
/// The opener pattern captures an optional indentation flag (`-` or `~`)
/// in group 1 and the terminator word in the first of groups 2..=4 that
/// matched. The body starts on the line after the opener.
pub struct Heredoc {
    /// Opener pattern
    pub opener: Regex,
    /// Format for the body
    pub format: Format,
    /// State tag while the body is open
    pub state_id: i32,
    /// Whether the terminator may always be indented
    pub indented: bool,
}

/// Outcome of checking a line against an open here-document
pub enum HeredocLine {
    /// No here-document was open
    Outside,
    /// The line is body text; nothing else applies to it
    Body,
    /// The line terminated the body; lexing continues at this position
    Closed(usize),
}

impl Heredoc {
    /// Create a here-document syntax
    pub fn new(opener: &str, format: Format, state_id: i32, indented: bool) -> Option<Self> {
        Some(Self {
            opener: Regex::new(opener).ok()?,
            format,
            state_id,
            indented,
        })
    }

    /// Handle a line that starts inside an open body
    pub fn resume(&self, ctx: &mut LineCtx<'_>) -> HeredocLine {
        if !ctx.prev.is(self.state_id) {
            return HeredocLine::Outside;
        }
        let label = ctx.prev.label.as_str();
        let (indented, word) = match label.strip_prefix('~') {
            Some(word) => (true, word),
            None => (self.indented, label),
        };
        let offset = if indented { ctx.indent() } else { 0 };
        let rest = &ctx.text[offset..];
        let terminated = rest.starts_with(word)
            && !word.is_empty()
            && rest[word.len()..]
                .bytes()
                .next()
                .map_or(true, |b| !is_word(b));
        if terminated {
            let end = offset + word.len();
            ctx.set(offset, end, Format::Special);
            HeredocLine::Closed(end)
        } else {
            let len = ctx.len();
            ctx.set(0, len, self.format);
            ctx.next = ctx.prev.clone();
            HeredocLine::Body
        }
    }

    /// Look for an opener in code text and open the body for the next line
    ///
    /// Only the first opener counts, and only if nothing else is already
    /// carried into the next line.
    pub fn open(&self, ctx: &mut LineCtx<'_>) {
        if !ctx.next.is_clean() {
            return;
        }
        let text = ctx.text;
        for caps in self.opener.captures_iter(text) {
            let Some(m) = caps.get(0) else {
                continue;
            };
            let start = m.start();
            if ctx.at(start).is_literal() || (start > 0 && text.as_bytes()[start - 1] == b'<') {
                continue;
            }
            let Some(word) = (2..=4).find_map(|i| caps.get(i)) else {
                continue;
            };
            let flagged = caps.get(1).is_some_and(|f| !f.as_str().is_empty());
            ctx.set(start, m.end(), Format::Special);
            let label = if flagged {
                format!("~{}", word.as_str())
            } else {
                word.as_str().to_string()
            };
            ctx.next = super::state::BlockState::labeled(self.state_id, label);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::lex_line;
    use crate::syntax::state::{tag, BlockState};
    use crate::syntax::Language;
    use rstest::rstest;

    fn string_rules() -> Vec<MultilineRule> {
        vec![
            MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT).unwrap(),
            MultilineRule::line("line_comment", "//", Format::Comment).unwrap(),
            MultilineRule::with_escape("string", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\')
                .unwrap()
                .continued_by_backslash(tag::DOUBLE_QUOTE),
        ]
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(2, false)]
    #[case(3, true)]
    #[case(4, false)]
    fn test_escape_parity(#[case] backslashes: usize, #[case] escaped: bool) {
        let text = format!("a{}\"", "\\".repeat(backslashes));
        assert_eq!(is_escaped(&text, text.len() - 1), escaped);
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, false)]
    #[case(2, true)]
    #[case(3, false)]
    #[case(4, true)]
    fn test_c_string_closes_by_parity(#[case] backslashes: usize, #[case] closes: bool) {
        let text = format!("s = \"a{}\" rest", "\\".repeat(backslashes));
        let quote = 6 + backslashes;
        let (formats, exit) = lex_line(Language::C, &text, &BlockState::default());
        assert_eq!(formats[quote], Format::String);
        let after = if closes { Format::Default } else { Format::String };
        assert_eq!(formats[quote + 2], after);
        assert!(exit.is_clean());
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, false)]
    #[case(2, true)]
    #[case(3, false)]
    #[case(4, true)]
    fn test_json_string_closes_by_parity(#[case] backslashes: usize, #[case] closes: bool) {
        let text = format!("[\"a{}\", 1]", "\\".repeat(backslashes));
        let quote = 3 + backslashes;
        let (formats, exit) = lex_line(Language::Json, &text, &BlockState::default());
        if closes {
            assert_eq!(formats[quote], Format::String);
            assert_eq!(formats[quote + 3], Format::Number);
            assert!(exit.is_clean());
        } else {
            assert_eq!(formats[quote], Format::Error);
            assert_eq!(formats[quote + 3], Format::Error);
            assert_eq!(exit.label, "a");
        }
    }

    #[test]
    fn test_escape_floor() {
        assert!(is_escaped_with(r"\\x", 1, 2, b'\\'));
        assert!(!is_escaped_with(r"\x", 1, 1, b'\\'));
    }

    #[test]
    fn test_continuation() {
        assert!(ends_with_continuation("abc \\"));
        assert!(!ends_with_continuation("abc \\\\"));
        assert!(!ends_with_continuation("abc"));
        assert!(!ends_with_continuation(""));
    }

    #[test]
    fn test_structure_closes_on_line() {
        let rules = string_rules();
        let prev = BlockState::default();
        let mut ctx = LineCtx::new(r#"x = "a // b"; // c"#, &prev, true);
        structure(&mut ctx, &Grammar::new(&rules));
        assert_eq!(ctx.at(4), Format::String);
        assert_eq!(ctx.at(8), Format::String);
        assert_eq!(ctx.at(12), Format::Default);
        assert_eq!(ctx.at(14), Format::Comment);
        assert!(ctx.next.is_clean());
    }

    #[test]
    fn test_structure_carries_block_comment() {
        let rules = string_rules();
        let prev = BlockState::default();
        let mut ctx = LineCtx::new("a /* b", &prev, true);
        structure(&mut ctx, &Grammar::new(&rules));
        assert!(ctx.next.is(tag::COMMENT));

        let carried = ctx.next.clone();
        let mut ctx = LineCtx::new("b */ \"c\"", &carried, true);
        structure(&mut ctx, &Grammar::new(&rules));
        assert_eq!(ctx.at(0), Format::Comment);
        assert_eq!(ctx.at(3), Format::Comment);
        assert_eq!(ctx.at(5), Format::String);
        assert!(ctx.next.is_clean());
    }

    #[test]
    fn test_string_needs_backslash_to_continue() {
        let rules = string_rules();
        let prev = BlockState::default();
        let mut ctx = LineCtx::new("x = \"open", &prev, true);
        structure(&mut ctx, &Grammar::new(&rules));
        assert_eq!(ctx.at(8), Format::String);
        assert!(ctx.next.is_clean());

        let mut ctx = LineCtx::new("x = \"open\\", &prev, true);
        structure(&mut ctx, &Grammar::new(&rules));
        assert!(ctx.next.is(tag::DOUBLE_QUOTE));
    }

    #[test]
    fn test_decorate_notes_and_urls() {
        let prev = BlockState::default();
        let text = "// TODO see https://example.com/x";
        let mut ctx = LineCtx::new(text, &prev, true);
        ctx.set(0, text.len(), Format::Comment);
        decorate_literal(&mut ctx, 0, text.len(), Format::Comment);
        assert_eq!(ctx.at(3), Format::Note);
        assert_eq!(ctx.at(12), Format::Url);
        assert_eq!(ctx.at(0), Format::Comment);
    }

    #[test]
    fn test_heredoc_open_and_close() {
        let heredoc = Heredoc::new(
            r#"<<([-~]?)\s*(?:'(\w+)'|"(\w+)"|(\w+))"#,
            Format::String,
            tag::HEREDOC,
            false,
        )
        .unwrap();
        let prev = BlockState::default();
        let mut ctx = LineCtx::new("cat <<-EOF", &prev, true);
        heredoc.open(&mut ctx);
        assert_eq!(ctx.next, BlockState::labeled(tag::HEREDOC, "~EOF"));

        let open = ctx.next.clone();
        let mut ctx = LineCtx::new("body text", &open, true);
        assert!(matches!(heredoc.resume(&mut ctx), HeredocLine::Body));
        assert_eq!(ctx.at(0), Format::String);
        assert_eq!(ctx.next, open);

        let mut ctx = LineCtx::new("\tEOF", &open, true);
        assert!(matches!(heredoc.resume(&mut ctx), HeredocLine::Closed(4)));
        assert!(ctx.next.is_clean());
    }
}
