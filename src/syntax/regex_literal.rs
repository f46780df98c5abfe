//! Regex and quote-like literals
//!
//! Perl, Ruby and JavaScript share the problem of telling a regex `/.../`
//! apart from division, and Perl and Ruby add operator forms with
//! arbitrary delimiters (`s{a}{b}`, `qw(...)`, `%r!...!`). This module
//! handles both and carries open literals across lines when the language
//! allows it.

use regex::Regex;

use super::context::LineCtx;
use super::format::Format;
use super::scan::{is_escaped, is_escaped_with, is_word, next_boundary};

/// What the code right before a slash looks like
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookBack<'t> {
    /// Byte directly before the slash
    pub immediate: Option<u8>,
    /// Last non-blank byte before the slash, skipping comments
    pub prev_char: Option<u8>,
    /// Identifier ending at `prev_char`, if it is one
    pub prev_word: Option<&'t str>,
    /// Byte before `prev_word` (`$`, `@`, `.` ...)
    pub sigil: Option<u8>,
    /// Whether blanks separate the slash from `prev_char`
    pub space_before: bool,
    /// Whether a blank (or the end of line) follows the slash
    pub space_after: bool,
    /// Whether a string or regex literal ends at `prev_char`
    pub after_literal: bool,
}

impl<'t> LookBack<'t> {
    /// Inspect the code before `pos`
    pub fn at(ctx: &LineCtx<'t>, pos: usize) -> Self {
        let text: &'t str = ctx.text;
        let bytes = text.as_bytes();
        let mut i = pos.min(bytes.len());
        let immediate = i.checked_sub(1).map(|p| bytes[p]);
        while i > 0 && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t' || ctx.at(i - 1) == Format::Comment) {
            i -= 1;
        }
        let prev_char = i.checked_sub(1).map(|p| bytes[p]);
        let after_literal = i > 0 && (ctx.quote_mark == i || ctx.regex_mark == i);

        let (prev_word, sigil) = match prev_char {
            Some(c) if is_word(c) => {
                let mut j = i;
                while j > 0 && is_word(bytes[j - 1]) {
                    j -= 1;
                }
                (Some(&text[j..i]), j.checked_sub(1).map(|p| bytes[p]))
            }
            _ => (None, None),
        };

        Self {
            immediate,
            prev_char,
            prev_word,
            sigil,
            space_before: i < pos,
            space_after: bytes.get(pos + 1).map_or(true, |b| *b == b' ' || *b == b'\t'),
            after_literal,
        }
    }
}

/// Shape of a quote-like operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    /// Number of delimited parts (`s///` has 2)
    pub parts: u8,
    /// Whether the operator makes a string rather than a regex
    pub quote: bool,
}

impl Operator {
    pub const MATCH: Operator = Operator { parts: 1, quote: false };
    pub const SUBSTITUTE: Operator = Operator { parts: 2, quote: false };
    pub const QUOTE: Operator = Operator { parts: 1, quote: true };
}

/// In-flight literal, as carried in a state label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// Parts still to scan
    pub parts: u8,
    /// Waiting for the opening delimiter of the next part
    pub awaiting: bool,
    /// String rather than regex
    pub quote: bool,
    /// Opening delimiter
    pub open: char,
    /// Closing delimiter
    pub close: char,
}

impl Literal {
    fn new(op: Operator, open: char) -> Self {
        Self {
            parts: op.parts,
            awaiting: false,
            quote: op.quote,
            open,
            close: closer_for(open),
        }
    }

    /// Encode for [`BlockState::label`](super::state::BlockState::label)
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.parts,
            if self.awaiting { 'w' } else { '-' },
            if self.quote { 'q' } else { 'r' },
            self.open,
            self.close
        )
    }

    /// Decode a label written by [`Literal::encode`]
    pub fn decode(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        let parts = chars.next()?.to_digit(10)? as u8;
        let awaiting = chars.next()? == 'w';
        let quote = chars.next()? == 'q';
        let open = chars.next()?;
        let close = chars.next()?;
        Some(Self {
            parts,
            awaiting,
            quote,
            open,
            close,
        })
    }

    fn paired(&self) -> bool {
        self.open != self.close
    }

    fn format(&self) -> Format {
        if self.quote {
            Format::String
        } else {
            Format::Regex
        }
    }
}

/// Bracket-pair delimiters close with their counterpart
fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    }
}

/// An opener found on the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opening {
    /// Where the literal (operator word included) starts
    pub start: usize,
    /// Where the body of the first part starts
    pub body: usize,
    /// The literal being opened
    pub literal: Literal,
}

/// Regex syntax of a language
pub struct RegexSyntax {
    /// Quote-like operators; group 1 is the operator, group 2 the delimiter
    pub operators: Option<Regex>,
    /// Shape of an operator from its name
    pub operator: fn(&str) -> Operator,
    /// Whether an operator match at a position is really an operator
    pub operator_allowed: fn(&LookBack<'_>, &str) -> bool,
    /// Whether a bare `/` can open a regex
    pub bare_slash: bool,
    /// Whether a `/` with this look-back opens a regex
    pub slash_allowed: fn(&LookBack<'_>) -> bool,
    /// Modifier letters allowed after the closing delimiter
    pub flags: &'static str,
    /// Whether `[...]` classes hide the closing delimiter
    pub classes: bool,
    /// Whether unterminated literals continue on the next line
    pub multiline: bool,
    /// State tag while a literal is open
    pub state_id: i32,
}

impl RegexSyntax {
    /// Whether an open literal is carried under `state`
    pub fn carries(&self, state: i32) -> bool {
        self.multiline && self.state_id == state
    }

    /// Find the earliest literal opener at or after `from`, before `limit`
    pub fn find_start(&self, ctx: &LineCtx<'_>, from: usize, limit: Option<usize>) -> Option<Opening> {
        let text = ctx.text;
        let limit = limit.unwrap_or(text.len()).min(text.len());
        if from >= limit {
            return None;
        }
        let by_operator = self.find_operator(ctx, from, limit);
        let slash_limit = by_operator.as_ref().map_or(limit, |o| o.start);
        let by_slash = if self.bare_slash {
            self.find_slash(ctx, from, slash_limit)
        } else {
            None
        };
        by_slash.or(by_operator)
    }

    fn find_operator(&self, ctx: &LineCtx<'_>, from: usize, limit: usize) -> Option<Opening> {
        let re = self.operators.as_ref()?;
        let text = ctx.text;
        let mut pos = from;
        while pos < limit {
            let caps = re.captures_at(text, pos)?;
            let (Some(whole), Some(name), Some(delim)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                return None;
            };
            if whole.start() >= limit {
                return None;
            }
            let lookback = LookBack::at(ctx, whole.start());
            if ctx.formats.is_unclaimed(whole.start())
                && !is_escaped(text, whole.start())
                && (self.operator_allowed)(&lookback, name.as_str())
            {
                let open = delim.as_str().chars().next()?;
                let spaced = delim.start() > name.end();
                if !(spaced && closer_for(open) == open && !matches!(open, '/' | '!' | '|')) {
                    let op = (self.operator)(name.as_str());
                    return Some(Opening {
                        start: whole.start(),
                        body: delim.end(),
                        literal: Literal::new(op, open),
                    });
                }
            }
            pos = next_boundary(text, whole.start() + 1);
        }
        None
    }

    fn find_slash(&self, ctx: &LineCtx<'_>, from: usize, limit: usize) -> Option<Opening> {
        let bytes = ctx.text.as_bytes();
        let mut pos = from;
        while pos < limit {
            if bytes[pos] != b'/' || !ctx.formats.is_unclaimed(pos) || is_escaped(ctx.text, pos) {
                pos += 1;
                continue;
            }
            if (self.slash_allowed)(&LookBack::at(ctx, pos)) {
                return Some(Opening {
                    start: pos,
                    body: pos + 1,
                    literal: Literal::new(Operator::MATCH, '/'),
                });
            }
            // division: the whole run of slashes is an operator
            while pos < limit && bytes[pos] == b'/' {
                pos += 1;
            }
        }
        None
    }

    /// Finish a literal carried in from the previous line
    pub fn resume(&self, ctx: &mut LineCtx<'_>) -> Option<usize> {
        let prev = ctx.prev;
        let Some(literal) = Literal::decode(&prev.label) else {
            return Some(0);
        };
        self.scan(ctx, 0, 0, literal, prev.open_nests)
    }

    /// Scan an opened literal to its end
    ///
    /// Returns the position after the literal (flags included), or `None`
    /// if it ran off the end of the line.
    pub fn run(&self, ctx: &mut LineCtx<'_>, opening: Opening) -> Option<usize> {
        let depth = if opening.literal.paired() { 1 } else { 0 };
        self.scan(ctx, opening.start, opening.body, opening.literal, depth)
    }

    fn scan(
        &self,
        ctx: &mut LineCtx<'_>,
        start: usize,
        body: usize,
        mut literal: Literal,
        mut depth: i32,
    ) -> Option<usize> {
        let text = ctx.text;
        let bytes = text.as_bytes();
        let mut pos = body;
        loop {
            if literal.awaiting {
                while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                let Some(open) = text[pos..].chars().next() else {
                    break;
                };
                if open.is_alphanumeric() || open == '_' {
                    // malformed second part: end the literal here
                    self.close(ctx, start, pos, &literal);
                    return Some(pos);
                }
                literal.open = open;
                literal.close = closer_for(open);
                literal.awaiting = false;
                depth = if literal.paired() { 1 } else { 0 };
                pos += open.len_utf8();
            }

            match self.body_end(text, pos, &literal, &mut depth) {
                Some(close) => {
                    literal.parts = literal.parts.saturating_sub(1);
                    pos = close + literal.close.len_utf8();
                    if literal.parts == 0 {
                        while pos < bytes.len() && self.flags.as_bytes().contains(&bytes[pos]) {
                            pos += 1;
                        }
                        self.close(ctx, start, pos, &literal);
                        return Some(pos);
                    }
                    if literal.paired() {
                        literal.awaiting = true;
                    }
                }
                None => break,
            }
        }

        let len = ctx.len();
        ctx.set(start, len, literal.format());
        if self.multiline {
            ctx.next.state = self.state_id;
            ctx.next.label = literal.encode();
            ctx.next.open_nests = depth;
        }
        None
    }

    fn close(&self, ctx: &mut LineCtx<'_>, start: usize, end: usize, literal: &Literal) {
        ctx.set(start, end, literal.format());
        if literal.quote {
            ctx.quote_mark = end;
        } else {
            ctx.regex_mark = end;
        }
    }

    /// Position of the delimiter closing the current part
    fn body_end(&self, text: &str, from: usize, literal: &Literal, depth: &mut i32) -> Option<usize> {
        let mut in_class = false;
        for (pos, c) in text.get(from..)?.char_indices().map(|(i, c)| (from + i, c)) {
            if is_escaped_with(text, from, pos, b'\\') {
                continue;
            }
            if self.classes && !literal.quote {
                if in_class {
                    if c == ']' {
                        in_class = false;
                    }
                    continue;
                }
                if c == '[' && literal.open != '[' {
                    in_class = true;
                    continue;
                }
            }
            if literal.paired() {
                if c == literal.open {
                    *depth += 1;
                } else if c == literal.close {
                    *depth -= 1;
                    if *depth <= 0 {
                        return Some(pos);
                    }
                }
            } else if c == literal.close {
                return Some(pos);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::state::{tag, BlockState};

    fn slash_after_operator(lb: &LookBack<'_>) -> bool {
        !lb.after_literal
            && match lb.prev_char {
                None => true,
                Some(c) if is_word(c) => lb.prev_word == Some("return"),
                Some(b')' | b']' | b'}') => false,
                Some(_) => true,
            }
    }

    fn any_operator(_: &LookBack<'_>, _: &str) -> bool {
        true
    }

    fn perlish(name: &str) -> Operator {
        match name {
            "s" | "tr" | "y" => Operator::SUBSTITUTE,
            "q" | "qq" | "qw" => Operator::QUOTE,
            _ => Operator::MATCH,
        }
    }

    fn syntax() -> RegexSyntax {
        RegexSyntax {
            operators: Regex::new(r"\b(m|s|tr|y|q|qq|qw)\s*([^\w\s])").ok(),
            operator: perlish,
            operator_allowed: any_operator,
            bare_slash: true,
            slash_allowed: slash_after_operator,
            flags: "gimsx",
            classes: true,
            multiline: true,
            state_id: tag::REGEX,
        }
    }

    fn lex(text: &str, prev: &BlockState) -> (Vec<Format>, BlockState) {
        let syntax = syntax();
        let mut ctx = LineCtx::new(text, prev, true);
        let mut pos = 0;
        if syntax.carries(prev.state) {
            match syntax.resume(&mut ctx) {
                Some(end) => pos = end,
                None => pos = text.len(),
            }
        }
        while let Some(open) = syntax.find_start(&ctx, pos, None) {
            match syntax.run(&mut ctx, open) {
                Some(end) => pos = end,
                None => break,
            }
        }
        let formats = (0..text.len()).map(|i| ctx.at(i)).collect();
        (formats, ctx.next)
    }

    #[test]
    fn test_label_encoding() {
        let literal = Literal::new(Operator::SUBSTITUTE, '{');
        assert_eq!(literal.encode(), "2-r{}");
        assert_eq!(Literal::decode("2-r{}"), Some(literal));
        assert_eq!(Literal::decode("x"), None);
    }

    #[test]
    fn test_division_is_not_regex() {
        let (formats, exit) = lex("x = a / 2 / 3", &BlockState::default());
        assert!(formats.iter().all(|f| *f == Format::Default));
        assert!(exit.is_clean());
    }

    #[test]
    fn test_slash_regex_with_flags() {
        let text = "x = /a[/]b/gi;";
        let (formats, _) = lex(text, &BlockState::default());
        assert_eq!(formats[4], Format::Regex);
        assert_eq!(formats[12], Format::Regex);
        assert_eq!(formats[13], Format::Default);
    }

    #[test]
    fn test_substitute_with_brackets() {
        let text = "s{a{1}}  {b} + 1";
        let (formats, exit) = lex(text, &BlockState::default());
        assert_eq!(formats[0], Format::Regex);
        assert_eq!(formats[11], Format::Regex);
        assert_eq!(formats[13], Format::Default);
        assert!(exit.is_clean());
    }

    #[test]
    fn test_open_literal_carried() {
        let (_, exit) = lex("qw(a b", &BlockState::default());
        assert!(exit.is(tag::REGEX));
        assert_eq!(exit.open_nests, 1);

        let (formats, exit) = lex("c) x", &exit);
        assert_eq!(formats[0], Format::String);
        assert_eq!(formats[1], Format::String);
        assert_eq!(formats[3], Format::Default);
        assert!(exit.is_clean());
    }

    #[test]
    fn test_second_part_on_next_line() {
        let (_, exit) = lex("s(a)", &BlockState::default());
        assert_eq!(Literal::decode(&exit.label).map(|l| l.awaiting), Some(true));
        let (formats, exit) = lex("  (b)g;", &exit);
        assert_eq!(formats[2], Format::Regex);
        assert_eq!(formats[5], Format::Regex);
        assert_eq!(formats[6], Format::Default);
        assert!(exit.is_clean());
    }
}
