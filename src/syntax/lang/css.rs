//! CSS lexer
//!
//! A small state machine over blocks (`{ }`, depth in `open_nests`) and
//! value regions (`property: value;`, open flag in `property`). Braces
//! inside strings, comments, `url(...)` and attribute selectors never
//! count as block delimiters. Decorative rules then run per region, so
//! `#fff` in a value is a colour while `#main` in a selector is an id.

use std::ops::Range;

use once_cell::sync::Lazy;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, PatternRule};
use crate::syntax::scan::{self, ends_with_continuation, is_escaped_with};
use crate::syntax::state::{tag, BlockState};

pub struct Css;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Selector,
    Declaration,
    Value,
}

fn selector_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("at_rule", r"@[\w-]+", Format::Preprocessor, 90),
        PatternRule::new("pseudo", r"::?[A-Za-z-][\w-]*", Format::Keyword, 85),
        PatternRule::new("class", r"\.[A-Za-z_-][\w-]*", Format::Type, 80),
        PatternRule::new("id", r"#[A-Za-z_-][\w-]*", Format::Constant, 80),
        PatternRule::new("number", r"\b\d+(?:\.\d+)?(?:%|[A-Za-z]+)?", Format::Number, 70),
        PatternRule::new("element", r"\b[A-Za-z][\w-]*\b", Format::Tag, 60),
        PatternRule::new("combinator", r"[>+~*,&]", Format::Operator, 40),
    ]
}

fn declaration_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("at_rule", r"@[\w-]+", Format::Preprocessor, 90),
        PatternRule::new("property", r"-{0,2}[A-Za-z][\w-]*", Format::Key, 80),
    ]
}

fn value_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("important", r"!\s*important\b", Format::Keyword, 95),
        PatternRule::new("color", r"#[0-9a-fA-F]{3,8}\b", Format::Constant, 90),
        PatternRule::with_group("function", r"([A-Za-z-][\w-]*)\(", Format::Function, 85, 1),
        PatternRule::new("number", r"-?(?:\d+\.?\d*|\.\d+)(?:%|[A-Za-z]+)?", Format::Number, 80),
        PatternRule::new("variable", r"--[\w-]+", Format::Variable, 75),
        PatternRule::new("value", r"[A-Za-z_-][\w-]*", Format::Value, 50),
        PatternRule::new("operator", r"[,/+*]", Format::Operator, 40),
    ]
}

static SELECTOR: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(selector_rules()));
static DECLARATION: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(declaration_rules()));
static VALUE: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(value_rules()));

/// Position of the unescaped `quote` closing a string whose body starts at `from`
fn quote_end(text: &str, from: usize, quote: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..bytes.len()).find(|&i| bytes[i] == quote && !is_escaped_with(text, from, i, b'\\'))
}

/// Scanner state for one line
struct Walker {
    depth: i32,
    in_value: bool,
    seg: usize,
    regions: Vec<(Range<usize>, Region)>,
}

impl Walker {
    fn region(&self) -> Region {
        if self.in_value {
            Region::Value
        } else if self.depth > 0 {
            Region::Declaration
        } else {
            Region::Selector
        }
    }

    /// Close the current region at `end`; the next one starts at `next`
    fn cut(&mut self, end: usize, next: usize) {
        if end > self.seg {
            self.regions.push((self.seg..end, self.region()));
        }
        self.seg = next;
    }

    /// Hand the line over: decorate regions and write the exit state
    fn finish(mut self, ctx: &mut LineCtx<'_>, state: i32) {
        let len = ctx.len();
        self.cut(len, len);
        for (range, region) in self.regions {
            let table: &[PatternRule] = match region {
                Region::Selector => &SELECTOR,
                Region::Declaration => &DECLARATION,
                Region::Value => &VALUE,
            };
            ctx.decorate_range(range, table);
        }
        ctx.next = BlockState {
            state,
            open_nests: self.depth,
            property: self.in_value && self.depth > 0,
            ..Default::default()
        };
    }
}

/// A string starting at `pos` (the quote); `None` if it stays open
fn string(ctx: &mut LineCtx<'_>, pos: usize) -> Result<usize, i32> {
    let text = ctx.text;
    let quote = text.as_bytes()[pos];
    match quote_end(text, pos + 1, quote) {
        Some(end) => {
            ctx.set(pos, end + 1, Format::String);
            ctx.quote_mark = end + 1;
            Ok(end + 1)
        }
        None => {
            let len = ctx.len();
            if ends_with_continuation(text) {
                ctx.set(pos, len, Format::String);
                Err(if quote == b'"' { tag::DOUBLE_QUOTE } else { tag::SINGLE_QUOTE })
            } else {
                ctx.set(pos, len, Format::Error);
                Err(tag::CLEAN)
            }
        }
    }
}

/// A comment starting at `pos`; `Err` if it stays open
fn comment(ctx: &mut LineCtx<'_>, pos: usize, body: usize) -> Result<usize, i32> {
    let text = ctx.text;
    let end = text[body..].find("*/").map(|i| body + i + 2);
    let stop = end.unwrap_or(text.len());
    ctx.set(pos, stop, Format::Comment);
    scan::decorate_literal(ctx, pos, stop, Format::Comment);
    end.ok_or(tag::COMMENT)
}

/// An attribute selector from `[`; braces and quotes inside are inert
fn attribute_selector(ctx: &mut LineCtx<'_>, pos: usize) -> usize {
    let text = ctx.text;
    let bytes = text.as_bytes();
    let mut i = pos + 1;
    while i < bytes.len() && bytes[i] != b']' {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                let end = quote_end(text, i + 1, quote).map_or(bytes.len(), |e| e + 1);
                ctx.set(i, end, Format::String);
                i = end;
            }
            b'=' | b'~' | b'|' | b'^' | b'$' | b'*' => {
                ctx.set(i, i + 1, Format::Operator);
                i += 1;
            }
            _ => {
                let end = scan::next_boundary(text, i + 1);
                ctx.set(i, end, Format::Attribute);
                i = end;
            }
        }
    }
    (i + 1).min(bytes.len())
}

impl Lexer for Css {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let text = ctx.text;
        let bytes = text.as_bytes();
        let len = text.len();
        let mut walker = Walker {
            depth: prev.open_nests.max(0),
            in_value: prev.property,
            seg: 0,
            regions: Vec::new(),
        };

        let mut pos = 0;
        let resumed = match prev.state {
            tag::COMMENT => comment(ctx, 0, 0),
            quote @ (tag::DOUBLE_QUOTE | tag::SINGLE_QUOTE) => {
                let mark = if quote == tag::DOUBLE_QUOTE { b'"' } else { b'\'' };
                match quote_end(text, 0, mark) {
                    Some(end) => {
                        ctx.set(0, end + 1, Format::String);
                        Ok(end + 1)
                    }
                    None => {
                        ctx.set(0, len, Format::String);
                        Err(if ends_with_continuation(text) { quote } else { tag::CLEAN })
                    }
                }
            }
            _ => Ok(0),
        };
        match resumed {
            Ok(next) => pos = next,
            Err(state) => return walker.finish(ctx, state),
        }
        walker.seg = pos;

        while pos < len {
            match bytes[pos] {
                b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                    walker.cut(pos, pos);
                    match comment(ctx, pos, pos + 2) {
                        Ok(end) => pos = end,
                        Err(state) => return walker.finish(ctx, state),
                    }
                }
                b'"' | b'\'' => match string(ctx, pos) {
                    Ok(end) => pos = end,
                    Err(state) => return walker.finish(ctx, state),
                },
                b'[' if !walker.in_value => {
                    walker.cut(pos, pos);
                    pos = attribute_selector(ctx, pos);
                    walker.seg = pos;
                }
                b'{' => {
                    walker.cut(pos, pos + 1);
                    walker.depth += 1;
                    walker.in_value = false;
                    pos += 1;
                }
                b'}' => {
                    walker.cut(pos, pos + 1);
                    walker.depth = (walker.depth - 1).max(0);
                    walker.in_value = false;
                    pos += 1;
                }
                b':' if walker.depth > 0 && !walker.in_value => {
                    walker.cut(pos, pos + 1);
                    walker.in_value = true;
                    pos += 1;
                }
                b';' => {
                    walker.cut(pos, pos + 1);
                    walker.in_value = false;
                    pos += 1;
                }
                b'u' | b'U' if walker.in_value && text[pos..].to_ascii_lowercase().starts_with("url(") => {
                    let body = pos + 4;
                    match bytes.get(body) {
                        Some(b'"' | b'\'') => pos = body,
                        _ => {
                            let close = text[body..].find(')').map_or(len, |i| body + i);
                            ctx.set(pos, body - 1, Format::Function);
                            ctx.set(body, close, Format::Url);
                            pos = close;
                        }
                    }
                }
                _ => pos = scan::next_boundary(text, pos + 1),
            }
        }
        walker.finish(ctx, tag::CLEAN);
    }
}
