//! reStructuredText lexer
//!
//! Literal blocks and comments are defined by indentation: the label
//! holds the indent of the line that opened them, and every following
//! line indented deeper belongs to the block.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, PatternRule};
use crate::syntax::scan;
use crate::syntax::state::{tag, BlockState};

/// After `::`, or inside the literal block that follows it
const LITERAL: i32 = tag::LANGUAGE_BASE;

/// Directives whose content is code
const CODE_DIRECTIVES: &[&str] = &["code", "code-block", "sourcecode", "highlight", "parsed-literal", "math"];

pub struct Rest;

static EXPLICIT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(\s*)\.\.(?:\s+(?:(\|[^|]+\|\s+)?([\w:.+-]+)::|(\[[^\]]+\])|(_[^:]+:|__:))|\s|$)").ok()
});

fn inline_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("literal", r"``[^`]+``", Format::CodeBlock, 100),
        PatternRule::new("url", r"\b(?:https?|ftp)://[^\s<>`]+", Format::Url, 95),
        PatternRule::new("role", r":[\w.+-]+:`[^`]+`|`[^`]+`:[\w.+-]+:", Format::Attribute, 92),
        PatternRule::new("hyperlink", r"`[^`]+`__?", Format::Link, 90),
        PatternRule::new("interpreted", r"`[^`]+`", Format::Emphasis, 88),
        PatternRule::new("footnote_ref", r"\[(?:\d+|#\w*|\*|[A-Za-z][\w.-]*)\]_", Format::Link, 86),
        PatternRule::new("reference", r"\b\w[\w.-]*__?\b", Format::Link, 84),
        PatternRule::new("strong", r"\*\*[^*\s](?:[^*]*[^*\s])?\*\*", Format::Strong, 82),
        PatternRule::new("emphasis", r"\*[^*\s](?:[^*]*[^*\s])?\*", Format::Emphasis, 80),
        PatternRule::new("substitution", r"\|[^|\s](?:[^|]*[^|\s])?\|_{0,2}", Format::Special, 78),
        PatternRule::new("field", r"^\s*:[^:\s][^:]*:(?:\s|$)", Format::Key, 76),
        PatternRule::new("bullet", r"^\s*(?:[-*+•]|\d+[.)]|#[.)]|\(\d+\))\s", Format::Operator, 70),
        PatternRule::new("option", r"^\s*--?[A-Za-z][\w-]*", Format::Attribute, 65),
        PatternRule::new("literal_marker", r"::\s*$", Format::Special, 60),
    ]
}

static INLINE: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(inline_rules()));

/// A section adornment: one punctuation character repeated
fn is_adornment(text: &str) -> bool {
    let trimmed = text.trim_end();
    let mut bytes = trimmed.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_punctuation() => trimmed.len() >= 4 && bytes.all(|b| b == first),
        _ => false,
    }
}

fn leading_whitespace(text: &str) -> &str {
    &text[..text.len() - text.trim_start().len()]
}

/// Whether this line continues the indented block carried in `prev`
fn in_block(ctx: &LineCtx<'_>) -> bool {
    let prev = ctx.prev;
    (prev.is(LITERAL) || prev.is(tag::COMMENT)) && ctx.indent() > prev.label.len()
}

/// Explicit markup (`.. `); returns the state the line hands on
fn explicit_markup(ctx: &mut LineCtx<'_>, caps: &regex::Captures<'_>) -> BlockState {
    let text = ctx.text;
    let len = text.len();
    let indent = caps.get(1).map_or("", |m| m.as_str());
    let start = indent.len();
    let end = caps.get(0).map_or(len, |m| m.end());

    if let Some(name) = caps.get(3) {
        if let Some(sub) = caps.get(2) {
            ctx.set(sub.start(), sub.end(), Format::Special);
        }
        ctx.set(start, start + 2, Format::Keyword);
        ctx.set(name.start(), end, Format::Keyword);
        let args = text[end..].trim();
        if !args.is_empty() {
            let at = end + text[end..].find(args).unwrap_or(0);
            ctx.set(at, at + args.len(), Format::Value);
        }
        if CODE_DIRECTIVES.contains(&name.as_str()) {
            return BlockState::labeled(LITERAL, indent);
        }
        return BlockState::default();
    }
    if caps.get(4).is_some() || caps.get(5).is_some() {
        ctx.set(start, end, Format::Link);
        let rest = text[end..].trim_start();
        if !rest.is_empty() {
            ctx.set_unclaimed(len - rest.len(), len, Format::Url);
        }
        return BlockState::default();
    }

    ctx.set(start, len, Format::Comment);
    scan::decorate_literal(ctx, start, len, Format::Comment);
    BlockState::labeled(tag::COMMENT, indent)
}

impl Lexer for Rest {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let text = ctx.text;
        let len = text.len();

        if prev.is(LITERAL) || prev.is(tag::COMMENT) {
            if ctx.is_blank() {
                ctx.next = prev.clone();
                return;
            }
            if in_block(ctx) {
                let format = if prev.is(LITERAL) { Format::CodeBlock } else { Format::Comment };
                ctx.set(0, len, format);
                if format == Format::Comment {
                    scan::decorate_literal(ctx, 0, len, format);
                }
                ctx.next = BlockState {
                    property: true,
                    ..prev.clone()
                };
                return;
            }
        }

        if is_adornment(text) {
            ctx.set(0, len, Format::Heading);
            return;
        }

        if let Some(caps) = EXPLICIT.as_ref().and_then(|re| re.captures(text)) {
            ctx.next = explicit_markup(ctx, &caps);
            ctx.decorate_range(0..len, &INLINE);
            return;
        }

        ctx.decorate(&INLINE);
        if text.trim_end().ends_with("::") {
            ctx.next = BlockState::labeled(LITERAL, leading_whitespace(text));
        }
    }
}
