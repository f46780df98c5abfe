//! Markdown lexer
//!
//! Block structure decides what a line is before any inline rule runs.
//! Fenced code carries its fence and info string in the label (`~~~|py`)
//! and, for a known language, the embedded lexer's state in `sub`. The
//! label of every other state is the content indent of the enclosing
//! list item, which indented code is measured against.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::{Language, Lexer};
use crate::syntax::rules::{self, PatternRule};
use crate::syntax::scan;
use crate::syntax::state::{tag, BlockState};

/// Inside fenced code
const FENCE: i32 = tag::LANGUAGE_BASE;
/// After a line of indented code
const INDENTED_CODE: i32 = tag::LANGUAGE_BASE + 1;
/// After a line of paragraph text
const PARAGRAPH: i32 = tag::LANGUAGE_BASE + 2;

pub struct Markdown;

static FENCE_OPEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})\s*([\w+#.-]*)").ok());
static ATX_HEADING: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^ {0,3}#{1,6}(?:\s|$)").ok());
static SETEXT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^ {0,3}(?:=+|-+)\s*$").ok());
static THEMATIC_BREAK: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^ {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").ok());
static LIST_ITEM: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^(\s*(?:[-*+]|\d{1,9}[.)]))(?:[ \t]+|$)").ok());
static QUOTE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^ {0,3}>").ok());

fn inline_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("code_span", r"`+[^`]+`+", Format::CodeBlock, 100),
        PatternRule::new("autolink", r"<(?:https?|ftp|mailto):[^>\s]+>", Format::Url, 95),
        PatternRule::new("html_tag", r"</?[A-Za-z][\w-]*(?:\s[^<>]*)?/?>", Format::Tag, 92),
        PatternRule::new("image_or_link", r"!?\[[^\]]*\](?:\([^)]*\)|\[[^\]]*\])", Format::Link, 90),
        PatternRule::new("reference", r"^ {0,3}\[[^\]]+\]:\s*\S+", Format::Link, 89),
        PatternRule::new("strong", r"\*\*[^*\s](?:[^*]*[^*\s])?\*\*|\b__[^_\s](?:[^_]*[^_\s])?__\b", Format::Strong, 85),
        PatternRule::new("emphasis", r"\*[^*\s](?:[^*]*[^*\s])?\*|\b_[^_\s](?:[^_]*[^_\s])?_\b", Format::Emphasis, 80),
        PatternRule::new("escape", r"\\[\\`*_{}\[\]()#+\-.!<>]", Format::Special, 75),
    ]
}

static INLINE: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(inline_rules()));

fn matches(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Leading whitespace width, tabs to the next multiple of four
fn indent_columns(text: &str) -> usize {
    let mut cols = 0;
    for b in text.bytes() {
        match b {
            b' ' => cols += 1,
            b'\t' => cols = (cols / 4 + 1) * 4,
            _ => break,
        }
    }
    cols
}

/// Language of a fence info string, if it has a lexer worth embedding
fn fence_language(info: &str) -> Option<Language> {
    Language::from_name(info)
        .ok()
        .filter(|lang| !matches!(lang, Language::Markdown | Language::Plain))
}

/// A line inside fenced code; returns true if it closed the fence
fn fenced_line(ctx: &mut LineCtx<'_>) -> bool {
    let prev = ctx.prev;
    let (fence, info) = prev.label.split_once('|').unwrap_or((prev.label.as_str(), ""));
    let text = ctx.text;
    let len = text.len();
    let trimmed = text.trim_start_matches(' ');
    let fence_char = fence.chars().next().unwrap_or('`');
    let run = trimmed.len() - trimmed.trim_start_matches(fence_char).len();
    if len - trimmed.len() <= 3 && run >= fence.len() && trimmed[run..].trim().is_empty() {
        ctx.set(0, len, Format::Special);
        return true;
    }

    let mut next = BlockState::labeled(FENCE, prev.label.clone());
    if let Some(lang) = fence_language(info) {
        let entry = prev.sub_state();
        let exit = if len > 0 { ctx.embed(0..len, lang.lexer(), &entry) } else { entry };
        if !exit.is_clean() {
            next.sub = Some(Box::new(exit));
        }
    }
    ctx.set_unclaimed(0, len, Format::CodeBlock);
    ctx.next = next;
    false
}

/// Finish an HTML comment from `from`; `None` if it stays open
fn html_comment(ctx: &mut LineCtx<'_>, from: usize, body: usize) -> Option<usize> {
    let text = ctx.text;
    let end = text[body..].find("-->").map(|i| body + i + 3);
    let stop = end.unwrap_or(text.len());
    ctx.set(from, stop, Format::Comment);
    scan::decorate_literal(ctx, from, stop, Format::Comment);
    end
}

impl Lexer for Markdown {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let text = ctx.text;
        let len = text.len();

        if prev.is(FENCE) {
            fenced_line(ctx);
            return;
        }

        let mut list_indent = prev.label.clone();
        let mut from = 0;
        if prev.is(tag::COMMENT) {
            match html_comment(ctx, 0, 0) {
                Some(end) => from = end,
                None => {
                    ctx.next = BlockState::labeled(tag::COMMENT, list_indent);
                    return;
                }
            }
        }

        if ctx.is_blank() {
            ctx.next = BlockState {
                label: list_indent,
                property: prev.property,
                ..Default::default()
            };
            return;
        }

        let indent = indent_columns(text);
        if from == 0 {
            let code_allowed = !prev.is(PARAGRAPH) || prev.property;
            if code_allowed && indent >= list_indent.len() + 4 {
                ctx.set(0, len, Format::CodeBlock);
                ctx.next = BlockState {
                    state: INDENTED_CODE,
                    label: list_indent,
                    property: true,
                    ..Default::default()
                };
                return;
            }
            if indent < list_indent.len() {
                list_indent.clear();
            }

            if let Some(caps) = FENCE_OPEN.as_ref().and_then(|re| re.captures(text)) {
                let fence = caps.get(1).map_or("```", |m| m.as_str());
                let info = caps.get(2).map_or("", |m| m.as_str());
                ctx.set(0, len, Format::Special);
                if let Some(m) = caps.get(2).filter(|m| !m.is_empty()) {
                    ctx.set(m.start(), m.end(), Format::Keyword);
                }
                ctx.next = BlockState::labeled(FENCE, format!("{fence}|{info}"));
                return;
            }
            if matches(&ATX_HEADING, text) || (prev.is(PARAGRAPH) && matches(&SETEXT, text)) {
                ctx.set(0, len, Format::Heading);
                ctx.next = BlockState::labeled(tag::CLEAN, list_indent);
                return;
            }
            if matches(&THEMATIC_BREAK, text) {
                ctx.set(0, len, Format::Special);
                ctx.next = BlockState::labeled(tag::CLEAN, list_indent);
                return;
            }
            if let Some(marker) = LIST_ITEM.as_ref().and_then(|re| re.captures(text)).and_then(|c| c.get(1)) {
                let lead = marker.as_str().len() - marker.as_str().trim_start().len();
                ctx.set(marker.start() + lead, marker.end(), Format::Operator);
                list_indent = " ".repeat(marker.end() + 1);
            }
        }

        // an HTML comment opening later on the line
        let mut pos = from;
        let mut open_comment = false;
        while let Some(found) = text[pos..].find("<!--").map(|i| pos + i) {
            match html_comment(ctx, found, found + 4) {
                Some(end) => pos = end,
                None => {
                    open_comment = true;
                    break;
                }
            }
        }

        ctx.decorate_range(from..len, &INLINE);
        if matches(&QUOTE, text) {
            ctx.set_unclaimed(0, len, Format::Quote);
        }
        let state = if open_comment { tag::COMMENT } else { PARAGRAPH };
        ctx.next = BlockState::labeled(state, list_indent);
    }
}
