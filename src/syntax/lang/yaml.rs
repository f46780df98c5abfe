//! YAML lexer

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, PatternRule};
use crate::syntax::scan::{self, is_escaped_with};
use crate::syntax::state::{tag, BlockState};

/// Inside a `|` or `>` block scalar; the label holds the parent indent
const BLOCK_SCALAR: i32 = tag::LANGUAGE_BASE;

pub struct Yaml;

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::with_group("block_key", r#"^\s*(?:-\s+)*([^\s#'"\[\]{},&*!|>-][^#]*?|-[^\s#][^#]*?)\s*:(?:\s|$)"#, Format::Key, 90, 1),
        PatternRule::with_group("flow_key", r#"[{,]\s*([^\s{},:\[\]"'][^{},:\[\]]*?)\s*:(?:\s|$)"#, Format::Key, 88, 1),
        PatternRule::with_group("anchor", r"(?:^|\s)([&*][\w.-]+)", Format::Variable, 85, 1),
        PatternRule::with_group("tag", r"(?:^|\s)(!!?[\w/.:-]*)", Format::Type, 84, 1),
        PatternRule::with_group("item", r"^\s*(-)(?:\s|$)", Format::Operator, 83, 1),
        PatternRule::with_group("block_indicator", r"(?:^|\s)([|>][-+0-9]*)\s*$", Format::Special, 82, 1),
        PatternRule::new("constant", r"\b(?:true|false|yes|no|on|off|null|True|False|TRUE|FALSE|Yes|No|Null|NULL)\b|~", Format::Constant, 80),
        PatternRule::with_group("number", r"(?:^|[\s\[,])(-?(?:0x[0-9a-fA-F]+|\d+(?:\.\d+)?(?:[eE][+-]?\d+)?))\b", Format::Number, 70, 1),
    ]
}

static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static BLOCK_OPENER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?:^|\s)[|>][-+0-9]*\s*(?:#.*)?$").ok());

/// Whether a quote at `pos` starts a scalar rather than sitting inside one
fn scalar_start(text: &str, pos: usize) -> bool {
    let before = text[..pos].trim_end_matches([' ', '\t']);
    match before.as_bytes().last() {
        None => true,
        Some(b'-' | b':' | b'?' | b'[' | b'{' | b',') => before.len() < pos || !before.ends_with([':', '-', '?']),
        Some(_) => false,
    }
}

/// Position of the quote closing a scalar whose body starts at `from`
fn quote_end(text: &str, from: usize, quote: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == quote {
            if quote == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return Some(i);
            }
            if !is_escaped_with(text, from, i, b'\\') {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn is_blank_byte(b: Option<&u8>) -> bool {
    b.map_or(true, |b| *b == b' ' || *b == b'\t')
}

impl Lexer for Yaml {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let text = ctx.text;
        let bytes = text.as_bytes();
        let len = text.len();

        if prev.is(BLOCK_SCALAR) {
            let parent: usize = prev.label.parse().unwrap_or(0);
            if ctx.is_blank() || ctx.indent() > parent {
                ctx.set(0, len, Format::String);
                ctx.next = prev.clone();
                return;
            }
        }

        let mut depth = prev.open_nests.max(0);
        let mut in_value = prev.property;
        let mut pos = 0;
        let mut carried = tag::CLEAN;
        let mut value_start = None;

        if prev.is(tag::DOUBLE_QUOTE) || prev.is(tag::SINGLE_QUOTE) {
            let quote = if prev.is(tag::DOUBLE_QUOTE) { b'"' } else { b'\'' };
            match quote_end(text, 0, quote) {
                Some(end) => {
                    ctx.set(0, end + 1, Format::String);
                    pos = end + 1;
                }
                None => {
                    ctx.set(0, len, Format::String);
                    ctx.next = prev.clone();
                    return;
                }
            }
        } else if depth == 0 && (text.starts_with("---") || text.starts_with("...")) && is_blank_byte(bytes.get(3)) {
            ctx.set(0, 3, Format::Special);
            pos = 3;
        }

        while pos < len {
            let b = bytes[pos];
            match b {
                b'#' if pos == 0 || bytes[pos - 1] == b' ' || bytes[pos - 1] == b'\t' => {
                    ctx.set(pos, len, Format::Comment);
                    scan::decorate_literal(ctx, pos, len, Format::Comment);
                    break;
                }
                b'"' | b'\'' if scalar_start(text, pos) => match quote_end(text, pos + 1, b) {
                    Some(end) => {
                        ctx.set(pos, end + 1, Format::String);
                        ctx.quote_mark = end + 1;
                        pos = end + 1;
                        continue;
                    }
                    None => {
                        ctx.set(pos, len, Format::String);
                        carried = if b == b'"' { tag::DOUBLE_QUOTE } else { tag::SINGLE_QUOTE };
                        break;
                    }
                },
                b'[' | b'{' if depth > 0 || scalar_start(text, pos) => {
                    depth += 1;
                    in_value = false;
                }
                b']' | b'}' if depth > 0 => {
                    depth -= 1;
                    in_value = false;
                }
                b',' if depth > 0 => {
                    ctx.set(pos, pos + 1, Format::Operator);
                    in_value = false;
                }
                b':' if is_blank_byte(bytes.get(pos + 1))
                    || (depth > 0 && matches!(bytes.get(pos + 1), Some(b',' | b']' | b'}'))) =>
                {
                    ctx.set(pos, pos + 1, Format::Operator);
                    if depth > 0 {
                        in_value = true;
                    } else if value_start.is_none() {
                        value_start = Some(pos + 1);
                    }
                }
                _ => {}
            }
            pos = scan::next_boundary(text, pos + 1);
        }

        // decided before decoration, which claims the indicator itself
        let opens_block = carried == tag::CLEAN
            && depth == 0
            && BLOCK_OPENER
                .as_ref()
                .and_then(|re| re.find(text))
                .is_some_and(|m| {
                    let indicator = if bytes[m.start()].is_ascii_whitespace() { m.start() + 1 } else { m.start() };
                    !ctx.at(indicator).is_literal()
                });

        ctx.decorate(&PATTERNS);
        if let Some(start) = value_start.filter(|_| ctx.full) {
            let end = text.trim_end().len();
            let start = start + (text[start..].len() - text[start..].trim_start().len());
            if start < end && !matches!(bytes[start], b'[' | b'{') {
                ctx.set_unclaimed(start, end, Format::Value);
            }
        }
        ctx.next = if opens_block {
            BlockState::labeled(BLOCK_SCALAR, ctx.indent().to_string())
        } else {
            BlockState {
                state: carried,
                open_nests: depth,
                property: in_value && depth > 0,
                ..Default::default()
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_lines};
    use crate::syntax::Language;

    #[test]
    fn test_tables_compile() {
        assert!(pattern_rules().iter().all(Option::is_some));
        assert!(BLOCK_OPENER.is_some());
    }

    #[test]
    fn test_keys_values_comments() {
        let text = "name: relex # tool";
        assert_eq!(format_of(Language::Yaml, text, "name"), Format::Key);
        assert_eq!(format_of(Language::Yaml, text, "relex"), Format::Value);
        assert_eq!(format_of(Language::Yaml, text, "# tool"), Format::Comment);
        assert_eq!(format_of(Language::Yaml, "url: a#b", "#b"), Format::Value);
        assert_eq!(format_of(Language::Yaml, "- count: 3", "3"), Format::Number);
        assert_eq!(format_of(Language::Yaml, "- count: 3", "count"), Format::Key);
    }

    #[test]
    fn test_quotes_only_at_scalar_start() {
        let out = lex_lines(Language::Yaml, &["a: don't stop", "b: 1"]);
        assert!(out[0].1.is_clean());
        let out = lex_lines(Language::Yaml, &["a: 'it''s'"]);
        assert_eq!(out[0].0[9], Format::String);
        assert!(out[0].1.is_clean());
    }

    #[test]
    fn test_quoted_scalar_spans_lines() {
        let out = lex_lines(Language::Yaml, &["key: \"one", "two\" # c"]);
        assert!(out[0].1.is(tag::DOUBLE_QUOTE));
        assert_eq!(out[1].0[0], Format::String);
        assert_eq!(out[1].0[5], Format::Comment);
        assert!(out[1].1.is_clean());
    }

    #[test]
    fn test_block_scalar_by_indentation() {
        let out = lex_lines(Language::Yaml, &["text: |", "  line one", "", "  # not comment", "next: 1"]);
        assert!(out[0].1.is(BLOCK_SCALAR));
        assert_eq!(out[0].1.label, "0");
        assert!(out[1].0.iter().all(|f| *f == Format::String));
        assert!(out[3].0.iter().all(|f| *f == Format::String));
        assert_eq!(out[4].0[0], Format::Key);
        assert!(out[4].1.is_clean());
    }

    #[test]
    fn test_flow_collections() {
        let out = lex_lines(Language::Yaml, &["a: [1, {b: c,", "  d: e}, 2]"]);
        assert_eq!(out[0].1.open_nests, 2);
        assert!(!out[0].1.property);
        assert_eq!(out[0].0[8], Format::Key);
        assert!(out[1].1.is_clean());

        let out = lex_lines(Language::Yaml, &["a: {b:", "  c}"]);
        assert!(out[0].1.property);
        assert!(out[1].1.is_clean());
    }

    #[test]
    fn test_document_markers_and_anchors() {
        assert_eq!(format_of(Language::Yaml, "--- !!map", "---"), Format::Special);
        assert_eq!(format_of(Language::Yaml, "--- !!map", "!!map"), Format::Type);
        assert_eq!(format_of(Language::Yaml, "base: &b x", "&b"), Format::Variable);
        assert_eq!(format_of(Language::Yaml, "ref: *b", "*b"), Format::Variable);
    }
}
