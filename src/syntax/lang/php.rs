//! PHP lexer
//!
//! A PHP file is HTML with code islands. Outside an island the line is
//! lexed as HTML; inside one, the code state lives in the usual fields
//! with `property` set, and the interrupted HTML state waits in `sub`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{interpolate, words, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::{Language, Lexer};
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar, Heredoc, HeredocLine};
use crate::syntax::state::{tag, BlockState};

const KEYWORDS: &str = "abstract and array as break callable case catch class clone const continue \
    declare default do echo else elseif empty enddeclare endfor endforeach endif endswitch \
    endwhile enum extends final finally fn for foreach function global goto if implements include \
    include_once instanceof insteadof interface isset list match namespace new or print private \
    protected public readonly require require_once return static switch throw trait try unset use \
    var while xor yield";

const CONSTANTS: &str = "true false null TRUE FALSE NULL self parent __CLASS__ __DIR__ __FILE__ \
    __FUNCTION__ __LINE__ __METHOD__ __NAMESPACE__";

const VARIABLE: &str = r"\$\$?[A-Za-z_]\w*";

pub struct Php;

/// The code inside `<?php ... ?>`
struct PhpCode;

/// `#[` starts an attribute, not a comment
fn hash_comment(text: &str, pos: usize) -> bool {
    text.as_bytes().get(pos + 1) != Some(&b'[')
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT),
        MultilineRule::line("line_comment", "//", Format::Comment),
        MultilineRule::line("hash_comment", "#", Format::Comment).map(|r| r.guarded(hash_comment)),
        MultilineRule::with_escape("double", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\'),
        MultilineRule::with_escape("single", "'", "'", Format::AltString, tag::SINGLE_QUOTE, '\\'),
        MultilineRule::with_escape("backtick", "`", "`", Format::Special, tag::BACK_QUOTE, '\\'),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("attribute", r"#\[[^\]]*\]?", Format::Attribute, 95),
        PatternRule::new("variable", VARIABLE, Format::Variable, 90),
        PatternRule::with_group("function_def", r"\bfunction\s+&?(\w+)", Format::Function, 88, 1),
        PatternRule::with_group("class_def", r"\b(?:class|interface|trait|enum|extends|implements|new)\s+([\w\\]+)", Format::Type, 87, 1),
        PatternRule::new("keyword", &format!("(?i){}", words(KEYWORDS)), Format::Keyword, 80),
        PatternRule::new("constant", &words(CONSTANTS), Format::Constant, 78),
        PatternRule::with_group("call", r"\b([A-Za-z_]\w*)\s*\(", Format::Function, 70, 1),
        PatternRule::new("number", r"\b(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|\d[\d_]*\.?[\d_]*(?:[eE][+-]?\d+)?)\b", Format::Number, 65),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static INTERPOLATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(VARIABLE).ok());
static HEREDOC: Lazy<Option<Heredoc>> = Lazy::new(|| {
    Heredoc::new(
        r#"<<<()[ \t]*(?:'([A-Za-z_]\w*)'|"([A-Za-z_]\w*)"|([A-Za-z_]\w*))"#,
        Format::String,
        tag::HEREDOC,
        true,
    )
});
static ISLAND_OPEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<\?(?:php\b|=)?").ok());

impl Lexer for PhpCode {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let grammar = Grammar::new(&STRUCTURE);
        let heredoc = HEREDOC.as_ref();
        let line = match heredoc {
            Some(heredoc) => heredoc.resume(ctx),
            None => HeredocLine::Outside,
        };
        match line {
            HeredocLine::Body => return,
            HeredocLine::Closed(pos) => {
                scan::structure_from(ctx, &grammar, pos);
            }
            HeredocLine::Outside => scan::structure(ctx, &grammar),
        }
        if let Some(heredoc) = heredoc {
            heredoc.open(ctx);
        }
        ctx.decorate(&PATTERNS);
        if let Some(pattern) = INTERPOLATION.as_ref() {
            interpolate(ctx, pattern, Format::String, Format::Variable);
        }
    }
}

/// How a code island ended on this line
enum Island {
    /// `?>` found; HTML resumes at this position
    Closed(usize),
    /// Still open at the end of the line, with this code state
    Open(BlockState),
}

/// First `<?`, `<?php` or `<?=` at or after `from`, skipping `<?xml`
fn find_open(text: &str, from: usize) -> Option<(usize, usize)> {
    let re = ISLAND_OPEN.as_ref()?;
    re.find_iter(&text[from..])
        .map(|m| (from + m.start(), from + m.end()))
        .find(|(_, end)| !text[*end..].starts_with("xml"))
}

/// Lex code from `from`, stopping at the first `?>` outside a literal
///
/// A `?>` counts if the code before it, lexed from `entry`, leaves
/// nothing open. Line comments end at `?>` too, which this gives for free.
fn island(ctx: &mut LineCtx<'_>, from: usize, entry: &BlockState) -> Island {
    let text = ctx.text;
    let mut search = from;
    let close = loop {
        let Some(found) = text[search..].find("?>").map(|i| search + i) else {
            break None;
        };
        let mut probe = LineCtx::new(&text[from..found], entry, false);
        PhpCode.lex(&mut probe);
        if probe.next.is_clean() {
            break Some(found);
        }
        search = found + 2;
    };
    match close {
        Some(close) => {
            if close > from {
                ctx.embed(from..close, &PhpCode, entry);
            }
            ctx.set(close, close + 2, Format::Preprocessor);
            Island::Closed(close + 2)
        }
        None => {
            let len = ctx.len();
            Island::Open(ctx.embed(from..len, &PhpCode, entry))
        }
    }
}

/// Code state to persist: `property` marks the island, `sub` keeps HTML
fn open_state(code: BlockState, html: BlockState) -> BlockState {
    BlockState {
        property: true,
        sub: if html.is_clean() { None } else { Some(Box::new(html)) },
        ..code
    }
}

impl Lexer for Php {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let html_lexer = Language::Html.lexer();
        let mut pos = 0;
        let mut html = prev.clone();
        if prev.property {
            html = prev.sub_state();
            let code = BlockState {
                property: false,
                sub: None,
                ..prev.clone()
            };
            match island(ctx, 0, &code) {
                Island::Closed(end) => pos = end,
                Island::Open(exit) => {
                    ctx.next = open_state(exit, html);
                    return;
                }
            }
        }
        loop {
            let open = find_open(ctx.text, pos);
            let end = open.map_or(ctx.len(), |(start, _)| start);
            if end > pos {
                html = ctx.embed(pos..end, html_lexer, &html);
            }
            let Some((start, body)) = open else {
                ctx.next = html;
                return;
            };
            ctx.set(start, body, Format::Preprocessor);
            match island(ctx, body, &BlockState::default()) {
                Island::Closed(after) => pos = after,
                Island::Open(exit) => {
                    ctx.next = open_state(exit, html);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::markup;
    use crate::syntax::lang::testing::{format_of, lex_lines};

    #[test]
    fn test_tables_compile() {
        assert!(structure_rules().iter().all(Option::is_some));
        assert!(pattern_rules().iter().all(Option::is_some));
        assert!(HEREDOC.is_some());
        assert!(ISLAND_OPEN.is_some());
    }

    #[test]
    fn test_island_inside_html() {
        let text = "<p><?php echo $name; ?></p>";
        assert_eq!(format_of(Language::Php, text, "<p>"), Format::Tag);
        assert_eq!(format_of(Language::Php, text, "<?php"), Format::Preprocessor);
        assert_eq!(format_of(Language::Php, text, "echo"), Format::Keyword);
        assert_eq!(format_of(Language::Php, text, "$name"), Format::Variable);
        assert_eq!(format_of(Language::Php, text, "?>"), Format::Preprocessor);
        assert_eq!(format_of(Language::Php, text, "</p>"), Format::Tag);
    }

    #[test]
    fn test_close_inside_string_does_not_count() {
        let text = "<?php $s = '?>'; ?>";
        assert_eq!(format_of(Language::Php, text, "'?>'"), Format::AltString);
        let out = lex_lines(Language::Php, &[text]);
        assert!(out[0].1.is_clean());
    }

    #[test]
    fn test_island_inside_attribute_value() {
        let out = lex_lines(Language::Php, &["<a href=\"<?= $url ?>\">", "x"]);
        assert_eq!(out[0].0[9], Format::Preprocessor);
        assert_eq!(out[0].0[13], Format::Variable);
        assert_eq!(out[0].0[20], Format::String);
        assert!(out[0].1.is_clean());
    }

    #[test]
    fn test_island_spans_lines_and_keeps_html() {
        let out = lex_lines(Language::Php, &["<div class=\"<?php", "  /* c", "  */ $x ?>\">"]);
        assert!(out[0].1.property);
        assert!(out[0].1.sub_state().is(markup::DOUBLE_VALUE));
        assert!(out[1].1.is(tag::COMMENT));
        assert!(out[1].1.property);
        assert_eq!(out[2].0[5], Format::Variable);
        assert_eq!(out[2].0[10], Format::String);
        assert!(out[2].1.is_clean());
    }

    #[test]
    fn test_heredoc_in_island() {
        let out = lex_lines(Language::Php, &["<?php $a = <<<EOT", "  body ?>", "  EOT;", "?>"]);
        assert!(out[0].1.is(tag::HEREDOC));
        assert!(out[1].0.iter().all(|f| *f == Format::String));
        assert!(out[2].1.property);
        assert!(out[3].1.is_clean());
    }
}
