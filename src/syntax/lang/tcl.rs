//! Tcl lexer
//!
//! `#` is a comment only where a command may start. Brace depth is kept
//! in `open_nests`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{interpolate, words};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "after append array break catch cd close concat continue dict else elseif \
    error eval exec exit expr for foreach format gets glob global if incr info join lappend \
    lassign lindex linsert list llength lmap load lrange lreplace lsearch lset lsort namespace \
    open package proc puts pwd read regexp regsub rename return scan seek set socket source split \
    string subst switch tailcall tell then throw time trace try unset update uplevel upvar variable \
    vwait while yield";

const VARIABLE: &str = r"\$(?:\{[^}]*\}|(?:::)?\w+(?:::\w+)*(?:\([^)]*\))?)";

pub struct Tcl;

/// Whether a command can start at `pos`
fn command_start(text: &str, pos: usize) -> bool {
    let before = text[..pos].trim_end_matches([' ', '\t']);
    matches!(before.bytes().last(), None | Some(b';' | b'{' | b'['))
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::line("comment", "#", Format::Comment)
            .map(|r| r.guarded(command_start).continued_by_backslash(tag::LINE_COMMENT)),
        MultilineRule::with_escape("string", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\'),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("variable", VARIABLE, Format::Variable, 90),
        PatternRule::with_group("proc", r"\bproc\s+([\w:]+)", Format::Function, 88, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("option", r"(?:^|\s)-[A-Za-z]\w*", Format::Attribute, 70),
        PatternRule::new("number", r"\b(?:0[xX][0-9a-fA-F]+|\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)\b", Format::Number, 65),
        PatternRule::new("escape", r"\\.", Format::Special, 60),
        PatternRule::new("operator", r"[+\-*/%<>=!&|^~?:]+", Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static INTERPOLATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(VARIABLE).ok());

/// Brace depth after this line, counting braces outside literals
fn brace_depth(ctx: &LineCtx<'_>, start: i32) -> i32 {
    let text = ctx.text;
    let mut depth = start;
    for (i, b) in text.bytes().enumerate() {
        if ctx.at(i).is_literal() || scan::is_escaped(text, i) {
            continue;
        }
        match b {
            b'{' => depth += 1,
            b'}' => depth = (depth - 1).max(0),
            _ => {}
        }
    }
    depth
}

impl Lexer for Tcl {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.next.open_nests = brace_depth(ctx, ctx.prev.open_nests);
        ctx.decorate(&PATTERNS);
        if let Some(re) = INTERPOLATION.as_ref() {
            interpolate(ctx, re, Format::String, Format::Variable);
        }
    }
}
