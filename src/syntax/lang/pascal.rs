//! Pascal / Delphi lexer
//!
//! Keywords are case-insensitive. `{$...}` and `(*$...*)` are compiler
//! directives, not comments.

use once_cell::sync::Lazy;

use super::words;
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, Multiline, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "and array as asm begin case class const constructor destructor div do \
    downto else end except exports file finalization finally for function goto if implementation \
    in inherited initialization inline interface is label library mod nil not object of or out \
    packed procedure program property raise record repeat resourcestring set shl shr string then \
    threadvar to try type unit until uses var while with xor private protected public published \
    override virtual abstract overload reintroduce specialize generic";

const TYPES: &str = "integer cardinal shortint smallint longint int64 byte word longword qword \
    boolean char widechar ansichar real single double extended currency pointer ansistring \
    widestring unicodestring variant tobject tstringlist";

/// `(* ... *)` comments
const PAREN_COMMENT: i32 = tag::LANGUAGE_BASE;
/// `{$ ... }` directives
const BRACE_DIRECTIVE: i32 = tag::LANGUAGE_BASE + 1;
/// `(*$ ... *)` directives
const PAREN_DIRECTIVE: i32 = tag::LANGUAGE_BASE + 2;

pub struct Pascal;

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("brace_directive", r"\{\$", r"\}", Format::Preprocessor, BRACE_DIRECTIVE),
        MultilineRule::new("paren_directive", r"\(\*\$", r"\*\)", Format::Preprocessor, PAREN_DIRECTIVE),
        MultilineRule::new("brace_comment", r"\{", r"\}", Format::Comment, tag::COMMENT),
        MultilineRule::new("paren_comment", r"\(\*", r"\*\)", Format::Comment, PAREN_COMMENT),
        MultilineRule::line("line_comment", "//", Format::Comment),
        MultilineRule::new("string", "'", "'", Format::String, 0).map(|r| r.continued(Multiline::No)),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("char_code", r"#(?:\$[0-9a-fA-F]+|\d+)", Format::Special, 92),
        PatternRule::with_group(
            "routine",
            r"(?i)\b(?:procedure|function|constructor|destructor)\s+([\w.]+)",
            Format::Function,
            90,
            1,
        ),
        PatternRule::new("keyword", &format!("(?i){}", words(KEYWORDS)), Format::Keyword, 80),
        PatternRule::new("type", &format!("(?i){}", words(TYPES)), Format::Type, 78),
        PatternRule::new("constant", r"(?i)\b(?:true|false|self|result)\b", Format::Constant, 76),
        PatternRule::new(
            "number",
            r"\$[0-9a-fA-F]+\b|%[01]+\b|&[0-7]+\b|\b\d+(?:\.\d+)?(?:[eE][+-]?\d+)?\b",
            Format::Number,
            65,
        ),
        PatternRule::new("operator", r":=|[+\-*/=<>@^]+|\.\.", Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Pascal {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}
