//! Java lexer

use once_cell::sync::Lazy;

use super::{words, C_NUMBER, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, Multiline, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "abstract assert break case catch class const continue default do else \
    enum extends final finally for goto if implements import instanceof interface native new \
    package private protected public return static strictfp super switch synchronized this throw \
    throws transient try volatile while var record sealed permits non-sealed yield";

const TYPES: &str = "boolean byte char double float int long short void";

const CONSTANTS: &str = "true false null";

pub struct Java;

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT),
        MultilineRule::line("line_comment", "//", Format::Comment),
        MultilineRule::with_escape("text_block", "\"\"\"", "\"\"\"", Format::String, tag::TRIPLE_DOUBLE, '\\'),
        MultilineRule::with_escape("string", "\"", "\"", Format::String, 0, '\\')
            .map(|r| r.continued(Multiline::No)),
        MultilineRule::token("char", r"'(?:[^'\\]|\\[^']*)'", Format::AltString),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("annotation", r"@[A-Za-z_][\w.]*", Format::Attribute, 90),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("type", &words(TYPES), Format::Type, 78),
        PatternRule::new("constant", &words(CONSTANTS), Format::Constant, 77),
        PatternRule::new("class_name", r"\b[A-Z][A-Za-z0-9_]*\b", Format::Type, 60),
        PatternRule::with_group("method", r"\b([a-z_]\w*)\s*\(", Format::Function, 68, 1),
        PatternRule::new("number", C_NUMBER, Format::Number, 65),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Java {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}
