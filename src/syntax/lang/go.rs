//! Go lexer

use once_cell::sync::Lazy;

use super::{words, C_NUMBER, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, Multiline, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "break case chan const continue default defer else fallthrough for func go \
    goto if import interface map package range return select struct switch type var";

const TYPES: &str = "bool byte complex64 complex128 error float32 float64 int int8 int16 int32 \
    int64 rune string uint uint8 uint16 uint32 uint64 uintptr any comparable";

const BUILTINS: &str = "append cap clear close complex copy delete imag len make max min new panic \
    print println real recover";

const CONSTANTS: &str = "true false nil iota";

pub struct Go;

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT),
        MultilineRule::line("line_comment", "//", Format::Comment),
        MultilineRule::new("raw_string", "`", "`", Format::String, tag::BACK_QUOTE),
        MultilineRule::with_escape("string", "\"", "\"", Format::String, 0, '\\')
            .map(|r| r.continued(Multiline::No)),
        MultilineRule::token("rune", r"'(?:[^'\\]|\\[^']*)'", Format::AltString),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("type", &words(TYPES), Format::Type, 78),
        PatternRule::new("constant", &words(CONSTANTS), Format::Constant, 77),
        PatternRule::new("builtin", &words(BUILTINS), Format::Function, 76),
        PatternRule::with_group("func_def", r"\bfunc\s+(?:\([^)]*\)\s*)?(\w+)", Format::Function, 82, 1),
        PatternRule::with_group("call", r"\b([A-Za-z_]\w*)\s*\(", Format::Function, 68, 1),
        PatternRule::new("number", C_NUMBER, Format::Number, 65),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Go {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}
