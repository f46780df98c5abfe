//! Lua lexer

use once_cell::sync::Lazy;

use super::{words, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "and break do else elseif end for function goto if in local not or repeat \
    return then until while";

const BUILTINS: &str = "assert collectgarbage dofile error getmetatable ipairs load loadfile next \
    pairs pcall print rawequal rawget rawlen rawset require select setmetatable tonumber tostring \
    type xpcall coroutine debug io math os package string table utf8";

pub struct Lua;

/// `]==]` for `[==[` and `--[==[`
fn long_bracket_closer(opener: &str) -> String {
    let level = opener.bytes().filter(|b| *b == b'=').count();
    format!("]{}]", "=".repeat(level))
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::labeled(
            "long_comment",
            r"--\[=*\[",
            long_bracket_closer,
            Format::Comment,
            tag::LABELED_COMMENT,
        ),
        MultilineRule::line("comment", "--", Format::Comment),
        MultilineRule::labeled("long_string", r"\[=*\[", long_bracket_closer, Format::String, tag::RAW_STRING),
        MultilineRule::with_escape("double", "\"", "\"", Format::String, 0, '\\')
            .map(|r| r.continued_by_backslash(tag::DOUBLE_QUOTE)),
        MultilineRule::with_escape("single", "'", "'", Format::String, 0, '\\')
            .map(|r| r.continued_by_backslash(tag::SINGLE_QUOTE)),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::with_group("function", r"\bfunction\s+([\w.:]+)", Format::Function, 90, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("constant", r"\b(?:nil|true|false)\b|\.\.\.", Format::Constant, 78),
        PatternRule::new("self", r"\bself\b", Format::Variable, 77),
        PatternRule::new("builtin", &words(BUILTINS), Format::Function, 75),
        PatternRule::new("label", r"::\w+::", Format::Special, 70),
        PatternRule::new(
            "number",
            r"\b(?:0[xX][0-9a-fA-F]*\.?[0-9a-fA-F]*(?:[pP][+-]?\d+)?|\d+\.?\d*(?:[eE][+-]?\d+)?)\b",
            Format::Number,
            65,
        ),
        PatternRule::new("operator", &format!(r"{OPERATORS}|#|\.\."), Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Lua {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}
