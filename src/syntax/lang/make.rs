//! Makefile lexer
//!
//! Recipe lines (tab-led, or continuing a recipe after a trailing
//! backslash) are handed to the shell lexer; everything else is make
//! syntax.

use once_cell::sync::Lazy;

use super::shell::Shell;
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::{tag, BlockState};

/// A recipe line ended with a backslash
const RECIPE: i32 = tag::LANGUAGE_BASE;

pub struct Make;

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![MultilineRule::line("comment", "#", Format::Comment)
        .map(|r| r.escaped_by(b'\\').continued_by_backslash(tag::LINE_COMMENT))]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new(
            "directive",
            r"^\s*-?(?:include|sinclude|ifeq|ifneq|ifdef|ifndef|else|endif|define|endef|export|unexport|override|vpath|undefine)\b",
            Format::Keyword,
            90,
        ),
        PatternRule::new(
            "function",
            r"\$[({](?:subst|patsubst|strip|findstring|filter|filter-out|sort|word|wordlist|words|firstword|lastword|dir|notdir|suffix|basename|addsuffix|addprefix|join|wildcard|realpath|abspath|if|or|and|foreach|call|value|eval|origin|flavor|shell|error|warning|info|file)\b",
            Format::Function,
            88,
        ),
        PatternRule::new("variable", r"\$[({][^)}\s]*[)}]|\$[@<^?*%+|]|\$\w", Format::Variable, 85),
        PatternRule::new("special_target", r"^\.[A-Z_]+", Format::Special, 84),
        PatternRule::with_group(
            "assignment",
            r"^\s*(?:export\s+|override\s+)?([\w.-]+)\s*(?:[:+?!]?=|::=)",
            Format::Variable,
            82,
            1,
        ),
        PatternRule::with_group("target", r"^([^\s:=#][^:=#]*?)\s*::?(?:[^=]|$)", Format::Function, 80, 1),
        PatternRule::new("operator", r"[:+?!]?=|::?", Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Make {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let continued = ctx.prev.is(RECIPE);
        if continued || ctx.text.starts_with('\t') {
            let start = if continued { 0 } else { 1 };
            let entry = if continued { ctx.prev.sub_state() } else { BlockState::default() };
            let len = ctx.len();
            let exit = ctx.embed(start..len, &Shell, &entry);
            if scan::ends_with_continuation(ctx.text) {
                ctx.next = BlockState::with_state(RECIPE);
                if !exit.is_clean() {
                    ctx.next.sub = Some(Box::new(exit));
                }
            }
            return;
        }
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}
