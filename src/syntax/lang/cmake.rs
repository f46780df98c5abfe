//! CMake lexer

use once_cell::sync::Lazy;
use regex::Regex;

use super::interpolate;
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const VARIABLE: &str = r"\$(?:ENV|CACHE)?\{[^}]*\}";

pub struct CMake;

/// `[==[` closes with `]==]`, with or without the leading `#`
fn bracket_closer(opener: &str) -> String {
    let level = opener.chars().filter(|c| *c == '=').count();
    format!("]{}]", "=".repeat(level))
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::labeled("bracket_comment", r"#\[=*\[", bracket_closer, Format::Comment, tag::LABELED_COMMENT),
        MultilineRule::line("comment", "#", Format::Comment),
        MultilineRule::labeled("bracket_argument", r"\[=*\[", bracket_closer, Format::String, tag::RAW_STRING),
        MultilineRule::with_escape("string", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\'),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("variable", VARIABLE, Format::Variable, 90),
        PatternRule::new("generator", r"\$<[^>]*>", Format::Special, 88),
        PatternRule::new(
            "keyword",
            r"(?i)^\s*(?:if|elseif|else|endif|foreach|endforeach|while|endwhile|function|endfunction|macro|endmacro|return|break|continue|block|endblock)\b",
            Format::Keyword,
            85,
        ),
        PatternRule::with_group("command", r"^\s*([A-Za-z_]\w*)\s*\(", Format::Function, 80, 1),
        PatternRule::new(
            "constant",
            r"\b(?:ON|OFF|TRUE|FALSE|YES|NO|Y|N|IGNORE|NOTFOUND|AND|OR|NOT|PUBLIC|PRIVATE|INTERFACE|REQUIRED|STATIC|SHARED|MODULE)\b",
            Format::Constant,
            75,
        ),
        PatternRule::new("argument_keyword", r"\b[A-Z][A-Z0-9_]+\b", Format::Key, 60),
        PatternRule::new("number", r"\b\d+(?:\.\d+)*\b", Format::Number, 55),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static INTERPOLATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(VARIABLE).ok());

impl Lexer for CMake {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
        if let Some(pattern) = INTERPOLATION.as_ref() {
            interpolate(ctx, pattern, Format::String, Format::Variable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_lines};
    use crate::syntax::Language;

    #[test]
    fn test_tables_compile() {
        assert!(structure_rules().iter().all(Option::is_some));
        assert!(pattern_rules().iter().all(Option::is_some));
    }

    #[test]
    fn test_bracket_comment() {
        let out = lex_lines(Language::CMake, &["#[==[ start", "]] not yet", "]==] set(x 1)"]);
        assert!(out[0].1.is(tag::LABELED_COMMENT));
        assert_eq!(out[0].1.label, "]==]");
        assert!(out[1].0.iter().all(|f| *f == Format::Comment));
        assert!(out[2].1.is_clean());
        assert_eq!(out[2].0[3], Format::Comment);
        assert_eq!(out[2].0[5], Format::Default);
    }

    #[test]
    fn test_bracket_argument_and_string() {
        let out = lex_lines(Language::CMake, &["message([=[ a", "b ]=])", "set(S \"${X} y"]);
        assert!(out[0].1.is(tag::RAW_STRING));
        assert!(out[1].1.is_clean());
        assert!(out[2].1.is(tag::DOUBLE_QUOTE));
        assert_eq!(out[2].0[7], Format::Variable);
    }

    #[test]
    fn test_commands_and_keywords() {
        assert_eq!(format_of(Language::CMake, "add_library(foo STATIC a.c)", "add_library"), Format::Function);
        assert_eq!(format_of(Language::CMake, "add_library(foo STATIC a.c)", "STATIC"), Format::Constant);
        assert_eq!(format_of(Language::CMake, "IF(WIN32)", "IF"), Format::Keyword);
    }
}
