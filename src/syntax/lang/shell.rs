//! Bourne shell lexer

use once_cell::sync::Lazy;
use regex::Regex;

use super::{interpolate, words};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar, Heredoc, HeredocLine};
use crate::syntax::state::tag;

const KEYWORDS: &str = "if then else elif fi case esac for while until do done in function select \
    time return exit break continue local export readonly declare typeset unset shift source eval \
    exec trap";

const BUILTINS: &str = "echo printf read cd pwd test set alias unalias bg fg jobs kill wait umask \
    getopts hash type ulimit command builtin let mapfile true false";

/// `$'...'` strings, which take escapes unlike plain single quotes
const ANSI_QUOTE: i32 = tag::LANGUAGE_BASE;

pub struct Shell;

/// `#` starts a comment only at the start of a word
fn at_word_start(text: &str, pos: usize) -> bool {
    pos == 0
        || matches!(
            text.as_bytes()[pos - 1],
            b' ' | b'\t' | b';' | b'&' | b'|' | b'(' | b')' | b'`'
        )
}

/// Single quotes take no escapes inside, but `\'` outside is no opener
fn unescaped(text: &str, pos: usize) -> bool {
    !scan::is_escaped(text, pos)
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::line("comment", "#", Format::Comment).map(|r| r.guarded(at_word_start)),
        MultilineRule::with_escape("ansi_quote", r"\$'", "'", Format::String, ANSI_QUOTE, '\\'),
        MultilineRule::new("single", "'", "'", Format::AltString, tag::SINGLE_QUOTE).map(|r| r.guarded(unescaped)),
        MultilineRule::with_escape("double", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\'),
        MultilineRule::with_escape("backtick", "`", "`", Format::Special, tag::BACK_QUOTE, '\\'),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("variable", VARIABLE, Format::Variable, 90),
        PatternRule::with_group("function_def", r"^\s*(?:function\s+)?([\w-]+)\s*\(\)", Format::Function, 88, 1),
        PatternRule::with_group("assignment", r"(?:^|[\s;])(\w+)(?:\[[^\]]*\])?\+?=", Format::Variable, 86, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("builtin", &words(BUILTINS), Format::Function, 75),
        PatternRule::new("option", r"(?:^|\s)--?[A-Za-z][\w-]*", Format::Attribute, 60),
        PatternRule::new("number", r"\b\d+\b", Format::Number, 55),
        PatternRule::new("operator", r"[|&;<>!]+|\[\[|\]\]", Format::Operator, 40),
    ]
}

/// Variable references, also used inside double quotes
const VARIABLE: &str = r"\$(?:\{[^}]*\}|\w+|[@*#?$!0-9-])";

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static INTERPOLATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(VARIABLE).ok());
static HEREDOC: Lazy<Option<Heredoc>> = Lazy::new(|| {
    Heredoc::new(
        r#"<<(-?)\s*(?:'([A-Za-z_]\w*)'|"([A-Za-z_]\w*)"|\\?([A-Za-z_]\w*))"#,
        Format::String,
        tag::HEREDOC,
        false,
    )
});

impl Lexer for Shell {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_lines};
    use crate::syntax::Language;

    #[test]
    fn test_tables_compile() {
        assert!(structure_rules().iter().all(Option::is_some));
        assert!(pattern_rules().iter().all(Option::is_some));
        assert!(HEREDOC.is_some());
        assert!(INTERPOLATION.is_some());
    }

    #[test]
    fn test_hash_only_at_word_start() {
        let text = "echo ${#arr} a#b # comment";
        assert_eq!(format_of(Language::Sh, text, "${#arr}"), Format::Variable);
        assert_eq!(format_of(Language::Sh, text, "a#b"), Format::Default);
        assert_eq!(format_of(Language::Sh, text, "# comment"), Format::Comment);
    }

    #[test]
    fn test_quotes_span_lines() {
        let out = lex_lines(Language::Sh, &["echo 'one", "two' \"three", "four\" done"]);
        assert!(out[0].1.is(tag::SINGLE_QUOTE));
        assert!(out[1].1.is(tag::DOUBLE_QUOTE));
        assert_eq!(out[1].0[0], Format::AltString);
        assert!(out[2].1.is_clean());
        assert_eq!(out[2].0[6], Format::Keyword);
    }

    #[test]
    fn test_variable_inside_double_quotes() {
        let text = r#"echo "home is $HOME" '$HOME'"#;
        assert_eq!(format_of(Language::Sh, text, "$HOME\""), Format::Variable);
        assert_eq!(format_of(Language::Sh, text, "$HOME'"), Format::AltString);
    }

    #[test]
    fn test_heredoc() {
        let out = lex_lines(Language::Sh, &["cat <<EOF > out", "if $x then", "EOF", "fi"]);
        assert!(out[0].1.is(tag::HEREDOC));
        assert_eq!(out[0].1.label, "EOF");
        assert!(out[1].0.iter().all(|f| *f == Format::String));
        assert_eq!(out[2].0[0], Format::Special);
        assert!(out[2].1.is_clean());
        assert_eq!(out[3].0[0], Format::Keyword);
    }

    #[test]
    fn test_here_string_is_not_heredoc() {
        let out = lex_lines(Language::Sh, &["cat <<< word", "fi"]);
        assert!(out[0].1.is_clean());
        assert_eq!(out[1].0[0], Format::Keyword);
    }

    #[test]
    fn test_arithmetic_shift_is_not_heredoc() {
        let out = lex_lines(Language::Sh, &["x=$((1 << 2))", "fi"]);
        assert!(out[0].1.is_clean());
    }
}
