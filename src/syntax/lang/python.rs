//! Python lexer

use once_cell::sync::Lazy;

use super::{words, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "and as assert async await break class continue def del elif else except \
    finally for from global if import in is lambda nonlocal not or pass raise return try while \
    with yield match case";

const BUILTINS: &str = "abs all any bin bool bytes callable chr dict dir divmod enumerate eval \
    exec filter float format frozenset getattr hasattr hash hex id input int isinstance \
    issubclass iter len list map max min next object oct open ord pow print property range repr \
    reversed round set setattr slice sorted str sum super tuple type vars zip";

const CONSTANTS: &str = "True False None NotImplemented Ellipsis __name__ __file__";

pub struct Python;

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::line("comment", "#", Format::Comment),
        MultilineRule::with_escape(
            "triple_double",
            r#"(?i:\b(?:rb|br|fr|rf|[rbuf]))?""""#,
            r#"""""#,
            Format::String,
            tag::TRIPLE_DOUBLE,
            '\\',
        ),
        MultilineRule::with_escape(
            "triple_single",
            r"(?i:\b(?:rb|br|fr|rf|[rbuf]))?'''",
            "'''",
            Format::String,
            tag::TRIPLE_SINGLE,
            '\\',
        ),
        MultilineRule::with_escape("double", r#"(?i:\b(?:rb|br|fr|rf|[rbuf]))?""#, "\"", Format::String, 0, '\\')
            .map(|r| r.continued_by_backslash(tag::DOUBLE_QUOTE)),
        MultilineRule::with_escape("single", r"(?i:\b(?:rb|br|fr|rf|[rbuf]))?'", "'", Format::String, 0, '\\')
            .map(|r| r.continued_by_backslash(tag::SINGLE_QUOTE)),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("decorator", r"^\s*@[\w.]+", Format::Attribute, 95),
        PatternRule::with_group("def", r"\b(?:def|class)\s+(\w+)", Format::Function, 85, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("constant", &words(CONSTANTS), Format::Constant, 78),
        PatternRule::new("self", r"\b(?:self|cls)\b", Format::Variable, 77),
        PatternRule::new("builtin", &words(BUILTINS), Format::Function, 75),
        PatternRule::new("dunder", r"\b__\w+__\b", Format::Special, 70),
        PatternRule::new(
            "number",
            r"\b(?:0[xX][0-9a-fA-F_]+|0[oO][0-7_]+|0[bB][01_]+|\d[\d_]*\.?[\d_]*(?:[eE][+-]?\d+)?[jJ]?)\b",
            Format::Number,
            65,
        ),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Python {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_line, lex_lines};
    use crate::syntax::{BlockState, Language};

    #[test]
    fn test_tables_compile() {
        assert!(structure_rules().iter().all(Option::is_some));
        assert!(pattern_rules().iter().all(Option::is_some));
    }

    #[test]
    fn test_docstring_spans_lines() {
        let out = lex_lines(Language::Python, &["def f():", "    \"\"\"Doc", "    if x", "    \"\"\"", "    return 1"]);
        assert!(out[1].1.is(tag::TRIPLE_DOUBLE));
        assert!(out[2].0.iter().all(|f| *f == Format::String));
        assert!(out[3].1.is_clean());
        assert_eq!(out[4].0[4], Format::Keyword);
    }

    #[test]
    fn test_prefixed_triple_quote() {
        let (_, exit) = lex_line(Language::Python, "x = rb'''raw", &BlockState::default());
        assert!(exit.is(tag::TRIPLE_SINGLE));
        assert_eq!(format_of(Language::Python, "x = f\"{y}\"", "f\""), Format::String);
    }

    #[test]
    fn test_single_quotes_need_backslash() {
        let (_, exit) = lex_line(Language::Python, "x = 'open", &BlockState::default());
        assert!(exit.is_clean());
        let (_, exit) = lex_line(Language::Python, "x = 'open \\", &BlockState::default());
        assert!(exit.is(tag::SINGLE_QUOTE));
    }

    #[test]
    fn test_hash_in_string_is_not_comment() {
        let text = "s = '#not' # real";
        assert_eq!(format_of(Language::Python, text, "#not"), Format::String);
        assert_eq!(format_of(Language::Python, text, "# real"), Format::Comment);
    }

    #[test]
    fn test_decorator_and_def() {
        assert_eq!(format_of(Language::Python, "@app.route('/')", "@app"), Format::Attribute);
        assert_eq!(format_of(Language::Python, "def main(self):", "main"), Format::Function);
        assert_eq!(format_of(Language::Python, "def main(self):", "self"), Format::Variable);
    }
}
