//! LaTeX lexer

use once_cell::sync::Lazy;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, Multiline, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const DISPLAY_MATH: i32 = tag::LANGUAGE_BASE;
const INLINE_MATH: i32 = tag::LANGUAGE_BASE + 1;
const BRACKET_MATH: i32 = tag::LANGUAGE_BASE + 2;
const PAREN_MATH: i32 = tag::LANGUAGE_BASE + 3;

pub struct Latex;

/// `\end{name}` for a `\begin{name}` opener
fn end_environment(opener: &str) -> String {
    let name = opener
        .split_once('{')
        .and_then(|(_, rest)| rest.split_once('}'))
        .map_or("", |(name, _)| name);
    format!("\\end{{{name}}}")
}

/// `\verb|x|` closes on its own delimiter
fn verb_delimiter(opener: &str) -> String {
    opener.chars().last().map(String::from).unwrap_or_default()
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::labeled("verb", r"\\verb\*?[^\w\s*]", verb_delimiter, Format::CodeBlock, 0)
            .map(|r| r.continued(Multiline::No)),
        MultilineRule::labeled(
            "comment_environment",
            r"\\begin\{comment\}",
            end_environment,
            Format::Comment,
            tag::LABELED_COMMENT,
        ),
        MultilineRule::labeled(
            "verbatim",
            r"\\begin\{(?:verbatim\*?|Verbatim|lstlisting|minted|alltt)\}",
            end_environment,
            Format::CodeBlock,
            tag::RAW_STRING,
        ),
        MultilineRule::line("comment", "%", Format::Comment).map(|r| r.escaped_by(b'\\')),
        MultilineRule::with_escape("display_math", r"\$\$", r"\$\$", Format::Math, DISPLAY_MATH, '\\'),
        MultilineRule::with_escape("inline_math", r"\$", r"\$", Format::Math, INLINE_MATH, '\\'),
        MultilineRule::new("bracket_math", r"\\\[", r"\\\]", Format::Math, BRACKET_MATH),
        MultilineRule::new("paren_math", r"\\\(", r"\\\)", Format::Math, PAREN_MATH),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new(
            "sectioning",
            r"\\(?:part|chapter|section|subsection|subsubsection|paragraph|subparagraph)\*?",
            Format::Heading,
            95,
        ),
        PatternRule::new("environment_command", r"\\(?:begin|end)\b", Format::Keyword, 92),
        PatternRule::with_group("environment", r"\\(?:begin|end)\{([^}]*)\}", Format::Type, 90, 1),
        PatternRule::with_group("label", r"\\(?:label|ref|eqref|cite|pageref)\{([^}]*)\}", Format::Link, 88, 1),
        PatternRule::new("command", r"\\[A-Za-z@]+\*?", Format::Function, 80),
        PatternRule::new("escape", r"\\[^A-Za-z@]", Format::Special, 75),
        PatternRule::new("argument", r"#\d", Format::Variable, 70),
        PatternRule::new("operator", r"[&~^_{}\[\]]", Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Latex {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
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
    fn test_percent_comments() {
        assert_eq!(format_of(Language::Latex, "text % note", "%"), Format::Comment);
        assert_ne!(format_of(Language::Latex, "50\\% off", "%"), Format::Comment);
    }

    #[test]
    fn test_math_spans_lines() {
        let out = lex_lines(Language::Latex, &["where $a +", "b$ and $$x", "$$ \\[ y", "\\] done"]);
        assert!(out[0].1.is(INLINE_MATH));
        assert_eq!(out[1].0[0], Format::Math);
        assert!(out[1].1.is(DISPLAY_MATH));
        assert!(out[2].1.is(BRACKET_MATH));
        assert!(out[3].1.is_clean());
        assert_eq!(format_of(Language::Latex, "costs \\$5 or \\$6", "5"), Format::Default);
    }

    #[test]
    fn test_verbatim_environment() {
        let out = lex_lines(
            Language::Latex,
            &["\\begin{verbatim}", "% $not math$ \\section", "\\end{verbatim} \\emph{x}"],
        );
        assert!(out[0].1.is(tag::RAW_STRING));
        assert_eq!(out[0].1.label, "\\end{verbatim}");
        assert!(out[1].0.iter().all(|f| *f == Format::CodeBlock));
        assert!(out[2].1.is_clean());
        assert_eq!(out[2].0[15], Format::Function);

        let out = lex_lines(Language::Latex, &["\\begin{comment}", "text", "\\end{comment}"]);
        assert!(out[1].0.iter().all(|f| *f == Format::Comment));
        assert!(out[2].1.is_clean());
    }

    #[test]
    fn test_commands() {
        let text = "\\section{Intro} \\label{sec:intro} see \\verb|%x|";
        assert_eq!(format_of(Language::Latex, text, "\\section"), Format::Heading);
        assert_eq!(format_of(Language::Latex, text, "sec:intro"), Format::Link);
        assert_eq!(format_of(Language::Latex, text, "%x"), Format::CodeBlock);
        assert_eq!(format_of(Language::Latex, "\\begin{itemize}", "itemize"), Format::Type);
    }
}
