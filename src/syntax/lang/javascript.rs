//! JavaScript lexer, with a QML flavour

use once_cell::sync::Lazy;
use regex::Regex;

use super::{interpolate, words, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::regex_literal::{LookBack, Operator, RegexSyntax};
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, is_word, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "break case catch class const continue debugger default delete do else \
    export extends finally for function if import in instanceof let new of return static super \
    switch throw try typeof var void while with yield async await get set from as";

const CONSTANTS: &str = "true false null undefined NaN Infinity this arguments";

const BUILTINS: &str = "Array Object String Number Boolean Symbol BigInt Math JSON Date RegExp \
    Promise Map Set WeakMap WeakSet Error TypeError RangeError console window document globalThis";

const QML_KEYWORDS: &str = "import property signal readonly alias required default component on \
    pragma enum";

/// Words after which a `/` starts a regex rather than dividing
const REGEX_WORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

pub struct JavaScript {
    pub qml: bool,
}

fn slash_allowed(lookback: &LookBack<'_>) -> bool {
    if lookback.after_literal {
        return false;
    }
    match lookback.prev_char {
        None => true,
        Some(c) if is_word(c) || c == b'$' => lookback
            .prev_word
            .is_some_and(|word| lookback.sigil != Some(b'.') && REGEX_WORDS.contains(&word)),
        Some(b')' | b']' | b'}') => false,
        Some(_) => true,
    }
}

fn no_operator(_: &str) -> Operator {
    Operator::MATCH
}

fn never(_: &LookBack<'_>, _: &str) -> bool {
    false
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT),
        MultilineRule::line("line_comment", "//", Format::Comment),
        MultilineRule::with_escape("double", "\"", "\"", Format::String, 0, '\\')
            .map(|r| r.continued_by_backslash(tag::DOUBLE_QUOTE)),
        MultilineRule::with_escape("single", "'", "'", Format::String, 0, '\\')
            .map(|r| r.continued_by_backslash(tag::SINGLE_QUOTE)),
        MultilineRule::with_escape("template", "`", "`", Format::String, tag::BACK_QUOTE, '\\'),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::with_group("function_def", r"\bfunction\s*\*?\s*([A-Za-z_$][\w$]*)", Format::Function, 88, 1),
        PatternRule::with_group("class_def", r"\b(?:class|extends)\s+([A-Za-z_$][\w$]*)", Format::Type, 87, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("constant", &words(CONSTANTS), Format::Constant, 78),
        PatternRule::new("builtin", &words(BUILTINS), Format::Type, 75),
        PatternRule::with_group("call", r"\b([A-Za-z_$][\w$]*)\s*\(", Format::Function, 70, 1),
        PatternRule::new(
            "number",
            r"\b(?:0[xX][0-9a-fA-F_]+n?|0[oO][0-7_]+n?|0[bB][01_]+n?|\d[\d_]*\.?[\d_]*(?:[eE][+-]?\d+)?n?)\b",
            Format::Number,
            65,
        ),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ]
}

/// QML additions, ahead of the JavaScript rules
fn qml_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::with_group("import", r"^\s*import\s+([\w.]+)", Format::Preprocessor, 96, 1),
        PatternRule::with_group("property_decl", r"\bproperty\s+[\w<>]+\s+(\w+)", Format::Key, 94, 1),
        PatternRule::with_group("binding", r"^\s*([a-z_][\w.]*)\s*:", Format::Key, 92, 1),
        PatternRule::new("qml_keyword", &words(QML_KEYWORDS), Format::Keyword, 90),
        PatternRule::new("element", r"\b[A-Z]\w*\b", Format::Type, 62),
    ]
}

fn regex_syntax() -> RegexSyntax {
    RegexSyntax {
        operators: None,
        operator: no_operator,
        operator_allowed: never,
        bare_slash: true,
        slash_allowed,
        flags: "dgimsuyv",
        classes: true,
        multiline: false,
        state_id: tag::REGEX,
    }
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static QML_PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    let mut all = qml_rules();
    all.extend(pattern_rules());
    rules::table(all)
});
static REGEX: Lazy<RegexSyntax> = Lazy::new(regex_syntax);
static TEMPLATE_SUBSTITUTION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\$\{[^}]*\}").ok());

impl Lexer for JavaScript {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::with_regex(&STRUCTURE, &REGEX));
        if self.qml {
            ctx.decorate(&QML_PATTERNS);
        } else {
            ctx.decorate(&PATTERNS);
        }
        if let Some(pattern) = TEMPLATE_SUBSTITUTION.as_ref() {
            interpolate(ctx, pattern, Format::String, Format::Variable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_line, lex_lines};
    use crate::syntax::{BlockState, Language};
    use rstest::rstest;

    #[test]
    fn test_tables_compile() {
        assert!(structure_rules().iter().all(Option::is_some));
        assert!(pattern_rules().iter().all(Option::is_some));
        assert!(qml_rules().iter().all(Option::is_some));
    }

    #[rstest]
    #[case("a = b / c / d", None)]
    #[case("f(a) / 2", None)]
    #[case("x = /ab+c/gi;", Some("/ab+c/gi"))]
    #[case("return /[/]/.test(s)", Some("/[/]/"))]
    #[case("if (/x/.test(s)) {}", Some("/x/"))]
    #[case("let r = '/'; // c", None)]
    #[case("obj.return / 2", None)]
    fn test_regex_versus_divide(#[case] text: &str, #[case] regex: Option<&str>) {
        let (formats, exit) = lex_line(Language::JavaScript, text, &BlockState::default());
        let found: String = text
            .char_indices()
            .filter(|(i, _)| formats[*i] == Format::Regex)
            .map(|(_, c)| c)
            .collect();
        assert_eq!(found, regex.unwrap_or(""));
        assert!(exit.is_clean());
    }

    #[test]
    fn test_unterminated_regex_stays_on_line() {
        let out = lex_lines(Language::JavaScript, &["x = /abc", "let y;"]);
        assert!(out[0].1.is_clean());
        assert_eq!(out[1].0[0], Format::Keyword);
    }

    #[test]
    fn test_template_literal_spans_lines() {
        let out = lex_lines(Language::JavaScript, &["const s = `a", "${b} c` + 1"]);
        assert!(out[0].1.is(tag::BACK_QUOTE));
        assert_eq!(out[1].0[0], Format::Variable);
        assert_eq!(out[1].0[5], Format::String);
        assert!(out[1].1.is_clean());
    }

    #[test]
    fn test_block_comment() {
        let out = lex_lines(Language::JavaScript, &["/* a", " b */ var x"]);
        assert!(out[0].1.is(tag::COMMENT));
        assert_eq!(out[1].0[6], Format::Keyword);
    }

    #[test]
    fn test_keywords_and_calls() {
        let text = "function go(n) { return Math.max(n, 1); }";
        assert_eq!(format_of(Language::JavaScript, text, "function"), Format::Keyword);
        assert_eq!(format_of(Language::JavaScript, text, "go"), Format::Function);
        assert_eq!(format_of(Language::JavaScript, text, "Math"), Format::Type);
        assert_eq!(format_of(Language::JavaScript, text, "max"), Format::Function);
    }

    #[test]
    fn test_qml_bindings() {
        assert_eq!(format_of(Language::Qml, "import QtQuick 2.15", "QtQuick"), Format::Preprocessor);
        assert_eq!(format_of(Language::Qml, "    width: 100", "width"), Format::Key);
        assert_eq!(format_of(Language::Qml, "Rectangle {", "Rectangle"), Format::Type);
        assert_eq!(format_of(Language::Qml, "property int count: 0", "count"), Format::Key);
        assert_eq!(format_of(Language::JavaScript, "    width: 100", "width"), Format::Default);
    }
}
