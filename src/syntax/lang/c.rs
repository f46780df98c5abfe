//! C/C++ lexer

use once_cell::sync::Lazy;

use super::{words, C_NUMBER, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "auto break case char const continue default do double else enum extern \
    float for goto if inline int long register restrict return short signed sizeof static struct \
    switch typedef union unsigned void volatile while _Alignas _Alignof _Atomic _Bool _Complex \
    _Generic _Imaginary _Noreturn _Static_assert _Thread_local";

const CPP_KEYWORDS: &str = "alignas alignof and and_eq asm bitand bitor bool catch class compl \
    concept consteval constexpr constinit const_cast co_await co_return co_yield decltype delete \
    dynamic_cast explicit export false final friend mutable namespace new noexcept not not_eq \
    nullptr operator or or_eq override private protected public reinterpret_cast requires \
    static_assert static_cast template this thread_local throw true try typeid typename using \
    virtual xor xor_eq";

const TYPES: &str = "size_t ssize_t ptrdiff_t intptr_t uintptr_t int8_t int16_t int32_t int64_t \
    uint8_t uint16_t uint32_t uint64_t wchar_t char8_t char16_t char32_t FILE NULL bool";

/// C and C++, which differ in raw strings and keywords
pub struct CFamily {
    pub cpp: bool,
}

/// `R"delim(` opens a raw string closed by `)delim"`
fn raw_closer(opener: &str) -> String {
    let delim = opener
        .split_once('"')
        .map_or("", |(_, rest)| rest.trim_end_matches('('));
    format!("){delim}\"")
}

/// `'` after a digit is a C++14 digit separator
fn not_after_digit(text: &str, pos: usize) -> bool {
    pos == 0 || !text.as_bytes()[pos - 1].is_ascii_digit()
}

fn structure_rules(cpp: bool) -> Vec<Option<MultilineRule>> {
    let mut table = vec![
        MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT),
        MultilineRule::line("line_comment", "//", Format::Comment)
            .map(|r| r.continued_by_backslash(tag::LINE_COMMENT)),
    ];
    if cpp {
        table.push(MultilineRule::labeled(
            "raw_string",
            r#"\b(?:u8|u|U|L)?R"[^ ()\\\t]{0,16}\("#,
            raw_closer,
            Format::String,
            tag::RAW_STRING,
        ));
    }
    table.extend([
        MultilineRule::with_escape("string", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\')
            .map(|r| r.continued_by_backslash(tag::DOUBLE_QUOTE)),
        MultilineRule::token("char", r"'(?:[^'\\]|\\.)*'", Format::AltString)
            .map(|r| r.guarded(not_after_digit)),
    ]);
    table
}

fn pattern_rules(cpp: bool) -> Vec<Option<PatternRule>> {
    let mut table = vec![
        PatternRule::new("preprocessor", r"^\s*#\s*\w+", Format::Preprocessor, 95),
        PatternRule::with_group("include", r"^\s*#\s*include\s*(<[^>]*>)", Format::String, 96, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("type", &words(TYPES), Format::Type, 75),
        PatternRule::new("constant", r"\b[A-Z][A-Z0-9_]{2,}\b", Format::Constant, 70),
        PatternRule::with_group("function", r"\b([A-Za-z_]\w*)\s*\(", Format::Function, 68, 1),
        PatternRule::new("number", C_NUMBER, Format::Number, 65),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ];
    if cpp {
        table.push(PatternRule::new("cpp_keyword", &words(CPP_KEYWORDS), Format::Keyword, 79));
        table.push(PatternRule::new("scope", r"\b\w+::", Format::Type, 72));
    }
    table
}

static C_STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules(false)));
static CPP_STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules(true)));
static C_PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules(false)));
static CPP_PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules(true)));

impl Lexer for CFamily {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let (structure, patterns) = if self.cpp {
            (&*CPP_STRUCTURE, &*CPP_PATTERNS)
        } else {
            (&*C_STRUCTURE, &*C_PATTERNS)
        };
        scan::structure(ctx, &Grammar::new(structure));
        ctx.decorate(patterns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_line, lex_lines};
    use crate::syntax::{BlockState, Language};

    #[test]
    fn test_tables_compile() {
        for cpp in [false, true] {
            assert!(structure_rules(cpp).iter().all(Option::is_some));
            assert!(pattern_rules(cpp).iter().all(Option::is_some));
        }
        assert_eq!(structure_rules(false).len() + 1, structure_rules(true).len());
    }

    #[test]
    fn test_raw_string_prefix_is_cpp_only() {
        let text = r#"s = R"(x)";"#;
        assert_eq!(format_of(Language::Cpp, text, "R"), Format::String);
        assert_ne!(format_of(Language::C, text, "R"), Format::String);
    }

    #[test]
    fn test_keyword_inside_string_stays_string() {
        let text = r#""if" is not a keyword here"#;
        let (formats, exit) = lex_line(Language::C, text, &BlockState::default());
        assert!(formats[..4].iter().all(|f| *f == Format::String));
        assert!(!formats.contains(&Format::Keyword));
        assert!(exit.is_clean());
    }

    #[test]
    fn test_block_comment_spans_three_lines() {
        let out = lex_lines(Language::C, &["int a; /* open", "anything at all", "still */ int b;"]);
        assert!(out[0].1.is(tag::COMMENT));
        assert!(out[1].0.iter().all(|f| *f == Format::Comment));
        assert!(out[1].1.is(tag::COMMENT));
        assert!(out[2].0[..8].iter().all(|f| *f == Format::Comment));
        assert_eq!(out[2].0[10], Format::Keyword);
        assert!(out[2].1.is_clean());
    }

    #[test]
    fn test_keywords_and_numbers() {
        assert_eq!(format_of(Language::C, "return 0x1F;", "return"), Format::Keyword);
        assert_eq!(format_of(Language::C, "return 0x1F;", "0x1F"), Format::Number);
        assert_eq!(format_of(Language::C, "  #include <stdio.h>", "<stdio.h>"), Format::String);
        assert_eq!(format_of(Language::C, "#define MAX 10", "#define"), Format::Preprocessor);
    }

    #[test]
    fn test_string_continues_only_after_backslash() {
        let out = lex_lines(Language::C, &["s = \"abc\\", "def\";"]);
        assert!(out[0].1.is(tag::DOUBLE_QUOTE));
        assert_eq!(out[1].0[3], Format::String);
        assert!(out[1].1.is_clean());

        let (_, exit) = lex_line(Language::C, "s = \"abc", &BlockState::default());
        assert!(exit.is_clean());
    }

    #[test]
    fn test_line_comment_backslash_continuation() {
        let out = lex_lines(Language::C, &["// comment \\", "continued", "int x;"]);
        assert!(out[0].1.is(tag::LINE_COMMENT));
        assert!(out[1].0.iter().all(|f| *f == Format::Comment));
        assert_eq!(out[2].0[0], Format::Keyword);
    }

    #[test]
    fn test_cpp_raw_string() {
        let out = lex_lines(Language::Cpp, &[r#"auto s = R"x(a ")" b"#, r#"c)x"; int y;"#]);
        assert!(out[0].1.is(tag::RAW_STRING));
        assert_eq!(out[0].1.label, ")x\"");
        assert_eq!(out[1].0[0], Format::String);
        assert_eq!(out[1].0[3], Format::String);
        assert_eq!(out[1].0[6], Format::Keyword);
        assert!(out[1].1.is_clean());
    }

    #[test]
    fn test_digit_separator_is_not_char() {
        let text = "int n = 1'000'000; char c = 'x';";
        assert_eq!(format_of(Language::Cpp, text, "000"), Format::Number);
        assert_eq!(format_of(Language::Cpp, text, "'x'"), Format::AltString);
    }
}
