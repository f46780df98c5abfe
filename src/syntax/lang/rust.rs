//! Rust lexer

use once_cell::sync::Lazy;

use super::{words, OPERATORS};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::tag;

const KEYWORDS: &str = "as async await break const continue crate dyn else enum extern fn for if \
    impl in let loop match mod move mut pub ref return self Self static struct super trait type \
    union unsafe use where while";

const TYPES: &str = "bool char str u8 u16 u32 u64 u128 usize i8 i16 i32 i64 i128 isize f32 f64";

const CONSTANTS: &str = "true false Some None Ok Err";

pub struct Rust;

/// `r##"` closes with `"##`
fn raw_closer(opener: &str) -> String {
    let hashes = opener.chars().filter(|c| *c == '#').count();
    format!("\"{}", "#".repeat(hashes))
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("block_comment", r"/\*", r"\*/", Format::Comment, tag::COMMENT).map(MultilineRule::nested),
        MultilineRule::line("line_comment", "//", Format::Comment),
        MultilineRule::labeled("raw_string", r#"\b[bc]?r#*""#, raw_closer, Format::String, tag::RAW_STRING),
        MultilineRule::with_escape("string", r#"(?:\b[bc])?""#, "\"", Format::String, tag::DOUBLE_QUOTE, '\\'),
        MultilineRule::token(
            "char",
            r"(?:\bb)?'(?:[^'\\]|\\(?:x[0-9a-fA-F]{2}|u\{[0-9a-fA-F]{1,6}\}|.))'",
            Format::AltString,
        ),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("attribute", r"#!?\[[^\]]*\]?", Format::Attribute, 95),
        PatternRule::new("lifetime", r"'[A-Za-z_]\w*\b", Format::Lifetime, 89),
        PatternRule::new("macro", r"\b[A-Za-z_]\w*!", Format::Preprocessor, 85),
        PatternRule::with_group("fn_def", r"\bfn\s+([A-Za-z_]\w*)", Format::Function, 82, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("type", &words(TYPES), Format::Type, 75),
        PatternRule::new("constant", &words(CONSTANTS), Format::Constant, 74),
        PatternRule::new("const_name", r"\b[A-Z][A-Z0-9_]+\b", Format::Constant, 62),
        PatternRule::new("type_name", r"\b[A-Z][a-zA-Z0-9_]*\b", Format::Type, 60),
        PatternRule::new("hex", r"\b0x[0-9a-fA-F_]+(?:[iu](?:8|16|32|64|128|size))?\b", Format::Number, 65),
        PatternRule::new("binary", r"\b0b[01_]+(?:[iu](?:8|16|32|64|128|size))?\b", Format::Number, 65),
        PatternRule::new("octal", r"\b0o[0-7_]+(?:[iu](?:8|16|32|64|128|size))?\b", Format::Number, 65),
        PatternRule::new("float", r"\b\d[\d_]*\.\d[\d_]*(?:[eE][+-]?\d+)?(?:f32|f64)?\b", Format::Number, 64),
        PatternRule::new("integer", r"\b\d[\d_]*(?:[iu](?:8|16|32|64|128|size)|f32|f64)?\b", Format::Number, 63),
        PatternRule::new("operator", OPERATORS, Format::Operator, 40),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));

impl Lexer for Rust {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        ctx.decorate(&PATTERNS);
    }
}
