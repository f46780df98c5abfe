//! Perl lexer

use once_cell::sync::Lazy;
use regex::Regex;

use super::{interpolate, words};
use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::regex_literal::{LookBack, Operator, RegexSyntax};
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, is_word, Grammar, Heredoc, HeredocLine};
use crate::syntax::state::{tag, BlockState};

const KEYWORDS: &str = "if elsif else unless while until for foreach do last next redo return my \
    our local state sub package use no require BEGIN END and or not xor eq ne lt gt le ge cmp \
    given when default";

const BUILTINS: &str = "print printf say open close chomp chop chdir defined delete die each eval \
    exists exit join keys lc length map grep push pop shift unshift splice split sort reverse \
    sprintf substr uc undef values wantarray warn ref bless scalar";

/// Words after which a `/` starts a regex rather than dividing
const REGEX_WORDS: &[&str] = &[
    "split", "grep", "map", "join", "if", "elsif", "unless", "while", "until", "and", "or", "not",
    "xor", "return", "when", "push", "unshift", "lt", "gt", "le", "ge", "eq", "ne", "cmp",
];

const VARIABLE: &str = r"[$@%]\{\^?\w+\}|[$@%]#?\w+(?:::\w+)*|\$[_&`'+!@/\\,;.0-9]";

/// Inside POD documentation
const POD: i32 = tag::LANGUAGE_BASE;
/// After `__END__` / `__DATA__`
const DATA: i32 = tag::LANGUAGE_BASE + 1;

pub struct Perl;

/// `$#array` and `\#` are not comments
fn comment_allowed(text: &str, pos: usize) -> bool {
    pos == 0 || !matches!(text.as_bytes()[pos - 1], b'$' | b'\\')
}

fn operator_shape(name: &str) -> Operator {
    match name {
        "s" | "tr" | "y" => Operator::SUBSTITUTE,
        "q" | "qq" | "qw" | "qx" => Operator::QUOTE,
        _ => Operator::MATCH,
    }
}

/// Quote-like operators are not method names, hash keys or sigiled names
fn operator_allowed(lookback: &LookBack<'_>, _name: &str) -> bool {
    match lookback.immediate {
        Some(b'$' | b'@' | b'%' | b'&' | b'*' | b'-' | b':' | b'>') => false,
        _ => true,
    }
}

/// Whether a `/` starts a regex, judged from what precedes it
fn slash_allowed(lookback: &LookBack<'_>) -> bool {
    if lookback.after_literal {
        return false;
    }
    match lookback.prev_char {
        None => true,
        Some(c) if is_word(c) => match lookback.prev_word {
            Some(word) if lookback.sigil.is_none() => REGEX_WORDS.contains(&word),
            _ => false,
        },
        Some(b')' | b']' | b'}') => false,
        Some(_) => true,
    }
}

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::line("comment", "#", Format::Comment).map(|r| r.guarded(comment_allowed)),
        MultilineRule::with_escape("double", "\"", "\"", Format::String, tag::DOUBLE_QUOTE, '\\'),
        MultilineRule::with_escape("single", "'", "'", Format::AltString, tag::SINGLE_QUOTE, '\\'),
        MultilineRule::with_escape("backtick", "`", "`", Format::Special, tag::BACK_QUOTE, '\\'),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("variable", VARIABLE, Format::Variable, 90),
        PatternRule::with_group("sub", r"\bsub\s+(\w+)", Format::Function, 88, 1),
        PatternRule::with_group("package", r"\b(?:package|use|no|require)\s+([\w:]+)", Format::Type, 86, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("builtin", &words(BUILTINS), Format::Function, 75),
        PatternRule::new("special", r"\b__(?:FILE|LINE|PACKAGE|SUB|END|DATA)__\b", Format::Special, 72),
        PatternRule::new("number", r"\b(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?)\b", Format::Number, 65),
        PatternRule::new("operator", r"=~|!~|->|=>|[+\-*/%&|^!<>=~?:.]+", Format::Operator, 40),
    ]
}

fn regex_syntax() -> RegexSyntax {
    RegexSyntax {
        operators: Regex::new(r"\b(m|qr|s|tr|y|q|qq|qw|qx)\s*([^\w\s,;)=>}\]])").ok(),
        operator: operator_shape,
        operator_allowed,
        bare_slash: true,
        slash_allowed,
        flags: "msixpodualngcer",
        classes: false,
        multiline: true,
        state_id: tag::REGEX,
    }
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static REGEX: Lazy<RegexSyntax> = Lazy::new(regex_syntax);
static INTERPOLATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(VARIABLE).ok());
static HEREDOC: Lazy<Option<Heredoc>> = Lazy::new(|| {
    Heredoc::new(
        r#"<<(~?)(?:'(\w+)'|"(\w+)"|([A-Za-z_]\w*))"#,
        Format::String,
        tag::HEREDOC,
        false,
    )
});

/// Whole-line blocks: POD and the data section
///
/// Returns true if the line was consumed.
fn block_line(ctx: &mut LineCtx<'_>) -> bool {
    let len = ctx.len();
    if ctx.prev.is(DATA) {
        ctx.set(0, len, Format::Comment);
        ctx.next = BlockState::with_state(DATA);
        return true;
    }
    let in_pod = ctx.prev.is(POD);
    let opens_pod = ctx.prev.is_clean() && ctx.text.starts_with('=') && ctx.byte(1).is_ascii_alphabetic();
    if in_pod || opens_pod {
        ctx.set(0, len, Format::Comment);
        if !ctx.text.starts_with("=cut") {
            ctx.next = BlockState::with_state(POD);
        }
        return true;
    }
    false
}

impl Lexer for Perl {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        if block_line(ctx) {
            return;
        }
        let grammar = Grammar::with_regex(&STRUCTURE, &REGEX);
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

        let trimmed = ctx.text.trim_end();
        if ctx.next.is_clean() && (trimmed == "__END__" || trimmed == "__DATA__") {
            let len = ctx.len();
            ctx.set(0, len, Format::Special);
            ctx.next = BlockState::with_state(DATA);
            return;
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
