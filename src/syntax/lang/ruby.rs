//! Ruby lexer

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

const KEYWORDS: &str = "BEGIN END alias and begin break case class def defined? do else elsif end \
    ensure false for if in module next nil not or redo rescue retry return self super then true \
    undef unless until when while yield __method__ require require_relative include extend \
    attr_reader attr_writer attr_accessor private protected public raise lambda proc loop puts";

/// Words after which a `/` starts a regex rather than dividing
const REGEX_WORDS: &[&str] = &[
    "if", "elsif", "unless", "while", "until", "when", "and", "or", "not", "return", "then", "puts",
    "p", "print", "split", "scan", "gsub", "sub", "match", "grep", "index",
];

/// Between `=begin` and `=end`
const EMBEDDED_DOC: i32 = tag::LANGUAGE_BASE;
/// After `__END__`
const DATA: i32 = tag::LANGUAGE_BASE + 1;

pub struct Ruby;

/// `$#`, `?#` and `\#` are not comments
fn comment_allowed(text: &str, pos: usize) -> bool {
    pos == 0 || !matches!(text.as_bytes()[pos - 1], b'$' | b'?' | b'\\')
}

/// `?x` is a character literal, `empty?` a method name
fn char_allowed(text: &str, pos: usize) -> bool {
    pos == 0 || !matches!(text.as_bytes()[pos - 1], b'_' | b')' | b']' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9')
}

fn operator_shape(name: &str) -> Operator {
    if name == "r" {
        Operator::MATCH
    } else {
        Operator::QUOTE
    }
}

/// A bare `%(` after an operand is the modulo operator
fn operator_allowed(lookback: &LookBack<'_>, name: &str) -> bool {
    if name.is_empty() {
        slash_allowed(lookback)
    } else {
        !lookback.immediate.is_some_and(|b| is_word(b) || b == b')' || b == b']')
    }
}

/// Whether a `/` (or bare `%`) starts a literal, judged from what precedes it
///
/// An identifier followed by a space, then the slash glued to the next
/// token, reads as a method call with a regex argument.
fn slash_allowed(lookback: &LookBack<'_>) -> bool {
    if lookback.after_literal {
        return false;
    }
    match lookback.prev_char {
        None => true,
        Some(c) if is_word(c) => {
            if matches!(lookback.sigil, Some(b'@' | b'$' | b'.' | b':')) {
                return false;
            }
            match lookback.prev_word {
                Some(word) if REGEX_WORDS.contains(&word) => true,
                Some(word) if word.as_bytes()[0].is_ascii_digit() => false,
                _ => lookback.space_before && !lookback.space_after,
            }
        }
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
        MultilineRule::token("char", r"\?(?:\\.|[^\s\w])", Format::AltString).map(|r| r.guarded(char_allowed)),
    ]
}

fn pattern_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("instance_variable", r"@@?[A-Za-z_]\w*", Format::Variable, 92),
        PatternRule::new("global", r"\$(?:[A-Za-z_]\w*|[~*$?!@/\;,.=:<>0-9])", Format::Variable, 91),
        PatternRule::with_group("symbol", r"(?:^|[^:\w])(:[A-Za-z_]\w*[?!=]?)", Format::Constant, 90, 1),
        PatternRule::with_group("def", r"\bdef\s+(?:self\.)?([\w?!=]+)", Format::Function, 88, 1),
        PatternRule::with_group("class", r"\b(?:class|module)\s+([A-Z][\w:]*)", Format::Type, 87, 1),
        PatternRule::with_group("key", r"\b([A-Za-z_]\w*):(?:\s|$)", Format::Key, 85, 1),
        PatternRule::new("keyword", &words(KEYWORDS), Format::Keyword, 80),
        PatternRule::new("constant", r"\b[A-Z]\w*\b", Format::Type, 60),
        PatternRule::new("number", r"\b(?:0[xX][0-9a-fA-F_]+|0[bB][01_]+|\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?)\b", Format::Number, 65),
        PatternRule::new("operator", r"=~|!~|<=>|=>|->|\.\.\.?|[+\-*/%&|^!<>=~?:]+", Format::Operator, 40),
    ]
}

fn regex_syntax() -> RegexSyntax {
    RegexSyntax {
        operators: Regex::new(r"%([qQwWiIrsx]?)([^\w\s=])").ok(),
        operator: operator_shape,
        operator_allowed,
        bare_slash: true,
        slash_allowed,
        flags: "imxounse",
        classes: false,
        multiline: true,
        state_id: tag::REGEX,
    }
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static PATTERNS: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(pattern_rules()));
static REGEX: Lazy<RegexSyntax> = Lazy::new(regex_syntax);
static INTERPOLATION: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"#\{[^}]*\}").ok());
static HEREDOC: Lazy<Option<Heredoc>> = Lazy::new(|| {
    Heredoc::new(
        r#"<<([-~]?)(?:'(\w+)'|"(\w+)"|([A-Z_][A-Z0-9_]*))"#,
        Format::String,
        tag::HEREDOC,
        false,
    )
});

/// Whole-line blocks: embedded documents and the data section
fn block_line(ctx: &mut LineCtx<'_>) -> bool {
    let len = ctx.len();
    if ctx.prev.is(DATA) {
        ctx.set(0, len, Format::Comment);
        ctx.next = BlockState::with_state(DATA);
        return true;
    }
    let in_doc = ctx.prev.is(EMBEDDED_DOC);
    if in_doc || (ctx.prev.is_clean() && ctx.text.starts_with("=begin")) {
        ctx.set(0, len, Format::Comment);
        if !(in_doc && ctx.text.starts_with("=end")) {
            ctx.next = BlockState::with_state(EMBEDDED_DOC);
        }
        return true;
    }
    false
}

impl Lexer for Ruby {
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

        if ctx.next.is_clean() && ctx.text.trim_end() == "__END__" {
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
            interpolate(ctx, pattern, Format::Regex, Format::Variable);
        }
    }
}
