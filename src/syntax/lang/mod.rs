//! Built-in language lexers
//!
//! One module per language (or family). Rule tables are compiled once
//! into `Lazy` statics; the lexers themselves are stateless.

pub mod c;
pub mod cmake;
pub mod css;
pub mod fountain;
pub mod go;
pub mod html;
pub mod java;
pub mod javascript;
pub mod json;
pub mod latex;
pub mod lua;
pub mod make;
pub mod markdown;
pub mod markup;
pub mod pascal;
pub mod perl;
pub mod php;
pub mod python;
pub mod rest;
pub mod ruby;
pub mod rust;
pub mod shell;
pub mod tcl;
pub mod xml;
pub mod yaml;

use regex::Regex;

use super::context::LineCtx;
use super::format::Format;
use super::language::Lexer;

/// Lexer that classifies nothing
pub struct Plain;

impl Lexer for Plain {
    fn lex(&self, _ctx: &mut LineCtx<'_>) {}
}

/// Word-boundary alternation over a space-separated word list
pub(crate) fn words(list: &str) -> String {
    let alternatives: Vec<&str> = list.split_whitespace().collect();
    format!(r"\b(?:{})\b", alternatives.join("|"))
}

/// Format matches of `pattern` that start inside `inside` text
///
/// Interpolated variables live inside strings, which the decorative
/// layer otherwise never touches.
pub(crate) fn interpolate(ctx: &mut LineCtx<'_>, pattern: &Regex, inside: Format, format: Format) {
    if !ctx.full {
        return;
    }
    let text = ctx.text;
    for m in pattern.find_iter(text) {
        if ctx.at(m.start()) == inside {
            ctx.formats.set_unless(m.start(), m.len(), format, Format::Url);
        }
    }
}

/// Decimal, hex, octal and binary numbers, C style
pub(crate) const C_NUMBER: &str =
    r"\b(?:0[xX][0-9a-fA-F']+|0[bB][01']+|\d[\d']*\.?[\d']*(?:[eE][+-]?\d+)?)[uUlLfF]*\b|\B\.\d+(?:[eE][+-]?\d+)?[fFlL]?\b";

/// Common operator characters
pub(crate) const OPERATORS: &str = r"[+\-*/%&|^!<>=~?:]+";


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        assert_eq!(words("if  else\nwhile"), r"\b(?:if|else|while)\b");
    }

    #[test]
    fn test_number_pattern() {
        let re = regex::Regex::new(C_NUMBER).unwrap();
        for n in ["42", "0x1F", "3.14", "1e10", "10UL", "0b101", "1'000"] {
            assert_eq!(re.find(n).map(|m| m.as_str()), Some(n), "{n}");
        }
    }
}
