//! Bracket collection for the host's bracket matcher
//!
//! Runs after every other rule, because whether a bracket counts depends on
//! the final classification of its position.

use super::spans::LineFormats;

/// A bracket, brace or parenthesis found in code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bracket {
    /// Byte offset within the line
    pub pos: usize,
    /// One of `( ) [ ] { }`
    pub ch: char,
}

impl Bracket {
    /// Whether this is an opening bracket
    pub fn is_open(&self) -> bool {
        matches!(self.ch, '(' | '[' | '{')
    }

    /// The bracket that closes (or opens) this one
    pub fn counterpart(&self) -> char {
        match self.ch {
            '(' => ')',
            ')' => '(',
            '[' => ']',
            ']' => '[',
            '{' => '}',
            _ => '{',
        }
    }
}

/// Collect brackets that are not inside strings, comments or regexes
pub fn collect(text: &str, formats: &LineFormats) -> Vec<Bracket> {
    text.bytes()
        .enumerate()
        .filter(|(_, b)| matches!(b, b'(' | b')' | b'[' | b']' | b'{' | b'}'))
        .filter(|(pos, _)| !formats.at(*pos).is_literal())
        .map(|(pos, b)| Bracket { pos, ch: b as char })
        .collect()
}
