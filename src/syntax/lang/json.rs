//! JSON lexer
//!
//! An explicit key/value state machine. The nesting stack is kept in the
//! state label, one frame per byte, so any nesting shape survives a line
//! break. The state tag is a hash of the stack.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::scan::{self, is_escaped_with};
use crate::syntax::state::{tag, BlockState};

/// Object, expecting a key or `}`
const OBJECT: u8 = b'o';
/// Object, key read, expecting `:`
const KEY: u8 = b'k';
/// Object, expecting a value
const VALUE: u8 = b'v';
/// Object, value read, expecting `,` or `}`
const AFTER_VALUE: u8 = b'c';
/// Array, expecting a value or `]`
const ARRAY: u8 = b'a';
/// Array, element read, expecting `,` or `]`
const AFTER_ELEMENT: u8 = b'e';

static NUMBER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?$").ok());

pub struct Json;

/// Nesting counters derived from a state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Open objects
    pub keys: usize,
    /// Objects waiting for a value after `:`
    pub values: usize,
    /// Open arrays
    pub brackets: usize,
}

impl Counters {
    pub fn of(state: &BlockState) -> Self {
        let mut counters = Self::default();
        for frame in state.label.bytes() {
            match frame {
                ARRAY | AFTER_ELEMENT => counters.brackets += 1,
                VALUE => {
                    counters.keys += 1;
                    counters.values += 1;
                }
                _ => counters.keys += 1,
            }
        }
        counters
    }
}

/// FNV-1a over the stack, folded above the shared tags
fn stack_hash(stack: &[u8]) -> i32 {
    if stack.is_empty() {
        return tag::CLEAN;
    }
    let mut hash: u32 = 0x811c_9dc5;
    for b in stack {
        hash ^= u32::from(*b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    tag::LANGUAGE_BASE + (hash % (i32::MAX as u32 - tag::LANGUAGE_BASE as u32)) as i32
}

fn expects_value(stack: &[u8]) -> bool {
    matches!(stack.last(), None | Some(&VALUE) | Some(&ARRAY))
}

/// Move the innermost frame past a complete value
fn value_done(stack: &mut [u8]) {
    if let Some(top) = stack.last_mut() {
        *top = match *top {
            VALUE => AFTER_VALUE,
            ARRAY => AFTER_ELEMENT,
            other => other,
        };
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'{' | b'}' | b'[' | b']' | b':' | b',' | b'"')
}

impl Lexer for Json {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let text = ctx.text;
        let bytes = text.as_bytes();
        let mut stack: Vec<u8> = ctx.prev.label.bytes().collect();
        let mut pos = 0;
        while pos < bytes.len() {
            let b = bytes[pos];
            let top = stack.last().copied();
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    pos += 1;
                    continue;
                }
                b'{' | b'[' if expects_value(&stack) => {
                    value_done(&mut stack);
                    stack.push(if b == b'{' { OBJECT } else { ARRAY });
                }
                b'}' if matches!(top, Some(OBJECT | AFTER_VALUE)) => {
                    stack.pop();
                }
                b']' if matches!(top, Some(ARRAY | AFTER_ELEMENT)) => {
                    stack.pop();
                }
                b':' if top == Some(KEY) => {
                    ctx.set(pos, pos + 1, Format::Operator);
                    if let Some(frame) = stack.last_mut() {
                        *frame = VALUE;
                    }
                }
                b',' if matches!(top, Some(AFTER_VALUE | AFTER_ELEMENT)) => {
                    ctx.set(pos, pos + 1, Format::Operator);
                    if let Some(frame) = stack.last_mut() {
                        *frame = if top == Some(AFTER_VALUE) { OBJECT } else { ARRAY };
                    }
                }
                b'"' => {
                    let close = (pos + 1..bytes.len())
                        .find(|&i| bytes[i] == b'"' && !is_escaped_with(text, pos + 1, i, b'\\'));
                    let Some(close) = close else {
                        // unterminated strings never continue
                        ctx.set(pos, bytes.len(), Format::Error);
                        break;
                    };
                    let end = close + 1;
                    if top == Some(OBJECT) {
                        ctx.set(pos, end, Format::Key);
                        if let Some(frame) = stack.last_mut() {
                            *frame = KEY;
                        }
                    } else if expects_value(&stack) {
                        ctx.set(pos, end, Format::String);
                        scan::decorate_literal(ctx, pos, end, Format::String);
                        value_done(&mut stack);
                    } else {
                        ctx.set(pos, end, Format::Error);
                    }
                    pos = end;
                    continue;
                }
                b'{' | b'}' | b'[' | b']' | b':' | b',' => {
                    ctx.set(pos, pos + 1, Format::Error);
                }
                _ => {
                    let end = (pos..bytes.len())
                        .find(|&i| is_delimiter(bytes[i]))
                        .unwrap_or(bytes.len());
                    let word = &text[pos..end];
                    let format = match word {
                        "true" | "false" | "null" => Format::Constant,
                        _ if NUMBER.as_ref().is_some_and(|re| re.is_match(word)) => Format::Number,
                        _ => Format::Error,
                    };
                    if format != Format::Error && expects_value(&stack) {
                        ctx.set(pos, end, format);
                        value_done(&mut stack);
                    } else {
                        ctx.set(pos, end, Format::Error);
                    }
                    pos = end;
                    continue;
                }
            }
            pos += 1;
        }

        ctx.next = BlockState {
            state: stack_hash(&stack),
            open_nests: i32::try_from(stack.len()).unwrap_or(i32::MAX),
            label: String::from_utf8_lossy(&stack).into_owned(),
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_line, lex_lines};
    use crate::syntax::Language;

    #[test]
    fn test_number_pattern() {
        let re = NUMBER.as_ref().unwrap();
        for good in ["0", "-1", "3.25", "1e9", "2.5E-3"] {
            assert!(re.is_match(good), "{good}");
        }
        for bad in ["01", "1.", ".5", "0x1", "--1"] {
            assert!(!re.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_keys_and_values() {
        let text = r#"{"name": "relex", "n": 2, "ok": true, "xs": [null]}"#;
        assert_eq!(format_of(Language::Json, text, "\"name\""), Format::Key);
        assert_eq!(format_of(Language::Json, text, "\"relex\""), Format::String);
        assert_eq!(format_of(Language::Json, text, "2"), Format::Number);
        assert_eq!(format_of(Language::Json, text, "true"), Format::Constant);
        assert_eq!(format_of(Language::Json, text, "null"), Format::Constant);
        assert_eq!(format_of(Language::Json, text, ":"), Format::Operator);
        let (_, exit) = lex_line(Language::Json, text, &BlockState::default());
        assert!(exit.is_clean());
    }

    #[test]
    fn test_counters_across_lines() {
        let out = lex_lines(Language::Json, &[r#"{"a":"#, r#"{"b": [1,"#, "2]}}"]);
        assert_eq!(Counters::of(&out[0].1), Counters { keys: 1, values: 1, brackets: 0 });
        assert_eq!(Counters::of(&out[1].1), Counters { keys: 2, values: 0, brackets: 1 });
        assert_eq!(out[1].1.open_nests, 3);
        assert_eq!(out[2].0[0], Format::Number);
        assert!(out[2].1.is_clean());
    }

    #[test]
    fn test_shapes_hash_apart() {
        let a = lex_lines(Language::Json, &["[{"]);
        let b = lex_lines(Language::Json, &["{\"k\": ["]);
        assert_ne!(a[0].1.state, b[0].1.state);
        assert!(a[0].1.state >= tag::LANGUAGE_BASE);
    }

    #[test]
    fn test_unexpected_tokens_are_errors() {
        let text = r#"{"a" 1, "b": 2 3}"#;
        let (formats, exit) = lex_line(Language::Json, text, &BlockState::default());
        assert_eq!(formats[5], Format::Error);
        assert_eq!(formats[6], Format::Error);
        assert_eq!(formats[15], Format::Error);
        assert_eq!(formats[13], Format::Number);
        assert!(exit.is_clean());
    }

    #[test]
    fn test_unterminated_string_is_error_and_not_carried() {
        let out = lex_lines(Language::Json, &[r#"{"a": "open"#, r#""b"}"#]);
        assert_eq!(out[0].0[6], Format::Error);
        assert_eq!(out[0].0[10], Format::Error);
        assert_eq!(Counters::of(&out[0].1).values, 1);
        assert_eq!(out[1].0[0], Format::String);
        assert!(out[1].1.is_clean());
    }

    #[test]
    fn test_split_matches_single_line() {
        let text = r#"{"a": {"b": [1,2,3]}}"#;
        let (whole, whole_exit) = lex_line(Language::Json, text, &BlockState::default());
        for (split, _) in text.match_indices(|c| matches!(c, '{' | '}' | '[' | ']')) {
            for cut in [split, split + 1] {
                let (head, tail) = text.split_at(cut);
                let out = lex_lines(Language::Json, &[head, tail]);
                let joined: Vec<Format> = out[0].0.iter().chain(out[1].0.iter()).copied().collect();
                assert_eq!(joined, whole, "split at {cut}");
                assert_eq!(out[1].1, whole_exit, "split at {cut}");
            }
        }
    }
}
