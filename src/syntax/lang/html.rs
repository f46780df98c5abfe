//! HTML lexer
//!
//! `<script>` and `<style>` bodies are handed to the JavaScript and CSS
//! lexers. While such a body is open across lines, the embedded lexer's
//! own state rides along in `sub`.

use super::markup::{self, Mode, Outcome};
use crate::syntax::context::LineCtx;
use crate::syntax::language::{Language, Lexer};
use crate::syntax::state::{tag, BlockState};

/// Inside a `<script>` body
const SCRIPT: i32 = tag::LANGUAGE_BASE + 8;
/// Inside a `<style>` body
const STYLE: i32 = tag::LANGUAGE_BASE + 9;

pub struct Html;

fn body_language(name: &str) -> Language {
    if name == "style" {
        Language::Css
    } else {
        Language::JavaScript
    }
}

/// Lex a raw body from `from` up to its end tag
///
/// Returns where the end tag starts, or `None` after persisting the
/// embedded state if the body runs past the end of the line.
fn raw_body(ctx: &mut LineCtx<'_>, from: usize, name: &str, entry: &BlockState) -> Option<usize> {
    let text = ctx.text;
    let lexer = body_language(name).lexer();
    let closer = format!("</{name}");
    let end = text[from..]
        .to_ascii_lowercase()
        .find(&closer)
        .map(|i| from + i);
    match end {
        Some(end) => {
            if end > from {
                ctx.embed(from..end, lexer, entry);
            }
            Some(end)
        }
        None => {
            let len = ctx.len();
            let exit = if len > from {
                ctx.embed(from..len, lexer, entry)
            } else {
                entry.clone()
            };
            let state = if name == "style" { STYLE } else { SCRIPT };
            let mut next = BlockState::labeled(state, name);
            if !exit.is_clean() {
                next.sub = Some(Box::new(exit));
            }
            ctx.next = next;
            None
        }
    }
}

impl Lexer for Html {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let mut pos = 0;
        let mut mode = Mode::from_state(prev);
        if prev.is(SCRIPT) || prev.is(STYLE) {
            match raw_body(ctx, 0, &prev.label, &prev.sub_state()) {
                Some(end) => {
                    pos = end;
                    mode = Mode::Text;
                }
                None => return,
            }
        }
        loop {
            match markup::run(ctx, pos, mode, &markup::HTML) {
                Outcome::EndOfLine(last) => {
                    ctx.next = last.to_state();
                    return;
                }
                Outcome::RawBody { name, at } => {
                    match raw_body(ctx, at, &name, &BlockState::default()) {
                        Some(end) => {
                            pos = end;
                            mode = Mode::Text;
                        }
                        None => return,
                    }
                }
            }
        }
    }
}
