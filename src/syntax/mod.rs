//! Syntax highlighting
//!
//! Layered from the bottom up:
//! - `format`, `spans`, `style`: categories, the per-byte overlay buffer
//!   and how categories look
//! - `state`: the exit state a line hands to the next one
//! - `rules`, `scan`, `regex_literal`: generic structural primitives
//! - `lang`: one lexer per language, behind the [`Lexer`] trait
//! - `highlighter`, `store`, `scheduler`: relexing lines and deciding
//!   which ones need it

mod brackets;
pub mod context;
mod format;
mod highlighter;
pub mod lang;
mod language;
pub mod regex_literal;
pub mod rules;
pub mod scan;
mod scheduler;
mod spans;
mod state;
mod store;
mod style;

pub use brackets::{collect as collect_brackets, Bracket};
pub use context::LineCtx;
pub use format::Format;
pub use highlighter::{Highlighter, LineOutput, DEFAULT_MAX_LINE_LENGTH};
pub use language::{Language, Lexer};
pub use scheduler::{Scheduler, Task};
pub use spans::{LineFormats, Span};
pub use state::{tag, BlockState, LineData};
pub use store::{LineId, LineStore};
pub use style::{Color, Style};
