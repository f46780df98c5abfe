//! relex - incremental, per-line syntax highlighting
//!
//! Each line is lexed from the exit state of the line above it, so an
//! edit only relexes the edited line plus whatever lines below it actually
//! start from a different state.
//!
//! ```
//! use relex::{Document, Format, Language};
//!
//! let mut doc = Document::from_text("/* open\nstill comment */ int x;", Language::C);
//! doc.flush();
//! assert_eq!(doc.spans(1).unwrap()[0].format, Format::Comment);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod render;
pub mod syntax;

pub use config::Config;
pub use document::Document;
pub use error::{RelexError, Result};
pub use syntax::{BlockState, Format, Highlighter, Language, LineOutput, Span};
