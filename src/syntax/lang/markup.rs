//! Shared tag scanner for HTML and XML
//!
//! Tags, attribute values, comments and declarations can all stay open at
//! the end of a line. The open construct is described by a [`Mode`],
//! which round-trips through the block state.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::scan;
use crate::syntax::state::{tag, BlockState};

/// Inside a start or end tag; the label holds the tag name
pub(crate) const IN_TAG: i32 = tag::LANGUAGE_BASE;
/// Inside a double-quoted attribute value
pub(crate) const DOUBLE_VALUE: i32 = tag::LANGUAGE_BASE + 1;
/// Inside a single-quoted attribute value
pub(crate) const SINGLE_VALUE: i32 = tag::LANGUAGE_BASE + 2;
/// Inside `<![CDATA[`
pub(crate) const CDATA: i32 = tag::LANGUAGE_BASE + 3;
/// Inside a processing instruction
pub(crate) const INSTRUCTION: i32 = tag::LANGUAGE_BASE + 4;
/// Inside `<!DOCTYPE` or another declaration
pub(crate) const DECLARATION: i32 = tag::LANGUAGE_BASE + 5;

static TAG_OPEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^</?([A-Za-z_][\w:.-]*)").ok());
static ATTRIBUTE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r#"^[^\s"'<>/=]+"#).ok());
static ENTITY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);").ok());

/// Per-dialect differences
pub(crate) struct Dialect {
    /// Tags whose body belongs to another lexer
    pub raw_tags: &'static [&'static str],
    /// Whether tag names are case-insensitive (and stored lowercase)
    pub fold_case: bool,
}

pub(crate) const HTML: Dialect = Dialect {
    raw_tags: &["script", "style"],
    fold_case: true,
};

pub(crate) const XML: Dialect = Dialect {
    raw_tags: &[],
    fold_case: false,
};

/// What the scanner is inside of
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    Text,
    Comment,
    CData,
    Instruction,
    Declaration,
    /// Inside a tag; end tags are stored with a leading `/`
    Tag(String),
    /// Inside a quoted value of the named tag
    Value(String, u8),
}

impl Mode {
    /// Decode a mode from a line's entry state
    pub(crate) fn from_state(state: &BlockState) -> Mode {
        let name = || state.label.clone();
        match state.state {
            tag::COMMENT => Mode::Comment,
            CDATA => Mode::CData,
            INSTRUCTION => Mode::Instruction,
            DECLARATION => Mode::Declaration,
            IN_TAG => Mode::Tag(name()),
            DOUBLE_VALUE => Mode::Value(name(), b'"'),
            SINGLE_VALUE => Mode::Value(name(), b'\''),
            _ => Mode::Text,
        }
    }

    /// Encode a mode as an exit state
    pub(crate) fn to_state(&self) -> BlockState {
        match self {
            Mode::Text => BlockState::default(),
            Mode::Comment => BlockState::with_state(tag::COMMENT),
            Mode::CData => BlockState::with_state(CDATA),
            Mode::Instruction => BlockState::with_state(INSTRUCTION),
            Mode::Declaration => BlockState::with_state(DECLARATION),
            Mode::Tag(name) => BlockState::labeled(IN_TAG, name.clone()),
            Mode::Value(name, b'\'') => BlockState::labeled(SINGLE_VALUE, name.clone()),
            Mode::Value(name, _) => BlockState::labeled(DOUBLE_VALUE, name.clone()),
        }
    }
}

/// Where a scan stopped
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The line ended in this mode
    EndOfLine(Mode),
    /// A raw-body tag such as `<script>` closed at `at`
    RawBody { name: String, at: usize },
}

fn entities(ctx: &mut LineCtx<'_>, start: usize, end: usize) {
    if !ctx.full || start >= end {
        return;
    }
    let Some(entity) = ENTITY.as_ref() else {
        return;
    };
    let text = ctx.text;
    for m in entity.find_iter(&text[start..end]) {
        ctx.set(start + m.start(), start + m.end(), Format::Special);
    }
}

/// Format from `pos` up to a fixed closer, returning the position after it
fn run_to(ctx: &mut LineCtx<'_>, pos: usize, closer: &str, format: Format) -> Option<usize> {
    let text = ctx.text;
    match text[pos..].find(closer) {
        Some(found) => {
            let end = pos + found + closer.len();
            ctx.set(pos, end, format);
            scan::decorate_literal(ctx, pos, end, format);
            Some(end)
        }
        None => {
            let len = ctx.len();
            ctx.set(pos, len, format);
            scan::decorate_literal(ctx, pos, len, format);
            None
        }
    }
}

/// Scan markup from `from` in `mode` until the line ends or a raw body opens
pub(crate) fn run(ctx: &mut LineCtx<'_>, from: usize, mut mode: Mode, dialect: &Dialect) -> Outcome {
    let text = ctx.text;
    let bytes = text.as_bytes();
    let len = text.len();
    let mut pos = from.min(len);
    loop {
        match mode {
            Mode::Text => {
                let Some(lt) = text[pos..].find('<').map(|i| pos + i) else {
                    entities(ctx, pos, len);
                    return Outcome::EndOfLine(Mode::Text);
                };
                entities(ctx, pos, lt);
                let rest = &text[lt..];
                if rest.starts_with("<!--") {
                    ctx.set(lt, lt + 4, Format::Comment);
                    pos = lt + 4;
                    mode = Mode::Comment;
                } else if rest.starts_with("<![CDATA[") {
                    ctx.set(lt, lt + 9, Format::Special);
                    pos = lt + 9;
                    mode = Mode::CData;
                } else if rest.starts_with("<?") {
                    ctx.set(lt, lt + 2, Format::Preprocessor);
                    pos = lt + 2;
                    mode = Mode::Instruction;
                } else if rest.starts_with("<!") {
                    ctx.set(lt, lt + 2, Format::Preprocessor);
                    pos = lt + 2;
                    mode = Mode::Declaration;
                } else if let Some(caps) = TAG_OPEN.as_ref().and_then(|re| re.captures(rest)) {
                    let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                        pos = lt + 1;
                        continue;
                    };
                    ctx.set(lt, lt + whole.end(), Format::Tag);
                    let mut name = name.as_str().to_string();
                    if dialect.fold_case {
                        name.make_ascii_lowercase();
                    }
                    if rest.starts_with("</") {
                        name.insert(0, '/');
                    }
                    pos = lt + whole.end();
                    mode = Mode::Tag(name);
                } else {
                    pos = lt + 1;
                }
            }
            Mode::Comment => match run_to(ctx, pos, "-->", Format::Comment) {
                Some(end) => {
                    pos = end;
                    mode = Mode::Text;
                }
                None => return Outcome::EndOfLine(Mode::Comment),
            },
            Mode::CData => match text[pos..].find("]]>") {
                Some(found) => {
                    let close = pos + found;
                    ctx.set(pos, close, Format::CodeBlock);
                    ctx.set(close, close + 3, Format::Special);
                    pos = close + 3;
                    mode = Mode::Text;
                }
                None => {
                    ctx.set(pos, len, Format::CodeBlock);
                    return Outcome::EndOfLine(Mode::CData);
                }
            },
            Mode::Instruction => match run_to(ctx, pos, "?>", Format::Preprocessor) {
                Some(end) => {
                    pos = end;
                    mode = Mode::Text;
                }
                None => return Outcome::EndOfLine(Mode::Instruction),
            },
            Mode::Declaration => match run_to(ctx, pos, ">", Format::Preprocessor) {
                Some(end) => {
                    pos = end;
                    mode = Mode::Text;
                }
                None => return Outcome::EndOfLine(Mode::Declaration),
            },
            Mode::Tag(name) => {
                while pos < len && bytes[pos].is_ascii_whitespace() {
                    pos += 1;
                }
                if pos >= len {
                    return Outcome::EndOfLine(Mode::Tag(name));
                }
                match bytes[pos] {
                    b'>' => {
                        ctx.set(pos, pos + 1, Format::Tag);
                        pos += 1;
                        if dialect.raw_tags.contains(&name.as_str()) {
                            return Outcome::RawBody { name, at: pos };
                        }
                        mode = Mode::Text;
                    }
                    b'/' | b'?' if bytes.get(pos + 1) == Some(&b'>') => {
                        ctx.set(pos, pos + 2, Format::Tag);
                        pos += 2;
                        mode = Mode::Text;
                    }
                    b'=' => {
                        ctx.set(pos, pos + 1, Format::Operator);
                        pos += 1;
                        while pos < len && bytes[pos].is_ascii_whitespace() {
                            pos += 1;
                        }
                        match bytes.get(pos) {
                            Some(&quote @ (b'"' | b'\'')) => {
                                ctx.set(pos, pos + 1, Format::String);
                                pos += 1;
                                mode = Mode::Value(name, quote);
                            }
                            Some(_) => {
                                let end = text[pos..]
                                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                                    .map_or(len, |i| pos + i);
                                ctx.set(pos, end, Format::Value);
                                pos = end;
                                mode = Mode::Tag(name);
                            }
                            None => mode = Mode::Tag(name),
                        }
                    }
                    quote @ (b'"' | b'\'') => {
                        ctx.set(pos, pos + 1, Format::String);
                        pos += 1;
                        mode = Mode::Value(name, quote);
                    }
                    b'<' => {
                        // unclosed tag: start over in text
                        mode = Mode::Text;
                    }
                    _ => {
                        let width = ATTRIBUTE
                            .as_ref()
                            .and_then(|re| re.find(&text[pos..]))
                            .map_or(0, |m| m.end());
                        if width > 0 {
                            ctx.set(pos, pos + width, Format::Attribute);
                            pos += width;
                        } else {
                            let end = scan::next_boundary(text, pos + 1);
                            ctx.set(pos, end, Format::Error);
                            pos = end;
                        }
                        mode = Mode::Tag(name);
                    }
                }
            }
            Mode::Value(name, quote) => match text[pos..].find(quote as char) {
                Some(found) => {
                    let end = pos + found + 1;
                    ctx.set(pos, end, Format::String);
                    entities(ctx, pos, end);
                    pos = end;
                    mode = Mode::Tag(name);
                }
                None => {
                    ctx.set(pos, len, Format::String);
                    entities(ctx, pos, len);
                    return Outcome::EndOfLine(Mode::Value(name, quote));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_line(text: &str, prev: &BlockState, dialect: &Dialect) -> (Vec<Format>, Outcome) {
        let mut ctx = LineCtx::new(text, prev, true);
        let mode = Mode::from_state(prev);
        let outcome = run(&mut ctx, 0, mode, dialect);
        let formats = (0..text.len()).map(|i| ctx.at(i)).collect();
        (formats, outcome)
    }

    #[test]
    fn test_patterns_compile() {
        assert!(TAG_OPEN.is_some());
        assert!(ATTRIBUTE.is_some());
        assert!(ENTITY.is_some());
    }

    #[test]
    fn test_mode_round_trip() {
        for mode in [
            Mode::Text,
            Mode::Comment,
            Mode::CData,
            Mode::Tag("div".into()),
            Mode::Value("a".into(), b'\''),
            Mode::Value("a".into(), b'"'),
        ] {
            assert_eq!(Mode::from_state(&mode.to_state()), mode);
        }
    }

    #[test]
    fn test_tag_and_attributes() {
        let text = r#"<a href="x.html" hidden>go &amp; see</a>"#;
        let (formats, outcome) = scan_line(text, &BlockState::default(), &HTML);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Text));
        assert_eq!(formats[0], Format::Tag);
        assert_eq!(formats[1], Format::Tag);
        assert_eq!(formats[3], Format::Attribute);
        assert_eq!(formats[7], Format::Operator);
        assert_eq!(formats[8], Format::String);
        assert_eq!(formats[17], Format::Attribute);
        assert_eq!(formats[23], Format::Tag);
        assert_eq!(formats[24], Format::Default);
        assert_eq!(formats[27], Format::Special);
        assert_eq!(formats[36], Format::Tag);
    }

    #[test]
    fn test_tag_spans_lines() {
        let (_, outcome) = scan_line("<Item name=\"first", &BlockState::default(), &XML);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Value("Item".into(), b'"')));
        let prev = Mode::Value("Item".into(), b'"').to_state();
        let (formats, outcome) = scan_line("second\" id=1>text", &prev, &XML);
        assert_eq!(formats[0], Format::String);
        assert_eq!(formats[8], Format::Attribute);
        assert_eq!(formats[11], Format::Value);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Text));
    }

    #[test]
    fn test_raw_body_stops_scan() {
        let (_, outcome) = scan_line("<SCRIPT type=\"x\">let a;", &BlockState::default(), &HTML);
        assert_eq!(
            outcome,
            Outcome::RawBody {
                name: "script".into(),
                at: 17
            }
        );
        let (_, outcome) = scan_line("</script><p>", &BlockState::default(), &HTML);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Text));
    }

    #[test]
    fn test_comment_and_cdata() {
        let (formats, outcome) = scan_line("<!-- TODO x", &BlockState::default(), &XML);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Comment));
        assert_eq!(formats[5], Format::Note);
        let (formats, outcome) = scan_line("a<![CDATA[<b>]]>c", &BlockState::default(), &XML);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Text));
        assert_eq!(formats[10], Format::CodeBlock);
        assert_eq!(formats[13], Format::Special);
        assert_eq!(formats[16], Format::Default);
    }

    #[test]
    fn test_less_than_in_text() {
        let (formats, outcome) = scan_line("a < b", &BlockState::default(), &HTML);
        assert_eq!(outcome, Outcome::EndOfLine(Mode::Text));
        assert!(formats.iter().all(|f| *f == Format::Default));
    }
}
