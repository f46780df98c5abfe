//! Fountain screenplay lexer
//!
//! Most elements are recognised by the line as a whole, in context: a
//! character cue must follow a blank line, and the lines after a cue are
//! dialogue until the next blank line. A clean entry state means the
//! previous line was blank (or the document just started).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::context::LineCtx;
use crate::syntax::format::Format;
use crate::syntax::language::Lexer;
use crate::syntax::rules::{self, MultilineRule, PatternRule};
use crate::syntax::scan::{self, Grammar};
use crate::syntax::state::{tag, BlockState};

/// Inside a `[[ note ]]`
const NOTE: i32 = tag::LANGUAGE_BASE;
/// After a character cue, until a blank line
const DIALOGUE: i32 = tag::LANGUAGE_BASE + 1;
/// After a non-blank line outside dialogue
const AFTER_TEXT: i32 = tag::LANGUAGE_BASE + 2;

pub struct Fountain;

fn structure_rules() -> Vec<Option<MultilineRule>> {
    vec![
        MultilineRule::new("boneyard", r"/\*", r"\*/", Format::Comment, tag::COMMENT),
        MultilineRule::new("note", r"\[\[", r"\]\]", Format::Note, NOTE),
    ]
}

fn inline_rules() -> Vec<Option<PatternRule>> {
    vec![
        PatternRule::new("scene_number", r"#[\w.-]+#\s*$", Format::Special, 95),
        PatternRule::new("bold_italic", r"\*\*\*[^*]+\*\*\*", Format::Strong, 90),
        PatternRule::new("bold", r"\*\*[^*]+\*\*", Format::Strong, 85),
        PatternRule::new("italic", r"\*[^*\s](?:[^*]*[^*\s])?\*", Format::Emphasis, 80),
        PatternRule::new("underline", r"_[^_\s](?:[^_]*[^_\s])?_", Format::Emphasis, 75),
        PatternRule::new("escape", r"\\[*_\\]", Format::Special, 70),
    ]
}

static STRUCTURE: Lazy<Vec<MultilineRule>> = Lazy::new(|| rules::multiline_table(structure_rules()));
static INLINE: Lazy<Vec<PatternRule>> = Lazy::new(|| rules::table(inline_rules()));
static SCENE_HEADING: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)^(?:int|ext|est|int\./ext|int/ext|i/e)[. ]").ok());

/// Element a line is, and the state it hands on
struct Element {
    format: Format,
    next: i32,
}

impl Element {
    fn new(format: Format, next: i32) -> Self {
        Self { format, next }
    }
}

/// An all-caps name, optionally followed by an extension like `(V.O.)`
fn is_character_cue(line: &str) -> bool {
    let name = line.trim_end_matches('^').split('(').next().unwrap_or("").trim();
    name.bytes().any(|b| b.is_ascii_alphabetic()) && !name.chars().any(char::is_lowercase)
}

fn is_transition(line: &str) -> bool {
    line.ends_with("TO:") && !line.chars().any(char::is_lowercase)
}

fn classify(line: &str, prev: &BlockState) -> Element {
    let after_blank = prev.is_clean() || prev.is(tag::COMMENT) || prev.is(NOTE);

    if line.len() >= 3 && line.bytes().all(|b| b == b'=') {
        return Element::new(Format::Operator, tag::CLEAN);
    }
    if prev.is(DIALOGUE) {
        let format = if line.starts_with('(') { Format::Special } else { Format::String };
        return Element::new(format, DIALOGUE);
    }
    match line.as_bytes().first() {
        Some(b'#') => return Element::new(Format::Heading, AFTER_TEXT),
        Some(b'=') => return Element::new(Format::Comment, AFTER_TEXT),
        Some(b'~') => return Element::new(Format::AltString, AFTER_TEXT),
        Some(b'!') => return Element::new(Format::Default, AFTER_TEXT),
        Some(b'@') => return Element::new(Format::Function, DIALOGUE),
        Some(b'>') if line.ends_with('<') => return Element::new(Format::Special, AFTER_TEXT),
        Some(b'>') => return Element::new(Format::Keyword, AFTER_TEXT),
        Some(b'.') if !line.starts_with("..") => return Element::new(Format::Heading, AFTER_TEXT),
        _ => {}
    }
    if after_blank {
        if SCENE_HEADING.as_ref().is_some_and(|re| re.is_match(line)) {
            return Element::new(Format::Heading, AFTER_TEXT);
        }
        if is_transition(line) {
            return Element::new(Format::Keyword, AFTER_TEXT);
        }
        if is_character_cue(line) {
            return Element::new(Format::Function, DIALOGUE);
        }
    }
    Element::new(Format::Default, AFTER_TEXT)
}

impl Lexer for Fountain {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let prev = ctx.prev;
        let resumed = prev.is(tag::COMMENT) || prev.is(NOTE);
        scan::structure(ctx, &Grammar::new(&STRUCTURE));
        if ctx.next.state != tag::CLEAN {
            ctx.decorate(&INLINE);
            return;
        }

        let text = ctx.text;
        let len = text.len();
        if ctx.is_blank() {
            return;
        }
        // A boneyard or note that ended on this line leaves the rest as action
        let element = if resumed {
            Element::new(Format::Default, AFTER_TEXT)
        } else {
            classify(text.trim(), prev)
        };

        ctx.decorate(&INLINE);
        if element.format != Format::Default {
            ctx.set_unclaimed(0, len, element.format);
        }
        ctx.next = BlockState::with_state(element.next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lang::testing::{format_of, lex_lines};
    use crate::syntax::Language;
    use rstest::rstest;

    #[test]
    fn test_tables_compile() {
        assert!(structure_rules().iter().all(Option::is_some));
        assert!(inline_rules().iter().all(Option::is_some));
        assert!(SCENE_HEADING.is_some());
    }

    #[test]
    fn test_character_and_dialogue() {
        let out = lex_lines(
            Language::Fountain,
            &["INT. HOUSE - DAY", "", "ANNA (V.O.)", "(quietly)", "Hello *there*.", "", "She leaves."],
        );
        assert_eq!(out[0].0[0], Format::Heading);
        assert_eq!(out[2].0[0], Format::Function);
        assert!(out[2].1.is(DIALOGUE));
        assert_eq!(out[3].0[0], Format::Special);
        assert_eq!(out[4].0[0], Format::String);
        assert_eq!(out[4].0[7], Format::Emphasis);
        assert!(out[5].1.is_clean());
        assert_eq!(out[6].0[0], Format::Default);
    }

    #[test]
    fn test_cue_needs_blank_line_before() {
        let out = lex_lines(Language::Fountain, &["He waits.", "NOBODY COMES"]);
        assert!(out[0].1.is(AFTER_TEXT));
        assert_eq!(out[1].0[0], Format::Default);
        let out = lex_lines(Language::Fountain, &["He waits.", "@McCLANE"]);
        assert_eq!(out[1].0[0], Format::Function);
    }

    #[rstest]
    #[case("CUT TO:", Format::Keyword)]
    #[case("> THE END <", Format::Special)]
    #[case("> Burn to white.", Format::Keyword)]
    #[case(".SNIPER SCOPE POV", Format::Heading)]
    #[case("# Act One", Format::Heading)]
    #[case("= The hero sets out", Format::Comment)]
    #[case("~Lyrics here", Format::AltString)]
    #[case("===", Format::Operator)]
    fn test_elements(#[case] line: &str, #[case] expected: Format) {
        assert_eq!(format_of(Language::Fountain, line, &line[..1]), expected);
    }

    #[test]
    fn test_boneyard_and_notes_span_lines() {
        let out = lex_lines(Language::Fountain, &["Action /* cut", "this */ more", "[[a note", "end]]"]);
        assert!(out[0].1.is(tag::COMMENT));
        assert_eq!(out[1].0[0], Format::Comment);
        assert_eq!(out[1].0[8], Format::Default);
        assert!(out[2].1.is(NOTE));
        assert_eq!(out[3].0[0], Format::Note);
        assert!(out[3].1.is(AFTER_TEXT));
    }

    #[test]
    fn test_scene_number() {
        let line = "EXT. ROOF - NIGHT #12A#";
        assert_eq!(format_of(Language::Fountain, line, "#12A#"), Format::Special);
    }
}
