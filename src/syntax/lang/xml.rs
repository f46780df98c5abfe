//! XML lexer

use super::markup::{self, Mode, Outcome};
use crate::syntax::context::LineCtx;
use crate::syntax::language::Lexer;

pub struct Xml;

impl Lexer for Xml {
    fn lex(&self, ctx: &mut LineCtx<'_>) {
        let mode = Mode::from_state(ctx.prev);
        // XML has no raw-body tags, so the scan always reaches the end
        if let Outcome::EndOfLine(last) = markup::run(ctx, 0, mode, &markup::XML) {
            ctx.next = last.to_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::format::Format;
    use crate::syntax::lang::testing::{format_of, lex_lines};
    use crate::syntax::state::tag;
    use crate::syntax::Language;

    #[test]
    fn test_declaration_and_elements() {
        let text = r#"<?xml version="1.0"?><Root xmlns:a="urn:x"/>"#;
        assert_eq!(format_of(Language::Xml, text, "version"), Format::Preprocessor);
        assert_eq!(format_of(Language::Xml, text, "Root"), Format::Tag);
        assert_eq!(format_of(Language::Xml, text, "xmlns:a"), Format::Attribute);
        assert_eq!(format_of(Language::Xml, text, "/>"), Format::Tag);
    }

    #[test]
    fn test_cdata_spans_lines() {
        let out = lex_lines(Language::Xml, &["<a><![CDATA[x < y", "z]]></a>"]);
        assert!(out[0].1.is(markup::CDATA));
        assert_eq!(out[0].0[14], Format::CodeBlock);
        assert_eq!(out[1].0[0], Format::CodeBlock);
        assert_eq!(out[1].0[1], Format::Special);
        assert_eq!(out[1].0[4], Format::Tag);
        assert!(out[1].1.is_clean());
    }

    #[test]
    fn test_comment_spans_lines() {
        let out = lex_lines(Language::Xml, &["<!--", "<b>not a tag</b>", "-->"]);
        assert!(out[0].1.is(tag::COMMENT));
        assert!(out[1].0.iter().all(|f| *f == Format::Comment));
        assert!(out[2].1.is_clean());
    }

    #[test]
    fn test_case_is_kept() {
        let out = lex_lines(Language::Xml, &["<Item", "/>"]);
        assert_eq!(out[0].1.label, "Item");
    }
}
