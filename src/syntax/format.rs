//! Classification categories ("formats")
//!
//! Every byte of a lexed line carries exactly one `Format`. `Default`
//! means the byte has not been claimed by any rule yet.

use super::style::{Color, Style};

/// Semantic categories assigned by the lexers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Unclassified text
    #[default]
    Default,
    /// Plain text explicitly claimed so later rules leave it alone
    Neutral,
    /// Comments
    Comment,
    /// TODO/FIXME markers inside comments
    Note,
    /// Double-quoted (or primary) string literals
    String,
    /// Single-quoted (or secondary) string literals
    AltString,
    /// Regular expression literals
    Regex,
    /// Malformed literals and unexpected tokens
    Error,
    /// Language keywords
    Keyword,
    /// Type names
    Type,
    /// Function and command names
    Function,
    /// Numeric literals
    Number,
    /// Operators
    Operator,
    /// Preprocessor directives and compiler pragmas
    Preprocessor,
    /// Constants, booleans, symbols
    Constant,
    /// Escape sequences, entities, special markers
    Special,
    /// Attributes, annotations, decorators, markup attributes
    Attribute,
    /// Rust lifetimes
    Lifetime,
    /// Variables with a sigil (`$x`, `@x`)
    Variable,
    /// Mapping keys (JSON, YAML)
    Key,
    /// Property values (CSS, JSON scalars)
    Value,
    /// Markup tags
    Tag,
    /// URLs and e-mail addresses
    Url,
    /// Document headings
    Heading,
    /// Emphasised text
    Emphasis,
    /// Strongly emphasised text
    Strong,
    /// Code blocks and literal blocks in markup
    CodeBlock,
    /// Block quotes
    Quote,
    /// Links and references
    Link,
    /// Math regions
    Math,
    /// Lines too long to be highlighted
    TooLong,
}

impl Format {
    /// Every format, in declaration order
    pub const ALL: [Format; 31] = [
        Format::Default,
        Format::Neutral,
        Format::Comment,
        Format::Note,
        Format::String,
        Format::AltString,
        Format::Regex,
        Format::Error,
        Format::Keyword,
        Format::Type,
        Format::Function,
        Format::Number,
        Format::Operator,
        Format::Preprocessor,
        Format::Constant,
        Format::Special,
        Format::Attribute,
        Format::Lifetime,
        Format::Variable,
        Format::Key,
        Format::Value,
        Format::Tag,
        Format::Url,
        Format::Heading,
        Format::Emphasis,
        Format::Strong,
        Format::CodeBlock,
        Format::Quote,
        Format::Link,
        Format::Math,
        Format::TooLong,
    ];

    /// Get the default style for this format
    pub fn default_style(&self) -> Style {
        match self {
            Format::Default | Format::Neutral => Style::default(),
            Format::Comment => Style::fg(Color::BrightBlack).with_italic(),
            Format::Note => Style::fg(Color::BrightYellow).with_bold(),
            Format::String => Style::fg(Color::Green),
            Format::AltString => Style::fg(Color::BrightGreen),
            Format::Regex => Style::fg(Color::BrightRed),
            Format::Error => Style::fg(Color::White).with_bg(Color::Red),
            Format::Keyword => Style::fg(Color::Magenta).with_bold(),
            Format::Type => Style::fg(Color::Yellow),
            Format::Function => Style::fg(Color::Blue),
            Format::Number => Style::fg(Color::Cyan),
            Format::Operator => Style::fg(Color::BrightWhite),
            Format::Preprocessor => Style::fg(Color::BrightMagenta),
            Format::Constant => Style::fg(Color::BrightRed),
            Format::Special => Style::fg(Color::BrightYellow),
            Format::Attribute => Style::fg(Color::BrightBlue),
            Format::Lifetime => Style::fg(Color::BrightMagenta),
            Format::Variable => Style::fg(Color::BrightCyan),
            Format::Key => Style::fg(Color::Blue).with_bold(),
            Format::Value => Style::fg(Color::Cyan),
            Format::Tag => Style::fg(Color::Magenta),
            Format::Url => Style::fg(Color::Blue).with_underline(),
            Format::Heading => Style::fg(Color::BrightBlue).with_bold(),
            Format::Emphasis => Style::default().with_italic(),
            Format::Strong => Style::default().with_bold(),
            Format::CodeBlock => Style::fg(Color::Green),
            Format::Quote => Style::fg(Color::BrightBlack),
            Format::Link => Style::fg(Color::Blue).with_underline(),
            Format::Math => Style::fg(Color::Yellow),
            Format::TooLong => Style::fg(Color::BrightBlack).with_reverse(),
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Format::Default => "Default",
            Format::Neutral => "Neutral",
            Format::Comment => "Comment",
            Format::Note => "Note",
            Format::String => "String",
            Format::AltString => "AltString",
            Format::Regex => "Regex",
            Format::Error => "Error",
            Format::Keyword => "Keyword",
            Format::Type => "Type",
            Format::Function => "Function",
            Format::Number => "Number",
            Format::Operator => "Operator",
            Format::Preprocessor => "Preprocessor",
            Format::Constant => "Constant",
            Format::Special => "Special",
            Format::Attribute => "Attribute",
            Format::Lifetime => "Lifetime",
            Format::Variable => "Variable",
            Format::Key => "Key",
            Format::Value => "Value",
            Format::Tag => "Tag",
            Format::Url => "Url",
            Format::Heading => "Heading",
            Format::Emphasis => "Emphasis",
            Format::Strong => "Strong",
            Format::CodeBlock => "CodeBlock",
            Format::Quote => "Quote",
            Format::Link => "Link",
            Format::Math => "Math",
            Format::TooLong => "TooLong",
        }
    }

    /// Parse a format from its name (for theme loading)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Whether this format marks literal text: strings, comments, regexes
    ///
    /// Bracket collection and keyword rules never look inside these.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Format::Comment
                | Format::Note
                | Format::String
                | Format::AltString
                | Format::Regex
                | Format::Url
                | Format::CodeBlock
                | Format::TooLong
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles_not_empty() {
        assert!(!Format::Comment.default_style().is_default());
        assert!(!Format::String.default_style().is_default());
        assert!(!Format::Keyword.default_style().is_default());
        assert!(Format::Neutral.default_style().is_default());
        assert!(Format::Default.default_style().is_default());
    }

    #[test]
    fn test_from_name_roundtrip() {
        for format in Format::ALL {
            assert_eq!(Format::from_name(format.name()), Some(format));
        }
    }

    #[test]
    fn test_from_name_invalid() {
        assert_eq!(Format::from_name("InvalidType"), None);
        assert_eq!(Format::from_name(""), None);
    }

    #[test]
    fn test_literal_formats() {
        assert!(Format::String.is_literal());
        assert!(Format::Comment.is_literal());
        assert!(!Format::Keyword.is_literal());
        assert!(!Format::Default.is_literal());
    }
}
