//! ANSI rendering of classified lines using crossterm

use std::collections::HashMap;
use std::io::Write;

use crossterm::queue;
use crossterm::style::{self, Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};

use crate::error::Result;
use crate::syntax::{Color, Format, Span, Style};

/// Paints spans with the default styles, or theme overrides
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    theme: HashMap<Format, Style>,
}

fn terminal_color(color: Color) -> Option<style::Color> {
    let color = match color {
        Color::Default => return None,
        Color::Black => style::Color::Black,
        Color::Red => style::Color::DarkRed,
        Color::Green => style::Color::DarkGreen,
        Color::Yellow => style::Color::DarkYellow,
        Color::Blue => style::Color::DarkBlue,
        Color::Magenta => style::Color::DarkMagenta,
        Color::Cyan => style::Color::DarkCyan,
        Color::White => style::Color::Grey,
        Color::BrightBlack => style::Color::DarkGrey,
        Color::BrightRed => style::Color::Red,
        Color::BrightGreen => style::Color::Green,
        Color::BrightYellow => style::Color::Yellow,
        Color::BrightBlue => style::Color::Blue,
        Color::BrightMagenta => style::Color::Magenta,
        Color::BrightCyan => style::Color::Cyan,
        Color::BrightWhite => style::Color::White,
    };
    Some(color)
}

impl Renderer {
    pub fn new(theme: HashMap<Format, Style>) -> Self {
        Self { theme }
    }

    /// Style used for `format`
    pub fn style_for(&self, format: Format) -> Style {
        self.theme
            .get(&format)
            .copied()
            .unwrap_or_else(|| format.default_style())
    }

    /// Write one line, colored, followed by a newline
    pub fn write_line<W: Write>(&self, out: &mut W, text: &str, spans: &[Span]) -> Result<()> {
        for (start, end, format) in runs(text, spans) {
            let piece = &text[start..end];
            let style = self.style_for(format);
            if style.is_default() {
                queue!(out, Print(piece))?;
                continue;
            }
            apply(out, &style)?;
            queue!(out, Print(piece), SetAttribute(Attribute::Reset))?;
        }
        queue!(out, Print("\n"))?;
        Ok(())
    }
}

fn apply<W: Write>(out: &mut W, style: &Style) -> Result<()> {
    if let Some(fg) = terminal_color(style.fg) {
        queue!(out, SetForegroundColor(fg))?;
    }
    if let Some(bg) = terminal_color(style.bg) {
        queue!(out, SetBackgroundColor(bg))?;
    }
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

/// Split `text` into runs of one format, on character boundaries
fn runs(text: &str, spans: &[Span]) -> Vec<(usize, usize, Format)> {
    let format_at = |pos: usize| {
        spans
            .iter()
            .find(|s| s.contains(pos))
            .map_or(Format::Default, |s| s.format)
    };
    let mut runs: Vec<(usize, usize, Format)> = Vec::new();
    for (pos, ch) in text.char_indices() {
        let format = format_at(pos);
        let end = pos + ch.len_utf8();
        match runs.last_mut() {
            Some(last) if last.2 == format => last.1 = end,
            _ => runs.push((pos, end, format)),
        }
    }
    runs
}

/// Write one `line:start..end Format` record per span
pub fn write_span_records<W: Write>(out: &mut W, line: usize, spans: &[Span]) -> Result<()> {
    for span in spans {
        writeln!(out, "{}:{}..{} {}", line + 1, span.start, span.end, span.format.name())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_follow_char_boundaries() {
        let text = "a\u{e9}\"x\"";
        let spans = [Span::new(2, 6, Format::String)];
        assert_eq!(runs(text, &spans), vec![(0, 3, Format::Default), (3, 6, Format::String)]);
    }

    #[test]
    fn test_plain_text_has_no_escapes() {
        let mut out = Vec::new();
        Renderer::default().write_line(&mut out, "plain", &[]).unwrap();
        assert_eq!(out, b"plain\n");
    }

    #[test]
    fn test_styled_text_is_wrapped() {
        let mut out = Vec::new();
        let spans = [Span::new(0, 2, Format::Keyword)];
        Renderer::default().write_line(&mut out, "if x", &spans).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b["));
        assert!(text.contains("if\x1b[0m x\n"));
    }

    #[test]
    fn test_theme_override() {
        let theme = HashMap::from([(Format::Comment, Style::default())]);
        let renderer = Renderer::new(theme);
        assert!(renderer.style_for(Format::Comment).is_default());
        assert_eq!(renderer.style_for(Format::String), Format::String.default_style());
    }

    #[test]
    fn test_span_records() {
        let mut out = Vec::new();
        write_span_records(&mut out, 0, &[Span::new(0, 2, Format::Keyword)]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1:0..2 Keyword\n");
    }
}
