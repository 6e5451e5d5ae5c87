//! Inline `style` attribute interpretation using cssparser.
//!
//! Note markup encodes most formatting through inline declarations:
//! - highlights: `--en-highlight:yellow`, `-evernote-highlight:true`, or a
//!   bare `background-color` on a span
//! - code blocks: `-en-codeblock:true` on a div
//! - emphasis: `font-weight`, `font-style`, `text-decoration`

use cssparser::{Delimiter, ParseError, Parser, ParserInput};

use crate::model::SpanStyle;

type CssParseError<'i> = ParseError<'i, ()>;

/// Formatting facts extracted from one `style` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InlineStyle {
    pub span: SpanStyle,
    pub highlight: bool,
    pub codeblock: bool,
}

/// Split a declaration list into lowercase `(property, value)` pairs.
///
/// Malformed declarations are skipped; parsing never fails.
pub fn parse_declarations(css: &str) -> Vec<(String, String)> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    while !parser.is_exhausted() {
        let before_name = parser.state();
        let name = match parser.expect_ident_cloned() {
            Ok(name) => name.to_ascii_lowercase(),
            Err(_) => {
                parser.reset(&before_name);
                skip_declaration(&mut parser);
                continue;
            }
        };

        let after_name = parser.state();
        if parser.expect_colon().is_err() {
            parser.reset(&after_name);
            skip_declaration(&mut parser);
            continue;
        }

        let start = parser.position();
        let _ = parser.parse_until_before(Delimiter::Semicolon, |p| {
            while p.next().is_ok() {}
            Ok::<_, CssParseError>(())
        });
        let value = parser.slice_from(start).trim().to_ascii_lowercase();
        declarations.push((name, value));

        // Consume the semicolon, if any
        let _ = parser.next();
    }

    declarations
}

fn skip_declaration(parser: &mut Parser<'_, '_>) {
    let _ = parser.parse_until_after(Delimiter::Semicolon, |p| {
        while p.next().is_ok() {}
        Ok::<_, CssParseError>(())
    });
}

/// Interpret an inline `style` attribute.
pub fn parse_inline_style(css: &str) -> InlineStyle {
    let mut style = InlineStyle::default();

    for (name, value) in parse_declarations(css) {
        match name.as_str() {
            "--en-highlight" => style.highlight = !value.is_empty(),
            "-evernote-highlight" => style.highlight = value == "true",
            "background-color" | "background" if is_highlight_color(&value) => {
                style.highlight = true;
            }
            "-en-codeblock" | "--en-codeblock" => style.codeblock = value == "true",
            "font-weight" => {
                style.span.bold = value == "bold"
                    || value == "bolder"
                    || value.parse::<u16>().is_ok_and(|w| w >= 600);
            }
            "font-style" => style.span.italic = value == "italic" || value == "oblique",
            "text-decoration" | "text-decoration-line" => {
                style.span.strikethrough = value.contains("line-through");
                style.span.underline = value.contains("underline");
            }
            "font-family" => {
                style.span.code = value.contains("monospace") || value.contains("courier");
            }
            _ => {}
        }
    }

    style
}

/// Whether a background value visibly marks text.
fn is_highlight_color(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    !matches!(
        compact.as_str(),
        "" | "transparent"
            | "none"
            | "inherit"
            | "initial"
            | "white"
            | "#fff"
            | "#ffffff"
            | "rgb(255,255,255)"
            | "rgba(0,0,0,0)"
    )
}
