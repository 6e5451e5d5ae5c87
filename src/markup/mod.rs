//! Note body markup → [`Document`](crate::model::Document).
//!
//! Bodies are ENML: XHTML with a handful of custom elements (`en-note`,
//! `en-media`, `en-todo`, `en-crypt`). Real exports are frequently not
//! well-formed, so they go through a lenient HTML5 parser rather than an XML
//! reader, and then through a mapping pass that assigns Markdown-oriented
//! roles.
//!
//! - [`html`]: parsing and DOM helpers
//! - [`style`]: inline `style` attribute interpretation
//! - [`builder`]: element → role mapping and structural repairs

mod builder;
mod html;
mod style;

pub use builder::build_document;
pub use html::{normalize_self_closing, strip_tags};
pub use style::{InlineStyle, parse_declarations, parse_inline_style};
