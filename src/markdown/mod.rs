//! Pure markdown generation from a note [`Document`](crate::model::Document).
//!
//! The design separates pure rendering logic from I/O:
//!
//! - [`escape`]: string escaping and link path encoding
//! - [`render`]: core document → Markdown rendering
//!
//! The conversion driver ([`crate::convert`]) handles file output, calling
//! these pure functions to generate content.
//!
//! ## Dialects
//!
//! Three flavors share one renderer and differ only where syntax diverges:
//!
//! - **Standard**: CommonMark links and images, highlights as bold
//! - **ObsidianMD**: `[[wiki links]]`, `![[embeds]]` and `==highlights==`
//! - **UrlEncodeMD**: Standard with percent-encoded link destinations, for
//!   tools that reject spaces in paths
//!
//! ## Design Notes
//!
//! - **Lazy line breaks**: `<br>` only becomes a hard break when more text
//!   follows in the same block, so trailing breaks never leave a dangling
//!   backslash
//! - **Fixed list indent**: every nesting level indents by four spaces
//! - **Dynamic code fence length**: code blocks use the minimum backtick
//!   fence that doesn't conflict with content

mod escape;
mod render;

pub use escape::{
    calculate_fence_length, calculate_inline_code_ticks, encode_link_path, escape_markdown,
    escape_markdown_at,
};
pub use render::{RenderContext, RenderResult, RenderTargets, render_document};
