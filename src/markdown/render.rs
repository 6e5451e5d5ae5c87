//! Document → Markdown rendering.
//!
//! Pure string generation: resource and note paths are looked up in maps
//! built beforehand, nothing is read or written here.

use std::path::Path;

use crate::config::Dialect;
use crate::error::Warning;
use crate::links::OutputIdentity;
use crate::model::{Document, LinkTarget, NodeId, Role, SpanStyle};
use crate::paths::relative_link;
use crate::resources::ResourceMap;

use super::escape::{
    calculate_fence_length, calculate_inline_code_ticks, encode_link_path, escape_markdown_at,
};

/// Indentation added per list nesting level.
const LIST_INDENT: &str = "    ";

/// Result of rendering a note body.
#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    /// The rendered markdown, without a trailing newline.
    pub content: String,
    /// Degradations applied while rendering.
    pub warnings: Vec<Warning>,
}

/// Where rendered references point.
#[derive(Debug, Clone, Copy)]
pub struct RenderTargets<'a> {
    /// Directory of the note being rendered, relative to the output root.
    pub note_dir: &'a Path,
    /// Output paths of the note's resources.
    pub resources: &'a ResourceMap,
    /// Output paths of every note of the archive.
    pub notes: &'a OutputIdentity,
}

/// Tracks list context for numbering.
#[derive(Debug, Clone)]
struct ListContext {
    is_ordered: bool,
    counter: usize,
}

/// Context for rendering (pure string accumulation, no I/O).
pub struct RenderContext<'a> {
    doc: &'a Document,
    dialect: Dialect,
    targets: RenderTargets<'a>,
    output: String,
    warnings: Vec<Warning>,
    // Formatting state
    line_prefix: String,
    list_stack: Vec<ListContext>,
    at_line_start: bool,
    has_line_content: bool,
    pending_newline: bool,
    pending_space: bool,
    pending_breaks: usize,
    /// Inside a table cell everything stays on one line.
    cell_depth: usize,
    /// Inside a heading line breaks become spaces.
    in_heading: bool,
    last_block_was_task: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(doc: &'a Document, dialect: Dialect, targets: RenderTargets<'a>) -> Self {
        Self {
            doc,
            dialect,
            targets,
            output: String::new(),
            warnings: Vec::new(),
            line_prefix: String::new(),
            list_stack: Vec::new(),
            at_line_start: true,
            has_line_content: false,
            pending_newline: false,
            pending_space: false,
            pending_breaks: 0,
            cell_depth: 0,
            in_heading: false,
            last_block_was_task: false,
        }
    }

    /// Render the document, consuming the context.
    pub fn render(mut self) -> RenderResult {
        self.walk_children(NodeId::ROOT);

        let content = self.output.trim_end().to_string();
        RenderResult {
            content,
            warnings: self.warnings,
        }
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Ensure we're ready to write content (write prefix if at line start).
    fn ensure_line_started(&mut self) {
        if self.at_line_start {
            self.output.push_str(&self.line_prefix);
            self.at_line_start = false;
        }
    }

    /// Write a newline, dropping trailing spaces of the finished line.
    fn write_newline(&mut self) {
        let trimmed = self.output.trim_end_matches(' ').len();
        self.output.truncate(trimmed);
        self.output.push('\n');
        self.at_line_start = true;
        self.has_line_content = false;
    }

    /// Write an empty line that still carries quote markers.
    fn write_blank_line(&mut self) {
        let prefix = self.line_prefix.trim_end().to_string();
        self.output.push_str(&prefix);
        self.write_newline();
    }

    /// Emit line breaks and spacing owed before more inline content.
    fn flush_inline_state(&mut self) {
        if self.pending_breaks > 0 && self.has_line_content {
            if self.cell_depth > 0 {
                self.output.push_str("<br>");
            } else if self.in_heading {
                self.output.push(' ');
            } else if self.pending_breaks == 1 {
                self.output.push('\\');
                self.write_newline();
            } else {
                self.write_newline();
                for _ in 1..self.pending_breaks {
                    self.write_blank_line();
                }
            }
            self.pending_space = false;
        }
        self.pending_breaks = 0;

        self.ensure_line_started();
        if self.pending_space && self.has_line_content {
            self.output.push(' ');
        }
        self.pending_space = false;
    }

    /// Write already-escaped inline Markdown.
    fn write_inline(&mut self, markdown: &str) {
        if markdown.is_empty() {
            return;
        }
        self.flush_inline_state();
        self.output.push_str(markdown);
        self.has_line_content = true;
    }

    /// Start a new block element.
    fn start_block(&mut self) {
        self.pending_breaks = 0;
        self.pending_space = false;

        if self.cell_depth > 0 {
            if self.has_line_content {
                self.output.push_str("<br>");
                self.has_line_content = false;
            }
            return;
        }

        if self.pending_newline {
            if !self.at_line_start {
                self.write_newline();
            }
            self.write_blank_line();
            self.pending_newline = false;
        } else if !self.at_line_start && self.has_line_content {
            self.write_newline();
        }
        self.ensure_line_started();
    }

    /// End a block element.
    fn end_block(&mut self) {
        self.pending_breaks = 0;
        self.pending_space = false;
        if self.cell_depth == 0 {
            self.pending_newline = true;
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        for child_id in self.doc.children(id) {
            self.walk_node(child_id);
        }
    }

    fn walk_node(&mut self, id: NodeId) {
        let Some(node) = self.doc.node(id) else {
            return;
        };
        let role = node.role;

        match role {
            Role::Text => {
                if !node.text.is_empty() {
                    let text = self.doc.text(node.text);
                    self.write_text(text);
                }
            }

            Role::Paragraph => {
                if !self.has_visible_content(id) {
                    self.warn_dropped_embeds(id);
                    return;
                }
                let is_task = self.first_content_child(id).is_some_and(|c| {
                    matches!(self.doc.role(c), Some(Role::Checkbox { .. }))
                });
                if is_task && self.last_block_was_task && self.pending_newline {
                    // Consecutive to-do lines form one task list
                    self.pending_newline = false;
                }
                self.start_block();
                self.walk_children(id);
                self.end_block();
                self.last_block_was_task = is_task;
                return;
            }

            Role::Heading(level) => {
                if !self.has_visible_content(id) {
                    self.warn_dropped_embeds(id);
                    return;
                }
                self.start_block();
                if self.cell_depth == 0 {
                    self.output.push_str(&"#".repeat(level as usize));
                    self.output.push(' ');
                }
                let was_heading = self.in_heading;
                self.in_heading = true;
                self.walk_children(id);
                self.in_heading = was_heading;
                self.end_block();
            }

            Role::List { ordered } => self.render_list(id, ordered),

            Role::ListItem { .. } => self.render_list_item(id),

            Role::BlockQuote => {
                if self.cell_depth > 0 {
                    self.walk_children(id);
                    return;
                }
                self.start_block();
                let old_prefix = self.line_prefix.clone();
                // The current line already has the old prefix
                self.output.push_str("> ");
                self.line_prefix.push_str("> ");
                self.walk_children(id);
                self.line_prefix = old_prefix;
                self.end_block();
            }

            Role::CodeBlock => self.render_code_block(id),

            Role::Table => self.render_table(id),

            // Rows and cells are rendered by their table
            Role::TableRow | Role::TableCell => self.walk_children(id),

            Role::Span(style) => self.render_span(id, style),

            Role::Highlight => {
                let marker = match self.dialect {
                    Dialect::ObsidianMD => "==",
                    Dialect::Standard | Dialect::UrlEncodeMD => "**",
                };
                self.write_wrapped(id, marker, marker);
            }

            Role::Checkbox { checked } => {
                let marker = if checked { "[x] " } else { "[ ] " };
                if self.has_line_content || self.cell_depth > 0 {
                    self.write_inline(marker);
                } else {
                    self.write_inline(&format!("- {marker}"));
                }
                // The marker's trailing space must not double up with text
                self.output.truncate(self.output.trim_end_matches(' ').len());
                self.pending_space = true;
            }

            Role::Image | Role::FileEmbed => self.render_embed(id, role),

            Role::Link => self.render_link(id),

            Role::LineBreak => {
                self.pending_breaks += 1;
            }

            Role::Rule => {
                if self.cell_depth > 0 {
                    return;
                }
                self.start_block();
                self.output.push_str("---");
                self.end_block();
            }

            Role::Root => self.walk_children(id),
        }
        self.last_block_was_task = false;
    }

    fn write_text(&mut self, text: &str) {
        let has_leading = text.starts_with(char::is_whitespace);
        let has_trailing = text.ends_with(char::is_whitespace);

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            if !text.is_empty() {
                self.pending_space = true;
            }
            return;
        }

        if has_leading {
            self.pending_space = true;
        }

        // Flush first so escaping knows whether this starts a line
        self.flush_inline_state();
        let joined = words.join(" ");
        let escaped = escape_markdown_at(&joined, !self.has_line_content);
        self.write_inline(&escaped);

        if has_trailing {
            self.pending_space = true;
        }
    }

    /// Render children between `open` and `close` markers.
    ///
    /// Whitespace at the edges moves outside the markers; an empty body
    /// writes nothing.
    fn write_wrapped(&mut self, id: NodeId, open: &str, close: &str) {
        let saved_output = std::mem::take(&mut self.output);
        let had_content = self.has_line_content;
        let was_at_line_start = self.at_line_start;
        let space_before = self.pending_space;
        let breaks_before = self.pending_breaks;

        // Render the body as if it started a fresh run of text
        self.pending_space = false;
        self.pending_breaks = 0;
        self.has_line_content = false;
        self.at_line_start = false;
        self.walk_children(id);

        let body = std::mem::replace(&mut self.output, saved_output);
        let space_after = self.pending_space;
        let breaks_after = self.pending_breaks;
        self.has_line_content = had_content;
        self.at_line_start = was_at_line_start;

        if body.trim().is_empty() {
            self.pending_space = space_before || space_after;
            self.pending_breaks = breaks_before + breaks_after;
            return;
        }

        self.pending_space = space_before;
        self.pending_breaks = breaks_before;
        self.flush_inline_state();
        self.output.push_str(open);
        self.output.push_str(body.trim_end());
        self.output.push_str(close);
        self.has_line_content = true;
        self.pending_space = space_after;
        self.pending_breaks = breaks_after;
    }

    fn render_span(&mut self, id: NodeId, style: SpanStyle) {
        if style.code {
            let content = self.collect_text(id);
            if content.is_empty() {
                return;
            }
            let tick_count = calculate_inline_code_ticks(&content);
            let ticks = "`".repeat(tick_count);
            let spacer = if content.starts_with('`') || content.ends_with('`') {
                " "
            } else {
                ""
            };
            self.write_inline(&format!("{ticks}{spacer}{content}{spacer}{ticks}"));
            return;
        }

        let mut open = String::new();
        if style.bold {
            open.push_str("**");
        }
        if style.italic {
            open.push('*');
        }
        if style.strikethrough {
            open.push_str("~~");
        }
        let close: String = open.chars().rev().collect();

        if open.is_empty() {
            self.walk_children(id);
        } else {
            self.write_wrapped(id, &open, &close);
        }
    }

    fn render_list(&mut self, id: NodeId, ordered: bool) {
        let nested = self
            .doc
            .node(id)
            .and_then(|n| n.parent)
            .is_some_and(|p| matches!(self.doc.role(p), Some(Role::ListItem { .. })));

        if nested && self.cell_depth == 0 {
            // Sublists follow their item's text directly
            self.pending_breaks = 0;
            self.pending_newline = false;
            if !self.at_line_start {
                self.write_newline();
            }
        } else {
            self.start_block();
        }

        self.list_stack.push(ListContext {
            is_ordered: ordered,
            counter: 0,
        });
        self.walk_children(id);
        self.list_stack.pop();

        if nested {
            self.pending_breaks = 0;
            self.pending_space = false;
        } else {
            self.end_block();
        }
    }

    fn render_list_item(&mut self, id: NodeId) {
        let task = self
            .first_content_child(id)
            .and_then(|c| match self.doc.role(c) {
                Some(Role::Checkbox { checked }) => Some((c, checked)),
                _ => None,
            });

        let bullet = match (task, self.list_stack.last_mut()) {
            (Some((_, true)), _) => "- [x] ".to_string(),
            (Some((_, false)), _) => "- [ ] ".to_string(),
            (None, Some(ctx)) if ctx.is_ordered => {
                ctx.counter += 1;
                format!("{}. ", ctx.counter)
            }
            _ => "- ".to_string(),
        };

        self.pending_newline = false;
        self.pending_breaks = 0;
        self.pending_space = false;
        if self.cell_depth > 0 {
            if self.has_line_content {
                self.output.push_str("<br>");
            }
        } else if self.has_line_content {
            self.write_newline();
        }

        self.ensure_line_started();
        self.output.push_str(&bullet);
        self.has_line_content = false;

        let old_prefix = self.line_prefix.clone();
        self.line_prefix.push_str(LIST_INDENT);

        let skip = task.map(|(c, _)| c);
        for child in self.doc.children(id) {
            if Some(child) != skip {
                self.walk_node(child);
            }
        }

        self.line_prefix = old_prefix;
        self.pending_newline = false;
        self.pending_breaks = 0;
        self.pending_space = false;
        // An item without text still counts as content for what follows
        self.has_line_content = true;
    }

    fn render_code_block(&mut self, id: NodeId) {
        let text = self.collect_text_verbatim(id);

        if self.cell_depth > 0 {
            let lines: Vec<String> = text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| {
                    let ticks = "`".repeat(calculate_inline_code_ticks(l));
                    format!("{ticks}{}{ticks}", l.trim())
                })
                .collect();
            if !lines.is_empty() {
                self.start_block();
                self.write_inline(&lines.join("<br>"));
            }
            return;
        }

        self.start_block();
        let lang = self.doc.attrs.language(id).unwrap_or("");
        let fence = "`".repeat(calculate_fence_length(&text, '`'));
        self.output.push_str(&fence);
        self.output.push_str(lang);
        self.output.push('\n');
        self.at_line_start = true;

        for line in text.lines() {
            self.ensure_line_started();
            self.output.push_str(line);
            self.output.push('\n');
            self.at_line_start = true;
        }

        self.ensure_line_started();
        self.output.push_str(&fence);
        self.has_line_content = true;
        self.end_block();
    }

    fn render_table(&mut self, id: NodeId) {
        let rows: Vec<NodeId> = self.doc.children(id).collect();
        let width = rows
            .iter()
            .map(|&row| self.doc.children(row).count())
            .max()
            .unwrap_or(0);
        if width == 0 || self.cell_depth > 0 {
            return;
        }

        self.start_block();
        for (index, &row) in rows.iter().enumerate() {
            if index > 0 {
                self.write_newline();
                self.ensure_line_started();
            }
            self.output.push('|');
            let cells: Vec<NodeId> = self.doc.children(row).collect();
            for column in 0..width {
                let cell = cells
                    .get(column)
                    .map(|&c| self.render_cell(c))
                    .unwrap_or_default();
                if cell.is_empty() {
                    self.output.push_str(" |");
                } else {
                    self.output.push(' ');
                    self.output.push_str(&cell);
                    self.output.push_str(" |");
                }
            }

            if index == 0 {
                self.write_newline();
                self.ensure_line_started();
                self.output.push('|');
                for _ in 0..width {
                    self.output.push_str(" --- |");
                }
            }
        }
        self.has_line_content = true;
        self.end_block();
    }

    /// Render one table cell to a single line.
    fn render_cell(&mut self, cell: NodeId) -> String {
        let saved_output = std::mem::take(&mut self.output);
        let saved_prefix = std::mem::take(&mut self.line_prefix);
        let saved_line = (self.at_line_start, self.has_line_content);

        self.cell_depth += 1;
        self.at_line_start = false;
        self.has_line_content = false;
        self.pending_space = false;
        self.pending_breaks = 0;
        self.walk_children(cell);
        self.cell_depth -= 1;

        let cell_text = std::mem::replace(&mut self.output, saved_output);
        self.line_prefix = saved_prefix;
        (self.at_line_start, self.has_line_content) = saved_line;
        self.pending_space = false;
        self.pending_breaks = 0;

        cell_text.trim().replace('\n', " ")
    }

    fn render_embed(&mut self, id: NodeId, role: Role) {
        let alt = self.doc.attrs.alt(id).unwrap_or("").to_string();

        if let Some(src) = self.doc.attrs.src(id) {
            let src = src.to_string();
            self.write_inline(&format!("![{}]({src})", escape_label(&alt)));
            return;
        }

        let Some(hash) = self.doc.attrs.resource(id).map(str::to_string) else {
            return;
        };
        let Some(path) = self.targets.resources.get(&hash) else {
            self.warn(Warning::UnresolvedResource { hash });
            return;
        };
        let link = relative_link(self.targets.note_dir, path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let markdown = match (self.dialect, role) {
            (Dialect::ObsidianMD, Role::Image) => format!("![[{link}]]"),
            (Dialect::ObsidianMD, _) => format!("[[{link}]]"),
            (Dialect::Standard, Role::Image) => format!("![{}]({link})", escape_label(&alt)),
            (Dialect::Standard, _) => format!("[{}]({link})", escape_label(&name)),
            (Dialect::UrlEncodeMD, Role::Image) => {
                format!("![{}]({})", escape_label(&alt), encode_link_path(&link))
            }
            (Dialect::UrlEncodeMD, _) => {
                format!("[{}]({})", escape_label(&name), encode_link_path(&link))
            }
        };
        self.write_inline(&markdown);
    }

    fn render_link(&mut self, id: NodeId) {
        let label = normalize_whitespace(&self.doc.text_content(id));

        match self.doc.attrs.link(id) {
            Some(LinkTarget::External(url)) => {
                let url = url.clone();
                let destination = if url.contains([' ', '(', ')']) {
                    format!("<{url}>")
                } else {
                    url.clone()
                };
                if label.is_empty() && !self.has_embed(id) {
                    self.write_inline(&format!("[{}]({destination})", escape_label(&url)));
                } else {
                    self.write_wrapped(id, "[", &format!("]({destination})"));
                }
            }
            Some(LinkTarget::Internal(note_ref)) => {
                let note_ref = note_ref.clone();
                let Some(path) = self.targets.notes.lookup(&note_ref) else {
                    self.warn(Warning::UnresolvedLink {
                        label: label.clone(),
                    });
                    self.walk_children(id);
                    return;
                };
                let link = relative_link(self.targets.note_dir, path);
                let shown = if label.is_empty() {
                    note_ref.title.clone()
                } else {
                    label
                };

                let markdown = match self.dialect {
                    Dialect::ObsidianMD => {
                        let target = link.strip_suffix(".md").unwrap_or(&link);
                        if shown == target {
                            format!("[[{target}]]")
                        } else {
                            format!("[[{target}|{}]]", shown.replace(['|', ']'], " "))
                        }
                    }
                    Dialect::Standard => format!("[{}]({link})", escape_label(&shown)),
                    Dialect::UrlEncodeMD => {
                        format!("[{}]({})", escape_label(&shown), encode_link_path(&link))
                    }
                };
                self.write_inline(&markdown);
            }
            None => self.walk_children(id),
        }
    }

    /// Whether a block renders anything at all.
    fn has_visible_content(&self, id: NodeId) -> bool {
        !self.doc.text_content(id).trim().is_empty()
            || self.doc.any_descendant(id, |r| {
                matches!(
                    r,
                    Role::Checkbox { .. } | Role::Link | Role::Table | Role::CodeBlock
                )
            })
            || self.has_embed(id)
    }

    /// Whether the subtree holds an embed that renders.
    fn has_embed(&self, id: NodeId) -> bool {
        self.embed_resolves(id) || self.doc.children(id).any(|c| self.has_embed(c))
    }

    fn embed_resolves(&self, id: NodeId) -> bool {
        self.doc.role(id).is_some_and(|r| r.is_embed())
            && (self.doc.attrs.src(id).is_some()
                || self
                    .doc
                    .attrs
                    .resource(id)
                    .is_some_and(|hash| self.targets.resources.get(hash).is_some()))
    }

    /// Report embeds of a block that is left out for lack of content.
    fn warn_dropped_embeds(&mut self, id: NodeId) {
        if self.doc.role(id).is_some_and(|r| r.is_embed()) {
            if let Some(hash) = self.doc.attrs.resource(id) {
                let hash = hash.to_string();
                self.warn(Warning::UnresolvedResource { hash });
            }
            return;
        }
        let children: Vec<_> = self.doc.children(id).collect();
        for child in children {
            self.warn_dropped_embeds(child);
        }
    }

    /// First child that is not whitespace-only text.
    fn first_content_child(&self, id: NodeId) -> Option<NodeId> {
        self.doc.children(id).find(|&c| match self.doc.node(c) {
            Some(n) if n.role == Role::Text => !self.doc.text(n.text).trim().is_empty(),
            Some(_) => true,
            None => false,
        })
    }

    /// Collect all text content from a node, whitespace-normalized.
    fn collect_text(&self, id: NodeId) -> String {
        normalize_whitespace(&self.doc.text_content(id))
    }

    /// Collect text content preserving literal whitespace (for code blocks).
    fn collect_text_verbatim(&self, id: NodeId) -> String {
        self.doc.text_content(id)
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text used inside `[...]`.
fn escape_label(label: &str) -> String {
    escape_markdown_at(label, false)
}

/// Render a document to Markdown.
pub fn render_document(doc: &Document, dialect: Dialect, targets: RenderTargets<'_>) -> RenderResult {
    RenderContext::new(doc, dialect, targets).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LinkResolver;
    use crate::markup::build_document;
    use crate::model::{Note, Resource};
    use crate::paths::PathAllocator;
    use crate::resources::plan_resources;

    fn render_with(body: &str, dialect: Dialect) -> RenderResult {
        let (doc, _) = build_document(&format!("<en-note>{body}</en-note>"));
        let resources = ResourceMap::new();
        let notes = OutputIdentity::new();
        let targets = RenderTargets {
            note_dir: Path::new(""),
            resources: &resources,
            notes: &notes,
        };
        render_document(&doc, dialect, targets)
    }

    fn render(body: &str) -> String {
        render_with(body, Dialect::Standard).content
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(render("<div>one</div><div>two</div>"), "one\n\ntwo");
    }

    #[test]
    fn test_empty_paragraphs_are_skipped() {
        assert_eq!(render("<div>one</div><div><br/></div><div>two</div>"), "one\n\ntwo");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(render("<div>one<br/>two<br/></div>"), "one\\\ntwo");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(
            render("<div><b>bold </b>and <i>italic</i> and <s>gone</s></div>"),
            "**bold** and *italic* and ~~gone~~"
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(render("<div>a*b*c [x]</div>"), "a\\*b\\*c \\[x\\]");
    }

    #[test]
    fn test_headings() {
        assert_eq!(render("<h2>Title</h2><div>text</div>"), "## Title\n\ntext");
    }

    #[test]
    fn test_highlight_by_dialect() {
        let body = r#"<div>a <span style="--en-highlight:yellow">marked</span> b</div>"#;
        assert_eq!(render_with(body, Dialect::Standard).content, "a **marked** b");
        assert_eq!(render_with(body, Dialect::UrlEncodeMD).content, "a **marked** b");
        assert_eq!(render_with(body, Dialect::ObsidianMD).content, "a ==marked== b");
    }

    #[test]
    fn test_nested_list_indentation() {
        let md = render("<ul><li>a<ul><li>b<ol><li>c</li><li>d</li></ol></li></ul></li><li>e</li></ul>");
        assert_eq!(md, "- a\n    - b\n        1. c\n        2. d\n- e");
    }

    #[test]
    fn test_invalid_sibling_sublist() {
        let md = render("<ul><li>first</li><ul><li>child</li></ul><li>second</li></ul>");
        assert_eq!(md, "- first\n    - child\n- second");
    }

    #[test]
    fn test_task_list_items() {
        let md = render(r#"<ul><li><en-todo checked="true"/>done</li><li><en-todo/>open</li></ul>"#);
        assert_eq!(md, "- [x] done\n- [ ] open");
    }

    #[test]
    fn test_task_paragraphs() {
        let md = render(r#"<div><en-todo checked="true"/>done</div><div><en-todo/>open</div><div>after</div>"#);
        assert_eq!(md, "- [x] done\n- [ ] open\n\nafter");
    }

    #[test]
    fn test_code_block() {
        let md = render(
            r#"<div style="-en-codeblock:true"><div>let a = "*";</div><div>```</div></div>"#,
        );
        assert_eq!(md, "````\nlet a = \"*\";\n```\n````");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(render("<div>run <code>cargo *x*</code></div>"), "run `cargo *x*`");
    }

    #[test]
    fn test_table() {
        let md = render(
            "<table><tr><td>A</td><td>B</td></tr><tr><td>1|2</td><td>x<br/>y</td><td>z</td></tr></table>",
        );
        assert_eq!(
            md,
            "| A | B | |\n| --- | --- | --- |\n| 1\\|2 | x<br>y | z |"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render("<blockquote><div>one</div><div>two</div></blockquote>"),
            "> one\n>\n> two"
        );
    }

    #[test]
    fn test_external_links() {
        assert_eq!(
            render(r#"<div><a href="https://example.com">Example</a></div>"#),
            "[Example](https://example.com)"
        );
        assert_eq!(
            render(r#"<div><a href="https://example.com"></a></div>"#),
            "[https://example.com](https://example.com)"
        );
    }

    #[test]
    fn test_unresolved_internal_link_degrades_to_text() {
        let result = render_with(
            r#"<div>see <a href="evernote:///view/1/s1/g/g/">Missing</a></div>"#,
            Dialect::Standard,
        );
        assert_eq!(result.content, "see Missing");
        assert_eq!(
            result.warnings,
            vec![Warning::UnresolvedLink {
                label: "Missing".to_string()
            }]
        );
    }

    #[test]
    fn test_unresolved_resource_is_omitted() {
        let result = render_with(
            r#"<div>pic <en-media hash="00ff" type="image/png"/></div>"#,
            Dialect::Standard,
        );
        assert_eq!(result.content, "pic");
        assert_eq!(
            result.warnings,
            vec![Warning::UnresolvedResource {
                hash: "00ff".to_string()
            }]
        );
    }

    #[test]
    fn test_block_of_unresolved_embeds_is_dropped() {
        let result = render_with(
            r#"<div>a</div><div><en-media hash="00ff" type="image/png"/></div><h2><en-media hash="0a0a" type="application/pdf"/></h2><div>b</div>"#,
            Dialect::Standard,
        );
        assert_eq!(result.content, "a\n\nb");
        assert_eq!(
            result.warnings,
            vec![
                Warning::UnresolvedResource {
                    hash: "00ff".to_string()
                },
                Warning::UnresolvedResource {
                    hash: "0a0a".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_embeds_and_links_by_dialect() {
        let image = Resource::new(b"img".to_vec(), "image/png").with_file_name("my pic.png");
        let pdf = Resource::new(b"pdf".to_vec(), "application/pdf").with_file_name("doc.pdf");
        let body = format!(
            r#"<div><en-media hash="{}" type="image/png"/></div><div><en-media hash="{}" type="application/pdf"/></div><div><a href="evernote:///view/1/s1/gb/gb/">Note B</a></div>"#,
            image.hash, pdf.hash
        );
        let mut note = Note::new("Note A", body);
        note.guid = Some("ga".to_string());
        note.resources = vec![image, pdf];
        let mut other = Note::new("Note B", "<en-note/>");
        other.guid = Some("gb".to_string());

        let alloc = PathAllocator::new();
        let mut resolver = LinkResolver::new(&alloc, "", false);
        let path = resolver.register(&note);
        resolver.register(&other);
        let identity = resolver.finish();
        let resources = plan_resources(&note, &path, &alloc);
        let (doc, _) = build_document(&note.content);
        let targets = RenderTargets {
            note_dir: Path::new(""),
            resources: &resources,
            notes: &identity,
        };

        let standard = render_document(&doc, Dialect::Standard, targets).content;
        assert_eq!(
            standard,
            "![](_resources/note_a.resources/my pic.png)\n\n\
             [doc.pdf](_resources/note_a.resources/doc.pdf)\n\n\
             [Note B](Note B.md)"
        );

        let obsidian = render_document(&doc, Dialect::ObsidianMD, targets).content;
        assert_eq!(
            obsidian,
            "![[_resources/note_a.resources/my pic.png]]\n\n\
             [[_resources/note_a.resources/doc.pdf]]\n\n\
             [[Note B]]"
        );

        let encoded = render_document(&doc, Dialect::UrlEncodeMD, targets).content;
        assert_eq!(
            encoded,
            "![](_resources/note_a.resources/my%20pic.png)\n\n\
             [doc.pdf](_resources/note_a.resources/doc.pdf)\n\n\
             [Note B](Note%20B.md)"
        );
    }

    #[test]
    fn test_obsidian_link_with_different_label() {
        let mut target = Note::new("Target", "<en-note/>");
        target.guid = Some("gt".to_string());
        let alloc = PathAllocator::new();
        let mut resolver = LinkResolver::new(&alloc, "", false);
        resolver.register(&target);
        let identity = resolver.finish();

        let (doc, _) = build_document(
            r#"<en-note><div><a href="evernote:///view/1/s1/gt/gt/">click here</a></div></en-note>"#,
        );
        let resources = ResourceMap::new();
        let targets = RenderTargets {
            note_dir: Path::new(""),
            resources: &resources,
            notes: &identity,
        };
        let md = render_document(&doc, Dialect::ObsidianMD, targets).content;
        assert_eq!(md, "[[Target|click here]]");
    }
}
