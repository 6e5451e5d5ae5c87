//! Map a parsed note body onto the arena [`Document`].

use markup5ever_rcdom::{Handle, NodeData};

use super::html::{
    element_name, find_first_element, get_attribute, get_text_content, parse_markup, strip_tags,
};
use super::style::{InlineStyle, parse_inline_style};
use crate::error::Warning;
use crate::model::{Document, LinkTarget, NodeId, Role, SpanStyle};

/// Build a document from a note's markup body.
///
/// Never fails: unusable fragments are dropped or degraded and reported as
/// warnings.
pub fn build_document(markup: &str) -> (Document, Vec<Warning>) {
    let dom = parse_markup(markup);
    let body = find_first_element(&dom.document, "en-note")
        .or_else(|| find_first_element(&dom.document, "body"))
        .unwrap_or_else(|| dom.document.clone());

    let mut ctx = BuildContext::new();
    ctx.process_children(&body, NodeId::ROOT);

    if !ctx.doc.has_children(NodeId::ROOT) && !ctx.saw_encrypted {
        let text = strip_tags(markup);
        if !text.is_empty() {
            let para = ctx.doc.push(NodeId::ROOT, Role::Paragraph);
            ctx.doc.push_text(para, &text);
            ctx.warn(Warning::MarkupFallback);
        }
    }

    (ctx.doc, ctx.warnings)
}

/// What an element turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    /// Block that holds inline content (`div`, `p`).
    Block,
    Heading(u8),
    List { ordered: bool },
    ListItem,
    Table,
    Pre,
    BlockQuote,
    Rule,
    LineBreak,
    /// Inline formatting from the element itself (`b`, `em`, `code`, ...).
    Emphasis(SpanStyle),
    /// `span`/`font`: formatting only from the inline style.
    Styled,
    Mark,
    Anchor,
    Img,
    Media,
    Todo,
    Input,
    Crypt,
    /// Never rendered (`script`, `style`, `head`, ...).
    Hidden,
    /// Children are processed in place.
    Transparent,
}

fn classify(name: &str) -> ElementKind {
    match name {
        "div" | "p" => ElementKind::Block,
        "h1" => ElementKind::Heading(1),
        "h2" => ElementKind::Heading(2),
        "h3" => ElementKind::Heading(3),
        "h4" => ElementKind::Heading(4),
        "h5" => ElementKind::Heading(5),
        "h6" => ElementKind::Heading(6),
        "ul" => ElementKind::List { ordered: false },
        "ol" => ElementKind::List { ordered: true },
        "li" => ElementKind::ListItem,
        "table" => ElementKind::Table,
        "pre" => ElementKind::Pre,
        "blockquote" => ElementKind::BlockQuote,
        "hr" => ElementKind::Rule,
        "br" => ElementKind::LineBreak,
        "b" | "strong" => ElementKind::Emphasis(SpanStyle {
            bold: true,
            ..Default::default()
        }),
        "i" | "em" | "cite" | "var" | "dfn" => ElementKind::Emphasis(SpanStyle {
            italic: true,
            ..Default::default()
        }),
        "u" | "ins" => ElementKind::Emphasis(SpanStyle {
            underline: true,
            ..Default::default()
        }),
        "s" | "strike" | "del" => ElementKind::Emphasis(SpanStyle {
            strikethrough: true,
            ..Default::default()
        }),
        "code" | "tt" | "kbd" | "samp" => ElementKind::Emphasis(SpanStyle {
            code: true,
            ..Default::default()
        }),
        "span" | "font" => ElementKind::Styled,
        "mark" => ElementKind::Mark,
        "a" => ElementKind::Anchor,
        "img" => ElementKind::Img,
        "en-media" => ElementKind::Media,
        "en-todo" => ElementKind::Todo,
        "input" => ElementKind::Input,
        "en-crypt" => ElementKind::Crypt,
        "head" | "title" | "script" | "style" | "meta" | "link" | "template" | "noscript"
        | "object" | "iframe" | "colgroup" | "col" => ElementKind::Hidden,
        _ => ElementKind::Transparent,
    }
}

/// Elements that force the enclosing `div` to act as a container.
fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "div"
            | "p"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "table"
            | "pre"
            | "blockquote"
            | "hr"
            | "section"
            | "article"
    )
}

/// Roles whose children are blocks, so inline content needs a paragraph.
fn is_block_context(role: Role) -> bool {
    matches!(role, Role::Root | Role::BlockQuote)
}

/// Roles that may hold nested lists, tables and code blocks.
fn is_flow_parent(role: Role) -> bool {
    is_block_context(role) || matches!(role, Role::ListItem { .. } | Role::TableCell)
}

struct BuildContext {
    doc: Document,
    warnings: Vec<Warning>,
    /// Paragraph opened implicitly for loose inline content, with its parent.
    open_paragraph: Option<(NodeId, NodeId)>,
    saw_encrypted: bool,
}

impl BuildContext {
    fn new() -> Self {
        Self {
            doc: Document::new(),
            warnings: Vec::new(),
            open_paragraph: None,
            saw_encrypted: false,
        }
    }

    fn warn(&mut self, warning: Warning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn role(&self, id: NodeId) -> Role {
        self.doc.role(id).unwrap_or(Role::Root)
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.doc.node(id).and_then(|n| n.parent)
    }

    /// Nearest ancestor (inclusive) that can hold block structure.
    fn flow_parent(&self, mut id: NodeId) -> NodeId {
        loop {
            if is_flow_parent(self.role(id)) {
                return id;
            }
            match self.parent_of(id) {
                Some(parent) => id = parent,
                None => return NodeId::ROOT,
            }
        }
    }

    /// Where inline content under `parent` goes.
    fn inline_parent(&mut self, parent: NodeId) -> NodeId {
        match self.role(parent) {
            role if is_block_context(role) => {
                if let Some((owner, para)) = self.open_paragraph
                    && owner == parent
                    && self.doc.last_child(parent) == Some(para)
                {
                    return para;
                }
                let para = self.doc.push(parent, Role::Paragraph);
                self.open_paragraph = Some((parent, para));
                para
            }
            Role::List { .. } => self.item_for_nested(parent),
            _ => parent,
        }
    }

    /// The preceding item of `list`, or a fresh empty one.
    fn item_for_nested(&mut self, list: NodeId) -> NodeId {
        if let Some(last) = self.doc.last_child(list)
            && matches!(self.role(last), Role::ListItem { .. })
        {
            return last;
        }
        let depth = self.list_depth(list);
        self.doc.push(list, Role::ListItem { depth })
    }

    /// Nesting depth of items in `list`; 0 for a top-level list.
    fn list_depth(&self, list: NodeId) -> u8 {
        let mut depth = 0u8;
        let mut current = self.parent_of(list);
        while let Some(id) = current {
            if matches!(self.role(id), Role::List { .. }) {
                depth = depth.saturating_add(1);
            }
            current = self.parent_of(id);
        }
        depth
    }

    fn end_paragraph(&mut self) {
        self.open_paragraph = None;
    }

    /// Process children of a DOM node.
    fn process_children(&mut self, handle: &Handle, parent: NodeId) {
        for child in handle.children.borrow().iter() {
            self.process_node(child, parent);
        }
    }

    /// Process a single DOM node.
    fn process_node(&mut self, handle: &Handle, parent: NodeId) {
        match handle.data {
            NodeData::Text { ref contents } => {
                let text = contents.borrow();
                self.process_text(&text, parent);
            }
            NodeData::Element { .. } => {
                let Some(name) = element_name(handle) else {
                    return;
                };
                self.process_element(handle, &name, parent);
            }
            _ => {}
        }
    }

    fn process_text(&mut self, text: &str, parent: NodeId) {
        let role = self.role(parent);
        if text.trim().is_empty() {
            // Inter-element whitespace between blocks carries no content
            if is_block_context(role)
                || matches!(role, Role::List { .. } | Role::Table | Role::TableRow)
            {
                return;
            }
            self.doc.push_text(parent, " ");
            return;
        }

        if matches!(role, Role::Table | Role::TableRow) {
            return;
        }
        let target = self.inline_parent(parent);
        self.doc.push_text(target, text);
    }

    fn process_element(&mut self, handle: &Handle, name: &str, parent: NodeId) {
        match classify(name) {
            ElementKind::Hidden => {}
            ElementKind::Transparent => self.process_children(handle, parent),
            ElementKind::Block => self.process_block(handle, parent),
            ElementKind::Heading(level) => {
                let role = self.role(parent);
                if is_block_context(role) {
                    self.end_paragraph();
                    let heading = self.doc.push(parent, Role::Heading(level));
                    self.process_children(handle, heading);
                    self.end_paragraph();
                } else {
                    self.process_inline_block(handle, parent);
                }
            }
            ElementKind::List { ordered } => self.process_list(handle, parent, ordered),
            ElementKind::ListItem => {
                if matches!(self.role(parent), Role::List { .. }) {
                    let depth = self.list_depth(parent);
                    let item = self.doc.push(parent, Role::ListItem { depth });
                    self.process_children(handle, item);
                } else {
                    self.process_block(handle, parent);
                }
            }
            ElementKind::Table => self.process_table(handle, parent),
            ElementKind::Pre => self.process_code_block(handle, parent),
            ElementKind::BlockQuote => {
                let container = self.flow_parent(parent);
                if self.role(container) == Role::TableCell {
                    self.process_inline_block(handle, parent);
                    return;
                }
                self.end_paragraph();
                let quote = self.doc.push(container, Role::BlockQuote);
                self.process_children(handle, quote);
                self.end_paragraph();
            }
            ElementKind::Rule => {
                let container = self.flow_parent(parent);
                if self.role(container) == Role::TableCell {
                    return;
                }
                self.end_paragraph();
                self.doc.push(container, Role::Rule);
            }
            ElementKind::LineBreak => {
                let target = self.inline_parent(parent);
                self.doc.push(target, Role::LineBreak);
            }
            ElementKind::Emphasis(base) => {
                let style = self.inline_style(handle);
                let span = base.merge(style.span);
                let target = self.inline_parent(parent);
                let span_node = self.doc.push(target, Role::Span(span));
                let inner = if style.highlight {
                    self.doc.push(span_node, Role::Highlight)
                } else {
                    span_node
                };
                self.process_children(handle, inner);
            }
            ElementKind::Styled => {
                let style = self.inline_style(handle);
                if !style.highlight && style.span.is_plain() {
                    self.process_children(handle, parent);
                    return;
                }
                let target = self.inline_parent(parent);
                let mut inner = target;
                if style.highlight {
                    inner = self.doc.push(inner, Role::Highlight);
                }
                if !style.span.is_plain() {
                    inner = self.doc.push(inner, Role::Span(style.span));
                }
                self.process_children(handle, inner);
            }
            ElementKind::Mark => {
                let target = self.inline_parent(parent);
                let mark = self.doc.push(target, Role::Highlight);
                self.process_children(handle, mark);
            }
            ElementKind::Anchor => self.process_anchor(handle, parent),
            ElementKind::Img => {
                let Some(src) = get_attribute(handle, "src").filter(|s| !s.trim().is_empty())
                else {
                    self.warn(Warning::MissingAttribute {
                        element: "img".to_string(),
                        attribute: "src",
                    });
                    return;
                };
                let target = self.inline_parent(parent);
                let img = self.doc.push(target, Role::Image);
                self.doc.attrs.set_src(img, src.trim());
                if let Some(alt) = get_attribute(handle, "alt") {
                    self.doc.attrs.set_alt(img, alt.trim());
                }
            }
            ElementKind::Media => self.process_media(handle, parent),
            ElementKind::Todo => {
                let checked = get_attribute(handle, "checked")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
                let target = self.inline_parent(parent);
                self.doc.push(target, Role::Checkbox { checked });
            }
            ElementKind::Input => {
                let is_checkbox = get_attribute(handle, "type")
                    .is_some_and(|t| t.trim().eq_ignore_ascii_case("checkbox"));
                if is_checkbox {
                    let checked = get_attribute(handle, "checked").is_some();
                    let target = self.inline_parent(parent);
                    self.doc.push(target, Role::Checkbox { checked });
                }
            }
            ElementKind::Crypt => {
                self.saw_encrypted = true;
                self.warn(Warning::EncryptedContent);
            }
        }
    }

    fn inline_style(&self, handle: &Handle) -> InlineStyle {
        get_attribute(handle, "style")
            .map(|css| parse_inline_style(&css))
            .unwrap_or_default()
    }

    /// `div`/`p`: a paragraph, or a plain container when it holds blocks.
    fn process_block(&mut self, handle: &Handle, parent: NodeId) {
        let style = self.inline_style(handle);
        if style.codeblock {
            self.process_code_block(handle, parent);
            return;
        }

        if !is_block_context(self.role(parent)) {
            self.process_inline_block(handle, parent);
            return;
        }

        self.end_paragraph();
        if has_block_children(handle) {
            // Nested block divs flatten to sibling paragraphs
            self.process_children(handle, parent);
        } else {
            let para = self.doc.push(parent, Role::Paragraph);
            let inner = if style.highlight {
                self.doc.push(para, Role::Highlight)
            } else {
                para
            };
            self.process_children(handle, inner);
        }
        self.end_paragraph();
    }

    /// A block inside inline content: separate it from what precedes by a
    /// line break.
    fn process_inline_block(&mut self, handle: &Handle, parent: NodeId) {
        let target = self.inline_parent(parent);
        let needs_break = self
            .doc
            .last_child(target)
            .is_some_and(|last| self.role(last) != Role::LineBreak);
        if needs_break {
            self.doc.push(target, Role::LineBreak);
        }
        self.process_children(handle, target);
    }

    fn process_list(&mut self, handle: &Handle, parent: NodeId, ordered: bool) {
        let container = match self.role(parent) {
            // A list directly inside a list belongs to the preceding item
            Role::List { .. } => self.item_for_nested(parent),
            _ => self.flow_parent(parent),
        };
        self.end_paragraph();
        let list = self.doc.push(container, Role::List { ordered });
        self.process_children(handle, list);
        self.end_paragraph();
    }

    fn process_table(&mut self, handle: &Handle, parent: NodeId) {
        let container = self.flow_parent(parent);
        if self.role(container) == Role::TableCell {
            self.process_inline_block(handle, parent);
            return;
        }
        self.end_paragraph();
        let table = self.doc.push(container, Role::Table);
        self.collect_rows(handle, table);
        self.pad_rows(table);
        self.end_paragraph();
    }

    fn collect_rows(&mut self, handle: &Handle, table: NodeId) {
        for child in handle.children.borrow().iter() {
            let Some(name) = element_name(child) else {
                continue;
            };
            match name.as_str() {
                "thead" | "tbody" | "tfoot" => self.collect_rows(child, table),
                "tr" => {
                    let row = self.doc.push(table, Role::TableRow);
                    for cell in child.children.borrow().iter() {
                        if matches!(element_name(cell).as_deref(), Some("td" | "th")) {
                            let cell_id = self.doc.push(row, Role::TableCell);
                            self.process_children(cell, cell_id);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Pad every row with empty cells up to the widest row.
    fn pad_rows(&mut self, table: NodeId) {
        let rows: Vec<NodeId> = self.doc.children(table).collect();
        let width = rows
            .iter()
            .map(|&row| self.doc.children(row).count())
            .max()
            .unwrap_or(0);
        for row in rows {
            let cells = self.doc.children(row).count();
            for _ in cells..width {
                self.doc.push(row, Role::TableCell);
            }
        }
    }

    fn process_code_block(&mut self, handle: &Handle, parent: NodeId) {
        let container = self.flow_parent(parent);
        self.end_paragraph();

        let mut code = String::new();
        collect_code_text(handle, &mut code);
        let code = code.trim_end_matches('\n');

        let block = self.doc.push(container, Role::CodeBlock);
        if !code.is_empty() {
            self.doc.push_text(block, code);
        }
        if let Some(language) = code_language(handle) {
            self.doc.attrs.set_language(block, &language);
        }
        self.end_paragraph();
    }

    fn process_anchor(&mut self, handle: &Handle, parent: NodeId) {
        let Some(href) = get_attribute(handle, "href").filter(|h| !h.trim().is_empty()) else {
            self.process_children(handle, parent);
            return;
        };
        let label = get_text_content(handle);
        let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
        let target = self.inline_parent(parent);
        let link = self.doc.push(target, Role::Link);
        self.doc.attrs.set_link(link, LinkTarget::parse(&href, &label));
        self.process_children(handle, link);
    }

    fn process_media(&mut self, handle: &Handle, parent: NodeId) {
        let Some(hash) = get_attribute(handle, "hash").filter(|h| !h.trim().is_empty()) else {
            self.warn(Warning::MissingAttribute {
                element: "en-media".to_string(),
                attribute: "hash",
            });
            return;
        };
        let is_image = get_attribute(handle, "type")
            .is_some_and(|t| t.trim().to_ascii_lowercase().starts_with("image/"));
        let role = if is_image { Role::Image } else { Role::FileEmbed };

        let target = self.inline_parent(parent);
        let media = self.doc.push(target, role);
        self.doc.attrs.set_resource(media, hash.trim());
        if let Some(alt) = get_attribute(handle, "alt").or_else(|| get_attribute(handle, "title"))
        {
            self.doc.attrs.set_alt(media, alt.trim());
        }
    }
}

fn has_block_children(handle: &Handle) -> bool {
    handle
        .children
        .borrow()
        .iter()
        .any(|child| element_name(child).is_some_and(|name| is_block_element(&name)))
}

/// Verbatim text of a code block; `br` and nested block elements end lines.
fn collect_code_text(handle: &Handle, out: &mut String) {
    for child in handle.children.borrow().iter() {
        match child.data {
            NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => {
                let name = element_name(child).unwrap_or_default();
                match name.as_str() {
                    "br" => out.push('\n'),
                    "div" | "p" | "li" | "tr" => {
                        if !out.is_empty() && !out.ends_with('\n') {
                            out.push('\n');
                        }
                        collect_code_text(child, out);
                        if !out.ends_with('\n') {
                            out.push('\n');
                        }
                    }
                    _ => collect_code_text(child, out),
                }
            }
            _ => {}
        }
    }
}

/// Language from `class="language-x"` / `class="lang-x"` on the block or a
/// nested `code` element.
fn code_language(handle: &Handle) -> Option<String> {
    let from_class = |h: &Handle| {
        get_attribute(h, "class").and_then(|class| {
            class.split_whitespace().find_map(|c| {
                c.strip_prefix("language-")
                    .or_else(|| c.strip_prefix("lang-"))
                    .map(str::to_string)
            })
        })
    };
    from_class(handle).or_else(|| find_first_element(handle, "code").and_then(|c| from_class(&c)))
}
