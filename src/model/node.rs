//! Document node types and roles.

/// Unique identifier for a node within a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root node ID (always 0).
    pub const ROOT: NodeId = NodeId(0);

    /// Handed out once the arena is full. Refers to no node.
    pub const DETACHED: NodeId = NodeId(u32::MAX);

    /// ID for the node stored at `index`, if one can be addressed.
    pub fn from_index(index: usize) -> Option<NodeId> {
        u32::try_from(index)
            .ok()
            .filter(|&i| i != Self::DETACHED.0)
            .map(NodeId)
    }
}

/// Inline formatting carried by a [`Role::Span`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

impl SpanStyle {
    /// Whether the span carries no formatting at all.
    pub fn is_plain(&self) -> bool {
        *self == SpanStyle::default()
    }

    /// Combine two styles, keeping every flag set in either.
    pub fn merge(self, other: SpanStyle) -> SpanStyle {
        SpanStyle {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            strikethrough: self.strikethrough || other.strikethrough,
            underline: self.underline || other.underline,
            code: self.code || other.code,
        }
    }
}

/// Semantic role of a node.
///
/// Roles map to Markdown concepts rather than to source elements: a `<div>`
/// and a `<p>` both become [`Role::Paragraph`], `<en-media>` and `<img>` both
/// become [`Role::Image`] when they show a picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Leaf text content referencing a range of the document's text buffer.
    #[default]
    Text,
    /// Root document node.
    Root,
    /// Block of inline content.
    Paragraph,
    /// Headings with level 1-6.
    Heading(u8),
    /// Ordered or unordered list.
    List { ordered: bool },
    /// List item; `depth` is 0 for items of a top-level list.
    ListItem { depth: u8 },
    Table,
    TableRow,
    TableCell,
    /// Preformatted code. Language is stored in the attribute map.
    CodeBlock,
    /// Highlighted (marker pen) text.
    Highlight,
    /// Inline formatting container.
    Span(SpanStyle),
    /// To-do checkbox.
    Checkbox { checked: bool },
    /// Picture backed by a resource hash or an external `src`.
    Image,
    /// Non-image attachment backed by a resource hash.
    FileEmbed,
    /// Hyperlink; target stored in the attribute map.
    Link,
    /// Hard line break (`<br>`).
    LineBreak,
    /// Horizontal rule (`<hr>`).
    Rule,
    BlockQuote,
}

impl Role {
    /// Roles that reference an attachment.
    pub fn is_embed(&self) -> bool {
        matches!(self, Role::Image | Role::FileEmbed)
    }
}

/// Range into a document's text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    /// Byte offset into the buffer.
    pub start: u32,
    /// Length in bytes.
    pub len: u32,
}

impl TextRange {
    pub fn new(start: u32, len: u32) -> Self {
        Self { start, len }
    }

    /// Range for `len` bytes at byte `start`, if its end fits in a `u32`.
    pub fn from_offsets(start: usize, len: usize) -> Option<Self> {
        let start = u32::try_from(start).ok()?;
        let len = u32::try_from(len).ok()?;
        start.checked_add(len)?;
        Some(Self { start, len })
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub role: Role,
    /// Parent node (None for root).
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Text content range (only for Text nodes).
    pub text: TextRange,
}

impl Node {
    /// Create a new node with no links.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            text: TextRange::default(),
        }
    }

    /// Create a text node with the given range.
    pub fn text(range: TextRange) -> Self {
        Self {
            text: range,
            ..Self::new(Role::Text)
        }
    }
}
