//! Arena-backed document tree built from a note's markup body.

use std::collections::HashMap;

use super::links::LinkTarget;
use super::node::{Node, NodeId, Role, TextRange};

/// Sparse per-node attributes.
///
/// Most nodes have none, so attributes live in maps keyed by node rather
/// than as `Option` fields on every node.
#[derive(Debug, Default, Clone)]
pub struct Attributes {
    /// Link targets (for Link nodes).
    link: HashMap<NodeId, LinkTarget>,
    /// Resource hash (for en-media backed Image/FileEmbed nodes).
    resource: HashMap<NodeId, String>,
    /// External picture source (for `<img src>` nodes).
    src: HashMap<NodeId, String>,
    /// Alternative text / display name.
    alt: HashMap<NodeId, String>,
    /// Programming language for code blocks.
    language: HashMap<NodeId, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_link(&mut self, node: NodeId, target: LinkTarget) {
        self.link.insert(node, target);
    }

    pub fn link(&self, node: NodeId) -> Option<&LinkTarget> {
        self.link.get(&node)
    }

    pub fn set_resource(&mut self, node: NodeId, hash: &str) {
        if !hash.is_empty() {
            self.resource.insert(node, hash.to_ascii_lowercase());
        }
    }

    pub fn resource(&self, node: NodeId) -> Option<&str> {
        self.resource.get(&node).map(String::as_str)
    }

    pub fn set_src(&mut self, node: NodeId, src: &str) {
        if !src.is_empty() {
            self.src.insert(node, src.to_string());
        }
    }

    pub fn src(&self, node: NodeId) -> Option<&str> {
        self.src.get(&node).map(String::as_str)
    }

    pub fn set_alt(&mut self, node: NodeId, alt: &str) {
        if !alt.is_empty() {
            self.alt.insert(node, alt.to_string());
        }
    }

    pub fn alt(&self, node: NodeId) -> Option<&str> {
        self.alt.get(&node).map(String::as_str)
    }

    pub fn set_language(&mut self, node: NodeId, language: &str) {
        if !language.is_empty() {
            self.language.insert(node, language.to_string());
        }
    }

    pub fn language(&self, node: NodeId) -> Option<&str> {
        self.language.get(&node).map(String::as_str)
    }

    /// Iterate over every internal link target.
    pub fn links(&self) -> impl Iterator<Item = (NodeId, &LinkTarget)> {
        self.link.iter().map(|(&k, v)| (k, v))
    }
}

/// A note body in structured form.
///
/// The tree uses a parent-pointer / first-child / next-sibling layout over a
/// single node vector. Index 0 is always the root. Text nodes reference
/// ranges in one shared buffer.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    pub attrs: Attributes,
    text: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with a root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Role::Root)],
            attrs: Attributes::new(),
            text: String::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.node(id).map(|n| n.role)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a detached node and return its ID.
    ///
    /// Once the arena is full the node is dropped and [`NodeId::DETACHED`]
    /// is returned; nothing can be attached to or under it.
    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        match NodeId::from_index(self.nodes.len()) {
            Some(id) => {
                self.nodes.push(node);
                id
            }
            None => NodeId::DETACHED,
        }
    }

    /// Append text to the buffer and return its range.
    ///
    /// Text that would end past `u32::MAX` bytes is dropped (empty range).
    pub fn append_text(&mut self, text: &str) -> TextRange {
        match TextRange::from_offsets(self.text.len(), text.len()) {
            Some(range) => {
                self.text.push_str(text);
                range
            }
            None => TextRange::default(),
        }
    }

    /// Get text from a range.
    pub fn text(&self, range: TextRange) -> &str {
        let start = range.start as usize;
        let end = start + range.len as usize;
        self.text.get(start..end).unwrap_or_default()
    }

    /// Append a child node to a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let previous_last = match self.nodes.get(parent.0 as usize) {
            Some(p) => p.last_child,
            None => return,
        };

        if let Some(child_node) = self.nodes.get_mut(child.0 as usize) {
            child_node.parent = Some(parent);
            child_node.next_sibling = None;
        }

        match previous_last {
            Some(last) => {
                if let Some(last_node) = self.nodes.get_mut(last.0 as usize) {
                    last_node.next_sibling = Some(child);
                }
            }
            None => {
                if let Some(parent_node) = self.nodes.get_mut(parent.0 as usize) {
                    parent_node.first_child = Some(child);
                }
            }
        }

        if let Some(parent_node) = self.nodes.get_mut(parent.0 as usize) {
            parent_node.last_child = Some(child);
        }
    }

    /// Allocate a node with `role` and append it under `parent`.
    pub fn push(&mut self, parent: NodeId, role: Role) -> NodeId {
        let id = self.alloc_node(Node::new(role));
        self.append_child(parent, id);
        id
    }

    /// Allocate a text node and append it under `parent`.
    pub fn push_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let range = self.append_text(text);
        let id = self.alloc_node(Node::text(range));
        self.append_child(parent, id);
        id
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildIter<'_> {
        let first_child = self
            .nodes
            .get(parent.0 as usize)
            .and_then(|n| n.first_child);
        ChildIter {
            doc: self,
            current: first_child,
        }
    }

    pub fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.node(parent).and_then(|n| n.last_child)
    }

    pub fn has_children(&self, parent: NodeId) -> bool {
        self.node(parent).is_some_and(|n| n.first_child.is_some())
    }

    /// Iterate over all nodes in depth-first order.
    pub fn iter_dfs(&self) -> DfsIter<'_> {
        DfsIter {
            doc: self,
            stack: vec![NodeId::ROOT],
        }
    }

    /// Whether any node below `id` (inclusive) has the given role class.
    pub fn any_descendant(&self, id: NodeId, pred: impl Fn(Role) -> bool + Copy) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if pred(node.role) {
            return true;
        }
        self.children(id).any(|c| self.any_descendant(c, pred))
    }

    /// Concatenated raw text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node.role {
            Role::Text => out.push_str(self.text(node.text)),
            Role::LineBreak => out.push('\n'),
            _ => {}
        }
        for child in self.children(id) {
            self.collect_text(child, out);
        }
    }
}

/// Iterator over children of a node.
pub struct ChildIter<'a> {
    doc: &'a Document,
    current: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self
            .doc
            .nodes
            .get(current.0 as usize)
            .and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Depth-first iterator over all nodes.
pub struct DfsIter<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for DfsIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Push children in reverse order so they're visited left-to-right
        let mut children: Vec<NodeId> = self.doc.children(current).collect();
        children.reverse();
        self.stack.extend(children);

        Some(current)
    }
}
