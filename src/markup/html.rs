//! Lenient HTML parsing of note bodies using html5ever.
//!
//! Note bodies are nominally XHTML but routinely contain unbalanced tags,
//! stray self-closing custom elements and missing attributes. html5ever's
//! browser-grade error recovery turns any of that into a usable DOM.

use std::sync::LazyLock;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex_lite::Regex;

/// Custom elements written in self-closing form (`<en-media ... />`).
///
/// HTML parsing ignores the trailing slash on unknown elements, which would
/// swallow all following content into the element.
static SELF_CLOSING_CUSTOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(en-media|en-todo|en-crypt)(\s[^<>]*?)?\s*/>").expect("static regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

/// Rewrite self-closing custom elements as explicit open/close pairs.
pub fn normalize_self_closing(markup: &str) -> String {
    SELF_CLOSING_CUSTOM
        .replace_all(markup, "<$1$2></$1>")
        .into_owned()
}

/// Parse a note body into a DOM tree.
pub fn parse_markup(markup: &str) -> RcDom {
    let normalized = normalize_self_closing(markup);
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .one(normalized.as_bytes())
}

/// Remove all tags, keeping only text (last-resort fallback).
pub fn strip_tags(markup: &str) -> String {
    let text = TAG.replace_all(markup, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Get the first element with the given local name
pub fn find_first_element(handle: &Handle, name: &str) -> Option<Handle> {
    if let NodeData::Element { name: ref qname, .. } = handle.data
        && qname.local.as_ref() == name
    {
        return Some(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        if let Some(found) = find_first_element(child, name) {
            return Some(found);
        }
    }

    None
}

/// Local name of an element, lowercased by the parser.
pub fn element_name(handle: &Handle) -> Option<String> {
    match handle.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref().to_string()),
        _ => None,
    }
}

/// Get an attribute value from an element
pub fn get_attribute(handle: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            if attr.name.local.as_ref() == attr_name {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

/// Get text content from a node (ignoring tags)
pub fn get_text_content(handle: &Handle) -> String {
    let mut text = String::new();
    get_text_recursive(handle, &mut text);
    text
}

fn get_text_recursive(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => {
            text.push_str(&contents.borrow());
        }
        NodeData::Element { .. } => {
            for child in handle.children.borrow().iter() {
                get_text_recursive(child, text);
            }
        }
        _ => {}
    }
}
