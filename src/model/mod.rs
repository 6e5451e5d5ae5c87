//! Core data model for note conversion.
//!
//! This module contains:
//! - Note and resource records read from an archive
//! - The arena document tree built from a note body
//! - Node roles and inline styles
//! - Link targets (external URLs and note-to-note references)

mod document;
mod links;
mod node;
mod note;

pub use document::{Attributes, ChildIter, DfsIter, Document};
pub use links::{LinkTarget, NoteRef};
pub use node::{Node, NodeId, Role, SpanStyle, TextRange};
pub use note::{Geolocation, Note, Resource};
