//! Error types for noteport operations.
//!
//! [`Error`] covers failures that abort a whole run. Everything scoped to a
//! single note, node or resource is a [`Warning`]: it is collected on the
//! note's report and conversion carries on.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort conversion of an archive.
#[derive(Error, Debug)]
pub enum Error {
    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal problems recorded against a single note.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("resource {index} could not be decoded: {reason}")]
    ResourceDecode { index: usize, reason: String },

    #[error("failed to write resource {path}: {reason}")]
    ResourceWriteFailed { path: String, reason: String },

    #[error("<{element}> without required `{attribute}` attribute was dropped")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("link to unknown note \"{label}\" rendered as text")]
    UnresolvedLink { label: String },

    #[error("reference to missing resource {hash} omitted")]
    UnresolvedResource { hash: String },

    #[error("markup could not be structured, kept as plain text")]
    MarkupFallback,

    #[error("encrypted content omitted")]
    EncryptedContent,

    #[error("front matter could not be serialized, omitted: {reason}")]
    MetadataOmitted { reason: String },

    #[error("failed to write note {path}: {reason}")]
    NoteWriteFailed { path: String, reason: String },
}
