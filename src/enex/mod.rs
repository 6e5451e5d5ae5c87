//! ENEX archive reading.
//!
//! An ENEX file is an `<en-export>` element holding `<note>` records. Each
//! note carries its ENML body inside `<content>` (usually as CDATA), its
//! timestamps, tags, `<note-attributes>` and inline base64 `<resource>`
//! payloads.

mod parser;

pub use parser::{ArchiveEntry, parse_archive, strip_bom};
