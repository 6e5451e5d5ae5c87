//! # noteport
//!
//! Converts Evernote ENEX archives into directories of Markdown notes.
//!
//! ## Features
//!
//! - Three Markdown dialects: CommonMark-style, Obsidian (wikilinks,
//!   `==highlights==`) and percent-encoded paths
//! - Attachments extracted next to each note under `_resources/`
//! - Links between notes rewritten to the target note's final file,
//!   including notes that appear later in the archive
//! - Collision-free file names across whole batches of archives
//! - Optional YAML metadata block and user templates
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use noteport::{Dialect, DialectConfig, convert};
//! use noteport::io::{DirWriter, read_archive};
//!
//! let archive = read_archive(Path::new("notebook.enex")).unwrap();
//! let config = DialectConfig::new(Dialect::ObsidianMD);
//! let writer = DirWriter::new("vault");
//!
//! let report = convert(&archive, Path::new("notes"), &config, &writer).unwrap();
//! for note in &report.notes {
//!     println!("{} -> {:?}", note.title, note.path);
//! }
//! ```
//!
//! ## In-memory conversion
//!
//! ```
//! use std::path::Path;
//! use noteport::{Dialect, DialectConfig, convert};
//! use noteport::io::MemoryWriter;
//!
//! let archive = br#"<en-export><note><title>Hello</title>
//! <content><![CDATA[<en-note><div>World</div></en-note>]]></content>
//! </note></en-export>"#;
//!
//! let writer = MemoryWriter::new();
//! let config = DialectConfig::new(Dialect::Standard).with_metadata(false);
//! convert(archive, Path::new(""), &config, &writer).unwrap();
//!
//! assert_eq!(writer.get_string("Hello.md").unwrap(), "World\n");
//! ```

pub mod config;
pub mod convert;
pub mod enex;
pub mod error;
pub mod io;
pub mod links;
pub mod markdown;
pub mod markup;
pub mod model;
pub mod paths;
pub mod resources;
pub mod template;
pub mod util;

pub use config::{Dialect, DialectConfig};
pub use convert::{Batch, ConversionReport, NoteReport, convert};
pub use error::{Error, Result, Warning};
pub use model::{Document, Note, Resource};
