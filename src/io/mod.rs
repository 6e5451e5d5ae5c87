//! Filesystem access: reading archives and writing output files.
//!
//! Conversion itself never touches the filesystem directly. Output goes
//! through a [`FileWriter`], so tests can capture it in memory.

mod source;
mod writer;

pub use source::{discover_archives, is_archive_path, read_archive};
pub use writer::{DirWriter, FileWriter, MemoryWriter};
