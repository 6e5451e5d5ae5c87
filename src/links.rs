//! Note-to-note link resolution.
//!
//! Resolution runs in two passes. Pass 1 ([`LinkResolver::register`]) walks
//! the archive in order, reserves every note's output path and records it
//! under the note's guid and title. Pass 2 renders notes independently and
//! only reads the finished [`OutputIdentity`], so a link can point at a note
//! that appears later in the archive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::model::{Note, NoteRef};
use crate::paths::PathAllocator;
use crate::util::zettelkasten_id;

/// Assigned output path of every note, by guid and by title.
#[derive(Debug, Clone, Default)]
pub struct OutputIdentity {
    by_guid: HashMap<String, PathBuf>,
    by_title: HashMap<String, PathBuf>,
    paths: Vec<PathBuf>,
}

impl OutputIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the note a link refers to.
    ///
    /// The guid wins when the link carries one the batch knows; otherwise
    /// the title is used.
    pub fn lookup(&self, target: &NoteRef) -> Option<&Path> {
        target
            .guid
            .as_deref()
            .and_then(|guid| self.by_guid.get(guid))
            .or_else(|| self.by_title.get(target.title.trim()))
            .map(PathBuf::as_path)
    }

    pub fn path_for_title(&self, title: &str) -> Option<&Path> {
        self.by_title.get(title.trim()).map(PathBuf::as_path)
    }

    /// Paths in registration order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Builds the [`OutputIdentity`] of one archive.
pub struct LinkResolver<'a> {
    allocator: &'a PathAllocator,
    dir: PathBuf,
    zettelkasten: bool,
    identity: OutputIdentity,
}

impl<'a> LinkResolver<'a> {
    /// Resolver placing notes in `dir` (relative to the output root).
    pub fn new(allocator: &'a PathAllocator, dir: impl Into<PathBuf>, zettelkasten: bool) -> Self {
        Self {
            allocator,
            dir: dir.into(),
            zettelkasten,
            identity: OutputIdentity::new(),
        }
    }

    /// Reserve the output path of `note` and record it.
    ///
    /// When two notes share a title, the title key keeps pointing at the
    /// first one registered.
    pub fn register(&mut self, note: &Note) -> PathBuf {
        let name = note_file_stem(note, self.zettelkasten);
        let path = self.allocator.reserve(&self.dir, &name, "md");

        if let Some(guid) = note.guid.as_deref().filter(|g| !g.is_empty()) {
            self.identity
                .by_guid
                .entry(guid.to_string())
                .or_insert_with(|| path.clone());
        }
        let title = note.title.trim();
        if !title.is_empty() {
            self.identity
                .by_title
                .entry(title.to_string())
                .or_insert_with(|| path.clone());
        }
        self.identity.paths.push(path.clone());

        tracing::debug!(title = %note.title, path = %path.display(), "registered note");
        path
    }

    /// Look up a link target among notes registered so far.
    pub fn resolve(&self, target: &NoteRef) -> Option<&Path> {
        self.identity.lookup(target)
    }

    pub fn identity(&self) -> &OutputIdentity {
        &self.identity
    }

    /// Finish pass 1.
    pub fn finish(self) -> OutputIdentity {
        self.identity
    }
}

/// Desired file stem of a note, before de-duplication.
///
/// With the Zettelkasten prefix the stem is `YYYYMMDDHHMM title` (creation
/// time in UTC), or just the id for untitled notes.
pub fn note_file_stem(note: &Note, zettelkasten: bool) -> String {
    let title = note.title.trim();
    match (zettelkasten, note.created) {
        (true, Some(created)) if title.is_empty() => zettelkasten_id(&created),
        (true, Some(created)) => format!("{} {title}", zettelkasten_id(&created)),
        _ => title.to_string(),
    }
}
