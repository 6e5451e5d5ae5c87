//! Attachment files of a note.
//!
//! Each note with resources gets its own directory below `_resources/`,
//! next to the note file. File names are planned (and reserved) before any
//! note is rendered, so the renderer can point embeds at their final paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Warning;
use crate::io::FileWriter;
use crate::model::Note;
use crate::paths::{PathAllocator, sanitize_name};

/// Directory holding the per-note resource directories.
pub const RESOURCES_DIR: &str = "_resources";

/// Output location of each resource of one note, keyed by content hash.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    paths: HashMap<String, PathBuf>,
    dir: Option<PathBuf>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative output path (from the output root) of a resource.
    pub fn get(&self, hash: &str) -> Option<&Path> {
        self.paths
            .get(&hash.to_ascii_lowercase())
            .map(PathBuf::as_path)
    }

    /// The note's resource directory, if it has any resources.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Name of a note's resource directory (without the `.resources` suffix).
pub fn resource_dir_stem(note_stem: &str) -> String {
    sanitize_name(note_stem)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Reserve output paths for every resource of `note`.
///
/// `note_path` is the note's reserved Markdown path; resources go to
/// `<note dir>/_resources/<stem>.resources/`. Resources sharing a hash are
/// stored once.
pub fn plan_resources(note: &Note, note_path: &Path, allocator: &PathAllocator) -> ResourceMap {
    let mut map = ResourceMap::new();
    if !note.has_resources() {
        return map;
    }

    let note_dir = note_path.parent().unwrap_or(Path::new(""));
    let note_stem = note_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = allocator.reserve(
        &note_dir.join(RESOURCES_DIR),
        &resource_dir_stem(&note_stem),
        "resources",
    );

    for resource in &note.resources {
        if map.paths.contains_key(&resource.hash) {
            continue;
        }
        let (stem, ext) = match resource.file_name.as_deref().map(split_file_name) {
            Some((stem, ext)) if !stem.trim().is_empty() => {
                let ext = if ext.is_empty() {
                    extension_for_mime(&resource.mime).to_string()
                } else {
                    sanitize_name(&ext)
                };
                (stem, ext)
            }
            _ => (
                resource.hash.clone(),
                extension_for_mime(&resource.mime).to_string(),
            ),
        };
        let path = allocator.reserve(&dir, &stem, &ext);
        map.paths.insert(resource.hash.clone(), path);
    }

    map.dir = Some(dir);
    map
}

/// Write every planned resource of `note`.
///
/// Failures are returned as warnings; the note itself is still written.
pub fn write_resources(note: &Note, map: &ResourceMap, writer: &dyn FileWriter) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut written = std::collections::HashSet::new();

    for resource in &note.resources {
        let Some(path) = map.get(&resource.hash) else {
            continue;
        };
        if !written.insert(path.to_path_buf()) {
            continue;
        }
        if let Err(e) = writer.write(path, &resource.data) {
            let warning = Warning::ResourceWriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            tracing::warn!(note = %note.title, "{warning}");
            warnings.push(warning);
        }
    }

    warnings
}

/// Split a declared file name into stem and extension.
fn split_file_name(name: &str) -> (String, String) {
    // Only the last path component counts; some exports store full paths
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name)
        .trim();
    let path = Path::new(base);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => (
            stem.to_string_lossy().into_owned(),
            ext.to_string_lossy().to_lowercase(),
        ),
        _ => (base.to_string(), String::new()),
    }
}

/// File extension for a MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let mime = mime.trim().to_ascii_lowercase();
    let essence = mime.split(';').next().unwrap_or("").trim();

    match essence {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/heic" => "heic",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/json" => "json",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-powerpoint" => "ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/amr" => "amr",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/ogg" => "ogg",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "text/plain" => "txt",
        "text/html" => "html",
        "text/csv" => "csv",
        "text/markdown" => "md",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryWriter;
    use crate::model::Resource;
    use std::io;

    fn note_with(resources: Vec<Resource>) -> Note {
        let mut note = Note::new("test - note with picture", "<en-note/>");
        note.resources = resources;
        note
    }

    #[test]
    fn test_resource_dir_stem() {
        assert_eq!(resource_dir_stem("test - note with picture"), "test_-_note_with_picture");
        assert_eq!(resource_dir_stem("pdfAttachment"), "pdfattachment");
    }

    #[test]
    fn test_plan_uses_declared_name_or_hash() {
        let named = Resource::new(b"pdf".to_vec(), "application/pdf").with_file_name("sample.pdf");
        let unnamed = Resource::new(b"png".to_vec(), "image/png");
        let unnamed_hash = unnamed.hash.clone();
        let note = note_with(vec![named.clone(), unnamed]);

        let alloc = PathAllocator::new();
        let map = plan_resources(&note, Path::new("test - note with picture.md"), &alloc);

        assert_eq!(
            map.dir(),
            Some(Path::new("_resources/test_-_note_with_picture.resources"))
        );
        assert_eq!(
            map.get(&named.hash),
            Some(Path::new("_resources/test_-_note_with_picture.resources/sample.pdf"))
        );
        let expected = format!("_resources/test_-_note_with_picture.resources/{unnamed_hash}.png");
        assert_eq!(map.get(&unnamed_hash), Some(Path::new(&expected)));
    }

    #[test]
    fn test_same_file_names_get_suffixes() {
        let a = Resource::new(b"one".to_vec(), "image/png").with_file_name("image.png");
        let b = Resource::new(b"two".to_vec(), "image/png").with_file_name("IMAGE.png");
        let note = note_with(vec![a.clone(), b.clone()]);

        let alloc = PathAllocator::new();
        let map = plan_resources(&note, Path::new("n.md"), &alloc);
        assert_eq!(map.get(&a.hash), Some(Path::new("_resources/n.resources/image.png")));
        assert_eq!(map.get(&b.hash), Some(Path::new("_resources/n.resources/IMAGE.1.png")));
    }

    #[test]
    fn test_resource_dirs_do_not_collide() {
        let alloc = PathAllocator::new();
        let note = note_with(vec![Resource::new(b"x".to_vec(), "image/png")]);
        let first = plan_resources(&note, Path::new("a b.md"), &alloc);
        let second = plan_resources(&note, Path::new("a_b.md"), &alloc);
        assert_eq!(first.dir(), Some(Path::new("_resources/a_b.resources")));
        assert_eq!(second.dir(), Some(Path::new("_resources/a_b.1.resources")));
    }

    #[test]
    fn test_note_without_resources_reserves_nothing() {
        let alloc = PathAllocator::new();
        let map = plan_resources(&note_with(Vec::new()), Path::new("n.md"), &alloc);
        assert!(map.is_empty());
        assert!(map.dir().is_none());
        assert!(alloc.is_empty());
    }

    #[test]
    fn test_write_resources() {
        let res = Resource::new(b"data".to_vec(), "text/plain").with_file_name("dir/notes.txt");
        let note = note_with(vec![res]);
        let alloc = PathAllocator::new();
        let map = plan_resources(&note, Path::new("n.md"), &alloc);

        let writer = MemoryWriter::new();
        let warnings = write_resources(&note, &map, &writer);
        assert!(warnings.is_empty());
        assert_eq!(
            writer.get("_resources/n.resources/notes.txt"),
            Some(b"data".to_vec())
        );
    }

    struct FailingWriter;

    impl FileWriter for FailingWriter {
        fn write(&self, _: &Path, _: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_write_failure_becomes_warning() {
        let note = note_with(vec![Resource::new(b"x".to_vec(), "image/gif")]);
        let alloc = PathAllocator::new();
        let map = plan_resources(&note, Path::new("n.md"), &alloc);

        let warnings = write_resources(&note, &map, &FailingWriter);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], Warning::ResourceWriteFailed { .. }));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/JPEG"), "jpg");
        assert_eq!(extension_for_mime("text/plain; charset=utf-8"), "txt");
        assert_eq!(extension_for_mime("application/x-unknown"), "bin");
    }
}
