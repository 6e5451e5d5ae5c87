//! Output file naming.
//!
//! Every note file and resource file gets a unique, filesystem-safe name.
//! Names are reserved in a shared registry before anything is written, so
//! the mapping from note to path is fixed (and linkable) up front.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Longest file stem produced by [`sanitize_name`], in characters.
pub const MAX_NAME_CHARS: usize = 128;

/// Stem used when nothing usable is left of a name.
pub const FALLBACK_NAME: &str = "untitled";

/// Names Windows reserves for devices, with or without an extension.
const DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turn an arbitrary title into a safe file stem.
///
/// Path separators, characters reserved on common filesystems and control
/// characters become `_`; surrounding whitespace and trailing dots are
/// trimmed; the result is capped at [`MAX_NAME_CHARS`]. Device names such
/// as `CON` or `lpt1.txt` get `_` after the device part.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let capped: String = trim_name(&replaced).chars().take(MAX_NAME_CHARS).collect();
    let trimmed = trim_name(&capped);

    let mut name = if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    };

    if let Some(end) = device_name_len(&name) {
        name.insert(end, '_');
        if name.chars().count() > MAX_NAME_CHARS {
            name.pop();
            name.truncate(trim_name(&name).len());
        }
    }
    name
}

fn trim_name(name: &str) -> &str {
    name.trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

/// Length of the device part when `name` starts with a device name.
fn device_name_len(name: &str) -> Option<usize> {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    DEVICE_NAMES
        .iter()
        .any(|device| stem.eq_ignore_ascii_case(device))
        .then_some(stem.len())
}

/// Path of `target` as seen from directory `from`, both relative to the
/// same root, joined with `/`.
pub fn relative_link(from: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = target.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), from.len() - common));
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Registry of reserved output names, keyed by directory.
///
/// Reservation is atomic: concurrent callers never receive the same name.
/// Names compare case-insensitively so the output also works on
/// case-insensitive filesystems.
#[derive(Debug, Default)]
pub struct PathAllocator {
    reserved: Mutex<HashMap<PathBuf, HashSet<String>>>,
}

impl PathAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique file in `dir` named after `stem`.
    ///
    /// Tries `stem.ext`, then `stem.1.ext`, `stem.2.ext`, ... and returns
    /// the first free one as a path relative to the output root. An empty
    /// `ext` yields names without an extension.
    pub fn reserve(&self, dir: &Path, stem: &str, ext: &str) -> PathBuf {
        let stem = sanitize_name(stem);
        let mut reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        let taken = reserved.entry(dir.to_path_buf()).or_default();

        let mut counter = 0usize;
        loop {
            let file_name = match (counter, ext.is_empty()) {
                (0, true) => stem.clone(),
                (0, false) => format!("{stem}.{ext}"),
                (n, true) => format!("{stem}.{n}"),
                (n, false) => format!("{stem}.{n}.{ext}"),
            };
            if taken.insert(file_name.to_lowercase()) {
                return dir.join(file_name);
            }
            counter += 1;
        }
    }

    /// Whether `file_name` is already taken in `dir`.
    pub fn is_reserved(&self, dir: &Path, file_name: &str) -> bool {
        let reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        reserved
            .get(dir)
            .is_some_and(|names| names.contains(&file_name.to_lowercase()))
    }

    /// Number of names reserved across all directories.
    pub fn len(&self) -> usize {
        let reserved = self.reserved.lock().unwrap_or_else(PoisonError::into_inner);
        reserved.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_name("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_name("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_trims() {
        assert_eq!(sanitize_name("  Meeting notes...  "), "Meeting notes");
        assert_eq!(sanitize_name("..."), FALLBACK_NAME);
        assert_eq!(sanitize_name("   "), FALLBACK_NAME);
        assert_eq!(sanitize_name(""), FALLBACK_NAME);
    }

    #[test]
    fn test_sanitize_device_names() {
        assert_eq!(sanitize_name("CON"), "CON_");
        assert_eq!(sanitize_name("nul"), "nul_");
        assert_eq!(sanitize_name("Com1.txt"), "Com1_.txt");
        assert_eq!(sanitize_name("lpt9 .tar.gz"), "lpt9_ .tar.gz");
        assert_eq!(sanitize_name("aux."), "aux_");
        assert_eq!(sanitize_name("CONSOLE"), "CONSOLE");
        assert_eq!(sanitize_name("COM10"), "COM10");
        assert_eq!(sanitize_name("my con"), "my con");

        let long = format!("CON.{}", "x".repeat(200));
        let name = sanitize_name(&long);
        assert!(name.starts_with("CON_.x"));
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_sanitize_caps_on_char_boundary() {
        let long = "é".repeat(300);
        let name = sanitize_name(&long);
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_reserve_suffixes() {
        let alloc = PathAllocator::new();
        let root = Path::new("");
        assert_eq!(alloc.reserve(root, "untitled", "md"), PathBuf::from("untitled.md"));
        assert_eq!(alloc.reserve(root, "untitled", "md"), PathBuf::from("untitled.1.md"));
        assert_eq!(alloc.reserve(root, "", "md"), PathBuf::from("untitled.2.md"));
        assert_eq!(alloc.len(), 3);
    }

    #[test]
    fn test_reserve_is_case_insensitive() {
        let alloc = PathAllocator::new();
        let root = Path::new("notes");
        assert_eq!(alloc.reserve(root, "Todo", "md"), PathBuf::from("notes/Todo.md"));
        assert_eq!(alloc.reserve(root, "TODO", "md"), PathBuf::from("notes/TODO.1.md"));
        assert!(alloc.is_reserved(root, "todo.md"));
    }

    #[test]
    fn test_directories_are_independent() {
        let alloc = PathAllocator::new();
        let a = alloc.reserve(Path::new("a"), "image", "png");
        let b = alloc.reserve(Path::new("b"), "image", "png");
        assert_eq!(a, PathBuf::from("a/image.png"));
        assert_eq!(b, PathBuf::from("b/image.png"));
    }

    #[test]
    fn test_reserve_without_extension() {
        let alloc = PathAllocator::new();
        let dir = Path::new("_resources");
        assert_eq!(alloc.reserve(dir, "note", ""), PathBuf::from("_resources/note"));
        assert_eq!(alloc.reserve(dir, "note", ""), PathBuf::from("_resources/note.1"));
    }

    #[test]
    fn test_concurrent_reservations_are_unique() {
        let alloc = PathAllocator::new();
        let paths: Vec<PathBuf> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| alloc.reserve(Path::new(""), "same", "md")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let unique: HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_relative_link() {
        let same = relative_link(Path::new("notes/a"), Path::new("notes/a/Other.md"));
        assert_eq!(same, "Other.md");
        let sibling = relative_link(Path::new("notes/a"), Path::new("notes/b/Other.md"));
        assert_eq!(sibling, "../b/Other.md");
        let nested = relative_link(Path::new(""), Path::new("_resources/n.resources/x.png"));
        assert_eq!(nested, "_resources/n.resources/x.png");
    }

    proptest! {
        #[test]
        fn sanitized_names_are_safe(name in "\\PC{0,200}") {
            let safe = sanitize_name(&name);
            prop_assert!(!safe.is_empty());
            prop_assert!(safe.chars().count() <= MAX_NAME_CHARS);
            prop_assert!(!safe.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']));
            prop_assert!(!safe.chars().any(char::is_control));
            prop_assert!(!safe.ends_with('.'));
            prop_assert_eq!(safe.trim(), safe.as_str());
        }

        #[test]
        fn sanitize_is_idempotent(name in "\\PC{0,200}") {
            let once = sanitize_name(&name);
            prop_assert_eq!(sanitize_name(&once), once);
        }

        #[test]
        fn device_names_are_escaped(
            name in "(?i)(con|prn|aux|nul|com[1-9]|lpt[1-9])( {0,2}\\.[a-z .]{0,140})?"
        ) {
            let safe = sanitize_name(&name);
            prop_assert!(device_name_len(&safe).is_none());
            prop_assert!(safe.chars().count() <= MAX_NAME_CHARS);
            prop_assert_eq!(sanitize_name(&safe), safe);
        }

        #[test]
        fn reservations_never_collide(stems in proptest::collection::vec("[a-cA-C ]{0,3}", 1..40)) {
            let alloc = PathAllocator::new();
            let mut seen = HashSet::new();
            for stem in &stems {
                let path = alloc.reserve(Path::new(""), stem, "md");
                prop_assert!(seen.insert(path.to_string_lossy().to_lowercase()));
            }
        }
    }
}
