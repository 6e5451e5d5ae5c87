//! Several archives converted with one path registry.

use std::fs;
use std::path::{Path, PathBuf};

use noteport::io::{DirWriter, MemoryWriter, discover_archives, read_archive};
use noteport::{Batch, Dialect, DialectConfig, Error};

fn single_note_archive(title: &str, body: &str) -> Vec<u8> {
    format!(
        "<en-export><note><title>{title}</title>\
         <content><![CDATA[<en-note><div>{body}</div><en-media hash=\"5d41402abc4b2a76b9719d911017c592\" type=\"image/png\"/></en-note>]]></content>\
         <resource><data encoding=\"base64\">aGVsbG8=</data><mime>image/png</mime>\
         <resource-attributes><file-name>pic.png</file-name></resource-attributes></resource>\
         </note></en-export>"
    )
    .into_bytes()
}

#[test]
fn test_shared_directory_never_overwrites() {
    let config = DialectConfig::new(Dialect::Standard).with_metadata(false);
    let batch = Batch::new(&config).unwrap();
    let writer = MemoryWriter::new();

    let first = batch
        .convert_archive(&single_note_archive("Todo", "from work"), Path::new("notes"), Some("work"), &writer)
        .unwrap();
    let second = batch
        .convert_archive(&single_note_archive("todo", "from home"), Path::new("notes"), Some("home"), &writer)
        .unwrap();

    assert_eq!(first.notes[0].path, Some(PathBuf::from("notes/Todo.md")));
    assert_eq!(second.notes[0].path, Some(PathBuf::from("notes/todo.1.md")));

    assert_eq!(
        writer.get_string("notes/Todo.md").unwrap(),
        "from work\n\n![](_resources/todo.resources/pic.png)\n"
    );
    assert_eq!(
        writer.get_string("notes/todo.1.md").unwrap(),
        "from home\n\n![](_resources/todo.1.resources/pic.png)\n"
    );
    assert_eq!(writer.len(), 4);
}

#[test]
fn test_separate_directories_keep_plain_names() {
    let config = DialectConfig::new(Dialect::Standard).with_metadata(false);
    let batch = Batch::new(&config).unwrap();
    let writer = MemoryWriter::new();

    for notebook in ["a", "b"] {
        let root = Path::new("notes").join(notebook);
        let report = batch
            .convert_archive(&single_note_archive("Todo", notebook), &root, Some(notebook), &writer)
            .unwrap();
        assert_eq!(report.notes[0].path, Some(root.join("Todo.md")));
    }
}

#[test]
fn test_batch_rejects_invalid_config() {
    let config = DialectConfig::new(Dialect::Standard).with_workers(0);
    assert!(matches!(Batch::new(&config), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_missing_archive() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone.enex");
    assert!(matches!(read_archive(&missing), Err(Error::ArchiveNotFound(p)) if p == missing));
}

#[test]
fn test_directory_batch_on_disk() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("b.enex"), single_note_archive("Note", "b")).unwrap();
    fs::write(input.path().join("a.ENEX"), single_note_archive("Note", "a")).unwrap();
    fs::write(input.path().join("readme.txt"), "not an archive").unwrap();

    let archives = discover_archives(&[input.path()]).unwrap();
    assert_eq!(archives.len(), 2);

    let config = DialectConfig::new(Dialect::ObsidianMD)
        .with_metadata(false)
        .with_workers(2);
    let batch = Batch::new(&config).unwrap();
    let writer = DirWriter::new(output.path());
    for archive in &archives {
        let bytes = read_archive(archive).unwrap();
        batch
            .convert_archive(&bytes, Path::new("notes"), None, &writer)
            .unwrap();
    }

    let notes = output.path().join("notes");
    assert_eq!(fs::read_to_string(notes.join("Note.md")).unwrap(), "a\n\n![[_resources/note.resources/pic.png]]\n");
    assert_eq!(
        fs::read_to_string(notes.join("Note.1.md")).unwrap(),
        "b\n\n![[_resources/note.1.resources/pic.png]]\n"
    );
    assert_eq!(
        fs::read(notes.join("_resources/note.1.resources/pic.png")).unwrap(),
        b"hello"
    );
}
