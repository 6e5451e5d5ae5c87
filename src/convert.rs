//! Archive conversion driver.
//!
//! Converting an archive runs in two passes:
//!
//! 1. Every note (in archive order) gets its Markdown path and resource
//!    paths reserved. This builds the [`OutputIdentity`] used for links.
//! 2. Notes are rendered and written independently, on `workers` scoped
//!    threads. Nothing shared is mutated in this pass.
//!
//! Per-note problems end up in the [`NoteReport`]; only an unreadable
//! archive or a bad configuration fails the call.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::DialectConfig;
use crate::enex::{ArchiveEntry, parse_archive};
use crate::error::{Result, Warning};
use crate::io::FileWriter;
use crate::links::{LinkResolver, OutputIdentity};
use crate::markdown::{RenderTargets, render_document};
use crate::markup::build_document;
use crate::model::Note;
use crate::paths::PathAllocator;
use crate::resources::{ResourceMap, plan_resources, write_resources};
use crate::template::render_note;

/// Outcome of one note.
#[derive(Debug, Clone)]
pub struct NoteReport {
    pub title: String,
    /// Output path relative to the writer root; `None` when the note was
    /// skipped or could not be written.
    pub path: Option<PathBuf>,
    pub warnings: Vec<Warning>,
}

impl NoteReport {
    pub fn is_written(&self) -> bool {
        self.path.is_some()
    }
}

/// Outcome of one archive, one entry per note in archive order.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub notes: Vec<NoteReport>,
}

impl ConversionReport {
    /// Notes that produced a file.
    pub fn written(&self) -> impl Iterator<Item = &NoteReport> {
        self.notes.iter().filter(|n| n.is_written())
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }

    /// Notes left out, by filter or write failure.
    pub fn skipped_count(&self) -> usize {
        self.notes.len() - self.written_count()
    }

    pub fn warning_count(&self) -> usize {
        self.notes.iter().map(|n| n.warnings.len()).sum()
    }
}

/// A note whose paths are fixed, waiting for pass 2.
struct PlannedNote {
    note: Note,
    path: PathBuf,
    resources: ResourceMap,
    warnings: Vec<Warning>,
}

/// Convert one archive into `output_root` (relative to the writer root).
///
/// Shorthand for a [`Batch`] holding a single archive.
pub fn convert(
    archive: &[u8],
    output_root: &Path,
    config: &DialectConfig,
    writer: &dyn FileWriter,
) -> Result<ConversionReport> {
    Batch::new(config)?.convert_archive(archive, output_root, None, writer)
}

/// Converts several archives with one path registry.
///
/// Archives written into the same directory never overwrite each other's
/// notes or resources: the second `Note.md` becomes `Note.1.md`. Links are
/// resolved within an archive only.
pub struct Batch<'a> {
    config: &'a DialectConfig,
    allocator: PathAllocator,
}

impl<'a> Batch<'a> {
    pub fn new(config: &'a DialectConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            allocator: PathAllocator::new(),
        })
    }

    pub fn config(&self) -> &DialectConfig {
        self.config
    }

    /// Convert one archive. `notebook` names the archive in the notes'
    /// metadata.
    pub fn convert_archive(
        &self,
        archive: &[u8],
        output_root: &Path,
        notebook: Option<&str>,
        writer: &dyn FileWriter,
    ) -> Result<ConversionReport> {
        let entries = parse_archive(archive, notebook)?;
        info!(
            notebook = notebook.unwrap_or_default(),
            notes = entries.len(),
            output = %output_root.display(),
            "converting archive"
        );

        let (planned, identity, mut reports) = self.plan(entries, output_root);
        let rendered = self.render_all(planned, &identity, writer);

        // Skipped notes keep their archive position
        let mut rendered = rendered.into_iter();
        for slot in reports.iter_mut() {
            if slot.is_none() {
                *slot = rendered.next();
            }
        }

        let report = ConversionReport {
            notes: reports.into_iter().flatten().collect(),
        };
        info!(
            written = report.written_count(),
            skipped = report.skipped_count(),
            warnings = report.warning_count(),
            "archive converted"
        );
        Ok(report)
    }

    /// Pass 1: reserve every path in archive order.
    ///
    /// Returns the notes to render plus one report slot per note; slots of
    /// skipped notes are already filled.
    fn plan(
        &self,
        entries: Vec<ArchiveEntry>,
        output_root: &Path,
    ) -> (Vec<PlannedNote>, OutputIdentity, Vec<Option<NoteReport>>) {
        let mut resolver =
            LinkResolver::new(&self.allocator, output_root, self.config.zettelkasten_prefix);
        let mut planned = Vec::with_capacity(entries.len());
        let mut reports = Vec::with_capacity(entries.len());

        for ArchiveEntry { note, warnings } in entries {
            if self.config.plain_text_only && note.has_resources() {
                debug!(title = %note.title, "skipping note with resources");
                reports.push(Some(NoteReport {
                    title: note.title,
                    path: None,
                    warnings,
                }));
                continue;
            }

            let path = resolver.register(&note);
            let resources = plan_resources(&note, &path, &self.allocator);
            planned.push(PlannedNote {
                note,
                path,
                resources,
                warnings,
            });
            reports.push(None);
        }

        (planned, resolver.finish(), reports)
    }

    /// Pass 2: render and write, keeping archive order in the result.
    fn render_all(
        &self,
        planned: Vec<PlannedNote>,
        identity: &OutputIdentity,
        writer: &dyn FileWriter,
    ) -> Vec<NoteReport> {
        let workers = self.config.workers.min(planned.len()).max(1);
        if workers == 1 {
            return planned
                .into_iter()
                .map(|p| render_note_file(p, identity, self.config, writer))
                .collect();
        }

        let chunk_size = planned.len().div_ceil(workers);
        let mut chunks: Vec<Vec<PlannedNote>> = Vec::with_capacity(workers);
        let mut planned = planned.into_iter().peekable();
        while planned.peek().is_some() {
            chunks.push(planned.by_ref().take(chunk_size).collect());
        }

        let config = self.config;
        std::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .into_iter()
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .into_iter()
                            .map(|p| render_note_file(p, identity, config, writer))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(reports) => reports,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }
}

/// Build, render and write one note with its resources.
fn render_note_file(
    planned: PlannedNote,
    identity: &OutputIdentity,
    config: &DialectConfig,
    writer: &dyn FileWriter,
) -> NoteReport {
    let PlannedNote {
        note,
        path,
        resources,
        mut warnings,
    } = planned;
    debug!(title = %note.title, path = %path.display(), "rendering note");

    let (doc, build_warnings) = build_document(&note.content);
    warnings.extend(build_warnings);

    let targets = RenderTargets {
        note_dir: path.parent().unwrap_or(Path::new("")),
        resources: &resources,
        notes: identity,
    };
    let rendered = render_document(&doc, config.dialect, targets);
    warnings.extend(rendered.warnings);

    let (output, note_warnings) = render_note(&note, &rendered.content, config);
    warnings.extend(note_warnings);
    warnings.extend(write_resources(&note, &resources, writer));

    let path = match writer.write(&path, output.as_bytes()) {
        Ok(()) => Some(path),
        Err(e) => {
            let warning = Warning::NoteWriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            warn!(note = %note.title, "{warning}");
            warnings.push(warning);
            None
        }
    };

    NoteReport {
        title: note.title,
        path,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::io::MemoryWriter;

    const ARCHIVE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<en-export>
<note><title>First</title><content><![CDATA[<en-note><div>See <a href="evernote:///view/1/s1/guid-2/guid-2/">Second</a></div></en-note>]]></content></note>
<note><title>Second</title><content><![CDATA[<en-note><div>Back</div></en-note>]]></content>
<note-attributes></note-attributes><guid>guid-2</guid></note>
</en-export>"#;

    fn config() -> DialectConfig {
        DialectConfig::new(Dialect::Standard).with_metadata(false)
    }

    #[test]
    fn test_convert_writes_notes_in_order() {
        let writer = MemoryWriter::new();
        let report = convert(ARCHIVE.as_bytes(), Path::new("out"), &config(), &writer).unwrap();

        let titles: Vec<_> = report.notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["First", "Second"]);
        assert_eq!(report.written_count(), 2);
        assert_eq!(
            writer.get_string("out/First.md").unwrap(),
            "See [Second](Second.md)\n"
        );
        assert_eq!(writer.get_string("out/Second.md").unwrap(), "Back\n");
    }

    #[test]
    fn test_workers_do_not_change_output() {
        let single = MemoryWriter::new();
        convert(ARCHIVE.as_bytes(), Path::new(""), &config(), &single).unwrap();

        let parallel = MemoryWriter::new();
        let report = convert(
            ARCHIVE.as_bytes(),
            Path::new(""),
            &config().with_workers(4),
            &parallel,
        )
        .unwrap();

        assert_eq!(report.notes[0].title, "First");
        assert_eq!(single.paths(), parallel.paths());
        for path in single.paths() {
            assert_eq!(single.get(&path), parallel.get(&path));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let writer = MemoryWriter::new();
        let result = convert(
            ARCHIVE.as_bytes(),
            Path::new(""),
            &config().with_workers(0),
            &writer,
        );
        assert!(result.is_err());
        assert!(writer.is_empty());
    }

    struct FailingWriter;

    impl FileWriter for FailingWriter {
        fn write(&self, _: &Path, _: &[u8]) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_write_failure_is_reported_per_note() {
        let report = convert(ARCHIVE.as_bytes(), Path::new(""), &config(), &FailingWriter).unwrap();
        assert_eq!(report.notes.len(), 2);
        assert_eq!(report.written_count(), 0);
        for note in &report.notes {
            assert!(matches!(note.warnings[..], [Warning::NoteWriteFailed { .. }]));
        }
    }
}
