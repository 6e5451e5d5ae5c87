//! Benchmarks for the conversion pipeline.
//!
//! Run with: cargo bench

use std::path::Path;

use criterion::{Criterion, criterion_group, criterion_main};

use noteport::enex::parse_archive;
use noteport::io::MemoryWriter;
use noteport::markup::build_document;
use noteport::{Dialect, DialectConfig, convert};

const SAMPLE: &[u8] = include_bytes!("../tests/fixtures/sample.enex");

/// An archive of `count` copies of the sample notes, all with equal titles.
fn large_archive(count: usize) -> Vec<u8> {
    let text = String::from_utf8_lossy(SAMPLE);
    let start = text.find("<note>").unwrap_or(0);
    let end = text.rfind("</note>").map(|i| i + "</note>".len()).unwrap_or(text.len());
    let notes = &text[start..end];

    let mut archive = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<en-export>\n");
    for _ in 0..count {
        archive.push_str(notes);
        archive.push('\n');
    }
    archive.push_str("</en-export>\n");
    archive.into_bytes()
}

fn bench_parse_archive(c: &mut Criterion) {
    c.bench_function("parse_archive", |b| {
        b.iter(|| parse_archive(SAMPLE, None).unwrap());
    });
}

fn bench_build_document(c: &mut Criterion) {
    let entries = parse_archive(SAMPLE, None).unwrap();
    let markup = entries[0].note.content.clone();

    c.bench_function("build_document", |b| {
        b.iter(|| build_document(&markup));
    });
}

fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");

    for dialect in [Dialect::Standard, Dialect::ObsidianMD, Dialect::UrlEncodeMD] {
        let config = DialectConfig::new(dialect);
        group.bench_function(dialect.name(), |b| {
            b.iter(|| {
                let writer = MemoryWriter::new();
                convert(SAMPLE, Path::new(""), &config, &writer).unwrap()
            });
        });
    }

    let archive = large_archive(200);
    for workers in [1, 4] {
        let config = DialectConfig::new(Dialect::ObsidianMD).with_workers(workers);
        group.bench_function(format!("400_notes_{workers}_workers"), |b| {
            b.iter(|| {
                let writer = MemoryWriter::new();
                convert(&archive, Path::new(""), &config, &writer).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_archive, bench_build_document, bench_convert);
criterion_main!(benches);
