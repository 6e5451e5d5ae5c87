//! noteport - ENEX to Markdown converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use noteport::io::{DirWriter, discover_archives, read_archive};
use noteport::{Batch, Dialect, DialectConfig};

#[derive(Parser)]
#[command(name = "noteport")]
#[command(version, about = "Convert Evernote ENEX archives to Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    noteport notebook.enex -o out                  Convert one archive
    noteport exports/ -o vault --dialect obsidian  Convert a directory of archives
    noteport a.enex b.enex --skip-archive-name     Put all notes into one folder")]
struct Cli {
    /// Archive files or directories containing .enex files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Markdown dialect: standard, obsidian or urlencode
    #[arg(short, long)]
    dialect: Option<Dialect>,

    /// Emit the metadata block
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    metadata: Option<bool>,

    /// Prefix note file names with their creation time
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    zettelkasten: Option<bool>,

    /// Leave geolocation out of the metadata block
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    skip_location: Option<bool>,

    /// Skip notes that carry attachments
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    plain_text_only: Option<bool>,

    /// Write the notes of all archives into one directory
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    skip_archive_name: Option<bool>,

    /// Template file with {metadata-block}, {content-block} and {title}
    #[arg(short, long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Threads used to render notes
    #[arg(short, long)]
    workers: Option<usize>,

    /// JSON file with default options; flags take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// More logging (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Options read from `--config`. Keys mirror the long flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    dialect: Option<String>,
    metadata: Option<bool>,
    zettelkasten: Option<bool>,
    skip_location: Option<bool>,
    plain_text_only: Option<bool>,
    skip_archive_name: Option<bool>,
    template: Option<PathBuf>,
    workers: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let file = match &cli.config {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    let config = build_config(cli, file)?;

    let archives = discover_archives(&cli.inputs).map_err(|e| e.to_string())?;
    if archives.is_empty() {
        return Err("no .enex archives found".to_string());
    }

    let writer = DirWriter::new(&cli.output);
    let batch = Batch::new(&config).map_err(|e| e.to_string())?;

    let mut written = 0;
    let mut warnings = 0;
    for archive in &archives {
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_root = if config.skip_archive_name {
            PathBuf::from("notes")
        } else {
            Path::new("notes").join(noteport::paths::sanitize_name(&stem))
        };

        let bytes = read_archive(archive).map_err(|e| e.to_string())?;
        let report = batch
            .convert_archive(&bytes, &output_root, Some(&stem), &writer)
            .map_err(|e| format!("{}: {e}", archive.display()))?;

        written += report.written_count();
        warnings += report.warning_count();
        if !cli.quiet {
            println!(
                "{}: {} notes written, {} skipped",
                archive.display(),
                report.written_count(),
                report.skipped_count()
            );
        }
    }

    if !cli.quiet {
        println!(
            "Done: {written} notes in {} ({warnings} warnings)",
            cli.output.display()
        );
    }
    Ok(())
}

fn load_file_config(path: &Path) -> Result<FileConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))
}

/// Merge file options with flags, flags winning.
fn build_config(cli: &Cli, file: FileConfig) -> Result<DialectConfig, String> {
    let dialect = match (cli.dialect, file.dialect.as_deref()) {
        (Some(dialect), _) => dialect,
        (None, Some(name)) => name.parse().map_err(|e: noteport::Error| e.to_string())?,
        (None, None) => Dialect::default(),
    };
    let defaults = DialectConfig::default();

    let template = match cli.template.as_ref().or(file.template.as_ref()) {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read template {}: {e}", path.display()))?,
        ),
        None => None,
    };

    Ok(DialectConfig {
        dialect,
        include_metadata: cli.metadata.or(file.metadata).unwrap_or(defaults.include_metadata),
        zettelkasten_prefix: cli
            .zettelkasten
            .or(file.zettelkasten)
            .unwrap_or(defaults.zettelkasten_prefix),
        skip_location: cli
            .skip_location
            .or(file.skip_location)
            .unwrap_or(defaults.skip_location),
        plain_text_only: cli
            .plain_text_only
            .or(file.plain_text_only)
            .unwrap_or(defaults.plain_text_only),
        template,
        workers: cli.workers.or(file.workers).unwrap_or(defaults.workers),
        skip_archive_name: cli
            .skip_archive_name
            .or(file.skip_archive_name)
            .unwrap_or(defaults.skip_archive_name),
    })
}
