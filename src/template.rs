//! Final note layout: metadata front matter plus rendered body.
//!
//! A template is plain text with placeholders:
//! - `{metadata-block}`: YAML front matter describing the note
//! - `{content-block}`: the rendered Markdown body
//! - `{title}`: the note title
//!
//! Without a template a note is its metadata block (when enabled), a blank
//! line and the body. A template that has no `{metadata-block}` never emits
//! metadata, whatever the configuration says.

use serde::Serialize;
use tracing::warn;

use crate::config::DialectConfig;
use crate::error::Warning;
use crate::model::{Geolocation, Note};
use crate::util::format_timestamp;

pub const METADATA_PLACEHOLDER: &str = "{metadata-block}";
pub const CONTENT_PLACEHOLDER: &str = "{content-block}";
pub const TITLE_PLACEHOLDER: &str = "{title}";

/// Front matter fields, in output order.
#[derive(Debug, Serialize)]
struct FrontMatter<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<Geolocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

impl<'a> FrontMatter<'a> {
    fn new(note: &'a Note, skip_location: bool) -> Self {
        let present = |value: &'a Option<String>| {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        };
        Self {
            title: note.title.trim(),
            created: note.created.as_ref().map(format_timestamp),
            updated: note.updated.as_ref().map(format_timestamp),
            tags: &note.tags,
            location: note.location.filter(|_| !skip_location),
            author: present(&note.author),
            source: present(&note.source_url),
        }
    }
}

/// Assemble the final file contents of a note.
///
/// A note whose front matter cannot be serialized is written without it.
pub fn render_note(note: &Note, content: &str, config: &DialectConfig) -> (String, Vec<Warning>) {
    let mut warnings = Vec::new();
    let metadata = if config.include_metadata {
        metadata_block(note, config.skip_location).unwrap_or_else(|e| {
            let warning = Warning::MetadataOmitted {
                reason: e.to_string(),
            };
            warn!(note = %note.title, "{warning}");
            warnings.push(warning);
            String::new()
        })
    } else {
        String::new()
    };

    let output = match config.template.as_deref() {
        None => {
            let mut out = metadata;
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(content);
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out
        }
        Some(template) => fill_template(template, &metadata, content, note.title.trim()),
    };
    (output, warnings)
}

/// Substitute placeholders in a single left-to-right pass.
///
/// Substituted text is never scanned again, so a body containing a
/// placeholder literally is kept as is.
pub fn fill_template(template: &str, metadata: &str, content: &str, title: &str) -> String {
    let mut out = String::with_capacity(template.len() + metadata.len() + content.len());
    let bytes = template.as_bytes();
    let mut pos = 0;

    while let Some(offset) = memchr::memchr(b'{', &bytes[pos..]) {
        let start = pos + offset;
        out.push_str(&template[pos..start]);
        let rest = &template[start..];

        let (replacement, len) = if rest.starts_with(METADATA_PLACEHOLDER) {
            (metadata, METADATA_PLACEHOLDER.len())
        } else if rest.starts_with(CONTENT_PLACEHOLDER) {
            (content, CONTENT_PLACEHOLDER.len())
        } else if rest.starts_with(TITLE_PLACEHOLDER) {
            (title, TITLE_PLACEHOLDER.len())
        } else {
            ("{", 1)
        };
        out.push_str(replacement);
        pos = start + len;
    }
    out.push_str(&template[pos..]);
    out
}

/// YAML front matter for a note, including the `---` fences.
pub fn metadata_block(note: &Note, skip_location: bool) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(&FrontMatter::new(note, skip_location))?;
    Ok(format!("---\n{yaml}---\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::util::parse_timestamp;
    use serde_yaml::{Mapping, Value};

    fn sample_note() -> Note {
        let mut note = Note::new("Trip: day 1", "<en-note/>");
        note.created = parse_timestamp("20181006T084349Z");
        note.updated = parse_timestamp("20181006T090000Z");
        note.add_tag("travel");
        note.add_tag("2018");
        note.location = Some(Geolocation {
            latitude: 47.5,
            longitude: 19.25,
            altitude: None,
        });
        note.source_url = Some("https://example.com/a".to_string());
        note
    }

    /// Parse a fenced block back into its mapping.
    fn parse_block(block: &str) -> Mapping {
        let body = block
            .strip_prefix("---\n")
            .and_then(|b| b.strip_suffix("---\n"))
            .expect("fenced front matter");
        serde_yaml::from_str(body).expect("valid YAML")
    }

    fn string(map: &Mapping, key: &str) -> String {
        match &map[key] {
            Value::String(s) => s.clone(),
            other => panic!("{key} is not a string: {other:?}"),
        }
    }

    #[test]
    fn test_metadata_block() {
        let block = metadata_block(&sample_note(), false).unwrap();
        let map = parse_block(&block);

        let keys: Vec<_> = map.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["title", "created", "updated", "tags", "location", "source"]);
        assert_eq!(string(&map, "title"), "Trip: day 1");
        assert_eq!(string(&map, "created"), "2018-10-06T08:43:49Z");
        assert_eq!(string(&map, "updated"), "2018-10-06T09:00:00Z");
        assert_eq!(
            map["tags"],
            Value::Sequence(vec!["travel".into(), "2018".into()])
        );
        assert_eq!(map["location"]["latitude"].as_f64(), Some(47.5));
        assert_eq!(map["location"]["longitude"].as_f64(), Some(19.25));
        assert!(map["location"].get("altitude").is_none());
        assert_eq!(string(&map, "source"), "https://example.com/a");
    }

    #[test]
    fn test_scalars_stay_strings() {
        let mut note = Note::new("0x1A", "<en-note/>");
        let tags = ["2018-10-06", "0x1A", ".inf", "y", "1_000", "0o17", "true", "~", "null"];
        for tag in tags {
            note.add_tag(tag);
        }
        note.author = Some("- dash: colon #hash".to_string());

        let map = parse_block(&metadata_block(&note, false).unwrap());
        assert_eq!(string(&map, "title"), "0x1A");
        assert_eq!(string(&map, "author"), "- dash: colon #hash");
        let parsed: Vec<_> = map["tags"]
            .as_sequence()
            .expect("tag list")
            .iter()
            .map(|v| v.as_str().expect("string tag"))
            .collect();
        assert_eq!(parsed, tags);
    }

    #[test]
    fn test_multiline_title_keeps_newline() {
        let note = Note::new("line one\nline two", "<en-note/>");
        let map = parse_block(&metadata_block(&note, false).unwrap());
        assert_eq!(string(&map, "title"), "line one\nline two");
    }

    #[test]
    fn test_skip_location() {
        let block = metadata_block(&sample_note(), true).unwrap();
        assert!(!block.contains("location"));
        assert!(!block.contains("latitude"));
    }

    #[test]
    fn test_default_layout() {
        let note = Note::new("Plain", "<en-note/>");
        let config = DialectConfig::new(Dialect::Standard);
        let (output, warnings) = render_note(&note, "body", &config);
        assert_eq!(output, "---\ntitle: Plain\n---\n\nbody\n");
        assert!(warnings.is_empty());

        let config = config.with_metadata(false);
        assert_eq!(render_note(&note, "body", &config).0, "body\n");
    }

    #[test]
    fn test_template_without_metadata_placeholder() {
        let note = sample_note();
        let config = DialectConfig::new(Dialect::ObsidianMD).with_template("{content-block}");
        assert_eq!(render_note(&note, "just content", &config).0, "just content");
    }

    #[test]
    fn test_template_placeholders() {
        let note = Note::new("T", "<en-note/>");
        let config = DialectConfig::new(Dialect::Standard)
            .with_template("# {title}\n\n{content-block}\n\n{metadata-block}");
        assert_eq!(
            render_note(&note, "text with {title}", &config).0,
            "# T\n\ntext with {title}\n\n---\ntitle: T\n---\n"
        );
    }

    #[test]
    fn test_unknown_braces_are_kept() {
        assert_eq!(fill_template("{x} {content-block}", "", "c", "t"), "{x} c");
    }
}
