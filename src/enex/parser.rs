//! ENEX container parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::error::{Error, Result, Warning};
use crate::model::{Geolocation, Note, Resource};
use crate::util::{decode_text, parse_timestamp, xml_encoding_hint};

/// A note read from an archive together with problems found while reading it.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub note: Note,
    pub warnings: Vec<Warning>,
}

/// Resource fields gathered while inside a `<resource>` element.
#[derive(Default)]
struct ResourceFields {
    data: Option<String>,
    encoding: Option<String>,
    mime: Option<String>,
    file_name: Option<String>,
    source_url: Option<String>,
}

/// Note fields gathered while inside a `<note>` element.
#[derive(Default)]
struct NoteFields {
    note: Note,
    has_content: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    altitude: Option<f64>,
    resource_index: usize,
    warnings: Vec<Warning>,
}

impl NoteFields {
    fn finish(mut self) -> ArchiveEntry {
        if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            self.note.location = Some(Geolocation {
                latitude,
                longitude,
                altitude: self.altitude,
            });
        }
        ArchiveEntry {
            note: self.note,
            warnings: self.warnings,
        }
    }

    fn push_resource(&mut self, fields: ResourceFields) {
        let index = self.resource_index;
        self.resource_index += 1;

        let encoding = fields.encoding.as_deref().unwrap_or("base64");
        if !encoding.eq_ignore_ascii_case("base64") {
            self.decode_failed(index, format!("unsupported encoding `{encoding}`"));
            return;
        }

        let payload: String = fields
            .data
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        match STANDARD.decode(payload.as_bytes()) {
            Ok(data) => {
                let mime = fields
                    .mime
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let mut resource = Resource::new(data, mime);
                resource.file_name = fields.file_name.filter(|n| !n.is_empty());
                resource.source_url = fields.source_url.filter(|u| !u.is_empty());
                self.note.resources.push(resource);
            }
            Err(e) => self.decode_failed(index, e.to_string()),
        }
    }

    fn decode_failed(&mut self, index: usize, reason: String) {
        warn!(note = %self.note.title, index, %reason, "dropping undecodable resource");
        self.warnings
            .push(Warning::ResourceDecode { index, reason });
    }
}

/// Parse a whole archive into notes, preserving archive order.
///
/// `notebook` names the archive and is copied onto every note.
pub fn parse_archive(bytes: &[u8], notebook: Option<&str>) -> Result<Vec<ArchiveEntry>> {
    let content = decode_text(strip_bom(bytes), xml_encoding_hint(bytes));

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(false);

    let mut entries = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_root = false;
    let mut note: Option<NoteFields> = None;
    let mut resource: Option<ResourceFields> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::MalformedArchive(format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(e) => {
                let name = element_name(&e);
                if path.is_empty() {
                    check_root(&name)?;
                    saw_root = true;
                }
                match name.as_str() {
                    "note" if path.len() == 1 => {
                        note = Some(NoteFields {
                            note: Note {
                                index: entries.len(),
                                notebook: notebook.map(str::to_string),
                                ..Default::default()
                            },
                            ..Default::default()
                        });
                    }
                    "resource" if note.is_some() => resource = Some(ResourceFields::default()),
                    "data" => {
                        if let Some(res) = resource.as_mut() {
                            res.encoding = attribute(&e, b"encoding");
                        }
                    }
                    _ => {}
                }
                path.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                if path.is_empty() {
                    check_root(&name)?;
                    saw_root = true;
                }
                // An empty <content/> still counts as a body.
                if name == "content"
                    && let Some(fields) = note.as_mut()
                {
                    fields.has_content = true;
                }
            }
            Event::Text(e) => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::CData(e) => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&entity) {
                    Some(resolved) => text.push_str(&resolved),
                    None => {
                        text.push('&');
                        text.push_str(&entity);
                        text.push(';');
                    }
                }
            }
            Event::End(_) => {
                let Some(name) = path.pop() else {
                    return Err(Error::MalformedArchive("unbalanced end tag".into()));
                };
                let parent = path.last().map(String::as_str);
                let value = std::mem::take(&mut text);

                match (name.as_str(), parent) {
                    ("note", Some(_)) if path.len() == 1 => {
                        if let Some(fields) = note.take() {
                            if !fields.has_content {
                                return Err(Error::MalformedArchive(format!(
                                    "note \"{}\" has no content element",
                                    fields.note.title
                                )));
                            }
                            debug!(title = %fields.note.title, "parsed note");
                            entries.push(fields.finish());
                        }
                    }
                    ("resource", Some("note")) => {
                        if let (Some(fields), Some(res)) = (note.as_mut(), resource.take()) {
                            fields.push_resource(res);
                        }
                    }
                    _ => {
                        if let Some(res) = resource.as_mut() {
                            assign_resource_field(res, &name, &value);
                        } else if let Some(fields) = note.as_mut() {
                            assign_note_field(fields, &name, parent, value);
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(Error::MalformedArchive(format!(
            "unexpected end of archive inside <{}>",
            path.join("/")
        )));
    }
    if !saw_root {
        return Err(Error::MalformedArchive("no en-export element".into()));
    }

    Ok(entries)
}

fn check_root(name: &str) -> Result<()> {
    if name != "en-export" {
        return Err(Error::MalformedArchive(format!(
            "expected <en-export> root, found <{name}>"
        )));
    }
    Ok(())
}

fn assign_note_field(fields: &mut NoteFields, name: &str, parent: Option<&str>, value: String) {
    match (name, parent) {
        ("title", Some("note")) => fields.note.title = value.trim().to_string(),
        ("content", Some("note")) => {
            fields.note.content = value;
            fields.has_content = true;
        }
        ("guid", Some("note")) => {
            let guid = value.trim();
            if !guid.is_empty() {
                fields.note.guid = Some(guid.to_string());
            }
        }
        ("created", Some("note")) => fields.note.created = parse_timestamp(&value),
        ("updated", Some("note")) => fields.note.updated = parse_timestamp(&value),
        ("tag", Some("note")) => fields.note.add_tag(&value),
        ("latitude", Some("note-attributes")) => fields.latitude = value.trim().parse().ok(),
        ("longitude", Some("note-attributes")) => fields.longitude = value.trim().parse().ok(),
        ("altitude", Some("note-attributes")) => fields.altitude = value.trim().parse().ok(),
        ("author", Some("note-attributes")) => fields.note.author = non_empty(value),
        ("source-url", Some("note-attributes")) => fields.note.source_url = non_empty(value),
        _ => {}
    }
}

fn assign_resource_field(res: &mut ResourceFields, name: &str, value: &str) {
    match name {
        "data" => res.data = Some(value.to_string()),
        "mime" => res.mime = Some(value.trim().to_string()),
        "file-name" => res.file_name = Some(value.trim().to_string()),
        "source-url" => res.source_url = Some(value.trim().to_string()),
        _ => {}
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Strip a UTF-8 byte order mark.
pub fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
