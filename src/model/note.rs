//! Note and resource records as read from an archive.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Geographic position recorded with a note.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// A binary attachment of a note.
#[derive(Debug, Clone)]
pub struct Resource {
    /// Decoded payload.
    pub data: Vec<u8>,
    /// Declared MIME type (`application/octet-stream` when missing).
    pub mime: String,
    /// Original file name, when the archive records one.
    pub file_name: Option<String>,
    /// Lowercase hex MD5 of `data`; markup references resources by this hash.
    pub hash: String,
    /// Where the attachment was clipped from.
    pub source_url: Option<String>,
}

impl Resource {
    /// Create a resource, computing its content hash.
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        let hash = format!("{:x}", md5::compute(&data));
        Self {
            data,
            mime: mime.into(),
            file_name: None,
            hash,
            source_url: None,
        }
    }

    /// Set the original file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Whether the payload is a picture.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// A single note of an archive.
#[derive(Debug, Clone, Default)]
pub struct Note {
    /// Position within the archive (0-based).
    pub index: usize,
    pub title: String,
    /// Stable id, when the export carries one.
    pub guid: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Tags in source order, without duplicates.
    pub tags: Vec<String>,
    pub location: Option<Geolocation>,
    /// Name of the archive (notebook) the note came from.
    pub notebook: Option<String>,
    pub author: Option<String>,
    pub source_url: Option<String>,
    /// Raw ENML markup.
    pub content: String,
    pub resources: Vec<Resource>,
}

impl Note {
    /// Create a note with a title and markup body.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Add a tag unless already present.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Look up a resource by content hash.
    pub fn resource(&self, hash: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.hash.eq_ignore_ascii_case(hash))
    }

    pub fn has_resources(&self) -> bool {
        !self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_hash_is_md5() {
        let res = Resource::new(b"hello".to_vec(), "text/plain");
        assert_eq!(res.hash, "5d41402abc4b2a76b9719d911017c592");
        assert!(!res.is_image());
    }

    #[test]
    fn test_tags_are_unique_in_source_order() {
        let mut note = Note::new("t", "");
        note.add_tag("work");
        note.add_tag("home");
        note.add_tag("work");
        note.add_tag("  ");
        assert_eq!(note.tags, vec!["work", "home"]);
    }

    #[test]
    fn test_resource_lookup_ignores_case() {
        let mut note = Note::new("t", "");
        note.resources.push(Resource::new(b"hello".to_vec(), "image/png"));
        assert!(note.resource("5D41402ABC4B2A76B9719D911017C592").is_some());
        assert!(note.resource("0000").is_none());
    }
}
