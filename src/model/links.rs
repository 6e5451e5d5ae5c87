//! Link representation for note bodies.
//!
//! Note markup links either to the outside world or to another note of the
//! same account. Note-to-note links come in two shapes:
//! - **App links**: `evernote:///view/<user>/<shard>/<note-guid>/<note-guid>/`
//! - **Web links**: `https://www.evernote.com/shard/<shard>/nl/<user>/<note-guid>/`
//!
//! Neither carries the target's title, so the link label (which the app fills
//! with the target's title) is kept alongside the guid for resolution.

/// Reference to another note in the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteRef {
    /// Title of the referenced note (taken from the link label).
    pub title: String,
    /// Note guid embedded in the link URL, when present.
    pub guid: Option<String>,
}

/// The target of a link node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// URL outside the batch, rendered verbatim.
    /// Example: `href="https://example.com"` → External(String)
    External(String),

    /// Link to another note; resolved against the batch's output identity.
    Internal(NoteRef),
}

impl LinkTarget {
    /// Check if this is a note-to-note link.
    pub fn is_internal(&self) -> bool {
        matches!(self, LinkTarget::Internal(_))
    }

    /// Get the URL if this is an external link.
    pub fn as_external(&self) -> Option<&str> {
        match self {
            LinkTarget::External(url) => Some(url),
            _ => None,
        }
    }

    /// Classify a raw href, using `label` as the title of internal targets.
    pub fn parse(href: &str, label: &str) -> LinkTarget {
        let href = href.trim();

        if let Some(rest) = href.strip_prefix("evernote:///view/") {
            // <user>/<shard>/<note-guid>/<note-guid>/
            let guid = rest.split('/').nth(2).filter(|s| !s.is_empty());
            return LinkTarget::Internal(NoteRef {
                title: label.trim().to_string(),
                guid: guid.map(str::to_string),
            });
        }

        if let Some(guid) = web_note_guid(href) {
            return LinkTarget::Internal(NoteRef {
                title: label.trim().to_string(),
                guid: Some(guid.to_string()),
            });
        }

        LinkTarget::External(href.to_string())
    }
}

/// Extract the note guid from a `https://www.evernote.com/shard/<s>/nl/<u>/<guid>/` URL.
fn web_note_guid(href: &str) -> Option<&str> {
    let rest = href
        .strip_prefix("https://www.evernote.com/shard/")
        .or_else(|| href.strip_prefix("http://www.evernote.com/shard/"))?;
    let mut parts = rest.split('/');
    let _shard = parts.next()?;
    if parts.next()? != "nl" {
        return None;
    }
    let _user = parts.next()?;
    parts.next().filter(|s| !s.is_empty())
}
