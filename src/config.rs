//! Rendering options for a conversion run.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Markdown flavor to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// CommonMark links and images, `**` for highlights.
    #[default]
    Standard,
    /// Obsidian wikilinks, embeds and `==highlight==` markers.
    ObsidianMD,
    /// Standard Markdown with percent-encoded link and image paths.
    UrlEncodeMD,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Standard => "standard",
            Dialect::ObsidianMD => "obsidian",
            Dialect::UrlEncodeMD => "urlencode",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "standardmd" | "md" => Ok(Dialect::Standard),
            "obsidian" | "obsidianmd" => Ok(Dialect::ObsidianMD),
            "urlencode" | "urlencodemd" => Ok(Dialect::UrlEncodeMD),
            other => Err(Error::InvalidConfig(format!("unknown dialect `{other}`"))),
        }
    }
}

/// Options for one conversion run.
///
/// The value is built once and passed by reference into every component
/// that needs it; nothing reads options from global state.
#[derive(Debug, Clone)]
pub struct DialectConfig {
    pub dialect: Dialect,
    /// Emit the metadata block (title, timestamps, tags, location).
    pub include_metadata: bool,
    /// Prefix note file names with their creation time (`YYYYMMDDHHMM`).
    pub zettelkasten_prefix: bool,
    /// Leave geolocation out of the metadata block.
    pub skip_location: bool,
    /// Skip every note that carries a resource.
    pub plain_text_only: bool,
    /// Template text with `{metadata-block}`, `{content-block}` and `{title}`.
    pub template: Option<String>,
    /// Worker threads used to render notes once paths are assigned.
    pub workers: usize,
    /// Write the notes of every archive of a batch into one directory.
    pub skip_archive_name: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Standard,
            include_metadata: true,
            zettelkasten_prefix: false,
            skip_location: false,
            plain_text_only: false,
            template: None,
            workers: 1,
            skip_archive_name: false,
        }
    }
}

impl DialectConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn with_zettelkasten(mut self, enabled: bool) -> Self {
        self.zettelkasten_prefix = enabled;
        self
    }

    pub fn with_skip_location(mut self, skip: bool) -> Self {
        self.skip_location = skip;
        self
    }

    pub fn with_plain_text_only(mut self, enabled: bool) -> Self {
        self.plain_text_only = enabled;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check option combinations that cannot work.
    pub fn validate(&self) -> crate::Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("obsidian".parse::<Dialect>().unwrap(), Dialect::ObsidianMD);
        assert_eq!("ObsidianMD".parse::<Dialect>().unwrap(), Dialect::ObsidianMD);
        assert_eq!("urlencode".parse::<Dialect>().unwrap(), Dialect::UrlEncodeMD);
        assert_eq!("standard".parse::<Dialect>().unwrap(), Dialect::Standard);
        assert!("latex".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_dialect_display_round_trips() {
        for dialect in [Dialect::Standard, Dialect::ObsidianMD, Dialect::UrlEncodeMD] {
            assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
        }
    }

    #[test]
    fn test_default_config() {
        let config = DialectConfig::default();
        assert!(config.include_metadata);
        assert!(config.template.is_none());
        assert!(config.validate().is_ok());
        assert!(DialectConfig::default().with_workers(0).validate().is_err());
    }
}
