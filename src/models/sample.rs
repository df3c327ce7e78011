//! Sample records and the path parsers that feed them.
//!
//! Listing pages link to `/people/{author}/sounds/{source_id}/` and detail
//! pages link to `/people/{author}/sounds/{source_id}/download/{full_name}`.
//! Served filenames follow `{source_id}__{author}__{title}.{ext}`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PathParseError;

/// Separator between the fields of a served filename.
pub const NAME_SEPARATOR: &str = "__";

const AUTHOR_MARKER: &str = "people";
const SAMPLE_MARKER: &str = "sounds";
const DOWNLOAD_MARKER: &str = "download";

/// One durable entry per ingested sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleRecord {
    /// Filename as served by the source
    pub full_name: String,

    /// `full_name` without the id/author prefixes and the extension
    pub base_name: String,
}

impl SampleRecord {
    /// Build the record for a freshly downloaded sample.
    pub fn from_download(link: &DownloadLink) -> Self {
        Self {
            full_name: link.full_name.clone(),
            base_name: base_name(&link.full_name, &link.source_id, &link.author),
        }
    }

    /// The authoritative dedup key derived from `full_name`.
    pub fn key(&self) -> Result<SampleKey, PathParseError> {
        SampleName::parse(&self.full_name).map(|name| name.key())
    }
}

/// Dedup key: lowercased author and source id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey {
    pub author: String,
    pub source_id: String,
}

impl SampleKey {
    pub fn new(author: &str, source_id: &str) -> Self {
        Self {
            author: author.to_lowercase(),
            source_id: source_id.to_string(),
        }
    }
}

/// A listing-page link to a sample detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// Link as found in the listing
    pub href: String,
    pub author: String,
    pub source_id: String,
}

impl CandidateLink {
    /// Whether a listing href looks like a sample detail link.
    pub fn matches(href: &str) -> bool {
        href.contains("/people/") && href.contains("/sounds/")
    }

    pub fn parse(href: &str) -> Result<Self, PathParseError> {
        let segments = path_segments(href);
        expect_marker(href, &segments, 1, AUTHOR_MARKER)?;
        expect_marker(href, &segments, 3, SAMPLE_MARKER)?;

        Ok(Self {
            href: href.to_string(),
            author: required(href, &segments, 2, "author")?,
            source_id: required(href, &segments, 4, "source id")?,
        })
    }

    pub fn key(&self) -> SampleKey {
        SampleKey::new(&self.author, &self.source_id)
    }
}

/// The download anchor found on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub href: String,
    pub author: String,
    pub source_id: String,
    pub full_name: String,
}

impl DownloadLink {
    /// Whether a detail-page href is a download link.
    pub fn matches(href: &str) -> bool {
        href.contains("/download/")
    }

    pub fn parse(href: &str) -> Result<Self, PathParseError> {
        let segments = path_segments(href);
        expect_marker(href, &segments, 1, AUTHOR_MARKER)?;
        expect_marker(href, &segments, 3, SAMPLE_MARKER)?;
        expect_marker(href, &segments, 5, DOWNLOAD_MARKER)?;

        // The filename becomes a staging path, so it must stay a plain name.
        let full_name = required(href, &segments, 6, "filename")?;
        if full_name == "." || full_name == ".." {
            return Err(PathParseError::MissingField {
                path: href.to_string(),
                field: "filename",
            });
        }

        Ok(Self {
            href: href.to_string(),
            author: required(href, &segments, 2, "author")?,
            source_id: required(href, &segments, 4, "source id")?,
            full_name,
        })
    }

    pub fn key(&self) -> SampleKey {
        SampleKey::new(&self.author, &self.source_id)
    }
}

/// The three fields encoded in a served filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleName<'a> {
    pub source_id: &'a str,
    pub author: &'a str,
    pub title: &'a str,
}

impl<'a> SampleName<'a> {
    pub fn parse(full_name: &'a str) -> Result<Self, PathParseError> {
        let parts: Vec<&str> = full_name.split(NAME_SEPARATOR).collect();
        match *parts.as_slice() {
            [source_id, author, title] => Ok(Self {
                source_id,
                author,
                title,
            }),
            _ => Err(PathParseError::SegmentCount {
                name: full_name.to_string(),
                parts: parts.len(),
            }),
        }
    }

    pub fn key(&self) -> SampleKey {
        SampleKey::new(self.author, self.source_id)
    }
}

/// Strip `{source_id}__`, then `{author}__` (case-insensitive), then the
/// extension from a served filename.
pub fn base_name(full_name: &str, source_id: &str, author: &str) -> String {
    let rest = full_name
        .strip_prefix(&format!("{source_id}{NAME_SEPARATOR}"))
        .unwrap_or(full_name);

    let author_prefix = format!("{author}{NAME_SEPARATOR}");
    let rest = strip_prefix_ignore_case(rest, &author_prefix).unwrap_or(rest);

    Path::new(rest)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(rest)
        .to_string()
}

/// Strip `prefix` from `text`, comparing char by char after lowercasing.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.chars();
    let mut end = 0;
    for expected in prefix.chars() {
        let actual = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end += actual.len_utf8();
    }
    text.get(end..)
}

/// Split the path portion of an absolute or relative href.
fn path_segments(href: &str) -> Vec<String> {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.split(['?', '#']).next().unwrap_or(href).to_string(),
    };
    path.split('/').map(str::to_string).collect()
}

fn expect_marker(
    href: &str,
    segments: &[String],
    index: usize,
    expected: &'static str,
) -> Result<(), PathParseError> {
    match segments.get(index) {
        Some(segment) if segment == expected => Ok(()),
        _ => Err(PathParseError::MissingMarker {
            path: href.to_string(),
            expected,
        }),
    }
}

fn required(
    href: &str,
    segments: &[String],
    index: usize,
    field: &'static str,
) -> Result<String, PathParseError> {
    segments
        .get(index)
        .filter(|s| !s.is_empty())
        .cloned()
        .ok_or_else(|| PathParseError::MissingField {
            path: href.to_string(),
            field,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_link_parse() {
        let link = CandidateLink::parse("/people/Foo/sounds/123/").unwrap();
        assert_eq!(link.author, "Foo");
        assert_eq!(link.source_id, "123");
        assert_eq!(link.key(), SampleKey::new("foo", "123"));
    }

    #[test]
    fn test_candidate_link_absolute_url() {
        let link = CandidateLink::parse("https://freesound.org/people/foo/sounds/42/?x=1").unwrap();
        assert_eq!(link.source_id, "42");
    }

    #[test]
    fn test_candidate_link_rejects_author_listing() {
        let err = CandidateLink::parse("/people/foo/sounds/").unwrap_err();
        assert!(matches!(err, PathParseError::MissingField { field: "source id", .. }));
    }

    #[test]
    fn test_candidate_link_rejects_wrong_marker() {
        assert!(CandidateLink::parse("/people/foo/packs/123/").is_err());
    }

    #[test]
    fn test_download_link_parse() {
        let link =
            DownloadLink::parse("/people/foo/sounds/123/download/123__foo__kick.wav").unwrap();
        assert_eq!(link.author, "foo");
        assert_eq!(link.source_id, "123");
        assert_eq!(link.full_name, "123__foo__kick.wav");
    }

    #[test]
    fn test_download_link_requires_filename() {
        assert!(DownloadLink::parse("/people/foo/sounds/123/download/").is_err());
    }

    #[test]
    fn test_sample_name_parse() {
        let name = SampleName::parse("123__Foo__kick.wav").unwrap();
        assert_eq!(name.source_id, "123");
        assert_eq!(name.author, "Foo");
        assert_eq!(name.title, "kick.wav");
        assert_eq!(name.key(), SampleKey::new("foo", "123"));
    }

    #[test]
    fn test_sample_name_rejects_extra_separators() {
        let err = SampleName::parse("123__foo__big__kick.wav").unwrap_err();
        assert_eq!(
            err,
            PathParseError::SegmentCount {
                name: "123__foo__big__kick.wav".to_string(),
                parts: 4,
            }
        );
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("123__foo__kick.wav", "123", "foo"), "kick");
        assert_eq!(base_name("123__Foo__kick.v2.wav", "123", "foo"), "kick.v2");
        assert_eq!(base_name("kick.wav", "123", "foo"), "kick");
    }

    #[test]
    fn test_base_name_strips_non_ascii_author() {
        // 'İ' grows from two to three bytes when lowercased.
        assert_eq!(base_name("7__İlker__kick.wav", "7", "İlker"), "kick");
        assert_eq!(base_name("7__İLKER__kick.wav", "7", "İlker"), "kick");
        assert_eq!(base_name("7__Ölçer__kick.wav", "7", "ölçer"), "kick");
        assert_eq!(base_name("7__İl__kick.wav", "7", "İlker"), "İl__kick");
    }

    #[test]
    fn test_record_from_download() {
        let link = DownloadLink::parse("/people/Foo/sounds/9/download/9__Foo__snare.flac").unwrap();
        let record = SampleRecord::from_download(&link);
        assert_eq!(record.full_name, "9__Foo__snare.flac");
        assert_eq!(record.base_name, "snare");
        assert_eq!(record.key().unwrap(), SampleKey::new("foo", "9"));
    }
}
