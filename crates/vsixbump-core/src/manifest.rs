//! Version span location and splicing on raw manifest text.
//!
//! The manifest is never parsed as XML. Re-serializing it through a markup
//! library reorders attributes and rewrites whitespace, so the version literal
//! is found by a scoped text search and replaced in place. Everything outside
//! the returned [`VersionSpan`] is preserved byte-for-byte.
//!
//! # Example
//!
//! ```
//! use vsixbump_core::manifest;
//!
//! let text = r#"<Metadata><Identity Id="x" Version="1.0.0.4" /></Metadata>"#;
//! let span = manifest::locate_version(text).unwrap();
//! assert_eq!(span.slice(text), Some("1.0.0.4"));
//!
//! let bumped = manifest::splice(text, span, "1.0.0.5").unwrap();
//! assert!(bumped.contains(r#"Version="1.0.0.5""#));
//! ```

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

const METADATA_OPEN: &str = "<Metadata>";
const METADATA_CLOSE: &str = "</Metadata>";

/// `<Identity` followed by any attributes, then a four-part `Version`.
const IDENTITY_VERSION_PATTERN: &str = r#"<Identity\s+(?:[\w:.-]+\s*=\s*"[^"]*"\s*)*Version\s*=\s*"([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+)""#;

/// Errors from locating or replacing the version literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// A structural element of the manifest is missing.
    #[error("cannot find version in manifest: {0}")]
    NotFound(Missing),

    /// The span does not address a valid range of the text.
    #[error("version span {start}..{end} is outside the manifest text ({len} bytes)")]
    SpanOutOfBounds {
        /// Span start offset.
        start: usize,
        /// Span end offset.
        end: usize,
        /// Length of the text the span was applied to.
        len: usize,
    },
}

/// Which part of the manifest was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// No `<Metadata>` opening tag.
    OpeningTag,
    /// No `</Metadata>` after the opening tag.
    ClosingTag,
    /// No `<Identity ... Version="a.b.c.d">` inside the metadata block.
    VersionAttribute,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpeningTag => write!(f, "no {METADATA_OPEN} tag"),
            Self::ClosingTag => write!(f, "no {METADATA_CLOSE} tag"),
            Self::VersionAttribute => write!(f, "no Identity Version attribute in metadata"),
        }
    }
}

/// Result alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Byte offsets `[start, end)` of the version literal, quotes excluded.
///
/// Only [`locate_version`] creates spans, so a span always satisfies
/// `start <= end` and points at a `d.d.d.d` literal of the text it was
/// located in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionSpan {
    start: usize,
    end: usize,
}

impl VersionSpan {
    /// Offset of the first byte of the version literal.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Offset one past the last byte of the version literal.
    pub const fn end(&self) -> usize {
        self.end
    }

    /// The span as a `Range` for slicing.
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The version literal in `text`, or `None` if the span does not fit it.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.range())
    }
}

fn identity_version_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(IDENTITY_VERSION_PATTERN).expect("identity version regex must compile")
    })
}

/// Find the span of the `Identity` element's version inside `<Metadata>`.
///
/// Only the first metadata block is searched, and only the first matching
/// `Identity` element within it.
///
/// # Errors
///
/// Returns [`ManifestError::NotFound`] when the opening tag, the closing tag,
/// or the version attribute is missing.
#[instrument(skip_all, fields(len = text.len()))]
pub fn locate_version(text: &str) -> ManifestResult<VersionSpan> {
    let body_start = text
        .find(METADATA_OPEN)
        .map(|idx| idx + METADATA_OPEN.len())
        .ok_or(ManifestError::NotFound(Missing::OpeningTag))?;

    let body_end = text[body_start..]
        .find(METADATA_CLOSE)
        .map(|idx| body_start + idx)
        .ok_or(ManifestError::NotFound(Missing::ClosingTag))?;

    let body = &text[body_start..body_end];
    let version = identity_version_regex()
        .captures(body)
        .and_then(|caps| caps.get(1))
        .ok_or(ManifestError::NotFound(Missing::VersionAttribute))?;

    let span = VersionSpan {
        start: body_start + version.start(),
        end: body_start + version.end(),
    };
    debug!(start = span.start, end = span.end, version = version.as_str(), "located version");
    Ok(span)
}

/// Replace the bytes covered by `span` with `replacement`.
///
/// Returns a new string; `text` is left untouched.
///
/// # Errors
///
/// Returns [`ManifestError::SpanOutOfBounds`] if the span runs past the end
/// of `text` or does not fall on character boundaries.
pub fn splice(text: &str, span: VersionSpan, replacement: &str) -> ManifestResult<String> {
    let out_of_bounds = || ManifestError::SpanOutOfBounds {
        start: span.start,
        end: span.end,
        len: text.len(),
    };

    let head = text.get(..span.start).ok_or_else(out_of_bounds)?;
    let tail = text.get(span.end..).ok_or_else(out_of_bounds)?;
    if span.start > span.end {
        return Err(out_of_bounds());
    }

    let mut spliced = String::with_capacity(head.len() + replacement.len() + tail.len());
    spliced.push_str(head);
    spliced.push_str(replacement);
    spliced.push_str(tail);
    Ok(spliced)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VSIX_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<PackageManifest Version="2.0.0" xmlns="http://schemas.microsoft.com/developer/vsx-schema/2011">
    <Metadata>
        <Identity Id="vhdl4vs.ProjectType.4e4c1b8a"   Version="1.0.0.4" Language="en-US"
                  Publisher="someone" />
        <DisplayName>VHDL for Visual Studio</DisplayName>
    </Metadata>
    <Installation>
        <InstallationTarget Id="Microsoft.VisualStudio.Community" Version="[15.0,17.0)" />
    </Installation>
</PackageManifest>
"#;

    #[test]
    fn locates_version_between_other_attributes() {
        let text = r#"<Metadata><Identity Foo="x" Version="1.0.0.4" Bar="y"/></Metadata>"#;
        let span = locate_version(text).unwrap();
        assert_eq!(span.slice(text), Some("1.0.0.4"));
        assert_eq!(&text[span.range()], "1.0.0.4");
    }

    #[test]
    fn splice_preserves_everything_else() {
        let text = r#"<Metadata>
  <Identity   Foo = "x"  Version="1.0.0.4"	Bar='y'/>
</Metadata>"#;
        let span = locate_version(text).unwrap();
        let bumped = splice(text, span, "1.0.0.5").unwrap();

        assert_eq!(&bumped[..span.start()], &text[..span.start()]);
        assert_eq!(&bumped[span.start()..span.start() + 7], "1.0.0.5");
        assert_eq!(&bumped[span.start() + 7..], &text[span.end()..]);
    }

    #[test]
    fn real_manifest_only_touches_identity_version() {
        let span = locate_version(VSIX_MANIFEST).unwrap();
        assert_eq!(span.slice(VSIX_MANIFEST), Some("1.0.0.4"));

        let bumped = splice(VSIX_MANIFEST, span, "1.0.0.5").unwrap();
        assert_eq!(bumped, VSIX_MANIFEST.replacen("1.0.0.4", "1.0.0.5", 1));
        // PackageManifest and InstallationTarget versions are outside the span
        assert!(bumped.contains(r#"<PackageManifest Version="2.0.0""#));
        assert!(bumped.contains(r#"Version="[15.0,17.0)""#));
    }

    #[test]
    fn longer_replacement_shifts_tail() {
        let text = r#"<Metadata><Identity Version="2.1.0.9" /></Metadata>"#;
        let span = locate_version(text).unwrap();
        let bumped = splice(text, span, "2.1.0.10").unwrap();
        assert_eq!(
            bumped,
            r#"<Metadata><Identity Version="2.1.0.10" /></Metadata>"#
        );
    }

    #[test]
    fn missing_opening_tag() {
        let text = r#"<Identity Version="1.0.0.4" />"#;
        assert_eq!(
            locate_version(text),
            Err(ManifestError::NotFound(Missing::OpeningTag))
        );
    }

    #[test]
    fn missing_closing_tag() {
        let text = r#"<Metadata><Identity Version="1.0.0.4" />"#;
        assert_eq!(
            locate_version(text),
            Err(ManifestError::NotFound(Missing::ClosingTag))
        );
    }

    #[test]
    fn closing_tag_before_opening_tag_is_not_used() {
        let text = r#"</Metadata><Metadata><Identity Version="1.0.0.4" />"#;
        assert_eq!(
            locate_version(text),
            Err(ManifestError::NotFound(Missing::ClosingTag))
        );
    }

    #[test]
    fn metadata_without_version_attribute() {
        let text = r#"<Metadata><Identity Id="x" Publisher="y" /></Metadata>"#;
        assert_eq!(
            locate_version(text),
            Err(ManifestError::NotFound(Missing::VersionAttribute))
        );
    }

    #[test]
    fn three_part_version_is_not_matched() {
        let text = r#"<Metadata><Identity Version="1.0.4" /></Metadata>"#;
        assert_eq!(
            locate_version(text),
            Err(ManifestError::NotFound(Missing::VersionAttribute))
        );
    }

    #[test]
    fn version_outside_metadata_is_ignored() {
        let text = r#"<Identity Version="9.9.9.9" /><Metadata><Identity Version="1.2.3.4" /></Metadata>"#;
        let span = locate_version(text).unwrap();
        assert_eq!(span.slice(text), Some("1.2.3.4"));
        assert!(span.start() > text.find("<Metadata>").unwrap());
    }

    #[test]
    fn version_after_metadata_is_ignored() {
        let text = r#"<Metadata><DisplayName>x</DisplayName></Metadata><Identity Version="1.2.3.4" />"#;
        assert_eq!(
            locate_version(text),
            Err(ManifestError::NotFound(Missing::VersionAttribute))
        );
    }

    #[test]
    fn non_ascii_text_before_span_uses_byte_offsets() {
        let text = "<!-- überprüft --><Metadata><Identity Version=\"3.0.0.1\" /></Metadata>";
        let span = locate_version(text).unwrap();
        assert_eq!(span.slice(text), Some("3.0.0.1"));
        let bumped = splice(text, span, "3.0.0.2").unwrap();
        assert!(bumped.starts_with("<!-- überprüft -->"));
        assert!(bumped.contains("\"3.0.0.2\""));
    }

    #[test]
    fn splice_rejects_span_past_end() {
        let span = VersionSpan { start: 3, end: 40 };
        assert_eq!(
            splice("short", span, "x"),
            Err(ManifestError::SpanOutOfBounds {
                start: 3,
                end: 40,
                len: 5
            })
        );
    }

    #[test]
    fn splice_rejects_span_inside_multibyte_char() {
        let span = VersionSpan { start: 1, end: 2 };
        assert!(splice("ü", span, "x").is_err());
    }

    #[test]
    fn not_found_message_names_the_missing_part() {
        let err = ManifestError::NotFound(Missing::ClosingTag);
        assert_eq!(
            err.to_string(),
            "cannot find version in manifest: no </Metadata> tag"
        );
    }
}
