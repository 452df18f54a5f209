//! Filename derivation, extension repair, and folder naming for downloads.
//!
//! A download's name comes from, in order:
//! 1. an explicit filename supplied by the page parser
//! 2. the `Content-Disposition` header
//! 3. the last path segment of the image URL
//!
//! The result is sanitized and, if its extension is not an image
//! extension, gets one appended from the `Content-Type`.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::constants::{IMAGE_EXTENSIONS, UNTITLED_FOLDER};
use super::content::ContentDescriptor;

/// Name used when neither header nor URL yields anything.
const FALLBACK_STEM: &str = "image";

/// `stem (N)` as produced by [`next_candidate_name`].
#[allow(clippy::expect_used)]
static COUNTER_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<stem>.*?)\s*\((?P<n>\d+)\)$").expect("suffix regex is valid")
});

/// Derives the on-disk filename for an accepted image.
#[must_use]
pub fn derive_filename(url: &str, explicit: Option<&str>, content: &ContentDescriptor) -> String {
    let raw = explicit
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| {
            content
                .content_disposition
                .as_deref()
                .and_then(parse_content_disposition)
        })
        .unwrap_or_else(|| filename_from_url(url));

    let name = sanitize_filename(raw.trim());
    let name = if name.trim_matches('_').is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        name
    };

    repair_extension(&name, content)
}

/// Parses a `Content-Disposition` value into a filename.
///
/// The RFC 5987 form (`filename*=UTF-8''...`) wins over the quoted form.
/// Its trailing extension is dropped; [`repair_extension`] puts one back
/// from the `Content-Type`.
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let decoded = percent_decode(encoded[..end].trim());
            let stem = match decoded.rsplit_once('.') {
                Some((stem, _)) => stem.to_string(),
                None => decoded,
            };
            if !stem.trim().is_empty() {
                return Some(stem);
            }
        }
    }

    let pos = header.find("filename=")?;
    let value = header[pos + 9..].trim();
    let name = if let Some(stripped) = value.strip_prefix('"') {
        let end = stripped.find('"')?;
        &stripped[..end]
    } else {
        let end = value.find(';').unwrap_or(value.len());
        value[..end].trim()
    };

    (!name.is_empty()).then(|| percent_decode(name))
}

/// Last non-empty path segment of the URL, percent-decoded.
pub(crate) fn filename_from_url(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    segment.map_or_else(|| FALLBACK_STEM.to_string(), |s| percent_decode(&s))
}

/// Appends the `Content-Type` extension when the name lacks an image extension.
///
/// A name without any dot counts as having an unrecognized extension.
#[must_use]
pub fn repair_extension(name: &str, content: &ContentDescriptor) -> String {
    let recognized = split_extension(name)
        .1
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if recognized {
        return name.to_string();
    }

    match content.extension() {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}

/// Splits `name.ext` into stem and extension. Leading dots do not start an extension.
pub(crate) fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Next candidate after a collision: `cat.jpg` -> `cat (2).jpg` -> `cat (3).jpg`.
#[must_use]
pub fn next_candidate_name(name: &str) -> String {
    let (stem, ext) = split_extension(name);

    let (base, number) = match COUNTER_SUFFIX.captures(stem) {
        Some(caps) => match caps["n"].parse::<u32>().ok().and_then(|n| n.checked_add(1)) {
            Some(next) => (caps["stem"].trim_end().to_string(), next),
            None => (stem.trim_end().to_string(), 2),
        },
        None => (stem.trim_end().to_string(), 2),
    };

    match ext {
        Some(ext) => format!("{base} ({number}).{ext}"),
        None => format!("{base} ({number})"),
    }
}

/// Turns a page title into an organizing folder name.
///
/// Strips ASCII punctuation and surrounding whitespace; an absent or
/// emptied title becomes [`UNTITLED_FOLDER`].
#[must_use]
pub fn sanitize_folder_name(title: Option<&str>) -> String {
    let cleaned: String = title
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        UNTITLED_FOLDER.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

fn percent_decode(value: &str) -> String {
    urlencoding::decode(value).map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned)
}
