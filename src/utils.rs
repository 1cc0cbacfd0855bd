//! Text and path helpers shared by the normalizer, resolver, and session.

use crate::types::VideoFileName;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Final path component of a path-like reference.
///
/// Both `/` and `\` separate components. Returns `None` when the reference is
/// blank or ends in a separator.
pub fn video_file_name(reference: &str) -> Option<VideoFileName> {
    let trimmed = reference.trim();
    let name = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Split a file name into `(stem, extension)` at the last dot.
///
/// A leading dot (`.hidden`) does not start an extension.
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => (&file_name[..pos], Some(&file_name[pos + 1..])),
        _ => (file_name, None),
    }
}

/// File name with `marker` inserted before its extension.
///
/// Returns `None` when the stem already ends with the marker.
pub fn converted_variant(file_name: &str, marker: &str) -> Option<VideoFileName> {
    let (stem, ext) = split_extension(file_name);
    if marker.is_empty() || stem.ends_with(marker) {
        return None;
    }
    Some(match ext {
        Some(ext) => format!("{stem}{marker}.{ext}"),
        None => format!("{stem}{marker}"),
    })
}

/// Trimmed text when it is non-empty.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
