//! Marker-delimited managed section of a shared document.
//!
//! The marker must be a non-empty single line. An empty marker never matches.

/// A document split at the first marker occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// Everything before the first marker, untrimmed.
    pub prefix: &'a [u8],
    /// Everything from the first marker to end-of-file, if the marker exists.
    pub managed: Option<&'a [u8]>,
}

impl Section<'_> {
    /// The prefix with trailing whitespace and newlines removed.
    pub fn preserved_prefix(&self) -> &[u8] {
        self.prefix.trim_ascii_end()
    }

    pub fn has_managed(&self) -> bool {
        self.managed.is_some()
    }
}

/// Result of stripping the managed section from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripOutcome {
    /// The remaining user content to write back.
    Write(Vec<u8>),
    /// Nothing but whitespace remains; the caller deletes the file.
    Delete,
}

/// Byte offset of the first occurrence of `marker` in `content`.
pub fn find_marker(content: &[u8], marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || marker.len() > content.len() {
        return None;
    }
    content
        .windows(marker.len())
        .position(|window| window == marker)
}

/// Split a document (or its absence) at the first marker occurrence.
pub fn split<'a>(existing: Option<&'a [u8]>, marker: &str) -> Section<'a> {
    let Some(content) = existing else {
        return Section {
            prefix: &[],
            managed: None,
        };
    };

    match find_marker(content, marker.as_bytes()) {
        Some(offset) => Section {
            prefix: &content[..offset],
            managed: Some(&content[offset..]),
        },
        None => Section {
            prefix: content,
            managed: None,
        },
    }
}

/// Produce the new document bytes with `managed` as the tool-owned suffix.
///
/// The user prefix is everything before the first marker (the whole file if
/// the marker is absent, nothing if the file is absent), with trailing
/// whitespace trimmed. The result is `prefix + "\n" + managed`, or just
/// `managed` for an empty prefix. If `managed` does not already begin with
/// the marker, a marker line is prepended so the section stays findable.
///
/// Merging the same content twice yields identical bytes.
pub fn merge(existing: Option<&[u8]>, marker: &str, managed: &str) -> Vec<u8> {
    let section = split(existing, marker);
    let prefix = section.preserved_prefix();

    let mut out = Vec::with_capacity(prefix.len() + managed.len() + marker.len() + 2);
    if !prefix.is_empty() {
        out.extend_from_slice(prefix);
        out.push(b'\n');
    }
    if !managed.starts_with(marker) {
        out.extend_from_slice(marker.as_bytes());
        out.push(b'\n');
    }
    out.extend_from_slice(managed.as_bytes());
    out
}

/// Remove the managed section, keeping only the trimmed user prefix.
///
/// Uses the same prefix computation as [`merge`]. When the remaining prefix
/// is empty the caller should delete the file rather than write empty bytes.
pub fn strip(existing: &[u8], marker: &str) -> StripOutcome {
    let section = split(Some(existing), marker);
    let prefix = section.preserved_prefix();
    if prefix.is_empty() {
        StripOutcome::Delete
    } else {
        StripOutcome::Write(prefix.to_vec())
    }
}
