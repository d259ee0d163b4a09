//! Path normalization and root-prefix handling
//!
//! Every path handed to the adapter goes through [`normalize_path`] before it
//! becomes an object key. Keys are then placed under the adapter root by
//! [`PathPrefixer`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Separator used inside object keys.
pub const SEPARATOR: char = '/';

/// Normalize a caller supplied path into a relative key fragment.
///
/// # Normalize Rules
///
/// - `\` is treated as a separator: `a\b` => `a/b`
/// - All leading and trailing separators are trimmed: `/a/b/` => `a/b`
/// - Repeated separators collapse: `a//b` => `a/b`
/// - The root (`""`, `/`, `//`) normalizes to the empty string
pub fn normalize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Key of the zero-byte object standing in for a directory.
///
/// `a/b` => `a/b/`. The root has no marker and yields an empty string.
pub fn directory_key(normalized: &str) -> String {
    if normalized.is_empty() {
        String::new()
    } else {
        format!("{normalized}{SEPARATOR}")
    }
}

/// Whether a listed key looks like a directory marker.
pub fn is_directory_marker(key: &str, size: u64) -> bool {
    size == 0 && key.ends_with(SEPARATOR)
}

/// Characters left alone inside one key segment, as in `encodeURIComponent`.
static SEGMENT_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode an object key for use as a URL path, keeping `/`.
///
/// Segments that are exactly `.` or `..` are encoded too, so the key is
/// addressed verbatim instead of being resolved as a relative path.
pub fn percent_encode_path(key: &str) -> String {
    key.split(SEPARATOR)
        .map(|segment| match segment {
            "." => "%2E".to_string(),
            ".." => "%2E%2E".to_string(),
            _ => utf8_percent_encode(segment, &SEGMENT_ENCODE_SET).to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Applies and strips the adapter root prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    /// Normalized root, without trailing separator. Empty means bucket root.
    root: String,
}

impl PathPrefixer {
    pub fn new(root: &str) -> Self {
        Self {
            root: normalize_path(root),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Object key for a file path.
    pub fn prefix_path(&self, path: &str) -> String {
        let path = normalize_path(path);
        match (self.root.is_empty(), path.is_empty()) {
            (true, _) => path,
            (false, true) => self.root.clone(),
            (false, false) => format!("{}{SEPARATOR}{}", self.root, path),
        }
    }

    /// Listing prefix for a directory path: always ends with a separator unless
    /// it addresses the bucket root.
    pub fn prefix_directory_path(&self, path: &str) -> String {
        directory_key(&self.prefix_path(path))
    }

    /// Turn an object key back into an adapter path.
    ///
    /// Keys outside the root are returned normalized but otherwise untouched.
    pub fn strip_prefix(&self, key: &str) -> String {
        let stripped = if self.root.is_empty() {
            key
        } else {
            match key.strip_prefix(self.root.as_str()) {
                Some("") => "",
                Some(rest) if rest.starts_with(SEPARATOR) => &rest[1..],
                _ => key,
            }
        };
        normalize_path(stripped)
    }
}
