//! Core data types exchanged with adapter callers

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::visibility::Visibility;
use crate::Result;

/// Attributes of a stored object.
///
/// Listing fills `path`, `file_size` and `last_modified`; head lookups fill
/// the rest as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttributes {
    pub path: String,
    pub file_size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub mime_type: Option<String>,
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra_metadata: HashMap<String, String>,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>, file_size: u64) -> Self {
        Self {
            path: path.into(),
            file_size,
            last_modified: None,
            mime_type: None,
            visibility: None,
            extra_metadata: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryAttributes {
    pub path: String,
}

/// One item produced by `list_contents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageEntry {
    File(FileAttributes),
    #[serde(rename = "dir")]
    Directory(DirectoryAttributes),
}

impl StorageEntry {
    pub fn path(&self) -> &str {
        match self {
            StorageEntry::File(file) => &file.path,
            StorageEntry::Directory(dir) => &dir.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StorageEntry::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, StorageEntry::Directory(_))
    }
}

/// Option bag accepted by write, copy and create-directory calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteConfig {
    pub visibility: Option<Visibility>,
    /// Forces the stored content type.
    pub mime_type: Option<String>,
    /// Cache lifetime hint in seconds, stored as `Cache-Control: max-age`.
    pub expires: Option<u64>,
    /// Copy only: keep the source ACL (default) or apply `visibility`.
    pub retain_visibility: Option<bool>,
    /// Unrecognized keys, forwarded to the backend as headers or metadata.
    pub headers: HashMap<String, String>,
}

impl WriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_expires(mut self, seconds: u64) -> Self {
        self.expires = Some(seconds);
        self
    }

    pub fn with_retain_visibility(mut self, retain: bool) -> Self {
        self.retain_visibility = Some(retain);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Build from a loosely typed option map.
    ///
    /// Recognized keys: `visibility`, `mimetype` / `ContentType`, `Expires`,
    /// `retain_visibility`. Everything else is kept as a passthrough header.
    pub fn from_map(map: HashMap<String, String>) -> Result<Self> {
        let mut cfg = WriteConfig::default();

        for (key, value) in map {
            match key.as_str() {
                "visibility" => cfg.visibility = Some(value.parse()?),
                "mimetype" | "ContentType" => cfg.mime_type = Some(value),
                "Expires" => {
                    let seconds = value.trim().parse::<u64>().map_err(|_| {
                        Error::invalid_config(format!("Expires must be seconds, got {value}"))
                    })?;
                    cfg.expires = Some(seconds);
                }
                "retain_visibility" => cfg.retain_visibility = Some(parse_flag(&key, &value)?),
                _ => {
                    cfg.headers.insert(key, value);
                }
            }
        }

        Ok(cfg)
    }
}

pub(crate) fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_config(format!(
            "{key} must be a boolean, got {value}"
        ))),
    }
}

/// HTTP method a presigned URL is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignMethod {
    #[default]
    Get,
    Put,
    Head,
    Delete,
}

impl SignMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignMethod::Get => "GET",
            SignMethod::Put => "PUT",
            SignMethod::Head => "HEAD",
            SignMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for SignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(SignMethod::Get),
            "PUT" => Ok(SignMethod::Put),
            "HEAD" => Ok(SignMethod::Head),
            "DELETE" => Ok(SignMethod::Delete),
            other => Err(Error::invalid_config(format!(
                "unsupported signing method: {other}"
            ))),
        }
    }
}
