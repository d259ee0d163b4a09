//! Error types for obsfs

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification shared by backend and adapter errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The object or prefix does not exist.
    NotFound,
    /// Credentials or ACL rejected the request.
    PermissionDenied,
    /// Network or backend failure.
    Transport,
    /// A multi-object operation failed for some of its keys.
    PartialFailure,
    /// The adapter was constructed with unusable settings.
    InvalidConfig,
}

/// Failure reported by an [`ObjectClient`](crate::client::ObjectClient) call.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("transport failure: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl ClientError {
    pub fn not_found(key: impl Into<String>) -> Self {
        ClientError::NotFound { key: key.into() }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        ClientError::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport {
            message: message.into(),
            source: None,
        }
    }

    pub fn transport_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ClientError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ClientError::Transport { .. } => ErrorKind::Transport,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

/// Which attribute a metadata getter was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    MimeType,
    FileSize,
    LastModified,
    Visibility,
    All,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::MimeType => "mime type",
            MetadataKind::FileSize => "file size",
            MetadataKind::LastModified => "last modified",
            MetadataKind::Visibility => "visibility",
            MetadataKind::All => "metadata",
        };
        f.write_str(name)
    }
}

/// One key a batch delete could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelete {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for FailedDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.reason)
    }
}

fn join_failed(failed: &[FailedDelete]) -> String {
    failed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid adapter configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid visibility: {0}")]
    InvalidVisibility(String),

    #[error("Unable to read file at {path}")]
    UnableToRead {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to write file at {path}")]
    UnableToWrite {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to copy {from} to {to}")]
    UnableToCopy {
        from: String,
        to: String,
        #[source]
        source: ClientError,
    },

    /// `copied` is true when the destination already holds a duplicate.
    #[error("Unable to move {from} to {to}")]
    UnableToMove {
        from: String,
        to: String,
        copied: bool,
        #[source]
        source: ClientError,
    },

    #[error("Unable to delete file at {path}")]
    UnableToDelete {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to delete directory at {path}")]
    UnableToDeleteDirectory {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Partially deleted directory at {path}; failed keys: {}", join_failed(.failed))]
    PartialDelete {
        path: String,
        failed: Vec<FailedDelete>,
    },

    #[error("Unable to create directory at {path}")]
    UnableToCreateDirectory {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to set visibility for file at {path}")]
    UnableToSetVisibility {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to retrieve the {kind} for file at {path}: {reason}")]
    UnableToRetrieveMetadata {
        path: String,
        kind: MetadataKind,
        reason: String,
        #[source]
        source: Option<ClientError>,
    },

    #[error("Unable to check existence for {path}")]
    UnableToCheckExistence {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to list contents of {path}")]
    UnableToList {
        path: String,
        #[source]
        source: ClientError,
    },

    #[error("Unable to generate url for {path}")]
    UnableToGenerateUrl {
        path: String,
        #[source]
        source: ClientError,
    },
}

impl Error {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    pub fn metadata(path: impl Into<String>, kind: MetadataKind, source: ClientError) -> Self {
        Error::UnableToRetrieveMetadata {
            path: path.into(),
            kind,
            reason: source.to_string(),
            source: Some(source),
        }
    }

    pub fn missing_metadata(path: impl Into<String>, kind: MetadataKind) -> Self {
        Error::UnableToRetrieveMetadata {
            path: path.into(),
            kind,
            reason: "backend response did not include it".to_string(),
            source: None,
        }
    }

    /// The backend cause, when the failure came from a client call.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Error::UnableToRead { source, .. }
            | Error::UnableToWrite { source, .. }
            | Error::UnableToCopy { source, .. }
            | Error::UnableToMove { source, .. }
            | Error::UnableToDelete { source, .. }
            | Error::UnableToDeleteDirectory { source, .. }
            | Error::UnableToCreateDirectory { source, .. }
            | Error::UnableToSetVisibility { source, .. }
            | Error::UnableToCheckExistence { source, .. }
            | Error::UnableToList { source, .. }
            | Error::UnableToGenerateUrl { source, .. } => Some(source),
            Error::UnableToRetrieveMetadata { source, .. } => source.as_ref(),
            Error::InvalidConfig(_) | Error::InvalidVisibility(_) | Error::PartialDelete { .. } => {
                None
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_) | Error::InvalidVisibility(_) => ErrorKind::InvalidConfig,
            Error::PartialDelete { .. } => ErrorKind::PartialFailure,
            Error::UnableToRetrieveMetadata { source: None, .. } => ErrorKind::Transport,
            other => other
                .client_error()
                .map(ClientError::kind)
                .unwrap_or(ErrorKind::Transport),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
