//! Filesystem adapter contract
//!
//! The operations a filesystem facade needs from a storage backend. Existence
//! checks report absence as `Ok(false)`; every other operation reports failure
//! as an [`Error`](crate::Error).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::client::ObjectReader;
use crate::types::{StorageEntry, WriteConfig};
use crate::visibility::Visibility;
use crate::Result;

#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    async fn file_exists(&self, path: &str) -> Result<bool>;

    async fn directory_exists(&self, path: &str) -> Result<bool>;

    async fn write(&self, path: &str, contents: Bytes, config: &WriteConfig) -> Result<()>;

    async fn write_stream(
        &self,
        path: &str,
        contents: ObjectReader,
        config: &WriteConfig,
    ) -> Result<()>;

    /// Missing files are an error, never empty content.
    async fn read(&self, path: &str) -> Result<Bytes>;

    async fn read_stream(&self, path: &str) -> Result<ObjectReader>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Removes every object under `path`. An absent directory is not an error.
    async fn delete_directory(&self, path: &str) -> Result<()>;

    async fn create_directory(&self, path: &str, config: &WriteConfig) -> Result<()>;

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()>;

    async fn visibility(&self, path: &str) -> Result<Visibility>;

    async fn mime_type(&self, path: &str) -> Result<String>;

    async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>>;

    async fn file_size(&self, path: &str) -> Result<u64>;

    /// Lazy listing; pagination stays internal. Calling again restarts it.
    fn list_contents(&self, path: &str, deep: bool) -> BoxStream<'static, Result<StorageEntry>>;

    async fn copy(&self, source: &str, destination: &str, config: &WriteConfig) -> Result<()>;

    /// Copy followed by delete of the source. Not atomic.
    async fn move_file(&self, source: &str, destination: &str, config: &WriteConfig)
        -> Result<()>;

    /// Unsigned link; performs no request.
    fn public_url(&self, path: &str) -> String;

    async fn temporary_url(
        &self,
        path: &str,
        expires_in: Duration,
        query: &[(String, String)],
    ) -> Result<String>;
}
