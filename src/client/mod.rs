//! Object storage client abstraction
//!
//! [`ObjectClient`] is the narrow set of OBS calls the adapter needs. The
//! adapter never talks to the network directly; it only composes these calls.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

use crate::error::ClientError;
use crate::types::SignMethod;
use crate::visibility::{CannedAcl, Grant};

pub mod memory;
pub mod s3;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Readable object body positioned at offset 0.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Most keys a single batch delete may carry.
pub const MAX_DELETE_BATCH: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub acl: Option<CannedAcl>,
    pub headers: HashMap<String, String>,
}

/// Result of a head lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectHead {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct CopyObjectRequest {
    pub bucket: String,
    pub source_key: String,
    pub destination_key: String,
    pub acl: Option<CannedAcl>,
}

#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: String,
    /// `None` lists every key under the prefix.
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListedObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectsPage {
    pub objects: Vec<ListedObject>,
    pub common_prefixes: Vec<String>,
    /// Present while more pages remain.
    pub next_continuation_token: Option<String>,
}

/// Outcome of a batch delete; keys that failed are reported, not raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteObjectsOutput {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct PresignRequest {
    pub bucket: String,
    pub key: String,
    pub method: SignMethod,
    pub expires_in: Duration,
    /// Extra query parameters included in the signature, e.g. `x-image-process`.
    pub query: Vec<(String, String)>,
}

/// Backend capability consumed by [`ObsAdapter`](crate::ObsAdapter).
#[async_trait]
pub trait ObjectClient: Send + Sync {
    async fn put_object(&self, request: PutObjectRequest) -> ClientResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<Bytes>;

    async fn get_object_stream(&self, bucket: &str, key: &str) -> ClientResult<ObjectReader>;

    async fn head_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectHead>;

    async fn copy_object(&self, request: CopyObjectRequest) -> ClientResult<()>;

    /// Deleting an absent key succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] keys in one request.
    async fn delete_objects(&self, bucket: &str, keys: &[String])
        -> ClientResult<DeleteObjectsOutput>;

    async fn list_objects(&self, request: ListObjectsRequest) -> ClientResult<ListObjectsPage>;

    async fn get_object_acl(&self, bucket: &str, key: &str) -> ClientResult<Vec<Grant>>;

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> ClientResult<()>;

    /// Produce a signed URL without performing the request.
    async fn presign(&self, request: PresignRequest) -> ClientResult<String>;
}
