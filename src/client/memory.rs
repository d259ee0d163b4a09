//! In-process object client
//!
//! Mirrors the OBS semantics the adapter depends on: flat keys, delimiter
//! grouping, continuation tokens, canned ACLs and presigned URLs. Faults can be
//! injected per operation and key to exercise failure paths.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use url::form_urlencoded;

use super::{
    ClientResult, CopyObjectRequest, DeleteObjectsOutput, ListObjectsPage, ListObjectsRequest,
    ListedObject, ObjectClient, ObjectHead, ObjectReader, PresignRequest, PutObjectRequest,
    MAX_DELETE_BATCH,
};
use crate::error::ClientError;
use crate::path::percent_encode_path;
use crate::visibility::{grants_for, CannedAcl, Grant};

/// Content type OBS reports when none was stored.
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

const DEFAULT_PAGE_SIZE: usize = 1000;
const OWNER: &str = "memory-owner";

/// Client call kinds faults can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    Get,
    Head,
    Copy,
    Delete,
    /// A whole batch delete request, keyed on the first key of the batch.
    DeleteBatch,
    List,
    GetAcl,
    PutAcl,
    Presign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    PermissionDenied,
    Transport,
}

impl Fault {
    fn to_error(self, key: &str) -> ClientError {
        match self {
            Fault::PermissionDenied => ClientError::permission_denied(format!("AccessDenied: {key}")),
            Fault::Transport => ClientError::transport(format!("injected failure for {key}")),
        }
    }
}

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: String,
    cache_control: Option<String>,
    last_modified: DateTime<Utc>,
    metadata: HashMap<String, String>,
    grants: Vec<Grant>,
}

#[derive(Debug)]
pub struct MemoryClient {
    host: String,
    page_size: usize,
    buckets: RwLock<HashMap<String, BTreeMap<String, MemoryObject>>>,
    faults: RwLock<HashMap<(Operation, String), Fault>>,
    requests: AtomicUsize,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClient {
    pub fn new() -> Self {
        Self {
            host: "obs.memory.local".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            buckets: RwLock::new(HashMap::new()),
            faults: RwLock::new(HashMap::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Cap every listing page at `page_size` entries.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make `operation` fail for exactly `key` (or listing `prefix`).
    pub async fn inject_fault(&self, operation: Operation, key: impl Into<String>, fault: Fault) {
        self.faults
            .write()
            .await
            .insert((operation, key.into()), fault);
    }

    pub async fn clear_faults(&self) {
        self.faults.write().await.clear();
    }

    /// Replace the ACL of an existing object with arbitrary grants.
    pub async fn set_grants(&self, bucket: &str, key: &str, grants: Vec<Grant>) -> ClientResult<()> {
        let mut buckets = self.buckets.write().await;
        let object = buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
            .ok_or_else(|| ClientError::not_found(key))?;
        object.grants = grants;
        Ok(())
    }

    /// Keys currently stored in `bucket`, in order.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of client calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn check(&self, operation: Operation, key: &str) -> ClientResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.faults.read().await.get(&(operation, key.to_string())) {
            Some(fault) => Err(fault.to_error(key)),
            None => Ok(()),
        }
    }

    async fn object(&self, bucket: &str, key: &str) -> ClientResult<MemoryObject> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| ClientError::not_found(key))
    }
}

enum Resume {
    Start,
    AfterKey(String),
    AfterPrefix(String),
}

impl Resume {
    fn parse(token: Option<&str>) -> ClientResult<Self> {
        let Some(token) = token else {
            return Ok(Resume::Start);
        };
        if let Some(key) = token.strip_prefix("k:") {
            Ok(Resume::AfterKey(key.to_string()))
        } else if let Some(prefix) = token.strip_prefix("p:") {
            Ok(Resume::AfterPrefix(prefix.to_string()))
        } else {
            Err(ClientError::transport(format!(
                "invalid continuation token: {token}"
            )))
        }
    }

    fn skips(&self, key: &str) -> bool {
        match self {
            Resume::Start => false,
            Resume::AfterKey(after) => key <= after.as_str(),
            Resume::AfterPrefix(prefix) => key < prefix.as_str() || key.starts_with(prefix.as_str()),
        }
    }
}

fn list_page(
    objects: &BTreeMap<String, MemoryObject>,
    request: &ListObjectsRequest,
    page_size: usize,
) -> ClientResult<ListObjectsPage> {
    let resume = Resume::parse(request.continuation_token.as_deref())?;
    let limit = request.max_keys.unwrap_or(page_size).min(page_size).max(1);
    let prefix = request.prefix.as_str();

    let mut page = ListObjectsPage::default();
    let mut taken = 0;
    let mut last_token = None;

    for (key, object) in objects.range(prefix.to_string()..) {
        if !key.starts_with(prefix) {
            break;
        }
        if resume.skips(key) {
            continue;
        }

        let rest = &key[prefix.len()..];
        let common_prefix = request
            .delimiter
            .as_deref()
            .filter(|d| !d.is_empty())
            .and_then(|d| rest.find(d).map(|idx| format!("{prefix}{}", &rest[..idx + d.len()])));

        if let Some(cp) = &common_prefix {
            if page.common_prefixes.last() == Some(cp) {
                continue;
            }
        }

        if taken == limit {
            page.next_continuation_token = last_token;
            return Ok(page);
        }
        taken += 1;

        match common_prefix {
            Some(cp) => {
                last_token = Some(format!("p:{cp}"));
                page.common_prefixes.push(cp);
            }
            None => {
                last_token = Some(format!("k:{key}"));
                page.objects.push(ListedObject {
                    key: key.clone(),
                    size: object.data.len() as u64,
                    last_modified: Some(object.last_modified),
                });
            }
        }
    }

    Ok(page)
}

fn signature(request: &PresignRequest, expires: i64) -> String {
    let mut hasher = DefaultHasher::new();
    request.bucket.hash(&mut hasher);
    request.key.hash(&mut hasher);
    request.method.as_str().hash(&mut hasher);
    request.query.hash(&mut hasher);
    expires.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[async_trait]
impl ObjectClient for MemoryClient {
    async fn put_object(&self, request: PutObjectRequest) -> ClientResult<()> {
        self.check(Operation::Put, &request.key).await?;

        let object = MemoryObject {
            data: request.body,
            content_type: request
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            cache_control: request.cache_control,
            last_modified: Utc::now(),
            metadata: request.headers,
            grants: grants_for(request.acl.unwrap_or(CannedAcl::Private), OWNER),
        };

        self.buckets
            .write()
            .await
            .entry(request.bucket)
            .or_default()
            .insert(request.key, object);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<Bytes> {
        self.check(Operation::Get, key).await?;
        Ok(self.object(bucket, key).await?.data)
    }

    async fn get_object_stream(&self, bucket: &str, key: &str) -> ClientResult<ObjectReader> {
        self.check(Operation::Get, key).await?;
        let data = self.object(bucket, key).await?.data;
        Ok(Box::pin(Cursor::new(data)))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectHead> {
        self.check(Operation::Head, key).await?;
        let object = self.object(bucket, key).await?;

        let mut metadata = object.metadata;
        if let Some(cache_control) = object.cache_control {
            metadata.insert("Cache-Control".to_string(), cache_control);
        }

        Ok(ObjectHead {
            content_length: object.data.len() as u64,
            content_type: Some(object.content_type),
            last_modified: Some(object.last_modified),
            metadata,
        })
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> ClientResult<()> {
        self.check(Operation::Copy, &request.source_key).await?;
        let mut object = self.object(&request.bucket, &request.source_key).await?;

        object.last_modified = Utc::now();
        object.grants = grants_for(request.acl.unwrap_or(CannedAcl::Private), OWNER);

        self.buckets
            .write()
            .await
            .entry(request.bucket)
            .or_default()
            .insert(request.destination_key, object);
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        self.check(Operation::Delete, key).await?;
        if let Some(objects) = self.buckets.write().await.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> ClientResult<DeleteObjectsOutput> {
        if keys.len() > MAX_DELETE_BATCH {
            return Err(ClientError::transport(format!(
                "batch delete accepts at most {MAX_DELETE_BATCH} keys, got {}",
                keys.len()
            )));
        }
        self.check(
            Operation::DeleteBatch,
            keys.first().map(String::as_str).unwrap_or_default(),
        )
        .await?;

        let faults = self.faults.read().await;
        let mut buckets = self.buckets.write().await;
        let mut output = DeleteObjectsOutput::default();

        for key in keys {
            if let Some(fault) = faults.get(&(Operation::Delete, key.clone())) {
                output
                    .failed
                    .push((key.clone(), fault.to_error(key).to_string()));
                continue;
            }
            if let Some(objects) = buckets.get_mut(bucket) {
                objects.remove(key);
            }
            output.deleted.push(key.clone());
        }

        Ok(output)
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> ClientResult<ListObjectsPage> {
        self.check(Operation::List, &request.prefix).await?;
        let buckets = self.buckets.read().await;
        match buckets.get(&request.bucket) {
            Some(objects) => list_page(objects, &request, self.page_size),
            None => Ok(ListObjectsPage::default()),
        }
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> ClientResult<Vec<Grant>> {
        self.check(Operation::GetAcl, key).await?;
        Ok(self.object(bucket, key).await?.grants)
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> ClientResult<()> {
        self.check(Operation::PutAcl, key).await?;
        self.set_grants(bucket, key, grants_for(acl, OWNER)).await
    }

    async fn presign(&self, request: PresignRequest) -> ClientResult<String> {
        self.check(Operation::Presign, &request.key).await?;

        let expires = Utc::now().timestamp() + request.expires_in.as_secs() as i64;
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &request.query {
            query.append_pair(name, value);
        }
        query
            .append_pair("AccessKeyId", "memory")
            .append_pair("Expires", &expires.to_string())
            .append_pair("Signature", &signature(&request, expires));

        Ok(format!(
            "https://{}.{}/{}?{}",
            request.bucket,
            self.host,
            percent_encode_path(&request.key),
            query.finish()
        ))
    }
}
