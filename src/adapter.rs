//! Huawei Cloud OBS filesystem adapter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use tokio::io::AsyncReadExt;

use crate::client::{
    ClientResult, CopyObjectRequest, ListObjectsRequest, ObjectClient, ObjectHead, ObjectReader,
    PresignRequest, PutObjectRequest, MAX_DELETE_BATCH,
};
use crate::config::AdapterConfig;
use crate::error::{ClientError, Error, FailedDelete, MetadataKind};
use crate::filesystem::FilesystemAdapter;
use crate::links::LinkBuilder;
use crate::listing::list_entries;
use crate::path::{normalize_path, PathPrefixer};
use crate::types::{FileAttributes, SignMethod, StorageEntry, WriteConfig};
use crate::visibility::{visibility_from_grants, Visibility};
use crate::Result;

/// Filesystem view over one OBS bucket.
pub struct ObsAdapter {
    client: Arc<dyn ObjectClient>,
    config: AdapterConfig,
    prefixer: PathPrefixer,
    links: LinkBuilder,
}

impl ObsAdapter {
    /// Build an adapter. Validates configuration only; no request is sent.
    pub fn new(client: Arc<dyn ObjectClient>, config: AdapterConfig) -> Result<Self> {
        config.signature.ensure_supported()?;
        let links = LinkBuilder::new(&config)?;
        let prefixer = PathPrefixer::new(config.prefix.as_deref().unwrap_or_default());

        tracing::debug!(
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            root = %prefixer.root(),
            signature = %config.signature,
            "OBS adapter configured"
        );

        Ok(Self {
            client,
            config,
            prefixer,
            links,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    pub fn client(&self) -> &Arc<dyn ObjectClient> {
        &self.client
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn key(&self, path: &str) -> String {
        self.prefixer.prefix_path(path)
    }

    async fn head(&self, path: &str, kind: MetadataKind) -> Result<ObjectHead> {
        let key = self.key(path);
        tracing::debug!(%key, %kind, "head object");
        self.client
            .head_object(self.bucket(), &key)
            .await
            .map_err(|source| Error::metadata(path, kind, source))
    }

    /// Every attribute of one object: a head lookup plus its ACL.
    pub async fn metadata(&self, path: &str) -> Result<FileAttributes> {
        let head = self.head(path, MetadataKind::All).await?;
        let visibility = self.visibility(path).await?;

        let mut attributes = FileAttributes::new(normalize_path(path), head.content_length);
        attributes.last_modified = head.last_modified;
        attributes.mime_type = head.content_type;
        attributes.visibility = Some(visibility);
        attributes.extra_metadata = head.metadata;
        Ok(attributes)
    }

    /// Presigned URL for `method`, signed over `query` as well.
    pub async fn sign_url(
        &self,
        path: &str,
        expires_in: Duration,
        query: &[(String, String)],
        method: SignMethod,
    ) -> Result<String> {
        let key = self.key(path);
        tracing::debug!(%key, %method, expires_in = expires_in.as_secs(), "presign");

        self.client
            .presign(PresignRequest {
                bucket: self.bucket().to_string(),
                key,
                method,
                expires_in,
                query: query.to_vec(),
            })
            .await
            .map_err(|source| Error::UnableToGenerateUrl {
                path: path.to_string(),
                source,
            })
    }

    fn resolve_visibility(&self, config: &WriteConfig) -> Visibility {
        config.visibility.unwrap_or(self.config.default_visibility)
    }

    async fn put(&self, path: &str, key: String, body: Bytes, config: &WriteConfig) -> ClientResult<()> {
        if key.is_empty() {
            return Err(ClientError::transport(format!(
                "{path:?} resolves to the bucket root"
            )));
        }

        let content_type = config
            .mime_type
            .clone()
            .or_else(|| mime_guess::from_path(&key).first_raw().map(str::to_string));

        tracing::debug!(
            %key,
            bytes = body.len(),
            content_type = content_type.as_deref().unwrap_or("<backend default>"),
            "put object"
        );

        self.client
            .put_object(PutObjectRequest {
                bucket: self.bucket().to_string(),
                key,
                body,
                content_type,
                cache_control: config.expires.map(|seconds| format!("max-age={seconds}")),
                acl: Some(self.resolve_visibility(config).canned_acl()),
                headers: config.headers.clone(),
            })
            .await
    }

    /// Every key under a directory prefix, across all pages.
    async fn collect_keys(&self, prefix: &str) -> ClientResult<Vec<String>> {
        let mut request = ListObjectsRequest {
            bucket: self.bucket().to_string(),
            prefix: prefix.to_string(),
            ..Default::default()
        };
        let mut keys = Vec::new();

        loop {
            let page = self.client.list_objects(request.clone()).await?;
            keys.extend(page.objects.into_iter().map(|object| object.key));
            match page.next_continuation_token {
                Some(token) => request.continuation_token = Some(token),
                None => return Ok(keys),
            }
        }
    }

    async fn copy_keys(&self, source: &str, destination: &str, config: &WriteConfig) -> ClientResult<()> {
        let source_key = self.key(source);
        let destination_key = self.key(destination);

        let acl = if config.retain_visibility.unwrap_or(true) {
            let grants = self.client.get_object_acl(self.bucket(), &source_key).await?;
            visibility_from_grants(&grants).canned_acl()
        } else {
            self.resolve_visibility(config).canned_acl()
        };

        tracing::debug!(%source_key, %destination_key, acl = acl.as_str(), "copy object");

        self.client
            .copy_object(CopyObjectRequest {
                bucket: self.bucket().to_string(),
                source_key,
                destination_key,
                acl: Some(acl),
            })
            .await
    }
}

#[async_trait]
impl FilesystemAdapter for ObsAdapter {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        let key = self.key(path);
        if key.is_empty() {
            return Ok(false);
        }

        match self.client.head_object(self.bucket(), &key).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(source) => Err(Error::UnableToCheckExistence {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn directory_exists(&self, path: &str) -> Result<bool> {
        let request = ListObjectsRequest {
            bucket: self.bucket().to_string(),
            prefix: self.prefixer.prefix_directory_path(path),
            delimiter: None,
            continuation_token: None,
            max_keys: Some(1),
        };

        match self.client.list_objects(request).await {
            Ok(page) => Ok(!page.objects.is_empty() || !page.common_prefixes.is_empty()),
            Err(err) if err.is_not_found() => Ok(false),
            Err(source) => Err(Error::UnableToCheckExistence {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn write(&self, path: &str, contents: Bytes, config: &WriteConfig) -> Result<()> {
        self.put(path, self.key(path), contents, config)
            .await
            .map_err(|source| Error::UnableToWrite {
                path: path.to_string(),
                source,
            })
    }

    async fn write_stream(
        &self,
        path: &str,
        mut contents: ObjectReader,
        config: &WriteConfig,
    ) -> Result<()> {
        let mut buf = Vec::new();
        contents
            .read_to_end(&mut buf)
            .await
            .map_err(|err| Error::UnableToWrite {
                path: path.to_string(),
                source: ClientError::transport_with("failed to read source stream", err),
            })?;

        self.write(path, Bytes::from(buf), config).await
    }

    async fn read(&self, path: &str) -> Result<Bytes> {
        let key = self.key(path);
        tracing::debug!(%key, "get object");
        self.client
            .get_object(self.bucket(), &key)
            .await
            .map_err(|source| Error::UnableToRead {
                path: path.to_string(),
                source,
            })
    }

    async fn read_stream(&self, path: &str) -> Result<ObjectReader> {
        let key = self.key(path);
        tracing::debug!(%key, "get object stream");
        self.client
            .get_object_stream(self.bucket(), &key)
            .await
            .map_err(|source| Error::UnableToRead {
                path: path.to_string(),
                source,
            })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let key = self.key(path);
        tracing::debug!(%key, "delete object");
        self.client
            .delete_object(self.bucket(), &key)
            .await
            .map_err(|source| Error::UnableToDelete {
                path: path.to_string(),
                source,
            })
    }

    async fn delete_directory(&self, path: &str) -> Result<()> {
        let prefix = self.prefixer.prefix_directory_path(path);
        let keys = self
            .collect_keys(&prefix)
            .await
            .map_err(|source| Error::UnableToDeleteDirectory {
                path: path.to_string(),
                source,
            })?;

        if keys.is_empty() {
            tracing::debug!(%prefix, "directory already empty");
            return Ok(());
        }

        let mut failed = Vec::new();
        let mut deleted = 0;
        let mut batches = keys.chunks(MAX_DELETE_BATCH);

        while let Some(batch) = batches.next() {
            match self.client.delete_objects(self.bucket(), batch).await {
                Ok(output) => {
                    deleted += output.deleted.len();
                    failed.extend(
                        output
                            .failed
                            .into_iter()
                            .map(|(key, reason)| FailedDelete { key, reason }),
                    );
                }
                Err(source) if deleted == 0 && failed.is_empty() => {
                    return Err(Error::UnableToDeleteDirectory {
                        path: path.to_string(),
                        source,
                    });
                }
                Err(source) => {
                    let reason = source.to_string();
                    failed.extend(
                        batch
                            .iter()
                            .chain(batches.by_ref().flatten())
                            .map(|key| FailedDelete {
                                key: key.clone(),
                                reason: reason.clone(),
                            }),
                    );
                    break;
                }
            }
        }

        tracing::debug!(%prefix, deleted, failed = failed.len(), "deleted directory");

        if failed.is_empty() {
            Ok(())
        } else {
            tracing::warn!(%prefix, failed = failed.len(), "directory delete left objects behind");
            Err(Error::PartialDelete {
                path: path.to_string(),
                failed,
            })
        }
    }

    async fn create_directory(&self, path: &str, config: &WriteConfig) -> Result<()> {
        let key = self.prefixer.prefix_directory_path(path);
        if key.is_empty() {
            return Ok(());
        }

        let marker = WriteConfig {
            mime_type: None,
            ..config.clone()
        };
        self.put(path, key, Bytes::new(), &marker)
            .await
            .map_err(|source| Error::UnableToCreateDirectory {
                path: path.to_string(),
                source,
            })
    }

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let key = self.key(path);
        tracing::debug!(%key, %visibility, "put object acl");
        self.client
            .put_object_acl(self.bucket(), &key, visibility.canned_acl())
            .await
            .map_err(|source| Error::UnableToSetVisibility {
                path: path.to_string(),
                source,
            })
    }

    async fn visibility(&self, path: &str) -> Result<Visibility> {
        let key = self.key(path);
        tracing::debug!(%key, "get object acl");
        let grants = self
            .client
            .get_object_acl(self.bucket(), &key)
            .await
            .map_err(|source| Error::metadata(path, MetadataKind::Visibility, source))?;
        Ok(visibility_from_grants(&grants))
    }

    async fn mime_type(&self, path: &str) -> Result<String> {
        self.head(path, MetadataKind::MimeType)
            .await?
            .content_type
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::missing_metadata(path, MetadataKind::MimeType))
    }

    async fn last_modified(&self, path: &str) -> Result<DateTime<Utc>> {
        self.head(path, MetadataKind::LastModified)
            .await?
            .last_modified
            .ok_or_else(|| Error::missing_metadata(path, MetadataKind::LastModified))
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        Ok(self.head(path, MetadataKind::FileSize).await?.content_length)
    }

    fn list_contents(&self, path: &str, deep: bool) -> BoxStream<'static, Result<StorageEntry>> {
        list_entries(
            self.client.clone(),
            self.bucket().to_string(),
            self.prefixer.clone(),
            path,
            deep,
        )
    }

    async fn copy(&self, source: &str, destination: &str, config: &WriteConfig) -> Result<()> {
        self.copy_keys(source, destination, config)
            .await
            .map_err(|err| Error::UnableToCopy {
                from: source.to_string(),
                to: destination.to_string(),
                source: err,
            })
    }

    async fn move_file(
        &self,
        source: &str,
        destination: &str,
        config: &WriteConfig,
    ) -> Result<()> {
        if self.key(source) == self.key(destination) {
            return Ok(());
        }

        let move_error = |copied: bool, err: ClientError| Error::UnableToMove {
            from: source.to_string(),
            to: destination.to_string(),
            copied,
            source: err,
        };

        self.copy_keys(source, destination, config)
            .await
            .map_err(|err| move_error(false, err))?;

        if let Err(err) = self.client.delete_object(self.bucket(), &self.key(source)).await {
            tracing::warn!(%source, %destination, error = %err, "copied but could not delete source");
            return Err(move_error(true, err));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.links.public_url(&self.key(path))
    }

    async fn temporary_url(
        &self,
        path: &str,
        expires_in: Duration,
        query: &[(String, String)],
    ) -> Result<String> {
        let signed = self.sign_url(path, expires_in, query, SignMethod::Get).await?;
        self.links
            .graft_signed(&self.key(path), &signed)
            .map_err(|err| Error::UnableToGenerateUrl {
                path: path.to_string(),
                source: ClientError::transport_with("backend returned an invalid signed url", err),
            })
    }
}

impl std::fmt::Debug for ObsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObsAdapter")
            .field("bucket", &self.config.bucket)
            .field("endpoint", &self.config.endpoint)
            .field("root", &self.prefixer.root())
            .finish()
    }
}

