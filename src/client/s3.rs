//! OBS client over the S3-compatible API

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SdkDateTime};
use aws_sdk_s3::types::{
    Delete, MetadataDirective, ObjectCannedAcl, ObjectIdentifier, Permission as SdkPermission,
    Type as GranteeType,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use url::form_urlencoded;

use super::{
    ClientResult, CopyObjectRequest, DeleteObjectsOutput, ListObjectsPage, ListObjectsRequest,
    ListedObject, ObjectClient, ObjectHead, ObjectReader, PresignRequest, PutObjectRequest,
};
use crate::config::SignatureScheme;
use crate::error::ClientError;
use crate::path::percent_encode_path;
use crate::types::SignMethod;
use crate::visibility::{CannedAcl, Grant, Grantee, Permission};

/// Connection settings for [`S3ObjectClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub key: Option<String>,
    pub secret: Option<String>,
    /// Endpoint with or without scheme, e.g. `obs.cn-east-3.myhuaweicloud.com`.
    pub endpoint: String,
    /// Inferred from the endpoint when empty.
    pub region: Option<String>,
    pub path_style: bool,
    pub signature: SignatureScheme,
}

/// Region embedded in a standard OBS endpoint: `obs.<region>.myhuaweicloud.com`.
pub fn region_from_endpoint(endpoint: &str) -> Option<String> {
    let host = endpoint
        .split("://")
        .last()
        .unwrap_or(endpoint)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();

    let region = host
        .strip_prefix("obs.")?
        .strip_suffix(".myhuaweicloud.com")?;
    (!region.is_empty() && !region.contains('.')).then(|| region.to_string())
}

fn endpoint_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}

/// [`ObjectClient`] backed by `aws-sdk-s3`.
pub struct S3ObjectClient {
    client: Client,
}

impl S3ObjectClient {
    pub async fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ClientError::transport("OBS endpoint must be specified"));
        }
        config
            .signature
            .ensure_supported()
            .map_err(|err| ClientError::transport(err.to_string()))?;

        let region = config
            .region
            .clone()
            .filter(|r| !r.trim().is_empty())
            .or_else(|| region_from_endpoint(&config.endpoint))
            .unwrap_or_else(|| "cn-north-4".to_string());

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url(&config.endpoint))
            .force_path_style(config.path_style);

        if let (Some(key), Some(secret)) = (config.key.as_ref(), config.secret.as_ref()) {
            builder = builder.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "obsfs-static",
            ));
        }

        tracing::debug!(endpoint = %config.endpoint, %region, path_style = config.path_style, "OBS client configured");

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

fn map_sdk_error<E>(key: &str, err: SdkError<E, HttpResponse>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|resp| resp.status().as_u16());
    let code = err.code().map(str::to_string);

    match (status, code.as_deref()) {
        (Some(404), _) | (_, Some("NoSuchKey")) | (_, Some("NotFound")) => {
            ClientError::not_found(key)
        }
        (Some(403), _) | (_, Some("AccessDenied")) => ClientError::permission_denied(format!(
            "{key}: {}",
            code.unwrap_or_else(|| "AccessDenied".to_string())
        )),
        _ => {
            let message = format!("{key}: {}", DisplayErrorContext(&err));
            ClientError::transport_with(message, err)
        }
    }
}

fn to_chrono(value: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn canned(acl: CannedAcl) -> ObjectCannedAcl {
    match acl {
        CannedAcl::Private => ObjectCannedAcl::Private,
        CannedAcl::PublicRead => ObjectCannedAcl::PublicRead,
    }
}

fn query_string(query: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

/// `bucket/key` with every key segment percent-encoded, as
/// `x-amz-copy-source` expects.
fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}/{}", percent_encode_path(key))
}

/// Presign one fluent builder, grafting extra query parameters onto the
/// request before it is signed so they are covered by the signature.
macro_rules! presign_with_query {
    ($builder:expr, $config:expr, $query:expr, $key:expr) => {{
        let extra = query_string($query);
        let customized = $builder.customize().mutate_request(move |req| {
            if extra.is_empty() {
                return;
            }
            let separator = if req.uri().contains('?') { '&' } else { '?' };
            let uri = format!("{}{}{}", req.uri(), separator, extra);
            if let Err(err) = req.set_uri(uri) {
                tracing::warn!(error = %err, "failed to attach presign query");
            }
        });
        customized
            .presigned($config)
            .await
            .map(|presigned| presigned.uri().to_string())
            .map_err(|err| map_sdk_error($key, err))
    }};
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn put_object(&self, request: PutObjectRequest) -> ClientResult<()> {
        let mut metadata = HashMap::new();
        let mut builder = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body))
            .set_content_type(request.content_type)
            .set_cache_control(request.cache_control)
            .set_acl(request.acl.map(canned));

        for (name, value) in request.headers {
            match name.to_ascii_lowercase().as_str() {
                "cache-control" => builder = builder.cache_control(value),
                "content-disposition" => builder = builder.content_disposition(value),
                "content-encoding" => builder = builder.content_encoding(value),
                "content-language" => builder = builder.content_language(value),
                lower => {
                    let meta_key = lower
                        .strip_prefix("x-obs-meta-")
                        .or_else(|| lower.strip_prefix("x-amz-meta-"))
                        .unwrap_or(lower)
                        .to_string();
                    metadata.insert(meta_key, value);
                }
            }
        }

        if !metadata.is_empty() {
            builder = builder.set_metadata(Some(metadata));
        }

        builder
            .send()
            .await
            .map_err(|err| map_sdk_error(&request.key, err))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|err| ClientError::transport_with(format!("{key}: body read failed"), err))?;

        Ok(data.into_bytes())
    }

    async fn get_object_stream(&self, bucket: &str, key: &str) -> ClientResult<ObjectReader> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;

        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn head_object(&self, bucket: &str, key: &str) -> ClientResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;

        let mut metadata = output.metadata().cloned().unwrap_or_default();
        if let Some(cache_control) = output.cache_control() {
            metadata.insert("Cache-Control".to_string(), cache_control.to_string());
        }

        Ok(ObjectHead {
            content_length: output.content_length().unwrap_or_default().max(0) as u64,
            content_type: output.content_type().map(str::to_string),
            last_modified: output.last_modified().and_then(to_chrono),
            metadata,
        })
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> ClientResult<()> {
        self.client
            .copy_object()
            .bucket(&request.bucket)
            .key(&request.destination_key)
            .copy_source(copy_source(&request.bucket, &request.source_key))
            .metadata_directive(MetadataDirective::Copy)
            .set_acl(request.acl.map(canned))
            .send()
            .await
            .map_err(|err| map_sdk_error(&request.source_key, err))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;
        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> ClientResult<DeleteObjectsOutput> {
        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            let identifier = ObjectIdentifier::builder()
                .key(key)
                .build()
                .map_err(|err| ClientError::transport_with("invalid delete key", err))?;
            objects.push(identifier);
        }

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|err| ClientError::transport_with("invalid delete request", err))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|err| map_sdk_error(bucket, err))?;

        Ok(DeleteObjectsOutput {
            deleted: output
                .deleted()
                .iter()
                .filter_map(|d| d.key().map(str::to_string))
                .collect(),
            failed: output
                .errors()
                .iter()
                .map(|e| {
                    (
                        e.key().unwrap_or_default().to_string(),
                        e.code().or(e.message()).unwrap_or("unknown").to_string(),
                    )
                })
                .collect(),
        })
    }

    async fn list_objects(&self, request: ListObjectsRequest) -> ClientResult<ListObjectsPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix)
            .set_delimiter(request.delimiter.clone())
            .set_continuation_token(request.continuation_token.clone())
            .set_max_keys(request.max_keys.map(|n| n.min(i32::MAX as usize) as i32))
            .send()
            .await
            .map_err(|err| map_sdk_error(&request.prefix, err))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ListedObject {
                    key: object.key()?.to_string(),
                    size: object.size().unwrap_or_default().max(0) as u64,
                    last_modified: object.last_modified().and_then(to_chrono),
                })
            })
            .collect();

        let common_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListObjectsPage {
            objects,
            common_prefixes,
            next_continuation_token,
        })
    }

    async fn get_object_acl(&self, bucket: &str, key: &str) -> ClientResult<Vec<Grant>> {
        let output = self
            .client
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;

        let grants = output
            .grants()
            .iter()
            .filter_map(|grant| {
                let grantee = grant.grantee()?;
                let grantee = match grantee.r#type() {
                    GranteeType::Group => Grantee::Group(grantee.uri()?.to_string()),
                    _ => Grantee::CanonicalUser(grantee.id().unwrap_or_default().to_string()),
                };
                let permission = match grant.permission()? {
                    SdkPermission::Read => Permission::Read,
                    SdkPermission::Write => Permission::Write,
                    SdkPermission::ReadAcp => Permission::ReadAcp,
                    SdkPermission::WriteAcp => Permission::WriteAcp,
                    SdkPermission::FullControl => Permission::FullControl,
                    _ => return None,
                };
                Some(Grant::new(grantee, permission))
            })
            .collect();

        Ok(grants)
    }

    async fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> ClientResult<()> {
        self.client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(canned(acl))
            .send()
            .await
            .map_err(|err| map_sdk_error(key, err))?;
        Ok(())
    }

    async fn presign(&self, request: PresignRequest) -> ClientResult<String> {
        let config = PresigningConfig::expires_in(request.expires_in)
            .map_err(|err| ClientError::transport_with("invalid presign expiration", err))?;
        let key = request.key.as_str();
        let query = request.query.as_slice();

        match request.method {
            SignMethod::Get => presign_with_query!(
                self.client.get_object().bucket(&request.bucket).key(key),
                config,
                query,
                key
            ),
            SignMethod::Put => presign_with_query!(
                self.client.put_object().bucket(&request.bucket).key(key),
                config,
                query,
                key
            ),
            SignMethod::Head => presign_with_query!(
                self.client.head_object().bucket(&request.bucket).key(key),
                config,
                query,
                key
            ),
            SignMethod::Delete => presign_with_query!(
                self.client.delete_object().bucket(&request.bucket).key(key),
                config,
                query,
                key
            ),
        }
    }
}
