//! Adapter behaviour against the in-process object client
//!
//! Every scenario runs the real adapter over `MemoryClient`, so the
//! OBS request shapes (prefixes, delimiters, ACLs) are exercised end to end.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use tokio::io::AsyncReadExt;

use obsfs::client::memory::{Fault, MemoryClient, Operation, DEFAULT_CONTENT_TYPE};
use obsfs::client::{ObjectClient, MAX_DELETE_BATCH};
use obsfs::config::{AdapterConfig, AdapterOptions, SignatureScheme};
use obsfs::visibility::{Grant, Grantee, Permission, ALL_USERS_URI};
use obsfs::{Error, FilesystemAdapter, ObsAdapter, SignMethod, StorageEntry, Visibility, WriteConfig};

const BUCKET: &str = "test";
const ENDPOINT: &str = "obs.cn-east-3.myhuaweicloud.com";

fn adapter_with(client: Arc<MemoryClient>, config: AdapterConfig) -> ObsAdapter {
    ObsAdapter::new(client, config).unwrap()
}

fn setup() -> (Arc<MemoryClient>, ObsAdapter) {
    let client = Arc::new(MemoryClient::new());
    let adapter = adapter_with(client.clone(), AdapterConfig::new(ENDPOINT, BUCKET));
    (client, adapter)
}

async fn list(adapter: &ObsAdapter, path: &str, deep: bool) -> Vec<StorageEntry> {
    adapter.list_contents(path, deep).try_collect().await.unwrap()
}

#[tokio::test]
async fn test_write_read_round_trip() {
    let (_, adapter) = setup();
    let config = WriteConfig::default();

    adapter
        .write("fixture/read.txt", Bytes::from_static(b"read-test"), &config)
        .await
        .unwrap();
    assert_eq!(
        adapter.read("fixture/read.txt").await.unwrap(),
        Bytes::from_static(b"read-test")
    );

    adapter
        .write("fixture/empty.txt", Bytes::new(), &config)
        .await
        .unwrap();
    assert!(adapter.file_exists("fixture/empty.txt").await.unwrap());
    assert!(adapter.read("fixture/empty.txt").await.unwrap().is_empty());
    assert_eq!(adapter.file_size("fixture/empty.txt").await.unwrap(), 0);
}

#[tokio::test]
async fn test_stream_round_trip() {
    let (_, adapter) = setup();

    let reader: obsfs::client::ObjectReader = Box::pin(std::io::Cursor::new(b"streamed".to_vec()));
    adapter
        .write_stream("fixture/stream.txt", reader, &WriteConfig::default())
        .await
        .unwrap();

    let mut stream = adapter.read_stream("fixture/stream.txt").await.unwrap();
    let mut contents = String::new();
    stream.read_to_string(&mut contents).await.unwrap();
    assert_eq!(contents, "streamed");
}

#[tokio::test]
async fn test_read_missing_file_is_error() {
    let (_, adapter) = setup();

    let err = adapter.read("fixture/missing.txt").await.unwrap_err();
    assert!(matches!(err, Error::UnableToRead { .. }));
    assert!(err.is_not_found());
    assert!(!adapter.file_exists("fixture/missing.txt").await.unwrap());
}

#[tokio::test]
async fn test_paths_are_normalized() {
    let (client, adapter) = setup();

    adapter
        .write("/fixture//nested/file.txt/", Bytes::from_static(b"x"), &WriteConfig::default())
        .await
        .unwrap();

    assert_eq!(client.keys(BUCKET).await, vec!["fixture/nested/file.txt"]);
    assert!(adapter.file_exists("fixture/nested/file.txt").await.unwrap());
}

#[tokio::test]
async fn test_visibility_round_trip() {
    let (_, adapter) = setup();
    adapter
        .write("fixture/visibility.txt", Bytes::from_static(b"v"), &WriteConfig::default())
        .await
        .unwrap();

    assert_eq!(
        adapter.visibility("fixture/visibility.txt").await.unwrap(),
        Visibility::Private
    );

    for visibility in [Visibility::Public, Visibility::Private] {
        adapter
            .set_visibility("fixture/visibility.txt", visibility)
            .await
            .unwrap();
        assert_eq!(
            adapter.visibility("fixture/visibility.txt").await.unwrap(),
            visibility
        );
    }
}

#[tokio::test]
async fn test_write_with_public_visibility() {
    let (_, adapter) = setup();
    let config = WriteConfig::new().with_visibility(Visibility::Public);

    adapter
        .write("fixture/public.txt", Bytes::from_static(b"p"), &config)
        .await
        .unwrap();
    assert_eq!(
        adapter.visibility("fixture/public.txt").await.unwrap(),
        Visibility::Public
    );
}

#[tokio::test]
async fn test_full_control_for_all_users_is_public() {
    let (client, adapter) = setup();
    adapter
        .write("fixture/acl.txt", Bytes::from_static(b"a"), &WriteConfig::default())
        .await
        .unwrap();

    client
        .set_grants(
            BUCKET,
            "fixture/acl.txt",
            vec![
                Grant::new(Grantee::CanonicalUser("owner".into()), Permission::FullControl),
                Grant::new(Grantee::Group(ALL_USERS_URI.into()), Permission::FullControl),
            ],
        )
        .await
        .unwrap();
    assert_eq!(
        adapter.visibility("fixture/acl.txt").await.unwrap(),
        Visibility::Public
    );

    client
        .set_grants(
            BUCKET,
            "fixture/acl.txt",
            vec![Grant::new(Grantee::Group(ALL_USERS_URI.into()), Permission::Write)],
        )
        .await
        .unwrap();
    assert_eq!(
        adapter.visibility("fixture/acl.txt").await.unwrap(),
        Visibility::Private
    );
}

#[tokio::test]
async fn test_move_file() {
    let (_, adapter) = setup();
    let config = WriteConfig::new().with_visibility(Visibility::Public);
    adapter
        .write("fixture/from.txt", Bytes::from_static(b"moved"), &config)
        .await
        .unwrap();

    adapter
        .move_file("fixture/from.txt", "fixture/to.txt", &WriteConfig::default())
        .await
        .unwrap();

    assert!(!adapter.file_exists("fixture/from.txt").await.unwrap());
    assert!(adapter.file_exists("fixture/to.txt").await.unwrap());
    assert_eq!(
        adapter.read("fixture/to.txt").await.unwrap(),
        Bytes::from_static(b"moved")
    );
    assert_eq!(
        adapter.visibility("fixture/to.txt").await.unwrap(),
        Visibility::Public
    );
}

#[tokio::test]
async fn test_move_onto_itself_keeps_file() {
    let (_, adapter) = setup();
    adapter
        .write("fixture/same.txt", Bytes::from_static(b"same"), &WriteConfig::default())
        .await
        .unwrap();

    adapter
        .move_file("fixture/same.txt", "/fixture/same.txt", &WriteConfig::default())
        .await
        .unwrap();
    assert_eq!(
        adapter.read("fixture/same.txt").await.unwrap(),
        Bytes::from_static(b"same")
    );
}

#[tokio::test]
async fn test_move_reports_copied_when_delete_fails() {
    let (client, adapter) = setup();
    adapter
        .write("fixture/stuck.txt", Bytes::from_static(b"stuck"), &WriteConfig::default())
        .await
        .unwrap();
    client
        .inject_fault(Operation::Delete, "fixture/stuck.txt", Fault::PermissionDenied)
        .await;

    let err = adapter
        .move_file("fixture/stuck.txt", "fixture/moved.txt", &WriteConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnableToMove { copied: true, .. }));
    assert!(adapter.file_exists("fixture/stuck.txt").await.unwrap());
    assert!(adapter.file_exists("fixture/moved.txt").await.unwrap());
}

#[tokio::test]
async fn test_move_missing_source_copies_nothing() {
    let (client, adapter) = setup();

    let err = adapter
        .move_file("fixture/nope.txt", "fixture/dest.txt", &WriteConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnableToMove { copied: false, .. }));
    assert!(client.keys(BUCKET).await.is_empty());
}

#[tokio::test]
async fn test_copy_retains_visibility() {
    let (_, adapter) = setup();
    adapter
        .write(
            "fixture/source.txt",
            Bytes::from_static(b"copy"),
            &WriteConfig::new().with_visibility(Visibility::Public),
        )
        .await
        .unwrap();

    adapter
        .copy("fixture/source.txt", "fixture/copy.txt", &WriteConfig::default())
        .await
        .unwrap();

    assert_eq!(
        adapter.read("fixture/copy.txt").await.unwrap(),
        adapter.read("fixture/source.txt").await.unwrap()
    );
    assert_eq!(
        adapter.visibility("fixture/copy.txt").await.unwrap(),
        Visibility::Public
    );
    assert!(adapter.file_exists("fixture/source.txt").await.unwrap());
}

#[tokio::test]
async fn test_copy_without_retaining_visibility() {
    let (_, adapter) = setup();
    adapter
        .write(
            "fixture/source.txt",
            Bytes::from_static(b"copy"),
            &WriteConfig::new().with_visibility(Visibility::Public),
        )
        .await
        .unwrap();

    let config = WriteConfig::new().with_retain_visibility(false);
    adapter
        .copy("fixture/source.txt", "fixture/private.txt", &config)
        .await
        .unwrap();
    assert_eq!(
        adapter.visibility("fixture/private.txt").await.unwrap(),
        Visibility::Private
    );
}

#[tokio::test]
async fn test_delete() {
    let (_, adapter) = setup();
    adapter
        .write("fixture/delete.txt", Bytes::from_static(b"d"), &WriteConfig::default())
        .await
        .unwrap();

    adapter.delete("fixture/delete.txt").await.unwrap();
    assert!(!adapter.file_exists("fixture/delete.txt").await.unwrap());
}

#[tokio::test]
async fn test_delete_missing_directory() {
    let (_, adapter) = setup();

    adapter.delete_directory("fixture/not-there").await.unwrap();
    assert!(list(&adapter, "fixture/not-there", true).await.is_empty());
}

#[tokio::test]
async fn test_delete_directory_spans_pages() {
    let client = Arc::new(MemoryClient::new().with_page_size(2));
    let adapter = adapter_with(client.clone(), AdapterConfig::new(ENDPOINT, BUCKET));

    for i in 0..5 {
        adapter
            .write(
                &format!("fixture/dir/file{i}.txt"),
                Bytes::from_static(b"x"),
                &WriteConfig::default(),
            )
            .await
            .unwrap();
    }
    adapter
        .write("fixture/keep.txt", Bytes::from_static(b"k"), &WriteConfig::default())
        .await
        .unwrap();

    adapter.delete_directory("fixture/dir").await.unwrap();

    assert_eq!(client.keys(BUCKET).await, vec!["fixture/keep.txt"]);
    assert!(!adapter.directory_exists("fixture/dir").await.unwrap());
}

#[tokio::test]
async fn test_delete_directory_reports_failed_keys() {
    let (client, adapter) = setup();
    for name in ["a.txt", "b.txt", "c.txt"] {
        adapter
            .write(&format!("fixture/dir/{name}"), Bytes::from_static(b"x"), &WriteConfig::default())
            .await
            .unwrap();
    }
    client
        .inject_fault(Operation::Delete, "fixture/dir/b.txt", Fault::PermissionDenied)
        .await;

    let err = adapter.delete_directory("fixture/dir").await.unwrap_err();
    match err {
        Error::PartialDelete { path, failed } => {
            assert_eq!(path, "fixture/dir");
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].key, "fixture/dir/b.txt");
        }
        other => panic!("expected partial delete, got {other:?}"),
    }
    assert_eq!(client.keys(BUCKET).await, vec!["fixture/dir/b.txt"]);
}

async fn write_bulk(adapter: &ObsAdapter, count: usize) -> Vec<String> {
    let mut paths = Vec::with_capacity(count);
    for i in 0..count {
        let path = format!("bulk/{i:05}.txt");
        adapter
            .write(&path, Bytes::from_static(b"x"), &WriteConfig::default())
            .await
            .unwrap();
        paths.push(path);
    }
    paths
}

#[tokio::test]
async fn test_delete_directory_later_batch_failure() {
    let client = Arc::new(MemoryClient::new().with_page_size(300));
    let adapter = adapter_with(client.clone(), AdapterConfig::new(ENDPOINT, BUCKET));
    let paths = write_bulk(&adapter, MAX_DELETE_BATCH + 250).await;
    let second_batch = paths[MAX_DELETE_BATCH..].to_vec();

    client
        .inject_fault(Operation::DeleteBatch, &second_batch[0], Fault::Transport)
        .await;

    let err = adapter.delete_directory("bulk").await.unwrap_err();
    match err {
        Error::PartialDelete { path, failed } => {
            assert_eq!(path, "bulk");
            let failed: Vec<_> = failed.into_iter().map(|f| f.key).collect();
            assert_eq!(failed, second_batch);
        }
        other => panic!("expected partial delete, got {other:?}"),
    }
    assert_eq!(client.keys(BUCKET).await, second_batch);
}

#[tokio::test]
async fn test_delete_directory_first_batch_failure() {
    let (client, adapter) = setup();
    let paths = write_bulk(&adapter, 3).await;

    client
        .inject_fault(Operation::DeleteBatch, &paths[0], Fault::PermissionDenied)
        .await;

    let err = adapter.delete_directory("bulk").await.unwrap_err();
    assert!(matches!(err, Error::UnableToDeleteDirectory { .. }));
    assert_eq!(err.kind(), obsfs::error::ErrorKind::PermissionDenied);
    assert_eq!(client.keys(BUCKET).await, paths);
}

#[tokio::test]
async fn test_delete_directory_listing_failure() {
    let (client, adapter) = setup();
    client
        .inject_fault(Operation::List, "fixture/dir/", Fault::Transport)
        .await;

    let err = adapter.delete_directory("fixture/dir").await.unwrap_err();
    assert!(matches!(err, Error::UnableToDeleteDirectory { .. }));
}

#[tokio::test]
async fn test_create_directory() {
    let (client, adapter) = setup();

    adapter
        .create_directory("fixture/path", &WriteConfig::default())
        .await
        .unwrap();

    assert_eq!(client.keys(BUCKET).await, vec!["fixture/path/"]);
    assert!(!adapter.file_exists("fixture/path").await.unwrap());
    assert!(adapter.directory_exists("fixture/path").await.unwrap());
    assert!(!adapter.directory_exists("fixture/other").await.unwrap());
}

#[tokio::test]
async fn test_shallow_listing() {
    let (_, adapter) = setup();
    adapter
        .write("fixture/path1/file.txt", Bytes::from_static(b"test"), &WriteConfig::default())
        .await
        .unwrap();

    let entries = list(&adapter, "fixture/path1", false).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path(), "fixture/path1/file.txt");
    assert!(entries[0].is_file());
}

#[tokio::test]
async fn test_shallow_listing_groups_subdirectories() {
    let (_, adapter) = setup();
    for path in ["fixture/a.txt", "fixture/sub/b.txt", "fixture/sub/deeper/c.txt"] {
        adapter
            .write(path, Bytes::from_static(b"x"), &WriteConfig::default())
            .await
            .unwrap();
    }

    let entries = list(&adapter, "fixture", false).await;
    let mut paths: Vec<_> = entries.iter().map(|e| (e.path().to_string(), e.is_dir())).collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            ("fixture/a.txt".to_string(), false),
            ("fixture/sub".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn test_deep_listing() {
    let (_, adapter) = setup();
    adapter
        .create_directory("fixture/path/dir", &WriteConfig::default())
        .await
        .unwrap();
    adapter
        .write("fixture/path/dir/file.txt", Bytes::from_static(b"test"), &WriteConfig::default())
        .await
        .unwrap();

    let entries = list(&adapter, "fixture/path", true).await;
    assert_eq!(entries.len(), 2);

    let dir = entries.iter().find(|e| e.is_dir()).unwrap();
    assert_eq!(dir.path(), "fixture/path/dir");

    match entries.iter().find(|e| e.is_file()).unwrap() {
        StorageEntry::File(file) => {
            assert_eq!(file.path, "fixture/path/dir/file.txt");
            assert_eq!(file.file_size, 4);
        }
        other => panic!("expected file, got {other:?}"),
    }
}

#[tokio::test]
async fn test_listing_follows_continuation_tokens() {
    let client = Arc::new(MemoryClient::new().with_page_size(2));
    let adapter = adapter_with(client.clone(), AdapterConfig::new(ENDPOINT, BUCKET));
    for i in 0..7 {
        adapter
            .write(&format!("paged/{i}.txt"), Bytes::from_static(b"x"), &WriteConfig::default())
            .await
            .unwrap();
    }

    let entries = list(&adapter, "paged", false).await;
    assert_eq!(entries.len(), 7);
    assert!(entries.iter().all(StorageEntry::is_file));
}

#[tokio::test]
async fn test_listing_restarts_on_each_call() {
    let (_, adapter) = setup();
    adapter
        .write("again/a.txt", Bytes::from_static(b"x"), &WriteConfig::default())
        .await
        .unwrap();

    assert_eq!(list(&adapter, "again", true).await.len(), 1);
    assert_eq!(list(&adapter, "again", true).await.len(), 1);
}

#[tokio::test]
async fn test_listing_error_surfaces_in_stream() {
    let (client, adapter) = setup();
    client
        .inject_fault(Operation::List, "broken/", Fault::Transport)
        .await;

    let result: obsfs::Result<Vec<_>> = adapter.list_contents("broken", true).try_collect().await;
    assert!(matches!(result, Err(Error::UnableToList { .. })));
}

#[tokio::test]
async fn test_mime_type() {
    let (_, adapter) = setup();
    let config = WriteConfig::default();

    adapter
        .write("fixture/text.txt", Bytes::from_static(b"t"), &config)
        .await
        .unwrap();
    adapter
        .write("fixture/unknown.unknownext", Bytes::from_static(b"u"), &config)
        .await
        .unwrap();
    adapter
        .write(
            "fixture/forced.txt",
            Bytes::from_static(b"f"),
            &WriteConfig::new().with_mime_type("application/json"),
        )
        .await
        .unwrap();

    assert_eq!(adapter.mime_type("fixture/text.txt").await.unwrap(), "text/plain");
    assert_eq!(
        adapter.mime_type("fixture/unknown.unknownext").await.unwrap(),
        DEFAULT_CONTENT_TYPE
    );
    assert_eq!(
        adapter.mime_type("fixture/forced.txt").await.unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_metadata_getters() {
    let (_, adapter) = setup();
    let before = chrono::Utc::now() - chrono::Duration::seconds(5);
    adapter
        .write(
            "fixture/meta.txt",
            Bytes::from_static(b"metadata"),
            &WriteConfig::new().with_expires(20),
        )
        .await
        .unwrap();

    assert_eq!(adapter.file_size("fixture/meta.txt").await.unwrap(), 8);
    assert!(adapter.last_modified("fixture/meta.txt").await.unwrap() >= before);

    let attributes = adapter.metadata("fixture/meta.txt").await.unwrap();
    assert_eq!(attributes.path, "fixture/meta.txt");
    assert_eq!(attributes.file_size, 8);
    assert_eq!(attributes.mime_type.as_deref(), Some("text/plain"));
    assert_eq!(attributes.visibility, Some(Visibility::Private));
    assert_eq!(
        attributes.extra_metadata.get("Cache-Control").map(String::as_str),
        Some("max-age=20")
    );
}

#[tokio::test]
async fn test_metadata_of_missing_file_is_error() {
    let (_, adapter) = setup();

    for result in [
        adapter.file_size("fixture/none.txt").await.map(|_| ()),
        adapter.mime_type("fixture/none.txt").await.map(|_| ()),
        adapter.last_modified("fixture/none.txt").await.map(|_| ()),
        adapter.visibility("fixture/none.txt").await.map(|_| ()),
    ] {
        let err = result.unwrap_err();
        assert!(matches!(err, Error::UnableToRetrieveMetadata { .. }));
        assert!(err.is_not_found());
    }
}

#[tokio::test]
async fn test_existence_check_failure_is_error() {
    let (client, adapter) = setup();
    client
        .inject_fault(Operation::Head, "fixture/denied.txt", Fault::Transport)
        .await;

    let err = adapter.file_exists("fixture/denied.txt").await.unwrap_err();
    assert!(matches!(err, Error::UnableToCheckExistence { .. }));
}

#[tokio::test]
async fn test_root_prefix() {
    let client = Arc::new(MemoryClient::new());
    let adapter = adapter_with(
        client.clone(),
        AdapterConfig::new(ENDPOINT, BUCKET).with_prefix("/github-test/"),
    );

    adapter
        .write("dir/file.txt", Bytes::from_static(b"rooted"), &WriteConfig::default())
        .await
        .unwrap();

    assert_eq!(client.keys(BUCKET).await, vec!["github-test/dir/file.txt"]);

    let entries = list(&adapter, "", true).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path(), "dir/file.txt");
    assert_eq!(
        adapter.public_url("dir/file.txt"),
        "https://test.obs.cn-east-3.myhuaweicloud.com/github-test/dir/file.txt"
    );
}

#[tokio::test]
async fn test_public_url_performs_no_request() {
    let client = Arc::new(MemoryClient::new());
    let config = AdapterConfig::new(ENDPOINT, BUCKET).with_options(AdapterOptions {
        url: Some("https://oss.cdn.com".into()),
        ..Default::default()
    });
    let adapter = adapter_with(client.clone(), config);

    assert_eq!(adapter.public_url("file.txt"), "https://oss.cdn.com/file.txt");
    assert_eq!(client.request_count(), 0);

    let (_, plain) = setup();
    assert_eq!(
        plain.public_url("file.txt"),
        "https://test.obs.cn-east-3.myhuaweicloud.com/file.txt"
    );
}

#[tokio::test]
async fn test_temporary_url_on_override_base() {
    let client = Arc::new(MemoryClient::new());
    let config = AdapterConfig::new(ENDPOINT, BUCKET).with_options(AdapterOptions {
        temporary_url: Some("https://oss.cdn.com".into()),
        ..Default::default()
    });
    let adapter = adapter_with(client, config);

    let url = adapter
        .temporary_url("test", Duration::from_secs(10), &[])
        .await
        .unwrap();
    assert!(url.starts_with("https://oss.cdn.com/test?"), "{url}");
    assert!(url.contains("Signature="));
}

#[tokio::test]
async fn test_temporary_url_signs_extra_query() {
    let (_, adapter) = setup();
    let query = vec![("x-image-process".to_string(), "image/circle,r_100".to_string())];

    let url = adapter
        .temporary_url("fixture/image.png", Duration::from_secs(10), &query)
        .await
        .unwrap();
    assert!(url.starts_with("https://test.obs.memory.local/fixture/image.png?"), "{url}");
    assert!(url.contains("x-image-process="));
}

#[tokio::test]
async fn test_sign_url_method_changes_signature() {
    let (_, adapter) = setup();
    let expires = Duration::from_secs(60);

    let get = adapter
        .sign_url("fixture/sign.txt", expires, &[], SignMethod::Get)
        .await
        .unwrap();
    let put = adapter
        .sign_url("fixture/sign.txt", expires, &[], SignMethod::Put)
        .await
        .unwrap();
    assert_ne!(get, put);
}

#[tokio::test]
async fn test_unsupported_signature_is_rejected() {
    let config = AdapterConfig::new(ENDPOINT, BUCKET).with_signature(SignatureScheme::V2);
    let err = ObsAdapter::new(Arc::new(MemoryClient::new()), config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    let config = AdapterConfig::new(ENDPOINT, BUCKET).with_signature(SignatureScheme::V4);
    assert!(ObsAdapter::new(Arc::new(MemoryClient::new()), config).is_ok());
}

#[tokio::test]
async fn test_dot_segments_address_the_stored_key() {
    let (client, adapter) = setup();
    adapter
        .write("a/../secret.txt", Bytes::from_static(b"s"), &WriteConfig::default())
        .await
        .unwrap();
    assert_eq!(client.keys(BUCKET).await, vec!["a/../secret.txt"]);

    assert_eq!(
        adapter.public_url("a/../secret.txt"),
        "https://test.obs.cn-east-3.myhuaweicloud.com/a/%2E%2E/secret.txt"
    );
    let signed = adapter
        .temporary_url("a/./b.txt", Duration::from_secs(10), &[])
        .await
        .unwrap();
    assert!(signed.starts_with("https://test.obs.memory.local/a/%2E/b.txt?"), "{signed}");
}

#[tokio::test]
async fn test_accessors() {
    let (client, adapter) = setup();
    assert_eq!(adapter.bucket(), BUCKET);
    assert_eq!(adapter.config().endpoint, ENDPOINT);

    adapter
        .client()
        .delete_object(BUCKET, "missing")
        .await
        .unwrap();
    assert_eq!(client.request_count(), 1);
}
