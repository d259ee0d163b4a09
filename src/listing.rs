//! Directory emulation over a flat key space
//!
//! [`synthesize_entries`] turns one backend listing page into adapter entries
//! and does no I/O. [`list_entries`] drives it across continuation tokens and
//! exposes the result as a lazy stream.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use crate::client::{ListObjectsPage, ListObjectsRequest, ObjectClient};
use crate::error::Error;
use crate::path::{is_directory_marker, normalize_path, PathPrefixer, SEPARATOR};
use crate::types::{DirectoryAttributes, FileAttributes, StorageEntry};
use crate::Result;

/// Map one page of flat keys onto file and directory entries.
///
/// - `listed` is the normalized adapter path being listed; neither it nor
///   anything outside it is ever emitted.
/// - Common prefixes (delimiter grouping) become directories.
/// - Zero-byte keys ending in a separator are directory markers and become
///   directories; every other key is a file.
pub fn synthesize_entries(
    listed: &str,
    page: ListObjectsPage,
    prefixer: &PathPrefixer,
) -> Vec<StorageEntry> {
    let mut entries = Vec::with_capacity(page.common_prefixes.len() + page.objects.len());

    for prefix in page.common_prefixes {
        let path = prefixer.strip_prefix(&prefix);
        if is_listed_child(listed, &path) {
            entries.push(StorageEntry::Directory(DirectoryAttributes { path }));
        }
    }

    for object in page.objects {
        let path = prefixer.strip_prefix(&object.key);
        if !is_listed_child(listed, &path) {
            continue;
        }

        if is_directory_marker(&object.key, object.size) {
            entries.push(StorageEntry::Directory(DirectoryAttributes { path }));
        } else if !object.key.ends_with(SEPARATOR) {
            let mut file = FileAttributes::new(path, object.size);
            file.last_modified = object.last_modified;
            entries.push(StorageEntry::File(file));
        }
    }

    entries
}

fn is_listed_child(listed: &str, path: &str) -> bool {
    if path.is_empty() || path == listed {
        return false;
    }
    listed.is_empty()
        || path
            .strip_prefix(listed)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

struct ListState {
    client: Arc<dyn ObjectClient>,
    request: ListObjectsRequest,
    prefixer: PathPrefixer,
    listed: String,
    buffer: VecDeque<StorageEntry>,
    exhausted: bool,
}

/// Stream every entry under `path`, fetching pages on demand.
///
/// Each call starts a fresh listing; nothing is cached between calls.
pub fn list_entries(
    client: Arc<dyn ObjectClient>,
    bucket: String,
    prefixer: PathPrefixer,
    path: &str,
    recursive: bool,
) -> BoxStream<'static, Result<StorageEntry>> {
    let listed = normalize_path(path);
    let request = ListObjectsRequest {
        bucket,
        prefix: prefixer.prefix_directory_path(&listed),
        delimiter: (!recursive).then(|| SEPARATOR.to_string()),
        continuation_token: None,
        max_keys: None,
    };

    let state = ListState {
        client,
        request,
        prefixer,
        listed,
        buffer: VecDeque::new(),
        exhausted: false,
    };

    stream::try_unfold(state, next_entry).boxed()
}

async fn next_entry(mut state: ListState) -> Result<Option<(StorageEntry, ListState)>> {
    loop {
        if let Some(entry) = state.buffer.pop_front() {
            return Ok(Some((entry, state)));
        }
        if state.exhausted {
            return Ok(None);
        }

        let page = state
            .client
            .list_objects(state.request.clone())
            .await
            .map_err(|source| Error::UnableToList {
                path: state.listed.clone(),
                source,
            })?;

        tracing::debug!(
            prefix = %state.request.prefix,
            objects = page.objects.len(),
            prefixes = page.common_prefixes.len(),
            "listed page"
        );

        state.exhausted = page.next_continuation_token.is_none();
        state.request.continuation_token = page.next_continuation_token.clone();
        state
            .buffer
            .extend(synthesize_entries(&state.listed, page, &state.prefixer));
    }
}
