//! Update-if-exists-else-create on top of [`resolve`].
//!
//! Resolution and mutation are separate remote calls. Two callers upserting the same
//! name/parent pair concurrently can both create, or race an update against a create; the
//! remote API offers no compare-and-swap to close that window.

use std::io;
use std::path::Path;

use tracing::info;

use crate::query::{FOLDER_MIME_TYPE, OCTET_STREAM};
use crate::resolve::{resolve, resolve_folder};
use crate::store::{RemoteStore, UploadRequest};
use crate::{DriveError, Result};

pub async fn upsert<S>(
    store: &S,
    local_path: &Path,
    parent: Option<&str>,
    update_if_exists: bool,
) -> Result<String>
where
    S: RemoteStore + ?Sized,
{
    let name = base_name(local_path)?;
    let existing = resolve(store, &name, parent).await?;
    let request = open_upload(local_path, name, parent).await?;

    match existing {
        Some(file_id) if update_if_exists => {
            info!(
                name = request.name.as_str(),
                file_id = file_id.as_str(),
                bytes = request.len,
                "replacing remote content"
            );
            store.update_file(&file_id, request).await
        }
        _ => {
            info!(
                name = request.name.as_str(),
                parent,
                bytes = request.len,
                "creating remote file"
            );
            let id = store.create_file(request).await?;
            info!(file_id = id.as_str(), "created remote file");
            Ok(id)
        }
    }
}

/// Returns the id of the folder named `name` inside `parent`, creating it when absent.
pub async fn ensure_folder<S>(store: &S, name: &str, parent: Option<&str>) -> Result<String>
where
    S: RemoteStore + ?Sized,
{
    if let Some(id) = resolve_folder(store, name, parent).await? {
        return Ok(id);
    }
    let parents: Vec<String> = parent.map(str::to_string).into_iter().collect();
    info!(name, parent, mime_type = FOLDER_MIME_TYPE, "creating remote folder");
    store.create_folder(name, &parents).await
}

fn base_name(local_path: &Path) -> Result<String> {
    local_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| DriveError::LocalFileMissing {
            path: local_path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no utf-8 file name"),
        })
}

async fn open_upload(
    local_path: &Path,
    name: String,
    parent: Option<&str>,
) -> Result<UploadRequest> {
    let missing = |source| DriveError::LocalFileMissing {
        path: local_path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(local_path).await.map_err(missing)?;
    let metadata = file.metadata().await.map_err(missing)?;
    if metadata.is_dir() {
        return Err(missing(io::Error::new(
            io::ErrorKind::InvalidInput,
            "path is a directory",
        )));
    }

    Ok(UploadRequest {
        name,
        parents: parent.map(str::to_string).into_iter().collect(),
        mime_type: OCTET_STREAM.to_string(),
        file,
        len: metadata.len(),
    })
}
