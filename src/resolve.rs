//! Name to id resolution.
//!
//! Every call re-queries the store. Only the first [`MAX_PAGE_SIZE`] entries of a single page
//! are scanned, so a match beyond that boundary is reported as not found. Names are not
//! unique; the first exact match in the order the store returned wins.

use tracing::debug;

use crate::Result;
use crate::query::{FOLDER_MIME_TYPE, MAX_PAGE_SIZE, Query};
use crate::store::{EntryKind, RemoteEntry, RemoteStore};

/// Raw entries named `name`, optionally restricted to children of `parent`.
pub async fn search<S>(store: &S, name: &str, parent: Option<&str>) -> Result<Vec<RemoteEntry>>
where
    S: RemoteStore + ?Sized,
{
    let query = Query::named(name).with_parent(parent);
    debug!(q = %query, "querying remote store");
    store.query(&query).await
}

pub async fn resolve<S>(store: &S, name: &str, parent: Option<&str>) -> Result<Option<String>>
where
    S: RemoteStore + ?Sized,
{
    let entries = search(store, name, parent).await?;
    let found = first_exact_match(&entries, name).map(|entry| entry.id.clone());
    match &found {
        Some(id) => debug!(name, id = id.as_str(), "resolved entry"),
        None => debug!(
            name,
            scanned = entries.len().min(MAX_PAGE_SIZE),
            "no entry matched"
        ),
    }
    Ok(found)
}

/// Like [`resolve`], but only folders are considered. A file sharing the name is skipped.
pub async fn resolve_folder<S>(
    store: &S,
    name: &str,
    parent: Option<&str>,
) -> Result<Option<String>>
where
    S: RemoteStore + ?Sized,
{
    let query = Query::named(name)
        .with_parent(parent)
        .with_mime_type(FOLDER_MIME_TYPE);
    debug!(q = %query, "resolving folder");
    let entries = store.query(&query).await?;
    Ok(first_exact_match(&entries, name)
        .filter(|entry| entry.kind() == EntryKind::Folder)
        .map(|entry| entry.id.clone()))
}

pub async fn list_children<S>(store: &S, folder_id: &str) -> Result<Vec<RemoteEntry>>
where
    S: RemoteStore + ?Sized,
{
    let query = Query::children_of(folder_id);
    debug!(q = %query, "listing folder");
    store.query(&query).await
}

pub(crate) fn first_exact_match<'a>(
    entries: &'a [RemoteEntry],
    name: &str,
) -> Option<&'a RemoteEntry> {
    entries
        .iter()
        .take(MAX_PAGE_SIZE)
        .find(|entry| entry.name == name)
}
