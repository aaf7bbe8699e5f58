use std::path::Path;

use tracing::warn;

use crate::Result;
use crate::client::DriveClient;
use crate::config::{DriveConfig, Env};
use crate::download::{DownloadReport, download};
use crate::resolve::{list_children, resolve, resolve_folder, search};
use crate::store::{RemoteEntry, RemoteStore};
use crate::upsert::{ensure_folder, upsert};

/// Which folder [`GoogleDrive::list`] should enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget<'a> {
    /// Resolved with an unscoped folder lookup first.
    Name(&'a str),
    Id(&'a str),
}

/// Name-oriented operations over one remote store handle.
#[derive(Debug, Clone)]
pub struct GoogleDrive<S = DriveClient> {
    store: S,
}

impl GoogleDrive<DriveClient> {
    pub async fn from_config(config: &DriveConfig, env: &Env) -> Result<Self> {
        Ok(Self::new(DriveClient::from_config(config, env).await?))
    }
}

impl<S: RemoteStore> GoogleDrive<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Entries named `name` (first page only, duplicates included).
    pub async fn search(&self, name: &str, parent: Option<&str>) -> Result<Vec<RemoteEntry>> {
        search(&self.store, name, parent).await
    }

    /// Untrashed children of a folder, or `None` when a folder name cannot be resolved.
    pub async fn list(&self, target: ListTarget<'_>) -> Result<Option<Vec<RemoteEntry>>> {
        let folder_id = match target {
            ListTarget::Id(id) => id.to_string(),
            ListTarget::Name(name) => match resolve_folder(&self.store, name, None).await? {
                Some(id) => id,
                None => {
                    warn!(name, "folder not found");
                    return Ok(None);
                }
            },
        };
        list_children(&self.store, &folder_id).await.map(Some)
    }

    pub async fn resolve(&self, name: &str, parent: Option<&str>) -> Result<Option<String>> {
        resolve(&self.store, name, parent).await
    }

    /// Uploads `local_path` under its base name, replacing an existing entry's content when
    /// `update_if_exists` is set.
    pub async fn upload(
        &self,
        local_path: &Path,
        parent: Option<&str>,
        update_if_exists: bool,
    ) -> Result<String> {
        upsert(&self.store, local_path, parent, update_if_exists).await
    }

    pub async fn download(
        &self,
        name: &str,
        parent: Option<&str>,
        dest: &Path,
        progress: impl FnMut(f64) + Send,
    ) -> Result<Option<DownloadReport>> {
        download(&self.store, name, parent, dest, progress).await
    }

    /// Existing folder id, or a newly created folder inside `parent`.
    pub async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String> {
        ensure_folder(&self.store, name, parent).await
    }
}
