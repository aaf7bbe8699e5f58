use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::query::{FOLDER_MIME_TYPE, Query};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub trashed: bool,
}

impl RemoteEntry {
    pub fn kind(&self) -> EntryKind {
        if self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE) {
            EntryKind::Folder
        } else {
            EntryKind::File
        }
    }
}

/// Payload for a create or replace-content call. The file is already open, so a store only
/// ever sees readable local content.
#[derive(Debug)]
pub struct UploadRequest {
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: String,
    pub file: tokio::fs::File,
    pub len: u64,
}

/// The remote calls every higher-level operation is written against.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns at most one page of entries matching `query`.
    async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>>;

    async fn create_file(&self, request: UploadRequest) -> Result<String>;

    async fn update_file(&self, file_id: &str, request: UploadRequest) -> Result<String>;

    async fn create_folder(&self, name: &str, parents: &[String]) -> Result<String>;

    /// Streams the content of `file_id` into `dest`, reporting the completed fraction after
    /// every chunk. Returns the number of bytes written.
    async fn download(
        &self,
        file_id: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<u64>;
}
