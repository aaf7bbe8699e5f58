//! In-memory [`RemoteStore`] that records every call it receives.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::query::{FOLDER_MIME_TYPE, Query};
use crate::store::{RemoteEntry, RemoteStore, UploadRequest};
use crate::{DriveError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Query(Query),
    CreateFile {
        name: String,
        parents: Vec<String>,
        bytes: Vec<u8>,
    },
    UpdateFile {
        file_id: String,
        name: String,
        bytes: Vec<u8>,
    },
    CreateFolder {
        name: String,
        parents: Vec<String>,
    },
    Download {
        file_id: String,
    },
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<RemoteEntry>,
    contents: BTreeMap<String, Vec<u8>>,
    calls: Vec<StoreCall>,
    next_id: u64,
}

/// Entries are kept in insertion order and queries return every match, unpaged.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        let store = Self::new();
        store.lock().entries.extend(entries);
        store
    }

    pub fn insert(&self, entry: RemoteEntry) {
        self.lock().entries.push(entry);
    }

    pub fn insert_file(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        parents: &[&str],
        bytes: impl Into<Vec<u8>>,
    ) {
        let id = id.into();
        let mut state = self.lock();
        state.entries.push(RemoteEntry {
            id: id.clone(),
            name: name.into(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            mime_type: Some(crate::query::OCTET_STREAM.to_string()),
            trashed: false,
        });
        state.contents.insert(id, bytes.into());
    }

    pub fn entries(&self) -> Vec<RemoteEntry> {
        self.lock().entries.clone()
    }

    pub fn content(&self, file_id: &str) -> Option<Vec<u8>> {
        self.lock().contents.get(file_id).cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }
}

async fn read_upload(request: &mut UploadRequest) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(usize::try_from(request.len).unwrap_or_default());
    request.file.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>> {
        let mut state = self.lock();
        state.calls.push(StoreCall::Query(query.clone()));
        Ok(state
            .entries
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect())
    }

    async fn create_file(&self, mut request: UploadRequest) -> Result<String> {
        let bytes = read_upload(&mut request).await?;
        let mut state = self.lock();
        let id = state.allocate_id();
        state.calls.push(StoreCall::CreateFile {
            name: request.name.clone(),
            parents: request.parents.clone(),
            bytes: bytes.clone(),
        });
        state.entries.push(RemoteEntry {
            id: id.clone(),
            name: request.name,
            parents: request.parents,
            mime_type: Some(request.mime_type),
            trashed: false,
        });
        state.contents.insert(id.clone(), bytes);
        Ok(id)
    }

    async fn update_file(&self, file_id: &str, mut request: UploadRequest) -> Result<String> {
        let bytes = read_upload(&mut request).await?;
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(StoreCall::UpdateFile {
            file_id: file_id.to_string(),
            name: request.name.clone(),
            bytes: bytes.clone(),
        });
        let Some(entry) = state.entries.iter_mut().find(|entry| entry.id == file_id) else {
            return Err(DriveError::InvalidResponse(format!(
                "file {file_id} does not exist"
            )));
        };
        entry.name = request.name;
        entry.mime_type = Some(request.mime_type);
        state.contents.insert(file_id.to_string(), bytes);
        Ok(file_id.to_string())
    }

    async fn create_folder(&self, name: &str, parents: &[String]) -> Result<String> {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.calls.push(StoreCall::CreateFolder {
            name: name.to_string(),
            parents: parents.to_vec(),
        });
        state.entries.push(RemoteEntry {
            id: id.clone(),
            name: name.to_string(),
            parents: parents.to_vec(),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            trashed: false,
        });
        Ok(id)
    }

    async fn download(
        &self,
        file_id: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<u64> {
        let bytes = {
            let mut state = self.lock();
            state.calls.push(StoreCall::Download {
                file_id: file_id.to_string(),
            });
            state.contents.get(file_id).cloned().ok_or_else(|| {
                DriveError::InvalidResponse(format!("file {file_id} has no content"))
            })?
        };
        tokio::fs::write(dest, &bytes).await?;
        progress(1.0);
        Ok(bytes.len() as u64)
    }
}
