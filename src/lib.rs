//! Name-oriented helpers over the Google Drive v3 API: search, list, resolve a name to an
//! id, upsert a local file, download by name, and resolve-or-create folders.

pub mod auth;
pub mod client;
pub mod config;
pub mod download;
mod drive;
mod error;
#[cfg(feature = "cli")]
pub mod logging;
#[cfg(test)]
mod memory;
pub mod query;
pub mod resolve;
pub mod store;
pub mod upsert;
pub mod utils;

pub use auth::{DRIVE_SCOPE, TokenSource};
pub use client::DriveClient;
pub use config::{DriveAuth, DriveConfig, Env, HttpTimeouts};
pub use download::DownloadReport;
pub use drive::{GoogleDrive, ListTarget};
pub use error::{DriveError, Result};
pub use query::{MAX_PAGE_SIZE, Query};
pub use store::{EntryKind, RemoteEntry, RemoteStore, UploadRequest};
