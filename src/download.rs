use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::Result;
use crate::resolve::resolve;
use crate::store::RemoteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub file_id: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Resolves `name` and streams its content into `dest`.
///
/// An unresolvable name is logged and returns `Ok(None)`; nothing is written locally.
pub async fn download<S>(
    store: &S,
    name: &str,
    parent: Option<&str>,
    dest: &Path,
    mut progress: impl FnMut(f64) + Send,
) -> Result<Option<DownloadReport>>
where
    S: RemoteStore + ?Sized,
{
    let Some(file_id) = resolve(store, name, parent).await? else {
        error!(name, parent, "remote file not found");
        return Ok(None);
    };

    let mut report_progress = |fraction: f64| {
        info!(name, "{:.0}% complete", fraction * 100.0);
        progress(fraction);
    };
    let bytes = store.download(&file_id, dest, &mut report_progress).await?;
    info!(
        name,
        file_id = file_id.as_str(),
        bytes,
        path = %dest.display(),
        "download finished"
    );

    Ok(Some(DownloadReport {
        file_id,
        path: dest.to_path_buf(),
        bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, StoreCall};

    #[tokio::test]
    async fn resolves_then_streams_to_dest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("out.csv");
        let store = MemoryStore::new();
        store.insert_file("X1", "report.csv", &["P1"], "a,b\n");

        let mut seen = Vec::new();
        let report = download(&store, "report.csv", Some("P1"), &dest, |f| seen.push(f))
            .await?
            .expect("downloaded");

        assert_eq!(report.file_id, "X1");
        assert_eq!(report.bytes, 4);
        assert_eq!(std::fs::read_to_string(&dest)?, "a,b\n");
        assert_eq!(seen.last().copied(), Some(1.0));
        assert!(store.calls().contains(&StoreCall::Download {
            file_id: "X1".to_string()
        }));
        Ok(())
    }

    #[tokio::test]
    async fn unresolved_name_is_a_no_op() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("missing.csv");
        let store = MemoryStore::new();

        let report = download(&store, "missing.csv", None, &dest, |_| {}).await?;

        assert_eq!(report, None);
        assert!(!dest.exists());
        assert_eq!(
            store.count_calls(|call| matches!(call, StoreCall::Download { .. })),
            0
        );
        Ok(())
    }
}
