use std::collections::BTreeMap;
use std::path::Path;

use crate::{DriveError, Result};

/// Credential lookups: values from a dotenv file first, then the process environment.
///
/// Nothing is exported into the process; a loaded file only affects lookups through this
/// value. Blank values count as unset on both layers.
#[derive(Clone, Default)]
pub struct Env {
    file_vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("file_keys", &self.file_vars.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Env {
    pub fn from_dotenv_str(contents: &str) -> Result<Self> {
        let mut file_vars = BTreeMap::new();
        for item in dotenv::from_read_iter(contents.as_bytes()) {
            let (key, value) =
                item.map_err(|err| DriveError::Config(format!("invalid dotenv line: {err}")))?;
            if !value.trim().is_empty() {
                file_vars.insert(key, value);
            }
        }
        Ok(Self { file_vars })
    }

    pub async fn load_dotenv(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
            DriveError::Config(format!("read dotenv {} failed: {err}", path.display()))
        })?;
        Self::from_dotenv_str(&contents)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.file_vars
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
            .filter(|value| !value.trim().is_empty())
    }

    /// First non-empty value among `keys`, in order.
    pub fn first_of<S: AsRef<str>>(&self, keys: &[S]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key.as_ref()))
    }
}
