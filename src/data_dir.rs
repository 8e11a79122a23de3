use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the store inside the data directory.
pub const STORE_FILE: &str = "store.redb";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The KEYMATCH_DATA_DIR environment variable
    /// 3. The XDG data directory (~/.local/share/keymatch/)
    ///
    /// The directory is not created: the store is written by another
    /// process and only read here.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var("KEYMATCH_DATA_DIR") {
            PathBuf::from(val)
        } else {
            xdg::BaseDirectories::with_prefix("keymatch")
                .get_data_home()
                .ok_or_else(|| {
                    Error::Config(
                        "could not determine XDG data home directory".into(),
                    )
                })?
        };

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the store database, unless overridden by `--store`.
    pub fn store(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.join(STORE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        assert_eq!(dir.root(), tmp.path());
        assert_eq!(dir.store(None), tmp.path().join("store.redb"));
    }

    #[test]
    fn explicit_store_overrides_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();
        let custom = Path::new("/srv/images.redb");

        assert_eq!(dir.store(Some(custom)), custom);
    }

    #[test]
    fn resolve_does_not_create_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("not-yet");
        let dir = DataDir::resolve(Some(&missing)).unwrap();

        assert_eq!(dir.root(), missing);
        assert!(!missing.exists());
    }
}
