//! Per-run data directories.

use std::path::{Path, PathBuf};

use crate::types::{Error, Result};

/// Prefix for directories created by [`TempDirManager`].
pub const DATA_DIR_PREFIX: &str = "k8s_test_framework_";

/// Creates and removes the data directory of one process run.
///
/// `destroy` is called at most once per successful `create`; implementations
/// need not be idempotent.
#[cfg_attr(test, mockall::automock)]
pub trait DataDirManager: Send + Sync {
    fn create(&mut self) -> Result<PathBuf>;
    fn destroy(&mut self) -> Result<()>;
}

/// Creates fresh directories under the system temp dir (or a chosen base).
///
/// Directories are only removed by [`destroy`](DataDirManager::destroy),
/// never on drop: a process that outlived its stop timeout may still be
/// writing there.
#[derive(Debug, Default)]
pub struct TempDirManager {
    base: Option<PathBuf>,
    current: Option<PathBuf>,
}

impl TempDirManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create directories inside `base` instead of the system temp dir.
    pub fn in_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
            current: None,
        }
    }

    /// Directory from the last `create`, if not yet destroyed.
    pub fn path(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

impl DataDirManager for TempDirManager {
    fn create(&mut self) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(DATA_DIR_PREFIX);
        let created = match &self.base {
            Some(base) => builder.tempdir_in(base),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::allocation(format!("cannot create data directory: {}", e)))?;

        let path = created.keep();
        self.current = Some(path.clone());
        Ok(path)
    }

    fn destroy(&mut self) -> Result<()> {
        let path = self
            .current
            .take()
            .ok_or_else(|| Error::not_initialized("no data directory has been created"))?;

        std::fs::remove_dir_all(&path)
            .map_err(|e| Error::destroy(format!("{}: {}", path.display(), e)))
    }
}
