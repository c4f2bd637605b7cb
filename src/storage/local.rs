use crate::contract::DataDir;
use crate::domain::ports::Storage;
use crate::utils::error::{AppError, Result};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Files inside the persistent data directory.
///
/// Never creates directories: the data directory belongs to provisioning.
/// Writes go to a temp file in the target directory that is then renamed
/// over the destination, so a process killed mid-write leaves either the old
/// or the new file, never a torn one.
#[derive(Debug, Clone)]
pub struct DataDirStorage {
    data_dir: DataDir,
}

impl DataDirStorage {
    pub fn new(data_dir: DataDir) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &DataDir {
        &self.data_dir
    }

    /// Name of `path` relative to the data directory, if it lies inside it.
    pub fn relative_name(&self, path: &Path) -> Option<String> {
        path.strip_prefix(self.data_dir.path())
            .ok()
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(AppError::InvalidConfigValueError {
                field: "storage path".to_string(),
                value: path.to_string(),
                reason: "must be a relative path inside the data directory".to_string(),
            });
        }
        Ok(self.data_dir.join(relative))
    }
}

impl Storage for DataDirStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;
        let parent = full_path.parent().unwrap_or(self.data_dir.path());

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist(&full_path).map_err(|e| AppError::IoError(e.error))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }
}
