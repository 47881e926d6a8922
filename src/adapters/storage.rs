use crate::core::Storage;
use crate::utils::error::{CleanError, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 本機檔案系統；寫入先落在同目錄的暫存檔，成功後才改名
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CleanError::NotFoundError {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(CleanError::IoError(e)),
        }
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let target = self.base_path.join(name);
        let write_error = |source: std::io::Error| CleanError::WriteError {
            path: target.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(write_error)?;

        let mut temp = NamedTempFile::new_in(&self.base_path).map_err(write_error)?;
        temp.write_all(data).map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;
        temp.persist(&target).map_err(|e| write_error(e.error))?;

        tracing::debug!("Persisted {} ({} bytes)", target.display(), data.len());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let missing = dir.path().join("nope.json");
        match storage.read_file(&missing).await {
            Err(CleanError::NotFoundError { path }) => assert_eq!(path, missing),
            other => panic!("expected NotFoundError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("courses");
        let storage = LocalStorage::new(&out_dir);

        let path = storage.write_file("a_clean.json", b"[]").await.unwrap();
        assert_eq!(path, out_dir.join("a_clean.json"));
        assert_eq!(std::fs::read(&path).unwrap(), b"[]");

        let entries: Vec<_> = std::fs::read_dir(&out_dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_write_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("depts_clean.json", b"old").await.unwrap();
        let path = storage.write_file("depts_clean.json", b"new").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_is_write_error() {
        let dir = TempDir::new().unwrap();
        // 以一般檔案擋住輸出目錄
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"file").unwrap();
        let storage = LocalStorage::new(&blocker);

        let result = storage.write_file("out.json", b"[]").await;
        assert!(matches!(result, Err(CleanError::WriteError { .. })));
    }
}
