//! 파일 시스템 캐시 저장소.

use super::CacheStore;
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use ohlcv_core::CacheKey;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// 디렉토리 하나에 키당 파일 하나를 두는 저장소.
///
/// 파일 이름은 키의 SHA-256 다이제스트(`<digest>.json`)입니다. 쓰기는 임시 파일에
/// 기록한 뒤 rename하므로 동시에 읽는 쪽이 절반만 쓰인 항목을 보지 않습니다.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// 새 파일 저장소 생성. 디렉토리는 첫 쓰기 시 생성됩니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 키에 해당하는 항목 파일 경로.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.entry_path(key)).await?)
    }

    async fn read(&self, key: &CacheKey) -> Result<Vec<u8>> {
        let path = self.entry_path(key);
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::Io(e),
        })
    }

    async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.entry_path(key);
        let tmp = self.dir.join(format!(".{}.{}.tmp", key.digest(), Uuid::new_v4()));

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(key = %key, path = %path.display(), bytes = bytes.len(), "캐시 파일 저장");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ohlcv_core::{CandleRequest, Timeframe};

    fn key() -> CacheKey {
        CacheKey::from_request(&CandleRequest::new(
            "BTCUSDT",
            Timeframe::D1,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let key = key();

        assert!(!store.exists(&key).await.unwrap());
        store.write(&key, b"payload").await.unwrap();

        assert!(store.exists(&key).await.unwrap());
        assert_eq!(store.read(&key).await.unwrap(), b"payload");
        assert!(store.entry_path(&key).ends_with(format!("{}.json", key.digest())));
    }

    #[tokio::test]
    async fn test_no_temp_files_left() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write(&key(), b"payload").await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn test_read_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.read(&key()).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
