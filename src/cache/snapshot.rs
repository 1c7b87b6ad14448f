use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use super::{atomic, keys};
use crate::weather::WeatherSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] io::Error),
    #[error("cache decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// 以文件形式保存天气快照，文件修改时间即为新鲜度依据
///
/// 写入先落到临时文件再重命名，读者不会读到写了一半的快照。
/// 同一个键的并发写入不做协调，后写者覆盖先写者。
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
    max_age: Duration,
}

impl SnapshotCache {
    pub fn new(dir: PathBuf, max_age: Duration) -> Self {
        Self { dir, max_age }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(keys::file_name(key))
    }

    /// 读取未过期的快照，过期、缺失或读取失败都视为未命中
    pub async fn lookup(&self, key: &str) -> Option<WeatherSnapshot> {
        match self.read_if_fresh(key).await {
            Ok(Some(snapshot)) => {
                tracing::debug!("Get snapshot from cache: {}", key);
                Some(snapshot)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn read_if_fresh(&self, key: &str) -> Result<Option<WeatherSnapshot>, CacheError> {
        let path = self.path_for(key);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !self.is_fresh(metadata.modified()?, SystemTime::now()) {
            tracing::debug!("Cached snapshot is stale: {}", key);
            return Ok(None);
        }

        let content = tokio::fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&content)?))
    }

    fn is_fresh(&self, modified: SystemTime, now: SystemTime) -> bool {
        // 修改时间在未来（时钟回拨）时视为刚写入
        match now.duration_since(modified) {
            Ok(age) => age < self.max_age,
            Err(_) => true,
        }
    }

    /// 整体覆盖写入，失败只记录日志
    pub async fn store(&self, key: &str, snapshot: &WeatherSnapshot) {
        if let Err(e) = self.write(key, snapshot).await {
            tracing::error!("Failed to store snapshot for {}: {}", key, e);
        } else {
            tracing::debug!("Set snapshot to cache: {}", key);
        }
    }

    async fn write(&self, key: &str, snapshot: &WeatherSnapshot) -> Result<(), CacheError> {
        let out = serde_json::to_vec(snapshot)?;
        atomic::write_atomic(&self.path_for(key), &out).await?;
        Ok(())
    }
}
