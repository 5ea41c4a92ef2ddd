//! 快照存储 - 业务能力层
//!
//! 每个来源一个 JSON 文件：`<root>/<source_key>.json`，内容是记录数组。
//! 不同键是完全独立的存储单元，写和删互不影响。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::StorageError;
use crate::models::{Record, SourceKey};

const SNAPSHOT_EXTENSION: &str = "json";

/// 某个来源最近一次提取的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub key: SourceKey,
    pub records: Vec<Record>,
}

/// 快照存储
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 快照文件路径
    pub fn path_for(&self, key: &SourceKey) -> PathBuf {
        self.root
            .join(format!("{}.{}", key.as_str(), SNAPSHOT_EXTENSION))
    }

    /// 覆盖写入快照
    ///
    /// 先写同目录下的临时文件再重命名，读者不会看到写了一半的快照，
    /// 写失败时旧快照保持不变。
    pub async fn put(&self, key: &SourceKey, records: &[Record]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::CreateDirFailed {
                path: self.root.display().to_string(),
                source,
            })?;

        let body = serde_json::to_string_pretty(records).map_err(|source| StorageError::EncodeFailed {
            key: key.to_string(),
            source,
        })?;

        let target = self.path_for(key);
        let staging = self.root.join(format!(".{}.{}.tmp", key.as_str(), SNAPSHOT_EXTENSION));

        if let Err(source) = fs::write(&staging, body).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::WriteFailed {
                path: staging.display().to_string(),
                source,
            });
        }
        fs::rename(&staging, &target)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: target.display().to_string(),
                source,
            })?;

        debug!("快照已写入: {} ({} 条)", target.display(), records.len());
        Ok(())
    }

    /// 删除快照，不存在时什么都不做；返回是否真的删除了文件
    pub async fn delete(&self, key: &SourceKey) -> Result<bool, StorageError> {
        let target = self.path_for(key);
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!("快照已删除: {}", target.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::DeleteFailed {
                path: target.display().to_string(),
                source,
            }),
        }
    }

    /// 读取单个快照，不存在时返回 `None`
    pub async fn get(&self, key: &SourceKey) -> Result<Option<Snapshot>, StorageError> {
        let target = self.path_for(key);
        let content = match fs::read_to_string(&target).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::ReadFailed {
                    path: target.display().to_string(),
                    source,
                })
            }
        };

        let records: Vec<Record> = serde_json::from_str(&content).map_err(|source| StorageError::Corrupt {
            path: target.display().to_string(),
            source,
        })?;

        Ok(Some(Snapshot {
            key: key.clone(),
            records,
        }))
    }

    /// 当前存在的所有快照键（按键排序）
    pub async fn keys(&self) -> Result<Vec<SourceKey>, StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::ListFailed {
                    path: self.root.display().to_string(),
                    source,
                })
            }
        };

        let mut keys = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(StorageError::ListFailed {
                        path: self.root.display().to_string(),
                        source,
                    })
                }
            };

            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()).and_then(SourceKey::parse) {
                Some(key) => keys.push(key),
                None => debug!("忽略非快照文件: {}", path.display()),
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// 读取所有快照
    ///
    /// 列目录和逐个读取之间被并发删除的快照直接跳过。
    pub async fn get_all(&self) -> Result<Vec<Snapshot>, StorageError> {
        let mut snapshots = Vec::new();
        for key in self.keys().await? {
            if let Some(snapshot) = self.get(&key).await? {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }
}
